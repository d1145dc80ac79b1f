//! Streaming codec for `tokio_util::codec::Framed`.
//!
//! [`Packet::encode`] and [`Packet::decode`] work on one complete frame.
//! Sockets deliver bytes in arbitrary chunks, so the transport layer wraps
//! its streams with this codec instead: `decode` is called every time new
//! bytes arrive and returns `Ok(None)` until a whole frame is buffered.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::types::check_frame_len;
use crate::{Packet, ProtocolError, LEN_PREFIX};

/// Length-prefixed [`Packet`] framing.
///
/// Stateless apart from what `Framed` buffers for it, so one instance per
/// stream half is all that's needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketCodec;

impl PacketCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = ProtocolError;

    fn decode(
        &mut self,
        src: &mut BytesMut,
    ) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < LEN_PREFIX {
            return Ok(None);
        }

        // Peek at the prefix without consuming it: if the body isn't
        // complete yet we must leave the buffer untouched.
        let mut prefix = &src[..LEN_PREFIX];
        let len = check_frame_len(prefix.get_u32_le())?;

        if src.len() < LEN_PREFIX + len {
            src.reserve(LEN_PREFIX + len - src.len());
            return Ok(None);
        }

        src.advance(LEN_PREFIX);
        let frame = src.split_to(len);
        Packet::decode_frame(&frame).map(Some)
    }

    fn decode_eof(
        &mut self,
        src: &mut BytesMut,
    ) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(packet) => Ok(Some(packet)),
            None if src.is_empty() => Ok(None),
            // The peer hung up in the middle of a frame.
            None => {
                let expected = if src.len() < LEN_PREFIX {
                    LEN_PREFIX
                } else {
                    let mut prefix = &src[..LEN_PREFIX];
                    LEN_PREFIX + prefix.get_u32_le() as usize
                };
                Err(ProtocolError::Truncated {
                    expected,
                    actual: src.len(),
                })
            }
        }
    }
}

impl<'a> Encoder<&'a Packet> for PacketCodec {
    type Error = ProtocolError;

    fn encode(
        &mut self,
        item: &'a Packet,
        dst: &mut BytesMut,
    ) -> Result<(), Self::Error> {
        item.encode_into(dst)
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = ProtocolError;

    fn encode(
        &mut self,
        item: Packet,
        dst: &mut BytesMut,
    ) -> Result<(), Self::Error> {
        item.encode_into(dst)
    }
}
