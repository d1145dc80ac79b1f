//! Core protocol types for Mirage's wire format.
//!
//! A packet is a fixed header of five integers followed by a single text
//! field. The text field carries positional values joined by `/`.

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::ProtocolError;

/// Size of the length prefix in front of every frame.
pub const LEN_PREFIX: usize = 4;

/// Size of the fixed header: `i32` + four `u16`s.
pub const HEADER_LEN: usize = 12;

/// Largest frame (header + body) either side will accept.
pub const MAX_FRAME_LEN: usize = 8 * 1024;

/// Separator between positional values in a packet body.
pub const DELIMITER: char = '/';

/// Result code carried by every successful response.
pub const SUCCESS: i32 = 0;

/// Generic failure code for any response whose request could not be served
/// because the server itself failed (storage unreachable and the like).
pub const SERVER_FAILURE: i32 = 4;

// ---------------------------------------------------------------------------
// Command ids
// ---------------------------------------------------------------------------

/// Command identifiers.
///
/// `CM_*` are client → server requests, `SM_*` are server → client
/// responses. The numbering follows the legend-of-mir client, so an
/// off-the-shelf client can talk to these servers.
pub mod command {
    /// Login server: `account/password`.
    pub const CM_IDPASSWORD: u16 = 2001;
    /// Login server: `worldName`.
    pub const CM_SELECTSERVER: u16 = 104;

    /// Game server: `account/credential`.
    pub const CM_QUERYCHR: u16 = 100;
    /// Game server: `account/name/class/gender/slot/`.
    pub const CM_NEWCHR: u16 = 101;
    /// Game server: `name`.
    pub const CM_DELCHR: u16 = 102;

    pub const SM_PASSWD_FAIL: u16 = 503;
    pub const SM_QUERYCHR: u16 = 520;
    pub const SM_NEWCHR_SUCCESS: u16 = 521;
    pub const SM_NEWCHR_FAIL: u16 = 522;
    pub const SM_DELCHR_SUCCESS: u16 = 523;
    pub const SM_DELCHR_FAIL: u16 = 524;
    pub const SM_STARTFAIL: u16 = 526;
    pub const SM_QUERYCHR_FAIL: u16 = 527;
    pub const SM_PASSOK_SELECTSERVER: u16 = 529;
    pub const SM_SELECTSERVER_OK: u16 = 530;

    /// Returns a human-readable name for logging, if the id is known.
    pub fn name(id: u16) -> Option<&'static str> {
        Some(match id {
            CM_IDPASSWORD => "CM_IDPASSWORD",
            CM_SELECTSERVER => "CM_SELECTSERVER",
            CM_QUERYCHR => "CM_QUERYCHR",
            CM_NEWCHR => "CM_NEWCHR",
            CM_DELCHR => "CM_DELCHR",
            SM_PASSWD_FAIL => "SM_PASSWD_FAIL",
            SM_QUERYCHR => "SM_QUERYCHR",
            SM_NEWCHR_SUCCESS => "SM_NEWCHR_SUCCESS",
            SM_NEWCHR_FAIL => "SM_NEWCHR_FAIL",
            SM_DELCHR_SUCCESS => "SM_DELCHR_SUCCESS",
            SM_DELCHR_FAIL => "SM_DELCHR_FAIL",
            SM_STARTFAIL => "SM_STARTFAIL",
            SM_QUERYCHR_FAIL => "SM_QUERYCHR_FAIL",
            SM_PASSOK_SELECTSERVER => "SM_PASSOK_SELECTSERVER",
            SM_SELECTSERVER_OK => "SM_SELECTSERVER_OK",
            _ => return None,
        })
    }
}

// ---------------------------------------------------------------------------
// PacketHeader
// ---------------------------------------------------------------------------

/// The fixed-size header in front of every packet body.
///
/// `result` is 0 on success; any other value is a command-specific
/// failure reason. `param_count` is an auxiliary count whose meaning also
/// depends on the command (world entries in a directory, characters in a
/// roster). The two reserved words are always written as zero by this
/// server and ignored on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PacketHeader {
    pub result: i32,
    pub command: u16,
    pub reserved1: u16,
    pub reserved2: u16,
    pub param_count: u16,
}

impl PacketHeader {
    /// A header for `command` with every other field zeroed.
    pub fn new(command: u16) -> Self {
        Self {
            command,
            ..Self::default()
        }
    }

    fn write(&self, dst: &mut BytesMut) {
        dst.put_i32_le(self.result);
        dst.put_u16_le(self.command);
        dst.put_u16_le(self.reserved1);
        dst.put_u16_le(self.reserved2);
        dst.put_u16_le(self.param_count);
    }

    fn read(src: &mut &[u8]) -> Self {
        Self {
            result: src.get_i32_le(),
            command: src.get_u16_le(),
            reserved1: src.get_u16_le(),
            reserved2: src.get_u16_le(),
            param_count: src.get_u16_le(),
        }
    }
}

// ---------------------------------------------------------------------------
// Packet
// ---------------------------------------------------------------------------

/// One request or response: header plus delimited text body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Packet {
    pub header: PacketHeader,
    pub body: String,
}

impl Packet {
    /// A request or response with result 0 and no count.
    pub fn new(command: u16, body: impl Into<String>) -> Self {
        Self {
            header: PacketHeader::new(command),
            body: body.into(),
        }
    }

    /// A successful response carrying `param_count` entries in `body`.
    pub fn with_count(
        command: u16,
        param_count: u16,
        body: impl Into<String>,
    ) -> Self {
        let mut packet = Self::new(command, body);
        packet.header.param_count = param_count;
        packet
    }

    /// A failure response: nonzero result code, empty body.
    pub fn failure(command: u16, result: i32) -> Self {
        let mut packet = Self::new(command, String::new());
        packet.header.result = result;
        packet
    }

    pub fn command(&self) -> u16 {
        self.header.command
    }

    pub fn result(&self) -> i32 {
        self.header.result
    }

    /// Splits the body into its positional values.
    ///
    /// A single trailing delimiter is allowed and does not produce an
    /// empty last field, so `"a/b/"` and `"a/b"` both yield `["a", "b"]`.
    /// An empty body yields no fields at all.
    pub fn params(&self) -> Vec<&str> {
        let body = self.body.strip_suffix(DELIMITER).unwrap_or(&self.body);
        if body.is_empty() {
            return Vec::new();
        }
        body.split(DELIMITER).collect()
    }

    /// Encodes this packet as one complete frame, length prefix included.
    ///
    /// # Errors
    /// Returns [`ProtocolError::BadLength`] if the frame would exceed
    /// [`MAX_FRAME_LEN`].
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        let mut dst = BytesMut::new();
        self.encode_into(&mut dst)?;
        Ok(dst.freeze())
    }

    pub(crate) fn encode_into(
        &self,
        dst: &mut BytesMut,
    ) -> Result<(), ProtocolError> {
        let len = HEADER_LEN + self.body.len();
        if len > MAX_FRAME_LEN {
            return Err(ProtocolError::BadLength(len));
        }
        dst.reserve(LEN_PREFIX + len);
        // `len` is bounded by MAX_FRAME_LEN, so the cast cannot truncate.
        dst.put_u32_le(len as u32);
        self.header.write(dst);
        dst.put_slice(self.body.as_bytes());
        Ok(())
    }

    /// Decodes exactly one frame, length prefix included.
    ///
    /// # Errors
    /// Any truncation, out-of-range length, leftover bytes, or non-UTF-8
    /// body is a [`ProtocolError`].
    pub fn decode(mut src: &[u8]) -> Result<Self, ProtocolError> {
        if src.len() < LEN_PREFIX {
            return Err(ProtocolError::Truncated {
                expected: LEN_PREFIX,
                actual: src.len(),
            });
        }
        let len = check_frame_len(src.get_u32_le())?;
        if src.len() < len {
            return Err(ProtocolError::Truncated {
                expected: len,
                actual: src.len(),
            });
        }
        if src.len() > len {
            return Err(ProtocolError::TrailingBytes(src.len() - len));
        }
        Self::decode_frame(src)
    }

    /// Decodes header + body once the length prefix has been stripped.
    pub(crate) fn decode_frame(mut frame: &[u8]) -> Result<Self, ProtocolError> {
        if frame.len() < HEADER_LEN {
            return Err(ProtocolError::Truncated {
                expected: HEADER_LEN,
                actual: frame.len(),
            });
        }
        let header = PacketHeader::read(&mut frame);
        let body = String::from_utf8(frame.to_vec())
            .map_err(ProtocolError::InvalidBody)?;
        Ok(Self { header, body })
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match command::name(self.header.command) {
            Some(name) => write!(f, "{name}")?,
            None => write!(f, "CMD-{}", self.header.command)?,
        }
        write!(
            f,
            "[result={} count={}] {:?}",
            self.header.result, self.header.param_count, self.body
        )
    }
}

/// Validates a length prefix against the header size and frame limit.
pub(crate) fn check_frame_len(len: u32) -> Result<usize, ProtocolError> {
    let len = len as usize;
    if !(HEADER_LEN..=MAX_FRAME_LEN).contains(&len) {
        return Err(ProtocolError::BadLength(len));
    }
    Ok(len)
}

/// Joins values into a body, each followed by the delimiter.
///
/// `join_params(["test1", "1"])` is `"test1/1/"`.
pub fn join_params<I>(values: I) -> String
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    use fmt::Write;

    let mut body = String::new();
    for value in values {
        // Writing into a String cannot fail.
        let _ = write!(body, "{value}{DELIMITER}");
    }
    body
}
