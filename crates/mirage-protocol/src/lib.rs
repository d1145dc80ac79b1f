//! Wire protocol for Mirage.
//!
//! This crate defines the packets the login server, game server and their
//! clients exchange:
//!
//! - **Types** ([`Packet`], [`PacketHeader`], [`command`]): a fixed
//!   12-byte header plus one `/`-delimited text body.
//! - **Codec** ([`PacketCodec`]): length-prefixed framing for
//!   `tokio_util::codec::Framed` streams.
//! - **Errors** ([`ProtocolError`]): framing failures.
//!
//! # Frame layout
//!
//! ```text
//! +-----------+--------------+--------------+---------+---------+-------------+--------------+
//! | len: u32  | result: i32  | command: u16 | rsv: u16| rsv: u16| params: u16 | body (UTF-8) |
//! +-----------+--------------+--------------+---------+---------+-------------+--------------+
//!   little-endian, `len` counts everything after itself
//! ```
//!
//! The codec knows nothing about body schemas. Each command owns its own
//! positional field layout; [`Packet::params`] and [`join_params`] are the
//! only helpers for it.

mod codec;
mod error;
mod types;

pub use codec::PacketCodec;
pub use error::ProtocolError;
pub use types::{
    command, join_params, Packet, PacketHeader, DELIMITER, HEADER_LEN,
    LEN_PREFIX, MAX_FRAME_LEN, SERVER_FAILURE, SUCCESS,
};
