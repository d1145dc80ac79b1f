//! Error types for the protocol layer.
//!
//! Every variant here is a *framing* error: the bytes on the wire could
//! not be turned into a [`Packet`](crate::Packet). Servers treat these as
//! connection-fatal and never answer them.

/// Errors that can occur while encoding or decoding packets.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The frame ended before the announced length was reached.
    #[error("frame truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// The length prefix is smaller than a header or larger than
    /// [`MAX_FRAME_LEN`](crate::MAX_FRAME_LEN).
    #[error("frame length {0} out of range")]
    BadLength(usize),

    /// Bytes were left over after a complete frame in a one-shot decode.
    #[error("{0} trailing bytes after frame")]
    TrailingBytes(usize),

    /// The body is not UTF-8 text.
    #[error("packet body is not valid UTF-8")]
    InvalidBody(#[source] std::string::FromUtf8Error),

    /// The underlying stream failed while the codec was reading or writing.
    ///
    /// `tokio_util`'s `Decoder`/`Encoder` traits require the error type to
    /// be constructible from `std::io::Error`, hence this variant.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
