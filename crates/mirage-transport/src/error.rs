use mirage_protocol::ProtocolError;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// Dialing a remote server failed.
    #[error("connect to {addr} failed: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The peer sent bytes that are not a valid frame.
    #[error("framing error: {0}")]
    Framing(#[source] ProtocolError),
}

impl TransportError {
    /// Splits a codec error into an I/O failure or a framing failure.
    pub(crate) fn from_recv(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Io(e) => Self::ReceiveFailed(e),
            other => Self::Framing(other),
        }
    }

    pub(crate) fn from_send(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Io(e) => Self::SendFailed(e),
            other => Self::Framing(other),
        }
    }

    /// Returns `true` if the peer violated the wire format.
    pub fn is_framing(&self) -> bool {
        matches!(self, Self::Framing(_))
    }
}
