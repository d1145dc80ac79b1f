//! Unified error type for the Mirage servers.

use mirage_character::CharacterError;
use mirage_protocol::ProtocolError;
use mirage_session::{SessionError, ValidationError};
use mirage_store::StoreError;
use mirage_transport::TransportError;

use crate::config::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// Per-request failures never reach this type: handlers turn them into
/// result codes. A `MirageError` either stops a server from starting or
/// ends one connection.
#[derive(Debug, thiserror::Error)]
pub enum MirageError {
    /// A transport-level error (bind, accept, send, recv, framing).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A storage error outside any request (opening, seeding).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A session error outside any request (bad secret).
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Character(#[from] CharacterError),

    /// The configuration file could not be read or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A blocking store call panicked or was cancelled.
    #[error("blocking store task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}
