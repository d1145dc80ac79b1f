//! Error types for the session layer.

use mirage_protocol::SERVER_FAILURE;
use mirage_store::StoreError;

/// Errors raised by the login connection state machine and the
/// credential authority.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Unknown account or wrong password. The two are deliberately not
    /// distinguished on the wire.
    #[error("invalid account name or password")]
    InvalidCredentials,

    /// The connection used up its authentication attempts.
    #[error("too many failed login attempts ({0})")]
    TooManyAttempts(u32),

    /// Server selection before a successful authentication.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The requested world is not in the directory.
    #[error("unknown world {0:?}")]
    UnknownWorld(String),

    /// A request arrived after the connection reached its terminal state.
    #[error("session already handed off to world {0}")]
    AlreadySelected(u32),

    /// The credential secret is unusable.
    #[error("invalid credential secret: {0}")]
    InvalidSecret(String),

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    /// The result code to answer with, or `None` when the connection should
    /// be closed instead of answered.
    pub fn result_code(&self) -> Option<i32> {
        match self {
            Self::InvalidCredentials => Some(1),
            Self::TooManyAttempts(_) => Some(2),
            Self::UnknownWorld(_) => Some(1),
            Self::NotAuthenticated => Some(2),
            Self::Store(_) => Some(SERVER_FAILURE),
            Self::AlreadySelected(_) | Self::InvalidSecret(_) => None,
        }
    }
}

/// Why a presented `account/credential` pair was rejected.
///
/// The checks run in a fixed order and the first failure wins, so a
/// client can tell exactly which step it failed from the code alone.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Missing or unparseable account or credential field.
    #[error("malformed account/credential field")]
    Malformed,

    /// The account does not exist.
    #[error("unknown account {0:?}")]
    UnknownAccount(String),

    /// The account exists but the credential is not its current one.
    #[error("credential mismatch for account {0:?}")]
    CredentialMismatch(String),

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ValidationError {
    pub fn result_code(&self) -> i32 {
        match self {
            Self::Malformed => 1,
            Self::UnknownAccount(_) => 2,
            Self::CredentialMismatch(_) => 3,
            Self::Store(_) => SERVER_FAILURE,
        }
    }
}
