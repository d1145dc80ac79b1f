//! Error types for character operations.

use mirage_protocol::SERVER_FAILURE;
use mirage_store::StoreError;

/// Why a character request was refused.
///
/// Every variant is recoverable: the game server answers with
/// [`result_code`](Self::result_code) and keeps the connection open.
#[derive(Debug, thiserror::Error)]
pub enum CharacterError {
    /// The create payload is missing fields or has a non-numeric one.
    #[error("malformed character request: {0}")]
    Malformed(String),

    /// The requested name breaks the naming rules.
    #[error("invalid character name {0:?}")]
    InvalidName(String),

    /// Some account already owns a character with this name.
    #[error("character name {0:?} is already taken")]
    NameTaken(String),

    /// The account already has a character in this slot.
    #[error("slot {0} is occupied")]
    SlotOccupied(u8),

    /// The slot is outside `1..=max`.
    #[error("slot {slot} is outside 1..={max}")]
    SlotOutOfRange { slot: u32, max: u8 },

    /// Nothing with this name is owned by the account.
    #[error("character {0:?} not found")]
    NotFound(String),

    /// The store could not complete the operation.
    #[error(transparent)]
    Store(StoreError),
}

impl CharacterError {
    pub fn result_code(&self) -> i32 {
        match self {
            Self::Malformed(_) | Self::InvalidName(_) => 1,
            Self::NameTaken(_) | Self::SlotOccupied(_) | Self::NotFound(_) => 2,
            Self::SlotOutOfRange { .. } => 3,
            Self::Store(_) => SERVER_FAILURE,
        }
    }
}

/// Uniqueness conflicts become business-rule errors; everything else is a
/// store failure.
impl From<StoreError> for CharacterError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NameTaken(name) => Self::NameTaken(name),
            StoreError::SlotOccupied { slot, .. } => Self::SlotOccupied(slot),
            other => Self::Store(other),
        }
    }
}
