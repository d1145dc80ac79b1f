//! Error types for the storage layer.

/// Errors returned by the storage interfaces.
///
/// `NameTaken` and `SlotOccupied` are not failures of the store: they are
/// how an atomic insert reports which uniqueness rule it refused to break.
/// Everything else means the store could not do its job.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another character, on any account, already has this name.
    #[error("character name {0:?} is already taken")]
    NameTaken(String),

    /// The account already has a character in this slot.
    #[error("account {account:?} already has a character in slot {slot}")]
    SlotOccupied { account: String, slot: u8 },

    /// An account with this name is already registered.
    #[error("account {0:?} already exists")]
    AccountExists(String),

    /// The account does not exist.
    #[error("account {0:?} not found")]
    AccountNotFound(String),

    /// The backing store is unreachable or its state is unusable
    /// (for example a poisoned lock).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A SQLite call failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    /// Returns `true` for the two uniqueness conflicts an insert can hit.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::NameTaken(_) | Self::SlotOccupied { .. })
    }
}
