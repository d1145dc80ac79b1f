//! The storage interfaces the servers are written against.
//!
//! All methods are synchronous. The servers call them from
//! `tokio::task::spawn_blocking`, so an implementation is free to block on
//! disk or a lock.

use crate::{Account, Character, StoreError, WorldServer};

/// Read access to accounts plus the login nonce.
pub trait AccountStore: Send + Sync + 'static {
    /// Looks an account up by its unique name.
    fn find_account(&self, name: &str) -> Result<Option<Account>, StoreError>;

    /// Replaces the account's login nonce, superseding the previous one.
    ///
    /// # Errors
    /// [`StoreError::AccountNotFound`] if no account has this name.
    fn set_login_nonce(&self, name: &str, nonce: u64) -> Result<(), StoreError>;
}

/// The static list of game worlds offered at login.
pub trait WorldDirectory: Send + Sync + 'static {
    /// All worlds, ordered by id.
    fn list_worlds(&self) -> Result<Vec<WorldServer>, StoreError>;

    /// Finds a world by its display name.
    fn find_world(&self, name: &str) -> Result<Option<WorldServer>, StoreError> {
        Ok(self.list_worlds()?.into_iter().find(|w| w.name == name))
    }

    /// Finds a world by its id.
    fn find_world_by_id(&self, id: u32) -> Result<Option<WorldServer>, StoreError> {
        Ok(self.list_worlds()?.into_iter().find(|w| w.id == id))
    }
}

/// Character persistence.
pub trait CharacterStore: Send + Sync + 'static {
    /// The account's characters in creation order.
    fn list_characters(&self, account: &str) -> Result<Vec<Character>, StoreError>;

    /// Whether any account owns a character with this name.
    fn character_exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Inserts a character, atomically enforcing both uniqueness rules.
    ///
    /// # Errors
    /// - [`StoreError::NameTaken`]: the name exists on any account
    /// - [`StoreError::SlotOccupied`]: the account already uses the slot
    fn insert_character(&self, character: &Character) -> Result<(), StoreError>;

    /// Deletes `name` if it exists and belongs to `account`.
    ///
    /// Returns `false` when nothing was deleted, so repeating a delete
    /// keeps returning `false`.
    fn delete_character(&self, account: &str, name: &str) -> Result<bool, StoreError>;
}
