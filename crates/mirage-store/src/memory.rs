//! In-process store.
//!
//! Every operation takes the same lock, so an insert's two uniqueness
//! checks and the push happen with no other writer in between.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::{
    Account, AccountStore, Character, CharacterStore, StoreError,
    WorldDirectory, WorldServer,
};

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    next_account_id: u64,
    /// Kept sorted by id.
    worlds: Vec<WorldServer>,
    /// Insertion order is creation order.
    characters: Vec<Character>,
}

/// A [`MemoryStore`] holds everything in one mutex-guarded struct.
///
/// Only useful when the login and game servers run in the same process,
/// since nothing is shared across processes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provisions an account and returns it.
    ///
    /// # Errors
    /// [`StoreError::AccountExists`] if the name is already registered.
    pub fn add_account(
        &self,
        name: &str,
        password: &str,
    ) -> Result<Account, StoreError> {
        let mut inner = self.lock()?;
        if inner.accounts.contains_key(name) {
            return Err(StoreError::AccountExists(name.to_string()));
        }
        inner.next_account_id += 1;
        let account = Account {
            id: inner.next_account_id,
            name: name.to_string(),
            password: password.to_string(),
            login_nonce: None,
        };
        inner.accounts.insert(name.to_string(), account.clone());
        Ok(account)
    }

    /// Adds a world to the directory, replacing any world with the same id.
    pub fn add_world(&self, world: WorldServer) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.worlds.retain(|w| w.id != world.id);
        inner.worlds.push(world);
        inner.worlds.sort_by_key(|w| w.id);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }
}

impl AccountStore for MemoryStore {
    fn find_account(&self, name: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.lock()?.accounts.get(name).cloned())
    }

    fn set_login_nonce(&self, name: &str, nonce: u64) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let account = inner
            .accounts
            .get_mut(name)
            .ok_or_else(|| StoreError::AccountNotFound(name.to_string()))?;
        account.login_nonce = Some(nonce);
        Ok(())
    }
}

impl WorldDirectory for MemoryStore {
    fn list_worlds(&self) -> Result<Vec<WorldServer>, StoreError> {
        Ok(self.lock()?.worlds.clone())
    }
}

impl CharacterStore for MemoryStore {
    fn list_characters(&self, account: &str) -> Result<Vec<Character>, StoreError> {
        Ok(self
            .lock()?
            .characters
            .iter()
            .filter(|c| c.account == account)
            .cloned()
            .collect())
    }

    fn character_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.characters.iter().any(|c| c.name == name))
    }

    fn insert_character(&self, character: &Character) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner.characters.iter().any(|c| c.name == character.name) {
            return Err(StoreError::NameTaken(character.name.clone()));
        }
        if inner
            .characters
            .iter()
            .any(|c| c.account == character.account && c.slot == character.slot)
        {
            return Err(StoreError::SlotOccupied {
                account: character.account.clone(),
                slot: character.slot,
            });
        }
        inner.characters.push(character.clone());
        Ok(())
    }

    fn delete_character(&self, account: &str, name: &str) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        let before = inner.characters.len();
        inner
            .characters
            .retain(|c| !(c.account == account && c.name == name));
        Ok(inner.characters.len() != before)
    }
}
