//! The character lifecycle: query, create, delete.

use mirage_protocol::join_params;
use mirage_store::{Character, CharacterStore};

use crate::request::{validate_name, CreateRequest, DEFAULT_HAIR};
use crate::CharacterError;

/// Default number of character slots per account.
pub const DEFAULT_MAX_SLOTS: u8 = 3;

/// An account's characters, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub characters: Vec<Character>,
}

impl Roster {
    /// Character count for the response's `param_count`.
    pub fn count(&self) -> u16 {
        u16::try_from(self.characters.len()).unwrap_or(u16::MAX)
    }

    /// The wire body: `name/gender/class/hair/slot/` per character.
    pub fn to_body(&self) -> String {
        join_params(self.characters.iter().flat_map(|c| {
            [
                c.name.clone(),
                u8::from(c.gender).to_string(),
                u8::from(c.class).to_string(),
                c.hair.to_string(),
                c.slot.to_string(),
            ]
        }))
    }
}

/// Applies the slot and naming rules on top of a [`CharacterStore`].
///
/// Holds no state of its own besides configuration; every decision about
/// uniqueness is made by the store's atomic insert.
#[derive(Debug, Clone, Copy)]
pub struct CharacterManager {
    max_slots: u8,
}

impl Default for CharacterManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SLOTS)
    }
}

impl CharacterManager {
    /// A manager allowing slots `1..=max_slots`. Zero is treated as one.
    pub fn new(max_slots: u8) -> Self {
        Self {
            max_slots: max_slots.max(1),
        }
    }

    pub fn max_slots(&self) -> u8 {
        self.max_slots
    }

    /// Lists `account`'s characters.
    pub fn query<S: CharacterStore + ?Sized>(
        &self,
        store: &S,
        account: &str,
    ) -> Result<Roster, CharacterError> {
        Ok(Roster {
            characters: store.list_characters(account)?,
        })
    }

    /// Creates a character for `account` from a parsed request.
    ///
    /// The request's own account field is not consulted; the caller decides
    /// what to do when it differs from the validated account.
    ///
    /// # Errors
    /// - [`CharacterError::SlotOutOfRange`]: slot outside `1..=max_slots`
    /// - [`CharacterError::InvalidName`]: name fails [`validate_name`]
    /// - [`CharacterError::NameTaken`] / [`CharacterError::SlotOccupied`]:
    ///   reported by the store's atomic insert
    pub fn create<S: CharacterStore + ?Sized>(
        &self,
        store: &S,
        account: &str,
        request: &CreateRequest,
    ) -> Result<Character, CharacterError> {
        let slot = u8::try_from(request.slot)
            .ok()
            .filter(|s| (1..=self.max_slots).contains(s))
            .ok_or(CharacterError::SlotOutOfRange {
                slot: request.slot,
                max: self.max_slots,
            })?;
        validate_name(&request.name)?;

        let character = Character {
            account: account.to_string(),
            name: request.name.clone(),
            slot,
            class: request.class,
            gender: request.gender,
            hair: DEFAULT_HAIR,
        };
        store.insert_character(&character)?;

        tracing::info!(character = %character, class = ?character.class, "character created");
        Ok(character)
    }

    /// Deletes `name` if `account` owns it.
    ///
    /// Repeating a successful delete fails with [`CharacterError::NotFound`].
    pub fn delete<S: CharacterStore + ?Sized>(
        &self,
        store: &S,
        account: &str,
        name: &str,
    ) -> Result<(), CharacterError> {
        if name.is_empty() || !store.delete_character(account, name)? {
            return Err(CharacterError::NotFound(name.to_string()));
        }
        tracing::info!(%account, character = %name, "character deleted");
        Ok(())
    }
}
