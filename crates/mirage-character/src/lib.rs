//! Character slot lifecycle for the Mirage game server.
//!
//! [`CharacterManager`] sits between a validated game connection and a
//! [`CharacterStore`](mirage_store::CharacterStore). It parses and
//! normalizes create requests, enforces the slot range and naming rules,
//! and leaves both uniqueness rules to the store's atomic insert:
//!
//! | Operation | Success | Failure codes |
//! |---|---|---|
//! | [`query`](CharacterManager::query) | [`Roster`] in creation order | 4 |
//! | [`create`](CharacterManager::create) | the stored [`Character`](mirage_store::Character) | 1 name/format, 2 conflict, 3 slot, 4 |
//! | [`delete`](CharacterManager::delete) | `()` | 2 not found, 4 |
//!
//! The manager is synchronous like the store it wraps; the game server
//! runs it on the blocking thread pool.

mod error;
mod manager;
mod request;

pub use error::CharacterError;
pub use manager::{CharacterManager, Roster, DEFAULT_MAX_SLOTS};
pub use request::{
    normalize_class, normalize_gender, validate_name, CreateRequest,
    DEFAULT_HAIR, MAX_NAME_LEN,
};
