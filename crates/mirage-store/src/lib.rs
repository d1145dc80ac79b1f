//! Persistence interfaces for Mirage.
//!
//! The login and game servers never touch a database directly. They talk
//! to three narrow traits:
//!
//! - [`AccountStore`]: look up accounts, record the current login nonce
//! - [`WorldDirectory`]: the static list of game worlds
//! - [`CharacterStore`]: list, test, insert, and delete characters
//!
//! Two implementations ship with the crate: [`MemoryStore`] for tests and
//! single-process setups, and [`SqliteStore`] for a database file shared by
//! a login process and any number of game processes.
//!
//! # Atomicity
//!
//! [`CharacterStore::insert_character`] checks *both* uniqueness rules
//! (global name, per-account slot) and inserts in one indivisible step.
//! Callers must not emulate it with `character_exists` + insert: two
//! concurrent creates of one name would both pass the check.

mod error;
mod memory;
mod model;
mod sqlite;
mod traits;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use model::{Account, Character, Class, Gender, WorldServer};
pub use sqlite::SqliteStore;
pub use traits::{AccountStore, CharacterStore, WorldDirectory};
