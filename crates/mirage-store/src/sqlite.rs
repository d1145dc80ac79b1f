//! SQLite-backed store.
//!
//! A login process and its game processes can open the same database file;
//! that file is the only state they share. Uniqueness is enforced by the
//! schema's unique indexes, so one `INSERT` is the whole atomic create even
//! across processes.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use crate::{
    Account, AccountStore, Character, CharacterStore, Class, Gender,
    StoreError, WorldDirectory, WorldServer,
};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS accounts (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL UNIQUE,
        password    TEXT NOT NULL,
        login_nonce INTEGER
    );
    CREATE TABLE IF NOT EXISTS worlds (
        id         INTEGER PRIMARY KEY,
        name       TEXT NOT NULL UNIQUE,
        game_addr  TEXT NOT NULL,
        login_addr TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS characters (
        id      INTEGER PRIMARY KEY AUTOINCREMENT,
        account TEXT NOT NULL,
        name    TEXT NOT NULL,
        slot    INTEGER NOT NULL,
        class   INTEGER NOT NULL,
        gender  INTEGER NOT NULL,
        hair    INTEGER NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS characters_name
        ON characters (name);
    CREATE UNIQUE INDEX IF NOT EXISTS characters_account_slot
        ON characters (account, slot);
";

/// How long a writer waits for another process's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A store backed by one SQLite database.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (creating if needed) a database file and its schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        // WAL lets the login and game processes read while the other writes.
        let mode: String = conn.pragma_update_and_check(
            None,
            "journal_mode",
            "WAL",
            |row| row.get(0),
        )?;
        tracing::debug!(path = %path.as_ref().display(), %mode, "sqlite store opened");
        Self::init(conn)
    }

    /// A private in-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
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
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO accounts (name, password) VALUES (?1, ?2)",
            params![name, password],
        )
        .map_err(|e| {
            if is_unique_violation(&e, "accounts.name") {
                StoreError::AccountExists(name.to_string())
            } else {
                StoreError::Sqlite(e)
            }
        })?;
        Ok(Account {
            id: conn.last_insert_rowid() as u64,
            name: name.to_string(),
            password: password.to_string(),
            login_nonce: None,
        })
    }

    /// Adds a world to the directory, replacing any world with the same id.
    pub fn add_world(&self, world: &WorldServer) -> Result<(), StoreError> {
        self.lock()?.execute(
            "INSERT OR REPLACE INTO worlds (id, name, game_addr, login_addr)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                world.id,
                world.name,
                world.game_addr.to_string(),
                world.login_addr.to_string()
            ],
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".into()))
    }
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    let nonce: Option<i64> = row.get("login_nonce")?;
    Ok(Account {
        id: row.get::<_, i64>("id")? as u64,
        name: row.get("name")?,
        password: row.get("password")?,
        // Stored as the two's-complement bit pattern of the u64.
        login_nonce: nonce.map(|n| n as u64),
    })
}

fn world_from_row(row: &Row<'_>) -> rusqlite::Result<WorldServer> {
    Ok(WorldServer {
        id: row.get("id")?,
        name: row.get("name")?,
        game_addr: parse_addr(row, "game_addr")?,
        login_addr: parse_addr(row, "login_addr")?,
    })
}

fn parse_addr(row: &Row<'_>, column: &str) -> rusqlite::Result<SocketAddr> {
    let raw: String = row.get(column)?;
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

fn character_from_row(row: &Row<'_>) -> rusqlite::Result<Character> {
    // Rows are only ever written through `insert_character`, which takes
    // typed values, so unknown discriminants fall back to the defaults.
    let class: u8 = row.get("class")?;
    let gender: u8 = row.get("gender")?;
    Ok(Character {
        account: row.get("account")?,
        name: row.get("name")?,
        slot: row.get("slot")?,
        class: Class::try_from(class).unwrap_or_default(),
        gender: Gender::try_from(gender).unwrap_or_default(),
        hair: row.get("hair")?,
    })
}

impl AccountStore for SqliteStore {
    fn find_account(&self, name: &str) -> Result<Option<Account>, StoreError> {
        let account = self
            .lock()?
            .query_row(
                "SELECT id, name, password, login_nonce FROM accounts WHERE name = ?1",
                params![name],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    fn set_login_nonce(&self, name: &str, nonce: u64) -> Result<(), StoreError> {
        let updated = self.lock()?.execute(
            "UPDATE accounts SET login_nonce = ?1 WHERE name = ?2",
            params![nonce as i64, name],
        )?;
        if updated == 0 {
            return Err(StoreError::AccountNotFound(name.to_string()));
        }
        Ok(())
    }
}

impl WorldDirectory for SqliteStore {
    fn list_worlds(&self) -> Result<Vec<WorldServer>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, game_addr, login_addr FROM worlds ORDER BY id",
        )?;
        let worlds = stmt
            .query_map([], world_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(worlds)
    }
}

impl CharacterStore for SqliteStore {
    fn list_characters(&self, account: &str) -> Result<Vec<Character>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT account, name, slot, class, gender, hair
             FROM characters WHERE account = ?1 ORDER BY id",
        )?;
        let characters = stmt
            .query_map(params![account], character_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(characters)
    }

    fn character_exists(&self, name: &str) -> Result<bool, StoreError> {
        let exists = self.lock()?.query_row(
            "SELECT EXISTS (SELECT 1 FROM characters WHERE name = ?1)",
            params![name],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn insert_character(&self, character: &Character) -> Result<(), StoreError> {
        let result = self.lock()?.execute(
            "INSERT INTO characters (account, name, slot, class, gender, hair)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                character.account,
                character.name,
                character.slot,
                u8::from(character.class),
                u8::from(character.gender),
                character.hair
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(e) => Err(classify_insert_error(e, character)),
        }
    }

    fn delete_character(&self, account: &str, name: &str) -> Result<bool, StoreError> {
        let deleted = self.lock()?.execute(
            "DELETE FROM characters WHERE account = ?1 AND name = ?2",
            params![account, name],
        )?;
        Ok(deleted > 0)
    }
}

/// Whether `err` is a constraint violation naming `column`.
fn is_unique_violation(err: &rusqlite::Error, column: &str) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(ffi, Some(message))
            if ffi.code == ErrorCode::ConstraintViolation && message.contains(column)
    )
}

/// Maps a unique-index violation to the rule it broke.
fn classify_insert_error(err: rusqlite::Error, character: &Character) -> StoreError {
    if is_unique_violation(&err, "characters.name") {
        return StoreError::NameTaken(character.name.clone());
    }
    if is_unique_violation(&err, "characters.slot") {
        return StoreError::SlotOccupied {
            account: character.account.clone(),
            slot: character.slot,
        };
    }
    StoreError::Sqlite(err)
}
