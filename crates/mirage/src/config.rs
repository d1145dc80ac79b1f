//! Server configuration.
//!
//! Each server has its own config struct with working defaults. The
//! binary reads all of them from one YAML file:
//!
//! ```yaml
//! secret: change-me
//! database: mirage.db
//! login:
//!   bind: 0.0.0.0:7000
//!   max_login_attempts: 3
//! game:
//!   bind: 0.0.0.0:7400
//!   world_id: 1
//!   max_slots: 3
//! seed:
//!   accounts:
//!     - { name: pangliang, password: pwd }
//!   worlds:
//!     - { id: 1, name: test1, game_addr: 127.0.0.1:7400, login_addr: 127.0.0.1:7000 }
//! ```

use std::path::{Path, PathBuf};

use mirage_character::DEFAULT_MAX_SLOTS;
use mirage_store::{AccountStore, SqliteStore, StoreError, WorldServer};
use serde::Deserialize;

/// Errors loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Login server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    pub bind: String,
    /// Failed authentications allowed per connection before it is closed.
    pub max_login_attempts: u32,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:7000".to_string(),
            max_login_attempts: 3,
        }
    }
}

/// Game server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub bind: String,
    /// The world this server runs; credentials are only accepted for it.
    pub world_id: u32,
    /// Character slots per account, numbered from 1.
    pub max_slots: u8,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:7400".to_string(),
            world_id: 1,
            max_slots: DEFAULT_MAX_SLOTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedAccount {
    pub name: String,
    pub password: String,
}

/// Accounts and worlds provisioned at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub accounts: Vec<SeedAccount>,
    pub worlds: Vec<WorldServer>,
}

impl SeedConfig {
    /// Writes the seed into `store`.
    ///
    /// Accounts that already exist are left alone, so a second process
    /// seeding the same database changes nothing. Worlds are upserted by id.
    pub fn apply(&self, store: &SqliteStore) -> Result<(), StoreError> {
        for account in &self.accounts {
            if store.find_account(&account.name)?.is_none() {
                store.add_account(&account.name, &account.password)?;
                tracing::info!(account = %account.name, "seeded account");
            }
        }
        for world in &self.worlds {
            store.add_world(world)?;
        }
        Ok(())
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MirageConfig {
    /// Credential secret shared by the login and game servers.
    pub secret: String,
    /// SQLite database shared by the login and game servers.
    pub database: PathBuf,
    pub login: LoginConfig,
    pub game: GameConfig,
    pub seed: SeedConfig,
}

impl Default for MirageConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            database: PathBuf::from("mirage.db"),
            login: LoginConfig::default(),
            game: GameConfig::default(),
            seed: SeedConfig::default(),
        }
    }
}

impl MirageConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        if config.secret.is_empty() {
            return Err(ConfigError::Invalid("`secret` must be set".into()));
        }
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }
}
