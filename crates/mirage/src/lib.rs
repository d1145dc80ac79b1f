//! # Mirage
//!
//! Login and game servers for a legend-of-mir style backend.
//!
//! The two servers run as independent processes. They share a SQLite
//! database and a credential secret, and nothing else:
//!
//! ```text
//! client ──CM_IDPASSWORD──→ LoginServer ──SM_PASSOK_SELECTSERVER (worlds)──→ client
//! client ──CM_SELECTSERVER─→ LoginServer ──SM_SELECTSERVER_OK (ip/port/credential)──→ client
//! client ──CM_QUERYCHR (account/credential)──→ GameServer ──SM_QUERYCHR (roster)──→ client
//! client ──CM_NEWCHR / CM_DELCHR──→ GameServer
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use mirage::prelude::*;
//!
//! # async fn start() -> Result<(), MirageError> {
//! let store = Arc::new(SqliteStore::open("mirage.db")?);
//! let login = LoginServerBuilder::new()
//!     .bind("0.0.0.0:7000")
//!     .secret("change-me")
//!     .build(Arc::clone(&store))
//!     .await?;
//! let game = GameServerBuilder::new()
//!     .bind("0.0.0.0:7400")
//!     .world_id(1)
//!     .secret("change-me")
//!     .build(store)
//!     .await?;
//! tokio::try_join!(login.run(), game.run())?;
//! # Ok(())
//! # }
//! ```

mod blocking;
pub mod config;
mod error;
pub mod game;
pub mod login;

pub use error::MirageError;

/// Installs the `tracing` subscriber used by the binary.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Calling it
/// twice is harmless: the second install is ignored.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub mod prelude {
    pub use crate::config::{GameConfig, LoginConfig, MirageConfig};
    pub use crate::game::{GameServer, GameServerBuilder};
    pub use crate::login::{LoginServer, LoginServerBuilder};
    pub use crate::MirageError;

    pub use mirage_protocol::{command, Packet};
    pub use mirage_store::{MemoryStore, SqliteStore, WorldServer};
    pub use mirage_transport::{Connection, TcpConnection};
}
