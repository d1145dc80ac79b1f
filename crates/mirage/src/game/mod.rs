//! `GameServer` builder and server loop.
//!
//! The game server validates the credential a client brings from the
//! login server and then serves that account's character roster. It never
//! talks to the login server: the shared secret and the shared store are
//! enough.

mod handler;

use std::net::SocketAddr;
use std::sync::Arc;

use mirage_character::CharacterManager;
use mirage_session::{CredentialAuthority, CredentialValidator};
use mirage_store::{AccountStore, CharacterStore};
use mirage_transport::{TcpTransport, Transport};

use crate::config::GameConfig;
use crate::MirageError;

use handler::handle_connection;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<S: ?Sized> {
    pub(crate) store: Arc<S>,
    pub(crate) validator: CredentialValidator,
    pub(crate) characters: CharacterManager,
}

/// Builder for configuring and starting a game server.
///
/// # Example
///
/// ```rust,ignore
/// let server = GameServerBuilder::new()
///     .bind("0.0.0.0:7400")
///     .world_id(1)
///     .secret("change-me")
///     .build(Arc::new(store))
///     .await?;
/// server.run().await
/// ```
pub struct GameServerBuilder {
    config: GameConfig,
    secret: String,
}

impl GameServerBuilder {
    /// Creates a new builder with default settings and no secret.
    pub fn new() -> Self {
        Self {
            config: GameConfig::default(),
            secret: String::new(),
        }
    }

    /// Replaces every setting with `config`.
    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind = addr.to_string();
        self
    }

    /// Sets the world this server runs.
    pub fn world_id(mut self, world_id: u32) -> Self {
        self.config.world_id = world_id;
        self
    }

    pub fn max_slots(mut self, max_slots: u8) -> Self {
        self.config.max_slots = max_slots;
        self
    }

    /// Sets the credential secret. Must match the login server's.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    /// Binds the listener.
    ///
    /// # Errors
    /// Fails if the secret is empty or the address cannot be bound.
    pub async fn build<S>(self, store: Arc<S>) -> Result<GameServer<S>, MirageError>
    where
        S: AccountStore + CharacterStore,
    {
        let authority = CredentialAuthority::new(&self.secret)?;
        let transport = TcpTransport::bind(&self.config.bind).await?;

        let state = Arc::new(ServerState {
            store,
            validator: CredentialValidator::new(authority, self.config.world_id),
            characters: CharacterManager::new(self.config.max_slots),
        });

        Ok(GameServer { transport, state })
    }
}

impl Default for GameServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GameServer<S> {
    transport: TcpTransport,
    state: Arc<ServerState<S>>,
}

impl<S> GameServer<S>
where
    S: AccountStore + CharacterStore,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(mut self) -> Result<(), MirageError> {
        tracing::info!(
            addr = ?self.transport.local_addr().ok(),
            world = self.state.validator.world_id(),
            "game server running"
        );

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "game connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
