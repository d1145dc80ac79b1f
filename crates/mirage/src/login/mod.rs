//! `LoginServer` builder and server loop.
//!
//! The login server authenticates accounts, lists the world directory, and
//! issues the credential a client takes to a game server.

mod handler;

use std::net::SocketAddr;
use std::sync::Arc;

use mirage_session::CredentialAuthority;
use mirage_store::{AccountStore, WorldDirectory};
use mirage_transport::{TcpTransport, Transport};

use crate::config::LoginConfig;
use crate::MirageError;

use handler::handle_connection;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<S: ?Sized> {
    pub(crate) store: Arc<S>,
    pub(crate) authority: CredentialAuthority,
    pub(crate) max_login_attempts: u32,
}

/// Builder for configuring and starting a login server.
///
/// # Example
///
/// ```rust,ignore
/// let server = LoginServerBuilder::new()
///     .bind("0.0.0.0:7000")
///     .secret("change-me")
///     .build(Arc::new(store))
///     .await?;
/// server.run().await
/// ```
pub struct LoginServerBuilder {
    config: LoginConfig,
    secret: String,
}

impl LoginServerBuilder {
    /// Creates a new builder with default settings and no secret.
    pub fn new() -> Self {
        Self {
            config: LoginConfig::default(),
            secret: String::new(),
        }
    }

    /// Replaces every setting with `config`.
    pub fn config(mut self, config: LoginConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind = addr.to_string();
        self
    }

    pub fn max_login_attempts(mut self, attempts: u32) -> Self {
        self.config.max_login_attempts = attempts;
        self
    }

    /// Sets the credential secret. Must match the game servers'.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    /// Binds the listener.
    ///
    /// # Errors
    /// Fails if the secret is empty or the address cannot be bound.
    pub async fn build<S>(self, store: Arc<S>) -> Result<LoginServer<S>, MirageError>
    where
        S: AccountStore + WorldDirectory,
    {
        let authority = CredentialAuthority::new(&self.secret)?;
        let transport = TcpTransport::bind(&self.config.bind).await?;

        let state = Arc::new(ServerState {
            store,
            authority,
            max_login_attempts: self.config.max_login_attempts,
        });

        Ok(LoginServer { transport, state })
    }
}

impl Default for LoginServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound login server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct LoginServer<S> {
    transport: TcpTransport,
    state: Arc<ServerState<S>>,
}

impl<S> LoginServer<S>
where
    S: AccountStore + WorldDirectory,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(mut self) -> Result<(), MirageError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "login server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "login connection ended with error");
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
