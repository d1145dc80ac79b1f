//! Per-connection state for the login and game servers.
//!
//! Both types are owned by exactly one connection task and dropped with it,
//! so nothing here is shared or locked.

use mirage_store::{Account, WorldServer};

use crate::SessionError;

// ---------------------------------------------------------------------------
// LoginState
// ---------------------------------------------------------------------------

/// Where a login connection is in its handoff.
///
/// ```text
///   Unauthenticated ──(auth ok)──→ Authenticated ──(select ok)──→ ServerSelected
///         ↑                            │     ↑
///         │                            └─────┘ (re-auth ok)
///         └──(re-auth fails, revoke)───┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoginState {
    #[default]
    Unauthenticated,

    /// Password checked; the connection may now pick a world.
    Authenticated { account: Account },

    /// A credential was issued for `world_id`. Terminal: the client is
    /// expected to hang up and connect to the game server.
    ServerSelected { account: String, world_id: u32 },
}

/// The login state machine plus its failed-attempt counter.
#[derive(Debug, Clone)]
pub struct LoginSession {
    state: LoginState,
    failed_attempts: u32,
    max_attempts: u32,
}

impl LoginSession {
    /// A fresh connection. `max_attempts` of zero is treated as one.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: LoginState::Unauthenticated,
            failed_attempts: 0,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn state(&self) -> &LoginState {
        &self.state
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, LoginState::ServerSelected { .. })
    }

    /// Checks a password against the looked-up account.
    ///
    /// `found` is whatever the store returned for the submitted name; an
    /// unknown account and a wrong password fail the same way. On success
    /// the connection is bound to the account, replacing any earlier one.
    /// A failed attempt drops any earlier binding, so a server selection
    /// after it is refused.
    ///
    /// # Errors
    /// - [`SessionError::InvalidCredentials`]: bad name or password
    /// - [`SessionError::TooManyAttempts`]: this failure used up the last attempt
    /// - [`SessionError::AlreadySelected`]: the connection is terminal
    pub fn authenticate(
        &mut self,
        found: Option<Account>,
        password: &str,
    ) -> Result<&Account, SessionError> {
        if let LoginState::ServerSelected { world_id, .. } = self.state {
            return Err(SessionError::AlreadySelected(world_id));
        }
        if self.failed_attempts >= self.max_attempts {
            return Err(SessionError::TooManyAttempts(self.failed_attempts));
        }

        match found {
            Some(account) if account.password == password => {
                self.state = LoginState::Authenticated { account };
                self.authenticated_account()
            }
            _ => {
                self.state = LoginState::Unauthenticated;
                self.failed_attempts += 1;
                if self.failed_attempts >= self.max_attempts {
                    Err(SessionError::TooManyAttempts(self.failed_attempts))
                } else {
                    Err(SessionError::InvalidCredentials)
                }
            }
        }
    }

    /// Drops the binding of a login the client was told failed.
    ///
    /// Does not count as a failed attempt and never leaves the terminal
    /// state.
    pub fn revoke(&mut self) {
        if let LoginState::Authenticated { .. } = self.state {
            self.state = LoginState::Unauthenticated;
        }
    }

    /// The account a server selection would issue a credential for.
    pub fn authenticated_account(&self) -> Result<&Account, SessionError> {
        match &self.state {
            LoginState::Authenticated { account } => Ok(account),
            LoginState::Unauthenticated => Err(SessionError::NotAuthenticated),
            LoginState::ServerSelected { world_id, .. } => {
                Err(SessionError::AlreadySelected(*world_id))
            }
        }
    }

    /// Moves to the terminal state once a credential for `world` exists.
    pub fn select_server(&mut self, world: &WorldServer) -> Result<(), SessionError> {
        let account = self.authenticated_account()?.name.clone();
        self.state = LoginState::ServerSelected {
            account,
            world_id: world.id,
        };
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GameContext
// ---------------------------------------------------------------------------

/// Whether a game connection has presented a valid credential.
///
/// Every game handler receives this. Character mutations are only served
/// in `Validated`, and only for the bound account.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GameContext {
    #[default]
    Unvalidated,
    Validated { account: String },
}

impl GameContext {
    /// The bound account, if validated.
    pub fn account(&self) -> Option<&str> {
        match self {
            Self::Validated { account } => Some(account),
            Self::Unvalidated => None,
        }
    }

    pub fn is_validated(&self) -> bool {
        matches!(self, Self::Validated { .. })
    }

    /// Binds the connection to `account`, replacing any earlier binding.
    pub fn promote(&mut self, account: impl Into<String>) {
        *self = Self::Validated {
            account: account.into(),
        };
    }

    /// Drops any binding after a failed validation.
    pub fn demote(&mut self) {
        *self = Self::Unvalidated;
    }
}
