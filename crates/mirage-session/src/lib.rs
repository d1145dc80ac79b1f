//! Session credentials and connection state for Mirage.
//!
//! The login server and the game server are separate processes that share
//! nothing but storage and a configured secret. This crate is the trust
//! boundary between them:
//!
//! 1. **Issue**: on server selection the login side writes a fresh random
//!    nonce for the account and hands the client a [`Credential`] derived
//!    from it ([`CredentialAuthority::issue`]).
//! 2. **Validate**: the game side re-derives the expected credential from
//!    the stored account and compares ([`CredentialValidator::validate`]).
//!    No call ever goes back to the login server.
//!
//! It also holds the two per-connection state machines:
//!
//! ```text
//! Login:  Unauthenticated ──auth──→ Authenticated ──select──→ ServerSelected (terminal)
//! Game:   Unvalidated ──query ok──→ Validated { account }
//!               ↑                          │
//!               └──────query failed────────┘
//! ```

mod credential;
mod error;
mod state;
mod validator;

pub use credential::{Credential, CredentialAuthority};
pub use error::{SessionError, ValidationError};
pub use state::{GameContext, LoginSession, LoginState};
pub use validator::{parse_credential_request, CredentialValidator};
