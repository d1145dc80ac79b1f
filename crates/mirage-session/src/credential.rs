//! The session credential: issued by the login server, checked by the
//! game server, with no channel between the two.
//!
//! A credential is the first four bytes of
//!
//! ```text
//! HMAC-SHA256(secret, account.id ‖ len(name) ‖ name ‖ login_nonce ‖ world_id)
//! ```
//!
//! Both processes know the secret (configuration) and can read the account
//! row (shared storage), so both can compute the same value. The nonce is
//! rewritten on every server selection, which retires every credential
//! issued before it: there is exactly one current credential per account.

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use mirage_store::{Account, AccountStore};
use rand::Rng;
use sha2::Sha256;

use crate::SessionError;

type HmacSha256 = Hmac<Sha256>;

/// The numeric token a client presents to the game server.
///
/// Sent on the wire as a decimal integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Credential(pub u32);

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Credential {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Issues and checks credentials with a shared secret.
///
/// Cheap to clone: the keyed HMAC state is computed once in
/// [`new`](Self::new) and cloned per use.
#[derive(Clone)]
pub struct CredentialAuthority {
    keyed: HmacSha256,
}

impl fmt::Debug for CredentialAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialAuthority").finish_non_exhaustive()
    }
}

impl CredentialAuthority {
    /// Creates an authority from the secret shared by login and game servers.
    ///
    /// # Errors
    /// [`SessionError::InvalidSecret`] if the secret is empty.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, SessionError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(SessionError::InvalidSecret("secret is empty".into()));
        }
        let keyed = HmacSha256::new_from_slice(secret)
            .map_err(|e| SessionError::InvalidSecret(e.to_string()))?;
        Ok(Self { keyed })
    }

    fn mac(&self, account: &Account, nonce: u64, world_id: u32) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(&account.id.to_be_bytes());
        // Length-prefix the name so (name, nonce) pairs can't run together.
        mac.update(&(account.name.len() as u32).to_be_bytes());
        mac.update(account.name.as_bytes());
        mac.update(&nonce.to_be_bytes());
        mac.update(&world_id.to_be_bytes());
        mac
    }

    /// The credential currently valid for `account` on `world_id`.
    ///
    /// Returns `None` if the account has never selected a server.
    pub fn derive(&self, account: &Account, world_id: u32) -> Option<Credential> {
        let nonce = account.login_nonce?;
        let tag = self.mac(account, nonce, world_id).finalize().into_bytes();
        Some(Credential(u32::from_be_bytes([tag[0], tag[1], tag[2], tag[3]])))
    }

    /// Checks a presented credential in constant time.
    pub fn verify(
        &self,
        account: &Account,
        world_id: u32,
        presented: Credential,
    ) -> bool {
        let Some(nonce) = account.login_nonce else {
            return false;
        };
        self.mac(account, nonce, world_id)
            .verify_truncated_left(&presented.0.to_be_bytes())
            .is_ok()
    }

    /// Issues a new credential for `account` on `world_id`.
    ///
    /// Writes a fresh nonce to the store first, so the previous credential
    /// stops validating the moment this one exists.
    pub fn issue<S: AccountStore + ?Sized>(
        &self,
        store: &S,
        account: &Account,
        world_id: u32,
    ) -> Result<Credential, SessionError> {
        let nonce: u64 = rand::rng().random();
        store.set_login_nonce(&account.name, nonce)?;

        let issued = Account {
            login_nonce: Some(nonce),
            ..account.clone()
        };
        let credential = self
            .derive(&issued, world_id)
            .ok_or_else(|| SessionError::InvalidSecret("nonce not applied".into()))?;

        tracing::info!(account = %account.name, world = world_id, "credential issued");
        Ok(credential)
    }
}
