//! Data model shared by every store implementation.

use std::fmt;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A player account.
///
/// Accounts are provisioned outside the servers; the servers only read them
/// and update `login_nonce`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Stable numeric id assigned by the store.
    pub id: u64,
    /// Unique login name.
    pub name: String,
    pub password: String,
    /// Random value written on every successful server selection.
    ///
    /// Session credentials are derived from it, so writing a new nonce
    /// invalidates every credential issued before. `None` until the account
    /// first selects a server.
    pub login_nonce: Option<u64>,
}

// ---------------------------------------------------------------------------
// WorldServer
// ---------------------------------------------------------------------------

/// One entry in the world directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldServer {
    pub id: u32,
    pub name: String,
    /// Where game clients connect.
    pub game_addr: SocketAddr,
    /// The login server fronting this world.
    pub login_addr: SocketAddr,
}

// ---------------------------------------------------------------------------
// Class / Gender
// ---------------------------------------------------------------------------

/// Character class. The wire value is the discriminant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Class {
    #[default]
    Warrior = 0,
    Wizard = 1,
    Taoist = 2,
    Assassin = 3,
}

impl TryFrom<u8> for Class {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Warrior),
            1 => Ok(Self::Wizard),
            2 => Ok(Self::Taoist),
            3 => Ok(Self::Assassin),
            other => Err(other),
        }
    }
}

impl From<Class> for u8 {
    fn from(class: Class) -> Self {
        class as u8
    }
}

/// Character gender. The wire value is the discriminant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Gender {
    #[default]
    Male = 1,
    Female = 2,
}

impl TryFrom<u8> for Gender {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Male),
            2 => Ok(Self::Female),
            other => Err(other),
        }
    }
}

impl From<Gender> for u8 {
    fn from(gender: Gender) -> Self {
        gender as u8
    }
}

// ---------------------------------------------------------------------------
// Character
// ---------------------------------------------------------------------------

/// A character owned by an account.
///
/// `name` is unique across all accounts; `(account, slot)` is unique too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    /// Name of the owning account.
    pub account: String,
    pub name: String,
    pub slot: u8,
    pub class: Class,
    pub gender: Gender,
    /// Appearance (hair style).
    pub hair: u8,
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}#{}", self.name, self.account, self.slot)
    }
}
