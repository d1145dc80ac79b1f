//! Parsing and normalizing create requests.

use mirage_store::{Class, Gender};

use crate::CharacterError;

/// Longest allowed character name, in bytes.
pub const MAX_NAME_LEN: usize = 14;

/// Hair style given to new characters; the create request has no field for it.
pub const DEFAULT_HAIR: u8 = 1;

/// A decoded `account/name/class/gender/slot` create request.
///
/// `class` and `gender` are already normalized. `slot` is kept as sent so
/// the manager can report an out-of-range value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub account: String,
    pub name: String,
    pub class: Class,
    pub gender: Gender,
    pub slot: u32,
}

impl CreateRequest {
    /// Parses the five positional fields of a create payload.
    ///
    /// Numeric fields that do not parse are [`CharacterError::Malformed`].
    /// A class or gender that parses but is not a known value is
    /// normalized, never rejected.
    pub fn parse(params: &[&str]) -> Result<Self, CharacterError> {
        let &[account, name, class, gender, slot] = params else {
            return Err(CharacterError::Malformed(format!(
                "expected 5 fields, got {}",
                params.len()
            )));
        };
        if account.is_empty() {
            return Err(CharacterError::Malformed("empty account".into()));
        }
        Ok(Self {
            account: account.to_string(),
            name: name.to_string(),
            class: normalize_class(parse_number(class, "class")?),
            gender: normalize_gender(parse_number(gender, "gender")?),
            slot: u32::try_from(parse_number(slot, "slot")?).unwrap_or(0),
        })
    }
}

fn parse_number(field: &str, what: &str) -> Result<i64, CharacterError> {
    field
        .parse()
        .map_err(|_| CharacterError::Malformed(format!("{what} {field:?} is not a number")))
}

/// Maps a submitted class onto the enumeration; unknown values become
/// [`Class::Warrior`].
pub fn normalize_class(raw: i64) -> Class {
    u8::try_from(raw)
        .ok()
        .and_then(|v| Class::try_from(v).ok())
        .unwrap_or_default()
}

/// Maps a submitted gender onto the enumeration; unknown values become
/// [`Gender::Male`].
pub fn normalize_gender(raw: i64) -> Gender {
    u8::try_from(raw)
        .ok()
        .and_then(|v| Gender::try_from(v).ok())
        .unwrap_or_default()
}

/// Checks a character name: 1 to [`MAX_NAME_LEN`] bytes, no whitespace,
/// no control characters, and no field delimiter.
pub fn validate_name(name: &str) -> Result<(), CharacterError> {
    let ok = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == mirage_protocol::DELIMITER);
    if ok {
        Ok(())
    } else {
        Err(CharacterError::InvalidName(name.to_string()))
    }
}
