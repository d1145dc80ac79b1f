//! Game-side credential validation.

use mirage_store::{Account, AccountStore};

use crate::{Credential, CredentialAuthority, ValidationError};

/// Splits an `account/credential` request into its two fields.
///
/// This is the format check, step 1 of validation: it never touches the
/// store. Anything other than exactly a non-empty account and a decimal
/// `u32` is [`ValidationError::Malformed`].
pub fn parse_credential_request<'a>(
    params: &[&'a str],
) -> Result<(&'a str, Credential), ValidationError> {
    let &[account, credential] = params else {
        return Err(ValidationError::Malformed);
    };
    if account.is_empty() {
        return Err(ValidationError::Malformed);
    }
    let credential = credential
        .parse::<Credential>()
        .map_err(|_| ValidationError::Malformed)?;
    Ok((account, credential))
}

/// Validates the credential a client presents to one game world.
#[derive(Debug, Clone)]
pub struct CredentialValidator {
    authority: CredentialAuthority,
    world_id: u32,
}

impl CredentialValidator {
    /// A validator for the world this game server runs.
    pub fn new(authority: CredentialAuthority, world_id: u32) -> Self {
        Self {
            authority,
            world_id,
        }
    }

    pub fn world_id(&self) -> u32 {
        self.world_id
    }

    /// Runs the three checks in order and returns the validated account.
    ///
    /// 1. format (no store access) → [`ValidationError::Malformed`]
    /// 2. account exists → [`ValidationError::UnknownAccount`]
    /// 3. credential matches → [`ValidationError::CredentialMismatch`]
    pub fn validate<S: AccountStore + ?Sized>(
        &self,
        store: &S,
        params: &[&str],
    ) -> Result<Account, ValidationError> {
        let (name, credential) = parse_credential_request(params)?;

        let account = store
            .find_account(name)?
            .ok_or_else(|| ValidationError::UnknownAccount(name.to_string()))?;

        if !self.authority.verify(&account, self.world_id, credential) {
            return Err(ValidationError::CredentialMismatch(account.name));
        }
        Ok(account)
    }
}
