#[cfg(test)]
#[path = "credential_test.rs"]
mod tests;

use std::fmt;

use anyhow::Result;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

/// API key used to authenticate against the chat backend. The value is opaque
/// to the client; only the backend decides whether it is valid.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: &str) -> Credential {
        return Credential(value.to_string());
    }

    pub fn as_str(&self) -> &str {
        return &self.0;
    }

    pub fn is_blank(&self) -> bool {
        return self.0.trim().is_empty();
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str("Credential(***)");
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum CredentialStoreName {
    Cookie,
    Memory,
}

impl CredentialStoreName {
    pub fn parse(text: String) -> Option<CredentialStoreName> {
        return CredentialStoreName::iter().find(|e| return e.to_string() == text);
    }
}

/// Persists at most one credential per client context.
pub trait CredentialStore {
    fn name(&self) -> CredentialStoreName;

    /// Returns the stored credential, or `None` when it is missing, blank or
    /// expired.
    fn get(&self) -> Result<Option<Credential>>;

    /// Stores the credential, overwriting any previous one.
    fn set(&self, credential: &Credential) -> Result<()>;

    /// Expires the stored credential immediately.
    fn clear(&self) -> Result<()>;
}

pub type CredentialStoreBox = Box<dyn CredentialStore + Send + Sync>;
