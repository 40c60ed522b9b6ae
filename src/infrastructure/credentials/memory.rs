#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use anyhow::anyhow;
use anyhow::Result;

use crate::domain::models::Credential;
use crate::domain::models::CredentialStore;
use crate::domain::models::CredentialStoreName;

/// Process local store. Nothing outlives the process. Clones share the same
/// slot.
#[derive(Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<Credential>>>,
}

impl MemoryStore {
    #[cfg(test)]
    pub fn with_credential(value: &str) -> MemoryStore {
        return MemoryStore {
            slot: Arc::new(Mutex::new(Some(Credential::new(value)))),
        };
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Credential>>> {
        return self
            .slot
            .lock()
            .map_err(|_| return anyhow!("Memory credential store is poisoned"));
    }
}

impl CredentialStore for MemoryStore {
    fn name(&self) -> CredentialStoreName {
        return CredentialStoreName::Memory;
    }

    fn get(&self) -> Result<Option<Credential>> {
        let slot = self.lock()?;
        return Ok(slot.clone().filter(|credential| return !credential.is_blank()));
    }

    fn set(&self, credential: &Credential) -> Result<()> {
        *self.lock()? = Some(credential.clone());
        return Ok(());
    }

    fn clear(&self) -> Result<()> {
        *self.lock()? = None;
        return Ok(());
    }
}
