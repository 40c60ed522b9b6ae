pub mod cookie;
pub mod memory;

use anyhow::Result;

use crate::domain::models::CredentialStoreBox;
use crate::domain::models::CredentialStoreName;

pub struct CredentialStoreManager {}

impl CredentialStoreManager {
    pub fn get(name: CredentialStoreName) -> Result<CredentialStoreBox> {
        match name {
            CredentialStoreName::Cookie => return Ok(Box::new(cookie::CookieJar::from_config()?)),
            CredentialStoreName::Memory => return Ok(Box::<memory::MemoryStore>::default()),
        }
    }
}
