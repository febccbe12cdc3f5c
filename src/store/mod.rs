pub mod catalog;

use std::sync::Arc;

use crate::auth::credentials::{CredentialVerifier, StaticCredential};
use crate::auth::session::{MemorySessionStore, SessionStore};
use crate::config::Config;
use crate::secrets::{self, SecretSource};
use crate::store::catalog::{CatalogStore, MemoryCatalog};
use crate::views::Views;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub credentials: Arc<dyn CredentialVerifier>,
    /// `None` when the vault is not configured.
    pub vault: Option<Arc<dyn SecretSource>>,
    pub views: Arc<Views>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Production wiring: seeded in-memory catalog, in-memory sessions, the
    /// configured account, and the Key Vault gateway if one is configured.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let views = Views::new()?;
        Ok(Self {
            catalog: Arc::new(MemoryCatalog::seeded()),
            sessions: Arc::new(MemorySessionStore::new()),
            credentials: Arc::new(StaticCredential::new(
                config.admin_user.clone(),
                config.admin_password.clone(),
            )),
            vault: secrets::init(&config),
            views: Arc::new(views),
            config: Arc::new(config),
        })
    }

    pub fn vault_connected(&self) -> bool {
        self.vault.is_some()
    }
}
