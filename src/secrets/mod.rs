pub mod error;
pub mod vault;

use std::sync::Arc;

use async_trait::async_trait;

pub use error::VaultError;
pub use vault::{KeyVaultClient, VaultCredential};

use crate::config::Config;

/// Logical name of the secret shown on the home page.
pub const CONNECTION_STRING_SECRET: &str = "DB-Connection-String";

/// A remote secret store. Implementations must not cache values.
#[async_trait]
pub trait SecretSource: Send + Sync {
    async fn fetch_secret(&self, name: &str) -> Result<String, VaultError>;
}

/// Build the vault gateway from configuration.
///
/// A missing vault name leaves the gateway uninitialized (`None`); the error is
/// logged and the process keeps running.
pub fn init(config: &Config) -> Option<Arc<dyn SecretSource>> {
    match KeyVaultClient::from_config(config) {
        Ok(client) => {
            tracing::info!(vault_url = %client.vault_url(), "key vault client initialized");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::error!(error = %e, "key vault initialization error");
            None
        }
    }
}
