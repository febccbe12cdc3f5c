use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;

use super::{SecretSource, VaultError};
use crate::config::Config;

const API_VERSION: &str = "7.4";
const VAULT_SCOPE: &str = "https://vault.azure.net/.default";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Refresh access tokens this long before they actually expire.
const TOKEN_EXPIRY_SKEW: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// How the client obtains a bearer token for the vault.
pub enum VaultCredential {
    /// OAuth2 client-credentials grant against the tenant's token endpoint.
    ClientSecret {
        token_url: Url,
        client_id: String,
        client_secret: String,
        cached: Mutex<Option<CachedToken>>,
    },
    /// A pre-issued bearer token.
    Static(String),
    /// No credential configured. Every fetch fails.
    Missing,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl VaultCredential {
    pub fn client_secret(
        authority_host: &str,
        tenant_id: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, VaultError> {
        let token_url = format!(
            "{}/{tenant_id}/oauth2/v2.0/token",
            authority_host.trim_end_matches('/')
        );
        let token_url = Url::parse(&token_url).map_err(|e| VaultError::InvalidUrl(e.to_string()))?;
        Ok(Self::ClientSecret {
            token_url,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            cached: Mutex::new(None),
        })
    }

    /// Environment credential first, then a static token.
    pub fn from_config(config: &Config) -> Result<Self, VaultError> {
        if let (Some(tenant), Some(client_id), Some(secret)) = (
            config.azure_tenant_id.as_deref(),
            config.azure_client_id.as_deref(),
            config.azure_client_secret.as_deref(),
        ) {
            return Self::client_secret(&config.azure_authority_host, tenant, client_id, secret);
        }
        Ok(config
            .azure_access_token
            .clone()
            .map_or(Self::Missing, Self::Static))
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::ClientSecret { .. } => "client_secret",
            Self::Static(_) => "static",
            Self::Missing => "missing",
        }
    }

    async fn bearer(&self, http: &reqwest::Client) -> Result<String, VaultError> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::Missing => Err(VaultError::Credential(
                "no Azure credential configured (set AZURE_TENANT_ID/AZURE_CLIENT_ID/AZURE_CLIENT_SECRET or AZURE_ACCESS_TOKEN)".into(),
            )),
            Self::ClientSecret {
                token_url,
                client_id,
                client_secret,
                cached,
            } => {
                let mut cached = cached.lock().await;
                if let Some(token) = cached.as_ref()
                    && Instant::now() < token.refresh_at
                {
                    return Ok(token.value.clone());
                }

                let resp = http
                    .post(token_url.clone())
                    .form(&[
                        ("grant_type", "client_credentials"),
                        ("client_id", client_id.as_str()),
                        ("client_secret", client_secret.as_str()),
                        ("scope", VAULT_SCOPE),
                    ])
                    .send()
                    .await?;

                let status = resp.status();
                if !status.is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(VaultError::Credential(format!(
                        "token endpoint returned {}: {}",
                        status.as_u16(),
                        error_message(&body)
                    )));
                }

                let token: TokenResponse = resp
                    .json()
                    .await
                    .map_err(|e| VaultError::Credential(format!("invalid token response: {e}")))?;
                let lifetime = Duration::from_secs(token.expires_in.unwrap_or(300));
                *cached = Some(CachedToken {
                    value: token.access_token.clone(),
                    refresh_at: Instant::now() + lifetime.saturating_sub(TOKEN_EXPIRY_SKEW),
                });
                tracing::debug!("acquired vault access token");
                Ok(token.access_token)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Azure Key Vault REST client for reading secrets.
pub struct KeyVaultClient {
    http: reqwest::Client,
    vault_url: Url,
    credential: VaultCredential,
}

#[derive(Deserialize)]
struct SecretBundle {
    value: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

/// Pull the human-readable message out of an Azure error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body).map_or_else(
        |_| body.trim().to_owned(),
        |env| match env.error.code {
            Some(code) => format!("{code}: {}", env.error.message),
            None => env.error.message,
        },
    )
}

/// `https://{name}.vault.azure.net`
pub fn vault_url_for(name: &str) -> Result<Url, VaultError> {
    Url::parse(&format!("https://{name}.vault.azure.net"))
        .map_err(|e| VaultError::InvalidUrl(e.to_string()))
}

impl KeyVaultClient {
    pub fn new(vault_url: Url, credential: VaultCredential) -> Result<Self, VaultError> {
        if vault_url.cannot_be_a_base() {
            return Err(VaultError::InvalidUrl(vault_url.to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            vault_url,
            credential,
        })
    }

    /// `KEY_VAULT_URL` wins over the URL derived from `KEY_VAULT_NAME`.
    pub fn from_config(config: &Config) -> Result<Self, VaultError> {
        let vault_url = match (&config.key_vault_url, &config.key_vault_name) {
            (Some(url), _) => Url::parse(url).map_err(|e| VaultError::InvalidUrl(e.to_string()))?,
            (None, Some(name)) => vault_url_for(name)?,
            (None, None) => {
                return Err(VaultError::NotConfigured(
                    "KEY_VAULT_NAME environment variable not set".into(),
                ));
            }
        };
        let credential = VaultCredential::from_config(config)?;
        tracing::debug!(credential = credential.kind(), "selected vault credential");
        Self::new(vault_url, credential)
    }

    pub fn vault_url(&self) -> &Url {
        &self.vault_url
    }

    fn secret_url(&self, name: &str) -> Result<Url, VaultError> {
        let mut url = self.vault_url.clone();
        url.path_segments_mut()
            .map_err(|()| VaultError::InvalidUrl(self.vault_url.to_string()))?
            .pop_if_empty()
            .push("secrets")
            .push(name);
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }
}

#[async_trait]
impl SecretSource for KeyVaultClient {
    #[tracing::instrument(skip(self), err)]
    async fn fetch_secret(&self, name: &str) -> Result<String, VaultError> {
        let url = self.secret_url(name)?;
        let token = self.credential.bearer(&self.http).await?;

        let resp = self.http.get(url).bearer_auth(token).send().await?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(VaultError::SecretNotFound(name.to_owned()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(VaultError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let bundle: SecretBundle = resp
            .json()
            .await
            .map_err(|e| VaultError::MalformedResponse(e.to_string()))?;
        bundle
            .value
            .ok_or_else(|| VaultError::MalformedResponse("secret bundle has no value".into()))
    }
}
