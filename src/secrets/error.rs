#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("{0}")]
    NotConfigured(String),

    #[error("Key Vault client not initialized")]
    NotInitialized,

    #[error("invalid vault url: {0}")]
    InvalidUrl(String),

    #[error("credential unavailable: {0}")]
    Credential(String),

    #[error("secret not found: {0}")]
    SecretNotFound(String),

    #[error("vault returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed vault response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
