use std::env;

/// Name of the environment marker that gates detailed error text and `.env` loading.
pub const ENV_MARKER: &str = "APP_ENV";

#[derive(Debug, Clone)]
pub struct Config {
    pub listen: String,
    /// Raw environment marker. `None` when unset.
    pub app_env: Option<String>,
    pub key_vault_name: Option<String>,
    pub key_vault_url: Option<String>,
    pub azure_tenant_id: Option<String>,
    pub azure_client_id: Option<String>,
    pub azure_client_secret: Option<String>,
    pub azure_authority_host: String,
    pub azure_access_token: Option<String>,
    pub admin_user: String,
    pub admin_password: String,
    pub secure_cookies: bool,
}

/// Load `.env` unless the process is explicitly marked as production.
///
/// Must run before [`Config::load`] so the file's values are visible to it.
pub fn load_dotenv() {
    if env::var(ENV_MARKER).ok().as_deref() == Some("production") {
        return;
    }
    match dotenvy::dotenv() {
        Ok(path) => tracing::info!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "failed to load .env"),
    }
}

fn default_listen(port: Option<&str>) -> String {
    let port = port.and_then(|p| p.parse::<u16>().ok()).unwrap_or(3000);
    format!("0.0.0.0:{port}")
}

/// Configured admin account, falling back to `admin` / `password123`.
fn admin_account(user: Option<String>, password: Option<String>) -> (String, String) {
    (
        user.unwrap_or_else(|| "admin".into()),
        password.unwrap_or_else(|| "password123".into()),
    )
}

impl Config {
    pub fn load() -> Self {
        let (admin_user, admin_password) = admin_account(
            env::var("STOREFRONT_ADMIN_USER").ok(),
            env::var("STOREFRONT_ADMIN_PASSWORD").ok(),
        );
        Self {
            listen: env::var("STOREFRONT_LISTEN")
                .unwrap_or_else(|_| default_listen(env::var("PORT").ok().as_deref())),
            app_env: env::var(ENV_MARKER).ok(),
            key_vault_name: env::var("KEY_VAULT_NAME").ok().filter(|v| !v.is_empty()),
            key_vault_url: env::var("KEY_VAULT_URL").ok().filter(|v| !v.is_empty()),
            azure_tenant_id: env::var("AZURE_TENANT_ID").ok(),
            azure_client_id: env::var("AZURE_CLIENT_ID").ok(),
            azure_client_secret: env::var("AZURE_CLIENT_SECRET").ok(),
            azure_authority_host: env::var("AZURE_AUTHORITY_HOST")
                .unwrap_or_else(|_| "https://login.microsoftonline.com".into()),
            azure_access_token: env::var("AZURE_ACCESS_TOKEN").ok(),
            admin_user,
            admin_password,
            secure_cookies: env::var("STOREFRONT_SECURE_COOKIES")
                .ok()
                .is_some_and(|v| v == "true"),
        }
    }

    /// Environment label shown on the home page.
    pub fn environment(&self) -> &str {
        self.app_env.as_deref().unwrap_or("development")
    }

    /// Underlying error text is only exposed when explicitly in development.
    /// An unset marker displays as "development" but still hides details.
    pub fn show_error_detail(&self) -> bool {
        self.app_env.as_deref() == Some("development")
    }
}

#[cfg(test)]
impl Default for Config {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:0".into(),
            app_env: Some("test".into()),
            key_vault_name: None,
            key_vault_url: None,
            azure_tenant_id: None,
            azure_client_id: None,
            azure_client_secret: None,
            azure_authority_host: "https://login.microsoftonline.com".into(),
            azure_access_token: None,
            admin_user: "admin".into(),
            admin_password: "password123".into(),
            secure_cookies: false,
        }
    }
}
