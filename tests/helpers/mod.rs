#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use storefront::auth::credentials::StaticCredential;
use storefront::auth::session::{MemorySessionStore, Session, SessionError, SessionStore};
use storefront::config::Config;
use storefront::secrets::{SecretSource, VaultError};
use storefront::store::AppState;
use storefront::store::catalog::MemoryCatalog;
use storefront::views::Views;

/// Config with test defaults: no vault, non-development error text.
pub fn test_config() -> Config {
    Config {
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

/// Build a test `AppState`.
///
/// - Seeded in-memory catalog (Product A, Product B)
/// - In-memory sessions
/// - The default `admin` / `password123` account
/// - Whatever vault the test supplies (`None` = not configured)
pub fn test_state(config: Config, vault: Option<Arc<dyn SecretSource>>) -> AppState {
    AppState {
        catalog: Arc::new(MemoryCatalog::seeded()),
        sessions: Arc::new(MemorySessionStore::new()),
        credentials: Arc::new(StaticCredential::new(
            config.admin_user.clone(),
            config.admin_password.clone(),
        )),
        vault,
        views: Arc::new(Views::new().expect("templates compile")),
        config: Arc::new(config),
    }
}

/// Build the full application router with the given state.
pub fn test_router(state: AppState) -> Router {
    storefront::api::app(state)
}

/// Application with default state and no vault.
pub fn default_app() -> Router {
    test_router(test_state(test_config(), None))
}

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Vault that always returns the same value and counts fetches.
pub struct FixedVault {
    pub value: String,
    pub calls: AtomicUsize,
}

impl FixedVault {
    pub fn new(value: &str) -> Arc<Self> {
        Arc::new(Self {
            value: value.into(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretSource for FixedVault {
    async fn fetch_secret(&self, _name: &str) -> Result<String, VaultError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.value.clone())
    }
}

/// Vault that always answers 403 with the given message.
pub struct DeniedVault(pub &'static str);

#[async_trait]
impl SecretSource for DeniedVault {
    async fn fetch_secret(&self, _name: &str) -> Result<String, VaultError> {
        Err(VaultError::Status {
            status: 403,
            message: self.0.into(),
        })
    }
}

/// Session store whose `destroy` always fails.
#[derive(Default)]
pub struct StickySessions(pub MemorySessionStore);

#[async_trait]
impl SessionStore for StickySessions {
    async fn create(&self) -> Result<(String, Session), SessionError> {
        self.0.create().await
    }

    async fn load(&self, token: &str) -> Result<Option<Session>, SessionError> {
        self.0.load(token).await
    }

    async fn save(&self, token: &str, session: &Session) -> Result<(), SessionError> {
        self.0.save(token, session).await
    }

    async fn destroy(&self, _token: &str) -> Result<(), SessionError> {
        Err(SessionError::Unavailable("store offline".into()))
    }

    async fn purge_expired(&self) -> usize {
        self.0.purge_expired().await
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub set_cookie: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

impl TestResponse {
    /// The `sid=...` pair from `Set-Cookie`, ready to send back.
    pub fn session_cookie(&self) -> Option<String> {
        let cookie = self.set_cookie.as_deref()?;
        let pair = cookie.split(';').next()?.trim();
        (pair.starts_with("sid=") && pair.len() > "sid=".len()).then(|| pair.to_owned())
    }
}

async fn send(app: &Router, req: Request<Body>) -> TestResponse {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let header_str = |name: header::HeaderName| {
        resp.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    let location = header_str(header::LOCATION);
    let set_cookie = header_str(header::SET_COOKIE);
    let content_type = header_str(header::CONTENT_TYPE);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    TestResponse {
        status,
        location,
        set_cookie,
        content_type,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}

/// Send a GET request, carrying the session cookie when non-empty.
pub async fn get(app: &Router, cookie: &str, path: &str) -> TestResponse {
    let mut builder = Request::builder().method("GET").uri(path);
    if !cookie.is_empty() {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

/// Send a POST with a URL-encoded form body, carrying the session cookie when non-empty.
pub async fn post_form(
    app: &Router,
    cookie: &str,
    path: &str,
    form: &[(&str, &str)],
) -> TestResponse {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(form)
        .finish();
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if !cookie.is_empty() {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(app, builder.body(Body::from(body)).unwrap()).await
}

/// Send a POST with a JSON body, carrying the session cookie when non-empty.
pub async fn post_json(
    app: &Router,
    cookie: &str,
    path: &str,
    body: &serde_json::Value,
) -> TestResponse {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if !cookie.is_empty() {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

/// Send a POST with an arbitrary content type and no cookie.
pub async fn post_raw(
    app: &Router,
    path: &str,
    content_type: &str,
    body: &'static str,
) -> TestResponse {
    let req = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();
    send(app, req).await
}

/// Open an anonymous session. Returns the `sid=...` cookie.
pub async fn new_session(app: &Router) -> String {
    let resp = get(app, "", "/login").await;
    assert_eq!(resp.status, StatusCode::OK);
    resp.session_cookie()
        .expect("first request must issue a session cookie")
}

/// Log in as the default account. Returns the authenticated session cookie.
pub async fn admin_login(app: &Router) -> String {
    let cookie = new_session(app).await;
    let resp = post_form(
        app,
        &cookie,
        "/login",
        &[("username", "admin"), ("password", "password123")],
    )
    .await;
    assert_eq!(
        resp.status,
        StatusCode::FOUND,
        "admin login failed: {}",
        resp.body
    );
    assert_eq!(resp.location.as_deref(), Some("/"));
    cookie
}
