use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

use crate::api::helpers::found;
use crate::auth::session::{DEFAULT_SESSION_TTL_SECS, Session};
use crate::error::ApiError;
use crate::store::AppState;

pub const SESSION_COOKIE: &str = "sid";

/// The caller's session, resolved by [`session_layer`].
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub token: String,
    pub session: Session,
}

impl CurrentSession {
    pub fn logged_in(&self) -> bool {
        self.session.logged_in
    }
}

/// Resolve the session cookie, issuing a new anonymous session when the caller
/// has none (or an expired one). The resolved session is stored in request
/// extensions for the [`CurrentSession`] and [`LoginRequired`] extractors.
pub async fn session_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let existing = match extract_session_cookie(req.headers()) {
        Some(token) => state
            .sessions
            .load(&token)
            .await?
            .map(|session| CurrentSession { token, session }),
        None => None,
    };

    let (current, issued) = match existing {
        Some(current) => (current, false),
        None => {
            let (token, session) = state.sessions.create().await?;
            tracing::debug!("issued new session");
            (CurrentSession { token, session }, true)
        }
    };

    let cookie = issued.then(|| session_cookie(&current.token, state.config.secure_cookies));
    req.extensions_mut().insert(current);

    let mut resp = next.run(req).await;

    // A handler that already set the cookie (logout) wins.
    if let Some(cookie) = cookie
        && !resp.headers().contains_key(SET_COOKIE)
        && let Ok(value) = HeaderValue::from_str(&cookie)
    {
        resp.headers_mut().append(SET_COOKIE, value);
    }
    Ok(resp)
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("session layer not installed")))
    }
}

/// Guard for routes that need an authenticated session.
///
/// Anonymous callers are sent to `/login` with a 302, not a 401/403.
#[derive(Debug, Clone)]
pub struct LoginRequired(pub CurrentSession);

impl<S: Send + Sync> FromRequestParts<S> for LoginRequired {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let current = CurrentSession::from_request_parts(parts, state)
            .await
            .map_err(axum::response::IntoResponse::into_response)?;
        if current.logged_in() {
            Ok(Self(current))
        } else {
            tracing::debug!(path = parts.uri.path(), "login required, redirecting");
            Err(found("/login"))
        }
    }
}

pub fn session_cookie(token: &str, secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={DEFAULT_SESSION_TTL_SECS}{secure_flag}"
    )
}

pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

fn extract_session_cookie(headers: &HeaderMap) -> Option<String> {
    let prefix = format!("{SESSION_COOKIE}=");
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .map(str::trim)
        .find_map(|cookie| {
            cookie
                .strip_prefix(prefix.as_str())
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
        })
}
