use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use minijinja::context;
use serde::Deserialize;

use crate::api::helpers::{JsonOrForm, found};
use crate::auth::middleware::{CurrentSession, clear_session_cookie};
use crate::auth::session::Session;
use crate::error::ApiError;
use crate::store::AppState;

pub const INVALID_CREDENTIALS: &str = "Invalid username or password";
pub const MISSING_CREDENTIALS: &str = "Username and password are required";
pub const LOGOUT_FAILED: &str = "Logout failed";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
}

async fn login_form(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    state.views.render(
        "login.html",
        context! { error => (), logged_in => false },
    )
}

#[tracing::instrument(skip_all, fields(username = body.username.as_deref().unwrap_or_default()))]
async fn login(
    State(state): State<AppState>,
    current: CurrentSession,
    JsonOrForm(body): JsonOrForm<LoginForm>,
) -> Result<Response, ApiError> {
    let (Some(username), Some(password)) = (body.username, body.password) else {
        return Err(ApiError::BadRequest(MISSING_CREDENTIALS.into()));
    };

    if !state.credentials.verify(&username, &password) {
        tracing::info!("login rejected");
        let page = state.views.render(
            "login.html",
            context! { error => INVALID_CREDENTIALS, logged_in => false },
        )?;
        return Ok(page.into_response());
    }

    state
        .sessions
        .save(
            &current.token,
            &Session {
                logged_in: true,
                ..current.session
            },
        )
        .await?;
    tracing::info!("login succeeded");
    Ok(found("/"))
}

/// Destroys the session. A store failure is reported as plain text, not a 500.
#[tracing::instrument(skip_all)]
async fn logout(State(state): State<AppState>, current: CurrentSession) -> Response {
    if let Err(e) = state.sessions.destroy(&current.token).await {
        tracing::error!(error = %e, "failed to destroy session");
        return LOGOUT_FAILED.into_response();
    }
    let mut resp = found("/");
    if let Ok(cookie) = clear_session_cookie().parse() {
        resp.headers_mut().insert(SET_COOKIE, cookie);
    }
    resp
}
