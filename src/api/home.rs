use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use minijinja::context;

use crate::auth::middleware::CurrentSession;
use crate::error::ApiError;
use crate::secrets::{CONNECTION_STRING_SECRET, VaultError};
use crate::store::AppState;

/// Shown instead of the underlying vault error outside development.
pub const SECRET_FAILURE: &str = "Failed to retrieve secret";

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(home))
}

/// Fetches the secret on every render. Vault failures never fail the page.
#[tracing::instrument(skip_all)]
async fn home(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Html<String>, ApiError> {
    let result = match &state.vault {
        Some(vault) => vault.fetch_secret(CONNECTION_STRING_SECRET).await,
        None => Err(VaultError::NotInitialized),
    };

    let (secret, error) = match result {
        Ok(value) => (Some(value), None),
        Err(e) => {
            tracing::warn!(error = %e, "failed to retrieve secret");
            let message = if state.config.show_error_detail() {
                e.to_string()
            } else {
                SECRET_FAILURE.to_owned()
            };
            (None, Some(message))
        }
    };

    state.views.render(
        "index.html",
        context! {
            secret,
            environment => state.config.environment(),
            error,
            logged_in => current.logged_in(),
        },
    )
}
