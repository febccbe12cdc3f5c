use axum::extract::State;
use axum::response::{Html, Response};
use axum::routing::{get, post};
use axum::Router;
use minijinja::context;

use crate::api::helpers::{JsonOrForm, found};
use crate::auth::middleware::CurrentSession;
use crate::error::ApiError;
use crate::store::AppState;
use crate::store::catalog::Message;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/form", get(list_messages))
        .route("/form-submit", post(submit_message))
}

async fn list_messages(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Html<String>, ApiError> {
    let messages = state.catalog.list_messages().await;
    state.views.render(
        "messages.html",
        context! { messages, logged_in => current.logged_in() },
    )
}

/// Appends unconditionally; empty or missing fields are stored as empty strings.
#[tracing::instrument(skip_all)]
async fn submit_message(
    State(state): State<AppState>,
    JsonOrForm(body): JsonOrForm<Message>,
) -> Response {
    state.catalog.add_message(body).await;
    tracing::info!("message submitted");
    found("/form")
}
