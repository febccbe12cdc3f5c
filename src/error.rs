use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Body of every 500 response. Internal detail never reaches the client.
pub const GENERIC_FAILURE: &str = "Something went wrong";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("render failed: {0}")]
    Render(#[from] minijinja::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            Self::Render(err) => {
                tracing::error!(error = %err, "template render failed");
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE).into_response()
            }
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE).into_response()
            }
        }
    }
}
