//! Last-resort failure reporting.
//!
//! [`report_failures`] logs every request that ends in a 5xx, [`panic_response`]
//! turns a handler panic into the generic 500, and [`install_panic_hook`] routes
//! panics from anywhere in the process (spawned tasks included) into the log.
//! A panicking task is still lost. Restarting a wedged process is left to
//! whatever supervises it.

use std::any::Any;

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::helpers::is_json;
use crate::error::GENERIC_FAILURE;

/// Largest request body buffered for failure logging.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const REDACTED_FIELDS: &[&str] = &["password"];

pub async fn report_failures(req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                method = %parts.method,
                path = parts.uri.path(),
                error = %e,
                "failed to read request body"
            );
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let kind = BodyKind::of(&parts.headers);
    let method = parts.method.clone();
    let uri = parts.uri.clone();

    let resp = next
        .run(Request::from_parts(parts, Body::from(bytes.clone())))
        .await;

    if resp.status().is_server_error() {
        tracing::error!(
            %method,
            path = uri.path(),
            query = uri.query().unwrap_or_default(),
            body = %loggable_body(&bytes, kind),
            status = resp.status().as_u16(),
            "request failed"
        );
    }
    resp
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Form,
    Json,
    Other,
}

impl BodyKind {
    fn of(headers: &HeaderMap) -> Self {
        if is_json(headers) {
            return Self::Json;
        }
        let is_form = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));
        if is_form { Self::Form } else { Self::Other }
    }
}

/// Request body as text, with secret fields masked in form and JSON bodies.
fn loggable_body(bytes: &Bytes, kind: BodyKind) -> String {
    match kind {
        BodyKind::Form => masked_form(bytes),
        BodyKind::Json => masked_json(bytes),
        BodyKind::Other => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn masked_json(bytes: &Bytes) -> String {
    let Ok(mut value) = serde_json::from_slice::<serde_json::Value>(bytes) else {
        return String::from_utf8_lossy(bytes).into_owned();
    };
    if let Some(fields) = value.as_object_mut() {
        for (key, field) in fields.iter_mut() {
            if REDACTED_FIELDS.contains(&key.as_str()) {
                *field = serde_json::Value::from("[redacted]");
            }
        }
    }
    value.to_string()
}

fn masked_form(bytes: &Bytes) -> String {
    let mut out = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in url::form_urlencoded::parse(bytes) {
        if REDACTED_FIELDS.contains(&key.as_ref()) {
            out.append_pair(&key, "[redacted]");
        } else {
            out.append_pair(&key, &value);
        }
    }
    out.finish()
}

pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

/// Response for a handler that panicked. Used with `CatchPanicLayer::custom`.
#[allow(clippy::needless_pass_by_value)]
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!(panic = %panic_message(&*err), "handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE).into_response()
}

/// Log panics through `tracing` instead of stderr. The process keeps running.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        tracing::error!(
            panic = %panic_message(info.payload()),
            location = location.as_deref().unwrap_or("unknown"),
            "unhandled panic"
        );
    }));
}
