pub mod health;
pub mod helpers;
pub mod home;
pub mod login;
pub mod messages;
pub mod products;

use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::auth::middleware::session_layer;
use crate::fault;
use crate::store::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(home::router())
        .merge(products::router())
        .merge(messages::router())
        .merge(login::router())
}

/// The full application: pages behind the session layer, the health probe
/// outside it, and the failure boundary around everything.
pub fn app(state: AppState) -> Router {
    router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_layer,
        ))
        .merge(health::router())
        .with_state(state)
        .layer(CatchPanicLayer::custom(fault::panic_response))
        .layer(axum::middleware::from_fn(fault::report_failures))
        .layer(TraceLayer::new_for_http())
}
