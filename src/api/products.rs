use axum::extract::{Path, State};
use axum::response::{Html, Response};
use axum::routing::get;
use axum::Router;
use minijinja::context;

use crate::api::helpers::{JsonOrForm, found};
use crate::auth::middleware::{CurrentSession, LoginRequired};
use crate::error::ApiError;
use crate::store::AppState;
use crate::store::catalog::NewProduct;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/browse", get(browse))
        .route("/details/{id}", get(details))
        // Login-gated: anonymous callers are redirected by the extractor
        .route("/add-product", get(add_product_form).post(add_product))
}

async fn browse(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Html<String>, ApiError> {
    let products = state.catalog.list_products().await;
    state.views.render(
        "browse.html",
        context! { products, logged_in => current.logged_in() },
    )
}

/// The id arrives as a raw path segment. Whole-number spellings such as `1.0`
/// resolve to the same product; anything else unknown is a 404.
#[tracing::instrument(skip(state, current))]
async fn details(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let product = match parse_product_id(&id) {
        Some(id) => state.catalog.find_product(id).await,
        None => None,
    }
    .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    state.views.render(
        "product.html",
        context! { product, logged_in => current.logged_in() },
    )
}

async fn add_product_form(
    State(state): State<AppState>,
    _auth: LoginRequired,
) -> Result<Html<String>, ApiError> {
    state
        .views
        .render("add_product.html", context! { logged_in => true })
}

#[tracing::instrument(skip(state, _auth, body), fields(name = %body.name))]
async fn add_product(
    State(state): State<AppState>,
    _auth: LoginRequired,
    JsonOrForm(body): JsonOrForm<NewProduct>,
) -> Response {
    let product = state.catalog.add_product(body).await;
    tracing::info!(id = product.id, "product added");
    found("/browse")
}

/// Largest integer an `f64` represents exactly.
const MAX_EXACT_ID: f64 = 9_007_199_254_740_991.0;

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]
fn parse_product_id(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<u64>() {
        return Some(id);
    }
    let n = raw.parse::<f64>().ok()?;
    (n.is_finite() && n >= 0.0 && n <= MAX_EXACT_ID && n.trunc() == n).then_some(n as u64)
}
