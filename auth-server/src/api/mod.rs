pub(crate) mod authorize;
pub(crate) mod login;
pub(crate) mod models;
pub(crate) mod token;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

/// Combines all routes into a single router.
pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(health))
        .route("/", get(login::index))
        .route("/login", get(login::login_form).post(login::login_submit))
        .route("/oauth/token", post(token::token))
        .route("/oauth/authorize", get(authorize::authorize))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
