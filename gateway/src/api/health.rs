use crate::state::AppState;
use axum::{routing::get, Json, Router};
use serde_json::json;

/// Health endpoints are reachable without a token.
pub(super) fn router() -> Router<AppState> {
    Router::new().route("/healthz", get(health_check))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
