mod authn_middleware;
pub(crate) mod health;
mod proxy;

use crate::api::authn_middleware::authentication_middleware;
use crate::api::proxy::forward_to_upstream;
use crate::state::AppState;
use axum::{middleware, routing::any, Router};

/// Combines all API routes into a single router
pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(protected_routes(state))
}

/// Creates a router for protected routes that require a bearer access token
fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Every non-health path is proxied to the upstream
        .fallback(any(forward_to_upstream))
        // we must use layer here and not route_layer because, route_layer only
        // affects routes that are defined on the router which doesn't affect fallback
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ))
}
