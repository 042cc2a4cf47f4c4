//! Forwards authenticated requests to the protected upstream.

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{Method, Request, Response, StatusCode},
    response::IntoResponse,
};
use http::header::HeaderName;
use log::{debug, error};
use reqwest::header::HeaderValue;
use token_core::AuthContext;

use crate::state::AppState;

/// Request headers that must not be forwarded. The bearer token stays at the
/// edge; hop-by-hop headers are connection-scoped per RFC 7230.
const STRIPPED_REQUEST_HEADERS: &[&str] = &[
    "authorization",
    "host",
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

const STRIPPED_RESPONSE_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "transfer-encoding",
    "trailer",
    "upgrade",
];

/// Forward an authenticated request to the upstream service.
///
/// The verified identity travels as `X-Auth-*` headers; inbound copies of
/// those headers are dropped first so the upstream can trust them.
pub(super) async fn forward_to_upstream(
    State(state): State<AppState>,
    req: Request<Body>,
) -> impl IntoResponse {
    let context = match req.extensions().get::<AuthContext>().cloned() {
        Some(context) => context,
        // The authentication layer always runs before this handler.
        None => {
            error!("proxy handler reached without an authenticated context");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let path = match req.uri().path_and_query() {
        Some(path) => path.to_string(),
        None => "".to_string(),
    };

    // Convert method to reqwest method
    let method = match *req.method() {
        Method::GET => reqwest::Method::GET,
        Method::POST => reqwest::Method::POST,
        Method::PUT => reqwest::Method::PUT,
        Method::DELETE => reqwest::Method::DELETE,
        Method::PATCH => reqwest::Method::PATCH,
        Method::HEAD => reqwest::Method::HEAD,
        Method::OPTIONS => reqwest::Method::OPTIONS,
        _ => {
            error!("Unsupported HTTP method: {}", req.method());
            return (
                StatusCode::METHOD_NOT_ALLOWED,
                format!("Unsupported HTTP method: {}", req.method()),
            )
                .into_response();
        }
    };

    let url = state.config.upstream.get_url(path);
    debug!("Forwarding request to upstream: {} {}", req.method(), url);
    let mut req_builder = state.upstream_client.request(method, &url);

    for (key, value) in req.headers() {
        if STRIPPED_REQUEST_HEADERS.contains(&key.as_str())
            || key.as_str().starts_with("x-auth-")
        {
            continue;
        }
        if let Ok(header_value) = HeaderValue::from_bytes(value.as_bytes()) {
            req_builder = req_builder.header(key.as_str(), header_value);
        }
    }
    req_builder = attach_identity_headers(req_builder, &context);

    let body_bytes = match to_bytes(req.into_body(), usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return (StatusCode::BAD_GATEWAY, "Failed to read request body").into_response(),
    };
    if !body_bytes.is_empty() {
        req_builder = req_builder.body(body_bytes);
    }

    match req_builder.send().await {
        Ok(response) => {
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = match response.bytes().await {
                Ok(bytes) => bytes,
                Err(e) => {
                    error!("Failed to read response body: {e}");
                    return (StatusCode::BAD_GATEWAY, "Failed to read response body")
                        .into_response();
                }
            };

            let mut resp = Response::new(Body::from(bytes));
            *resp.status_mut() = status;
            for (key, value) in headers {
                if let Some(key) = key {
                    if STRIPPED_RESPONSE_HEADERS.contains(&key.as_str()) {
                        continue;
                    }
                    if let Ok(name) = HeaderName::from_bytes(key.as_ref()) {
                        resp.headers_mut().insert(name, value);
                    }
                }
            }
            resp
        }
        Err(e) => {
            error!("Failed to reach upstream at {url}: {e}");
            if e.is_timeout() {
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "Request timed out while contacting the upstream service",
                )
                    .into_response()
            } else {
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to contact the upstream service",
                )
                    .into_response()
            }
        }
    }
}

/// Express the verified identity as headers the upstream can consume
/// without understanding JWTs.
fn attach_identity_headers(
    req_builder: reqwest::RequestBuilder,
    context: &AuthContext,
) -> reqwest::RequestBuilder {
    req_builder
        .header("X-Auth-Subject", &context.subject)
        .header("X-Auth-Client", &context.client_id)
        .header("X-Auth-Scopes", context.scopes.join(" "))
        .header("X-Auth-Roles", context.roles.join(" "))
}
