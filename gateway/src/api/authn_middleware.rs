//! Bearer-token authentication for every proxied route.

use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use http::{HeaderValue, StatusCode};
use log::debug;

/// Validates the `Authorization: Bearer` header and stashes the resulting
/// `AuthContext` in request extensions for the proxy handler. Rejections
/// carry an RFC 6750 challenge and never reach the upstream.
pub(super) async fn authentication_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let token = match bearer {
        Some(token) => token,
        None => {
            debug!("request to {} without a bearer token", req.uri().path());
            return challenge(None);
        }
    };

    match state.verifier.authenticate(token) {
        Ok(context) => {
            req.extensions_mut().insert(context);
            next.run(req).await
        }
        Err(e) => {
            debug!("rejected token for {}: {e}", req.uri().path());
            challenge(Some("invalid_token"))
        }
    }
}

/// 401 with a `WWW-Authenticate: Bearer` challenge. The error code is only
/// attached when a token was actually presented.
fn challenge(error: Option<&str>) -> Response {
    let value = match error {
        Some(code) => format!("Bearer error=\"{code}\""),
        None => "Bearer".to_string(),
    };
    let mut response = (StatusCode::UNAUTHORIZED, Body::empty()).into_response();
    if let Ok(value) = HeaderValue::from_str(&value) {
        response.headers_mut().insert(WWW_AUTHENTICATE, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use crate::test_utils::TestFixture;
    use axum::body::Body;
    use http::{Request, StatusCode};
    use token_core::TokenKind;

    #[tokio::test]
    async fn missing_token_is_challenged_without_an_error_code() {
        let fixture = TestFixture::new().await;
        let response = fixture.get("/echo", None).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.header("www-authenticate").as_deref(), Some("Bearer"));
    }

    #[tokio::test]
    async fn malformed_token_is_rejected_as_invalid() {
        let fixture = TestFixture::new().await;
        let response = fixture.get("/echo", Some("not-a-jwt")).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.header("www-authenticate").as_deref(),
            Some("Bearer error=\"invalid_token\"")
        );
    }

    #[tokio::test]
    async fn non_bearer_authorization_is_treated_as_missing() {
        let fixture = TestFixture::new().await;
        let request = Request::builder()
            .uri("/echo")
            .header("Authorization", "Basic dTE6cGFzc3dvcmQ=")
            .body(Body::empty())
            .unwrap();
        let response = fixture.send(request).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.header("www-authenticate").as_deref(), Some("Bearer"));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let fixture = TestFixture::new().await;
        let token = fixture.mint_expired_access_token();
        let response = fixture.get("/echo", Some(&token)).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.header("www-authenticate").as_deref(),
            Some("Bearer error=\"invalid_token\"")
        );
    }

    #[tokio::test]
    async fn refresh_token_cannot_open_the_gateway() {
        let fixture = TestFixture::new().await;
        let token = fixture.mint_token(TokenKind::Refresh, 3600);
        let response = fixture.get("/echo", Some(&token)).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_check_needs_no_token() {
        let fixture = TestFixture::new().await;
        let response = fixture.get("/healthz", None).await;
        response.assert_status(StatusCode::OK);
    }
}
