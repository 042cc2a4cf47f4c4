//! The token (grant) endpoint.

use crate::api::models::{ErrorBody, TokenRequestForm, TokenResponse};
use crate::errors::OAuthErrorResponse;
use crate::issuer::GrantRequest;
use crate::openapi::OAUTH_TAG;
use crate::state::AppState;
use crate::stores::GrantType;
use axum::extract::{Form, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::{CACHE_CONTROL, PRAGMA};
use http::{HeaderMap, StatusCode};
use log::debug;

/// OAuth2 token endpoint: password and refresh_token grants.
#[utoipa::path(
    post,
    path = "/oauth/token",
    tag = OAUTH_TAG,
    request_body(content = TokenRequestForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token pair issued", body = TokenResponse),
        (status = 400, description = "Malformed or refused grant request", body = ErrorBody),
        (status = 401, description = "Client authentication failed", body = ErrorBody),
        (status = 503, description = "Credential or client store unavailable", body = ErrorBody)
    )
)]
pub(super) async fn token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<TokenRequestForm>,
) -> Response {
    let (client_id, client_secret) = match client_credentials(&headers, &form) {
        Ok(creds) => creds,
        Err(err) => return err.into_response(),
    };

    let grant_type = match form.grant_type.as_deref().and_then(GrantType::parse) {
        Some(grant_type) => grant_type,
        None => {
            debug!("unsupported grant_type: {:?}", form.grant_type);
            return OAuthErrorResponse::unsupported_grant_type().into_response();
        }
    };

    let request = GrantRequest {
        grant_type,
        client_id,
        client_secret,
        username: form.username,
        password: form.password,
        refresh_token: form.refresh_token,
        scopes: form
            .scope
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect(),
    };

    match state.issuer.issue(&request).await {
        Ok(pair) => {
            let body = TokenResponse {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
                token_type: "bearer".to_string(),
                expires_in: pair.expires_in,
                scope: pair.scope,
            };
            // Token responses must never be cached (RFC 6749 Section 5.1).
            (
                StatusCode::OK,
                [(CACHE_CONTROL, "no-store"), (PRAGMA, "no-cache")],
                Json(body),
            )
                .into_response()
        }
        Err(err) => OAuthErrorResponse::from(err).into_response(),
    }
}

/// Resolve client credentials from the Basic authorization header or the
/// form body. The header takes precedence; a client id appearing in both
/// places with different values is a malformed request (RFC 6749
/// Section 2.3.1).
fn client_credentials(
    headers: &HeaderMap,
    form: &TokenRequestForm,
) -> Result<(String, String), OAuthErrorResponse> {
    if let Some((id, secret)) = basic_credentials(headers)? {
        if let Some(body_id) = &form.client_id {
            if body_id != &id {
                return Err(OAuthErrorResponse::invalid_request(
                    "client_id mismatch between Authorization header and body",
                ));
            }
        }
        return Ok((id, secret));
    }
    match (&form.client_id, &form.client_secret) {
        (Some(id), Some(secret)) => Ok((id.clone(), secret.clone())),
        _ => Err(OAuthErrorResponse::invalid_client()),
    }
}

fn basic_credentials(
    headers: &HeaderMap,
) -> Result<Option<(String, String)>, OAuthErrorResponse> {
    let header = match headers.get(http::header::AUTHORIZATION) {
        Some(header) => header,
        None => return Ok(None),
    };
    let value = header
        .to_str()
        .map_err(|_| OAuthErrorResponse::invalid_request("unreadable Authorization header"))?;
    if !value.to_lowercase().starts_with("basic ") {
        // Other schemes are not client authentication for this endpoint.
        return Ok(None);
    }
    let decoded = STANDARD
        .decode(value[6..].trim())
        .map_err(|_| OAuthErrorResponse::invalid_request("malformed Basic credentials"))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| OAuthErrorResponse::invalid_request("malformed Basic credentials"))?;
    let (id, secret) = decoded
        .split_once(':')
        .ok_or_else(|| OAuthErrorResponse::invalid_request("malformed Basic credentials"))?;
    Ok(Some((id.to_string(), secret.to_string())))
}
