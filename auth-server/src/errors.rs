//! RFC 6749 error bodies and the grant-failure boundary.

use crate::issuer::GrantError;
use axum::response::IntoResponse;
use axum::Json;
use http::header::WWW_AUTHENTICATE;
use http::StatusCode;
use log::{error, warn};
use serde_json::json;

/// A structured OAuth2 error response.
///
/// This is the single point where internal grant failures become externally
/// visible: the mapping deliberately collapses unknown-user, wrong-password
/// and bad-refresh-token into one `invalid_grant` so that responses cannot
/// be used for user enumeration.
#[derive(Debug, Clone)]
pub struct OAuthErrorResponse {
    pub error: &'static str,
    pub description: Option<String>,
    pub status: StatusCode,
}

impl OAuthErrorResponse {
    pub fn new(error: &'static str, status: StatusCode) -> Self {
        Self {
            error,
            description: None,
            status,
        }
    }

    pub fn with_description(mut self, description: impl ToString) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn invalid_request(description: impl ToString) -> Self {
        Self::new("invalid_request", StatusCode::BAD_REQUEST).with_description(description)
    }

    pub fn invalid_client() -> Self {
        Self::new("invalid_client", StatusCode::UNAUTHORIZED)
    }

    pub fn unsupported_grant_type() -> Self {
        Self::new("unsupported_grant_type", StatusCode::BAD_REQUEST)
    }
}

impl IntoResponse for OAuthErrorResponse {
    fn into_response(self) -> axum::response::Response {
        let body = json!({
            "error": self.error,
            "error_description": self.description,
        });
        let mut response = (self.status, Json(body)).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                http::HeaderValue::from_static("Basic realm=\"oauth\""),
            );
        }
        response
    }
}

impl From<GrantError> for OAuthErrorResponse {
    fn from(err: GrantError) -> Self {
        match err {
            GrantError::InvalidClient => OAuthErrorResponse::invalid_client(),
            GrantError::UnauthorizedGrant => {
                OAuthErrorResponse::new("unauthorized_client", StatusCode::BAD_REQUEST)
            }
            // One generic failure for every credential/token problem.
            GrantError::InvalidUser
            | GrantError::InvalidCredentials
            | GrantError::InvalidToken(_) => {
                warn!("grant refused: {err}");
                OAuthErrorResponse::new("invalid_grant", StatusCode::BAD_REQUEST)
                    .with_description("invalid credentials or token")
            }
            GrantError::InvalidScope => {
                OAuthErrorResponse::new("invalid_scope", StatusCode::BAD_REQUEST)
            }
            GrantError::MissingParameter(name) => {
                OAuthErrorResponse::invalid_request(format!("missing {name} parameter"))
            }
            GrantError::Upstream(e) => {
                error!("external store unavailable: {e}");
                OAuthErrorResponse::new("temporarily_unavailable", StatusCode::SERVICE_UNAVAILABLE)
            }
            GrantError::Internal(e) => {
                error!("token issuance failed: {e}");
                OAuthErrorResponse::new("server_error", StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
