//! The authorization endpoint and the session-terminating redirect.

use crate::api::login::found;
use crate::api::models::{AuthorizeParams, ErrorBody};
use crate::errors::OAuthErrorResponse;
use crate::openapi::OAUTH_TAG;
use crate::session::{clear_session_cookie, session_id_from_headers};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use http::header::SET_COOKIE;
use http::HeaderMap;
use log::{error, info, warn};
use rand::Rng;
use url::Url;

/// Authorization endpoint: hands an authorization code (or an error) back
/// to the client's redirect URI and retires the login session.
///
/// The code itself is an opaque one-off value; this server only supports
/// the password and refresh_token grants, so there is no redemption
/// endpoint for it.
#[utoipa::path(
    get,
    path = "/oauth/authorize",
    tag = OAUTH_TAG,
    params(
        ("response_type" = Option<String>, Query, description = "Must be 'code'"),
        ("client_id" = Option<String>, Query, description = "Client identifier"),
        ("redirect_uri" = Option<String>, Query, description = "Redirect target"),
        ("scope" = Option<String>, Query, description = "Requested scopes"),
        ("state" = Option<String>, Query, description = "Opaque client state"),
    ),
    responses(
        (status = 302, description = "Redirect to login, or to the redirect URI with code= or error="),
        (status = 400, description = "Unknown client or unusable redirect URI", body = ErrorBody),
        (status = 503, description = "Client registry unavailable", body = ErrorBody)
    )
)]
pub(super) async fn authorize(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    let session_id = match session_id_from_headers(&headers)
        .filter(|id| state.sessions.get(id).is_some())
    {
        Some(id) => id,
        // Not logged in: send the browser to the login form.
        None => return found("/login"),
    };

    // The redirect target is only trustworthy once the client is known;
    // an unknown client or unparseable URI must never be redirected to.
    let (client_id, redirect_uri) = match (&params.client_id, &params.redirect_uri) {
        (Some(client_id), Some(redirect_uri)) => (client_id, redirect_uri),
        _ => {
            return OAuthErrorResponse::invalid_request("client_id and redirect_uri are required")
                .into_response()
        }
    };
    let mut target = match Url::parse(redirect_uri) {
        Ok(url) => url,
        Err(_) => {
            return OAuthErrorResponse::invalid_request("redirect_uri is not a valid URL")
                .into_response()
        }
    };
    let client = match state.clients.find_by_client_id(client_id).await {
        Ok(Some(client)) => client,
        Ok(None) => {
            warn!("authorization request for unknown client `{client_id}`");
            return OAuthErrorResponse::invalid_request("unknown client").into_response();
        }
        Err(e) => {
            error!("client registry unavailable: {e}");
            return OAuthErrorResponse::new(
                "temporarily_unavailable",
                http::StatusCode::SERVICE_UNAVAILABLE,
            )
            .into_response();
        }
    };

    if params.response_type.as_deref() != Some("code") {
        append_error(&mut target, "unsupported_response_type", params.state.as_deref());
        return session_ending_redirect(&state, &session_id, target);
    }

    let requested: Vec<&str> = params
        .scope
        .as_deref()
        .unwrap_or_default()
        .split_whitespace()
        .collect();
    if requested.iter().any(|s| !client.scopes.contains(*s)) {
        append_error(&mut target, "invalid_scope", params.state.as_deref());
        return session_ending_redirect(&state, &session_id, target);
    }

    let code = new_authorization_code();
    {
        let mut pairs = target.query_pairs_mut();
        pairs.append_pair("code", &code);
        if let Some(s) = &params.state {
            pairs.append_pair("state", s);
        }
    }
    info!("issued authorization code to client `{client_id}`");
    session_ending_redirect(&state, &session_id, target)
}

/// Build the redirect that completes the authorization handoff and, as the
/// same explicit step, invalidate the login session. Every redirect carrying
/// `code=` or `error=` is constructed here, so session teardown is signalled
/// by this call rather than inferred by sniffing the URL.
fn session_ending_redirect(state: &AppState, session_id: &str, target: Url) -> Response {
    state.sessions.invalidate(session_id);
    let mut response = found(target.as_str());
    if let Ok(cookie) = clear_session_cookie().parse() {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    response
}

fn append_error(target: &mut Url, error: &str, state: Option<&str>) {
    let mut pairs = target.query_pairs_mut();
    pairs.append_pair("error", error);
    if let Some(s) = state {
        pairs.append_pair("state", s);
    }
}

/// 32 random bytes, base64url without padding.
fn new_authorization_code() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    URL_SAFE_NO_PAD.encode(bytes)
}
