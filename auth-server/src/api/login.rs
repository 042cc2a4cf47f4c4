//! Browser form login and the session-guarded landing page.

use crate::api::models::LoginForm;
use crate::issuer::GrantError;
use crate::session::{clear_session_cookie, session_cookie, session_id_from_headers};
use crate::state::AppState;
use axum::extract::{Form, Query, State};
use axum::response::{Html, IntoResponse, Response};
use http::header::{LOCATION, SET_COOKIE};
use http::{HeaderMap, StatusCode};
use log::{error, info, warn};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct LoginQuery {
    error: Option<String>,
}

/// `302 Found`, the redirect status browsers expect after form posts here.
pub(super) fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(LOCATION, location)],
        axum::body::Body::empty(),
    )
        .into_response()
}

/// Render the login form. A failed attempt lands back here with `?error`.
pub(super) async fn login_form(Query(query): Query<LoginQuery>) -> Html<String> {
    let banner = if query.error.is_some() {
        r#"<p class="error">Login failed. Check your username and password.</p>"#
    } else {
        ""
    };
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Sign in</title>
    <style>
        body {{ font-family: Arial, sans-serif; max-width: 400px; margin: 50px auto; padding: 20px; }}
        .form-group {{ margin-bottom: 15px; }}
        label {{ display: block; margin-bottom: 5px; }}
        input {{ width: 100%; padding: 8px; border: 1px solid #ddd; border-radius: 4px; }}
        button {{ background: #007bff; color: white; padding: 10px 20px; border: none; border-radius: 4px; cursor: pointer; }}
        .error {{ color: #b00020; }}
    </style>
</head>
<body>
    <h2>Sign in</h2>
    {banner}
    <form method="post" action="/login">
        <div class="form-group">
            <label for="username">Username:</label>
            <input type="text" id="username" name="username" required>
        </div>
        <div class="form-group">
            <label for="password">Password:</label>
            <input type="password" id="password" name="password" required>
        </div>
        <button type="submit">Sign in</button>
    </form>
</body>
</html>
"#
    ))
}

/// Process the login form: verify credentials, create a session, redirect.
///
/// Failures redirect back to the form with a generic error; the response
/// never distinguishes an unknown user from a wrong password.
pub(super) async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Response {
    match state
        .issuer
        .authenticate_principal(&form.username, &form.password)
        .await
    {
        Ok(principal) => {
            let session_id = state.sessions.create(&principal.username);
            info!("form login succeeded for `{}`", principal.username);
            let mut response = found("/");
            match session_cookie(&session_id).parse() {
                Ok(cookie) => {
                    response.headers_mut().insert(SET_COOKIE, cookie);
                }
                Err(e) => {
                    error!("failed to encode session cookie: {e}");
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
            }
            response
        }
        Err(GrantError::Upstream(e)) => {
            error!("credential store unavailable during login: {e}");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
        Err(err) => {
            warn!("form login failed: {err}");
            found("/login?error")
        }
    }
}

/// Landing page; only reachable with a live session.
pub(super) async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = session_id_from_headers(&headers).and_then(|id| state.sessions.get(&id));
    match session {
        Some(session) => Html(format!(
            "<html><body><h2>Signed in as {}</h2></body></html>",
            session.principal
        ))
        .into_response(),
        None => {
            // A stale cookie without a server-side session gets cleared.
            let mut response = found("/login");
            if let Ok(cookie) = clear_session_cookie().parse() {
                response.headers_mut().insert(SET_COOKIE, cookie);
            }
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::TestFixture;
    use http::StatusCode;

    #[tokio::test]
    async fn successful_login_redirects_home_with_a_session_cookie() {
        let fixture = TestFixture::new();
        let response = fixture
            .post_form("/login", &[("username", "u1"), ("password", "password")])
            .await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header("location").as_deref(), Some("/"));

        let cookie = response.session_cookie().expect("session cookie set");
        let home = fixture.get_with_cookie("/", &cookie).await;
        home.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn failed_login_redirects_back_with_generic_error() {
        let fixture = TestFixture::new();
        for (username, password) in [("u1", "wrong"), ("no-such-user", "password")] {
            let response = fixture
                .post_form("/login", &[("username", username), ("password", password)])
                .await;
            response.assert_status(StatusCode::FOUND);
            assert_eq!(response.header("location").as_deref(), Some("/login?error"));
            assert!(response.session_cookie().is_none());
        }
    }

    #[tokio::test]
    async fn landing_page_without_session_redirects_to_login() {
        let fixture = TestFixture::new();
        let response = fixture.get("/").await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header("location").as_deref(), Some("/login"));
    }

    #[tokio::test]
    async fn login_form_renders_with_and_without_error_banner() {
        let fixture = TestFixture::new();
        let plain = fixture.get("/login").await;
        plain.assert_status(StatusCode::OK);
        assert!(!plain.body_text.contains("Login failed"));

        let with_error = fixture.get("/login?error").await;
        with_error.assert_status(StatusCode::OK);
        assert!(with_error.body_text.contains("Login failed"));
    }

    #[tokio::test]
    async fn login_during_store_outage_is_service_unavailable() {
        let fixture = TestFixture::with_unavailable_stores();
        let response = fixture
            .post_form("/login", &[("username", "u1"), ("password", "password")])
            .await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }
}
