//! Browser sessions for the login → authorization-redirect handoff.
//!
//! A session exists only to bridge the form login and the authorization
//! redirect: it is created on successful login and destroyed the moment a
//! redirect carrying an authorization code or error is constructed, so the
//! logged-in state cannot be replayed after the handoff. Invalidation comes
//! from an explicit signal at the redirect-construction site, not from
//! sniffing `code=`/`error=` substrings out of target URLs.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use dashmap::DashMap;
use http::HeaderMap;
use log::debug;
use rand::Rng;

pub const SESSION_COOKIE: &str = "SESSION";

#[derive(Debug, Clone)]
pub struct Session {
    pub principal: String,
    pub created_at: i64,
}

/// Server-side session map, safe for unlimited concurrent request handling.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session bound to the principal, returning its identifier.
    pub fn create(&self, principal: &str) -> String {
        let id = new_session_id();
        self.sessions.insert(
            id.clone(),
            Session {
                principal: principal.to_string(),
                created_at: Utc::now().timestamp(),
            },
        );
        debug!("created session for `{principal}`");
        id
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        self.sessions.get(id).map(|s| s.clone())
    }

    /// Destroy a session. Invalidating an absent or already-invalidated
    /// session is a no-op, never an error.
    pub fn invalidate(&self, id: &str) {
        if self.sessions.remove(id).is_some() {
            debug!("invalidated session");
        }
    }
}

/// 32 random bytes, base64url without padding.
fn new_session_id() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// The `Set-Cookie` value establishing a session.
pub fn session_cookie(id: &str) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

/// The `Set-Cookie` value clearing the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0")
}

/// Extract the session id from the request's Cookie header, if any.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(http::header::COOKIE)?.to_str().ok()?;
    cookies.split(';').map(str::trim).find_map(|pair| {
        pair.strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    })
}
