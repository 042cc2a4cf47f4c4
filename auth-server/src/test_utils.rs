//! Test fixture driving the real router end to end.

use crate::config::{AuthServerConfig, KeyPairConfig};
use crate::create_app;
use crate::issuer::TokenIssuer;
use crate::session::SessionStore;
use crate::state::AppState;
use crate::stores::memory::{InMemoryClients, InMemoryUsers, UnavailableStore};
use crate::stores::{Client, GrantType, Principal};
use axum::body::Body;
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use token_core::TokenCodec;
use tower::ServiceExt;

pub(crate) const TEST_PRIVATE_PEM: &str = include_str!("../../testdata/rsa_private.pem");
pub(crate) const TEST_PUBLIC_PEM: &str = include_str!("../../testdata/rsa_public.pem");

/// Low bcrypt cost keeps test hashing fast; these hashes protect nothing.
pub(crate) fn hash(secret: &str) -> String {
    bcrypt::hash(secret, 4).unwrap()
}

/// The value of an HTTP Basic Authorization header.
pub(crate) fn basic_auth(id: &str, secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{id}:{secret}")))
}

fn test_codec() -> TokenCodec {
    TokenCodec::from_key_pair(TEST_PRIVATE_PEM.as_bytes(), TEST_PUBLIC_PEM.as_bytes(), None)
        .unwrap()
}

fn test_config() -> AuthServerConfig {
    AuthServerConfig {
        port: 0,
        keys: KeyPairConfig {
            private_key_path: String::new(),
            public_key_path: String::new(),
            key_id: None,
        },
        users_file: None,
        clients_file: None,
    }
}

fn seeded_users() -> Vec<Principal> {
    vec![Principal {
        username: "u1".to_string(),
        password_hash: hash("password"),
        roles: vec!["ROLE_USER".to_string(), "ROLE_ADMIN".to_string()],
        enabled: true,
        locked: false,
        expired: false,
    }]
}

fn seeded_clients() -> Vec<Client> {
    vec![Client {
        client_id: "c1".to_string(),
        secret_hash: hash("client-secret"),
        grant_types: HashSet::from([GrantType::Password, GrantType::RefreshToken]),
        scopes: HashSet::from(["read".to_string(), "write".to_string()]),
        access_token_lifetime: 3600,
        refresh_token_lifetime: 7200,
    }]
}

pub(crate) struct TestFixture {
    pub app: Router,
    pub state: AppState,
}

impl TestFixture {
    /// A fixture with one user (`u1`/`password`) and one client
    /// (`c1`/`client-secret`, scopes read+write, both grant types).
    pub fn new() -> Self {
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();

        let clients = Arc::new(InMemoryClients::new(seeded_clients()));
        let users = Arc::new(InMemoryUsers::new(seeded_users()));
        let state = AppState {
            config: Arc::new(test_config()),
            issuer: Arc::new(TokenIssuer::new(clients.clone(), users, test_codec())),
            sessions: Arc::new(SessionStore::new()),
            clients,
        };
        let app = create_app(state.clone());
        Self { app, state }
    }

    /// A fixture whose stores always report an outage.
    pub fn with_unavailable_stores() -> Self {
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();

        let store = Arc::new(UnavailableStore);
        let state = AppState {
            config: Arc::new(test_config()),
            issuer: Arc::new(TokenIssuer::new(store.clone(), store.clone(), test_codec())),
            sessions: Arc::new(SessionStore::new()),
            clients: store,
        };
        let app = create_app(state.clone());
        Self { app, state }
    }

    /// A codec sharing the fixture's key pair, for decoding issued tokens.
    pub fn codec(&self) -> TokenCodec {
        test_codec()
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header("Cookie", cookie)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        self.post_form_with_headers(uri, fields, &[]).await
    }

    pub async fn post_form_with_headers(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("Content-Type", "application/x-www-form-urlencoded");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(Body::from(form_body(fields)))
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        let body_text = String::from_utf8_lossy(&body).into_owned();
        let json = serde_json::from_slice(&body).unwrap_or_else(|_| serde_json::json!({}));

        TestResponse {
            status,
            headers,
            json,
            body_text,
        }
    }
}

/// Form-encode simple field values. Test values never contain characters
/// that need escaping beyond these.
fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{k}={}", v.replace('&', "%26").replace('=', "%3D").replace(' ', "+")))
        .collect::<Vec<_>>()
        .join("&")
}

pub(crate) struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: Value,
    pub body_text: String,
}

impl TestResponse {
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {expected} but got {} with body: {}",
            self.status, self.body_text
        );
        self
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// The `SESSION=<id>` pair from the Set-Cookie header, ready to send
    /// back as a Cookie header.
    pub fn session_cookie(&self) -> Option<String> {
        let set_cookie = self.header("set-cookie")?;
        let pair = set_cookie.split(';').next()?.trim().to_string();
        // An expired/cleared cookie is not a usable session.
        match pair.strip_prefix("SESSION=") {
            Some(id) if !id.is_empty() => Some(pair),
            _ => None,
        }
    }

    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }
}
