//! Test fixture running the gateway against a wiremock upstream.

use crate::config::{GatewayConfig, UpstreamConfig};
use crate::create_app;
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use token_core::{AccessTokenVerifier, TokenClaims, TokenCodec, TokenKind};
use tower::ServiceExt;
use wiremock::MockServer;

const TEST_PRIVATE_PEM: &str = include_str!("../../testdata/rsa_private.pem");
const TEST_PUBLIC_PEM: &str = include_str!("../../testdata/rsa_public.pem");

pub(crate) struct TestFixture {
    pub app: Router,
    pub upstream_mock: MockServer,
    signer: TokenCodec,
}

impl TestFixture {
    /// A gateway wired to a fresh mock upstream.
    pub async fn new() -> Self {
        Self::with_timeout(5).await
    }

    /// A gateway whose upstream client times out after `timeout` seconds,
    /// still pointed at the mock upstream.
    pub async fn with_slow_upstream(timeout: u64) -> Self {
        Self::with_timeout(timeout).await
    }

    async fn with_timeout(timeout: u64) -> Self {
        let upstream_mock = MockServer::start().await;
        let host = upstream_mock.address().ip().to_string();
        let port = upstream_mock.address().port();
        Self::build(&host, port, timeout, upstream_mock)
    }

    /// A gateway pointed at an arbitrary upstream address. The mock server
    /// it carries is unused in this configuration.
    pub async fn with_upstream(host: &str, port: u16, timeout: u64) -> Self {
        let unused_mock = MockServer::start().await;
        Self::build(host, port, timeout, unused_mock)
    }

    fn build(host: &str, port: u16, timeout: u64, upstream_mock: MockServer) -> Self {
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();

        let config = GatewayConfig {
            port: 0,
            public_key_path: String::new(),
            key_id: None,
            upstream: UpstreamConfig {
                host: host.to_string(),
                port,
                client_timeout: timeout,
            },
        };
        let verifier =
            AccessTokenVerifier::from_public_pem(TEST_PUBLIC_PEM.as_bytes(), None).unwrap();
        let state = AppState::with_verifier(config, verifier);
        let signer =
            TokenCodec::from_key_pair(TEST_PRIVATE_PEM.as_bytes(), TEST_PUBLIC_PEM.as_bytes(), None)
                .unwrap();

        Self {
            app: create_app(state),
            upstream_mock,
            signer,
        }
    }

    pub fn mint_access_token(&self) -> String {
        self.mint_token(TokenKind::Access, 3600)
    }

    pub fn mint_token(&self, kind: TokenKind, lifetime_secs: u64) -> String {
        let claims = TokenClaims::new(
            "u1",
            "c1",
            &["read".to_string(), "write".to_string()],
            vec!["ROLE_USER".to_string()],
            kind,
            lifetime_secs,
        );
        self.signer.sign(&claims).unwrap()
    }

    /// A correctly signed access token that ran out an hour ago.
    pub fn mint_expired_access_token(&self) -> String {
        let mut claims = TokenClaims::new(
            "u1",
            "c1",
            &[],
            vec![],
            TokenKind::Access,
            3600,
        );
        claims.iat -= 7200;
        claims.exp -= 7200;
        self.signer.sign(&claims).unwrap()
    }

    pub async fn get(&self, uri: &str, bearer: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty()).expect("Failed to build request");
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

        TestResponse {
            status,
            headers,
            body_text: String::from_utf8_lossy(&body).into_owned(),
        }
    }
}

pub(crate) struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
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
}
