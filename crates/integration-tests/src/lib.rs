//! Integration tests for the partner portal.
//!
//! Each test drives the full router in process against a [`wiremock`]
//! stand-in for the hosted backend. No network listener or browser is
//! involved; the session cookie is carried between requests by hand.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p partner-portal-integration-tests
//! ```
//!
//! # Backend Paths
//!
//! The mock serves every endpoint under one base URL:
//!
//! - `/register` - partner registration
//! - `/login` - login
//! - `/partners` - partner list, approve and reject; admin lead list and update
//! - `/leads` - a partner's leads and statistics
//! - `/create-lead` - lead creation

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use partner_portal::build_router;
use partner_portal::config::PortalConfig;
use partner_portal::middleware::session::SESSION_COOKIE_NAME;
use partner_portal::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const PARTNER_EMAIL: &str = "partner@example.com";

/// A rendered response, body collected.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// The redirect target, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Whether the response set or cleared the session cookie.
    #[must_use]
    pub fn touches_session_cookie(&self) -> bool {
        session_cookie(&self.headers).is_some()
    }
}

/// The portal wired to a mock backend, with a cookie jar of one.
pub struct TestPortal {
    pub backend: MockServer,
    router: Router,
    cookie: Option<String>,
}

impl TestPortal {
    /// Start a mock backend and build the portal against it.
    pub async fn start() -> Self {
        Self::start_with(&[]).await
    }

    /// Like [`TestPortal::start`], with individual settings replaced.
    ///
    /// # Panics
    ///
    /// Panics if the resulting configuration is invalid.
    pub async fn start_with(overrides: &[(&str, &str)]) -> Self {
        let backend = MockServer::start().await;
        let base = backend.uri();

        let mut vars: HashMap<String, String> = [
            ("PORTAL_BASE_URL", "http://localhost:3000".to_string()),
            ("PORTAL_REGISTER_URL", format!("{base}/register")),
            ("PORTAL_LOGIN_URL", format!("{base}/login")),
            ("PORTAL_PARTNERS_URL", format!("{base}/partners")),
            ("PORTAL_LEADS_URL", format!("{base}/leads")),
            ("PORTAL_CREATE_LEAD_URL", format!("{base}/create-lead")),
            ("PORTAL_BACKEND_TIMEOUT_SECS", "5".to_string()),
            ("PORTAL_RATE_LIMIT", "false".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        for (key, value) in overrides {
            vars.insert((*key).to_string(), (*value).to_string());
        }

        let config = PortalConfig::from_lookup(|key| vars.get(key).cloned())
            .expect("test configuration should be valid");
        let state = AppState::new(config).expect("backend client should build");

        Self {
            backend,
            router: build_router(state),
            cookie: None,
        }
    }

    /// Whether a session cookie is currently held.
    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.cookie.is_some()
    }

    /// Send a GET request.
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = self.request("GET", uri).body(Body::empty());
        self.send(request.expect("request should build")).await
    }

    /// Send a urlencoded form POST.
    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body));
        self.send(request.expect("request should build")).await
    }

    /// Log in through the form as the given backend identity.
    ///
    /// # Panics
    ///
    /// Panics if the login does not redirect.
    pub async fn login_as(&mut self, partner: Value) -> TestResponse {
        let email = partner["email"].as_str().unwrap_or_default().to_string();
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "partner": partner,
                "session_token": "token-123",
            })))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&self.backend)
            .await;

        let response = self
            .post_form("/login", &[("email", &email), ("password", "secret")])
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.body);
        response
    }

    /// Log in as an approved admin with id 1.
    pub async fn login_admin(&mut self) -> TestResponse {
        self.login_as(json!({"id": 1, "name": "Админ", "email": ADMIN_EMAIL, "is_admin": true}))
            .await
    }

    /// Log in as a partner with id 7.
    pub async fn login_partner(&mut self) -> TestResponse {
        self.login_as(json!({"id": 7, "name": "Пётр", "email": PARTNER_EMAIL, "is_admin": false}))
            .await
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        if let Some(cookie) = session_cookie(&headers) {
            self.cookie = cookie;
        }

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

/// The session cookie change a response carries.
///
/// `Some(None)` means the cookie was cleared.
fn session_cookie(headers: &HeaderMap) -> Option<Option<String>> {
    let prefix = format!("{SESSION_COOKIE_NAME}=");
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&prefix))
        .map(|v| {
            let pair = v.split(';').next().unwrap_or_default().trim();
            let cleared = pair == prefix || v.contains("Max-Age=0");
            (!cleared).then(|| pair.to_string())
        })
}
