#![allow(clippy::expect_used, dead_code)]
//! Test helpers for integration tests.
//!
//! Provides utilities for:
//! - Building requests against the in-memory [`TestApp`]
//! - Asserting on status codes and JSON bodies
//! - Seeding sessions and contacts through the public API

use salvo::Service;
use salvo::http::{Method, StatusCode};
use salvo::test::{ResponseExt, TestClient};
use serde_json::{Value, json};

pub use acompaniar_core::constants::API_ROUTE_PREFIX;
pub use acompaniar_test::TestApp;

/// Builds an API path below the versioned prefix.
#[must_use]
pub fn api(path: &str) -> String {
    format!("{API_ROUTE_PREFIX}{path}")
}

/// Test request builder for constructing HTTP requests.
pub struct TestRequest {
    method: Method,
    path: String,
    token: Option<String>,
    body: Option<Value>,
}

impl TestRequest {
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            token: None,
            body: None,
        }
    }

    #[must_use]
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn bearer(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// ## Panics
    /// Panics if the response body cannot be read.
    pub async fn send(self, service: &Service) -> TestResponse {
        let url = format!("http://127.0.0.1:5800{}", self.path);

        let mut client = match self.method {
            Method::GET => TestClient::get(&url),
            Method::PUT => TestClient::put(&url),
            Method::DELETE => TestClient::delete(&url),
            _ => TestClient::post(&url),
        };

        if let Some(token) = &self.token {
            client = client.bearer_auth(token);
        }
        if let Some(body) = &self.body {
            client = client.json(body);
        }

        let mut response = client.send(service).await;

        let status = response
            .status_code
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.take_string().await.unwrap_or_default();

        TestResponse {
            status,
            retry_after,
            body,
        }
    }
}

/// Represents an HTTP test response for assertions.
pub struct TestResponse {
    pub status: StatusCode,
    pub retry_after: Option<String>,
    pub body: String,
}

impl TestResponse {
    /// Asserts that the response status matches the expected code.
    #[must_use]
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status, expected,
            "Expected status {expected} but got {}: {}",
            self.status, self.body
        );
        self
    }

    /// Parses the body as JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("response body should be JSON")
    }

    /// Returns the `error` field of an error body.
    #[must_use]
    pub fn error(&self) -> String {
        self.json()["error"]
            .as_str()
            .expect("error body should carry a message")
            .to_string()
    }
}

/// Starts an anonymous session and returns its token.
pub async fn anonymous_token(app: &TestApp) -> String {
    let res = TestRequest::post(&api("/auth/anonymous"))
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);

    res.json()["access_token"]
        .as_str()
        .expect("token in response")
        .to_string()
}

/// Registers a user and logs in, returning the token.
pub async fn registered_token(app: &TestApp, email: &str, full_name: &str) -> String {
    TestRequest::post(&api("/auth/register"))
        .json(json!({
            "email": email,
            "password": "secreto123",
            "full_name": full_name,
        }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED);

    let res = TestRequest::post(&api("/auth/login"))
        .json(json!({"email": email, "password": "secreto123"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);

    res.json()["access_token"]
        .as_str()
        .expect("token in response")
        .to_string()
}

/// Creates a contact and returns its id.
pub async fn add_contact(app: &TestApp, token: &str, name: &str, phone: &str) -> String {
    let res = TestRequest::post(&api("/contacts"))
        .bearer(token)
        .json(json!({"nombre": name, "telefono": phone}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED);

    res.json()["id"]
        .as_str()
        .expect("contact id in response")
        .to_string()
}

/// Resolves the user id behind a token.
pub async fn user_id(app: &TestApp, token: &str) -> uuid::Uuid {
    let res = TestRequest::get(&api("/users/me"))
        .bearer(token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);

    res.json()["id"]
        .as_str()
        .and_then(|id| uuid::Uuid::parse_str(id).ok())
        .expect("user id in response")
}

/// Polls until `check` holds, for background work such as reconciliation.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..100 {
        if check() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(check(), "condition not reached in time");
}
