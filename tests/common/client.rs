//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all tracklog-server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    ///
    /// Use this for testing authentication flows.
    /// For most tests, use `authenticated()` instead.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client pre-authenticated as the given user
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String, user: &str) -> Self {
        let client = Self::new(base_url);

        let response = client.login(&provider_token(user)).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Test user authentication failed: {:?}",
            response.text().await
        );

        client
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /v1/auth/login
    pub async fn login(&self, access_token: &str) -> Response {
        self.client
            .post(format!("{}/v1/auth/login", self.base_url))
            .json(&json!({ "access_token": access_token }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// GET /v1/auth/logout
    pub async fn logout(&self) -> Response {
        self.client
            .get(format!("{}/v1/auth/logout", self.base_url))
            .send()
            .await
            .expect("Logout request failed")
    }

    /// GET /v1/auth/me
    pub async fn me(&self) -> Response {
        self.client
            .get(format!("{}/v1/auth/me", self.base_url))
            .send()
            .await
            .expect("Me request failed")
    }

    // ========================================================================
    // Reaction Endpoints
    // ========================================================================

    /// POST /v1/react/{kind}/{id}
    pub async fn like(&self, kind: &str, id: &str) -> Response {
        self.client
            .post(format!("{}/v1/react/{}/{}", self.base_url, kind, id))
            .send()
            .await
            .expect("Like request failed")
    }

    /// DELETE /v1/react/{kind}/{id}
    pub async fn unlike(&self, kind: &str, id: &str) -> Response {
        self.client
            .delete(format!("{}/v1/react/{}/{}", self.base_url, kind, id))
            .send()
            .await
            .expect("Unlike request failed")
    }

    /// GET /v1/target/{kind}/{id}/stats
    pub async fn stats(&self, kind: &str, id: &str) -> Response {
        self.client
            .get(format!(
                "{}/v1/target/{}/{}/stats",
                self.base_url, kind, id
            ))
            .send()
            .await
            .expect("Stats request failed")
    }

    /// GET /v1/target/{kind}/{id}/stats, decoded as JSON
    pub async fn stats_json(&self, kind: &str, id: &str) -> Value {
        let response = self.stats(kind, id).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("Stats body was not JSON")
    }

    // ========================================================================
    // Review Endpoints
    // ========================================================================

    /// POST /v1/review
    pub async fn create_review(&self, body: Value) -> Response {
        self.client
            .post(format!("{}/v1/review", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Create review request failed")
    }

    /// GET /v1/review/{id}
    pub async fn get_review(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/review/{}", self.base_url, id))
            .send()
            .await
            .expect("Get review request failed")
    }

    /// PUT /v1/review/{id}
    pub async fn update_review(&self, id: &str, body: Value) -> Response {
        self.client
            .put(format!("{}/v1/review/{}", self.base_url, id))
            .json(&body)
            .send()
            .await
            .expect("Update review request failed")
    }

    /// DELETE /v1/review/{id}
    pub async fn delete_review(&self, id: &str) -> Response {
        self.client
            .delete(format!("{}/v1/review/{}", self.base_url, id))
            .send()
            .await
            .expect("Delete review request failed")
    }

    /// GET /v1/item/{kind}/{id}/reviews
    pub async fn list_reviews(&self, kind: &str, id: &str) -> Response {
        self.client
            .get(format!(
                "{}/v1/item/{}/{}/reviews",
                self.base_url, kind, id
            ))
            .send()
            .await
            .expect("List reviews request failed")
    }

    // ========================================================================
    // Annotation Endpoints
    // ========================================================================

    /// POST /v1/annotation
    pub async fn create_annotation(&self, body: Value) -> Response {
        self.client
            .post(format!("{}/v1/annotation", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Create annotation request failed")
    }

    /// PUT /v1/annotation/{id}
    pub async fn update_annotation(&self, id: &str, body: Value) -> Response {
        self.client
            .put(format!("{}/v1/annotation/{}", self.base_url, id))
            .json(&body)
            .send()
            .await
            .expect("Update annotation request failed")
    }

    /// DELETE /v1/annotation/{id}
    pub async fn delete_annotation(&self, id: &str) -> Response {
        self.client
            .delete(format!("{}/v1/annotation/{}", self.base_url, id))
            .send()
            .await
            .expect("Delete annotation request failed")
    }

    /// GET /v1/track/{id}/annotations
    pub async fn list_annotations(&self, track_id: &str) -> Response {
        self.client
            .get(format!(
                "{}/v1/track/{}/annotations",
                self.base_url, track_id
            ))
            .send()
            .await
            .expect("List annotations request failed")
    }
}

/// Extracts the id field from a 201 response body.
pub async fn created_id(response: Response) -> String {
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let body: Value = response.json().await.expect("Body was not JSON");
    body["id"]
        .as_str()
        .expect("Body has no string id field")
        .to_string()
}
