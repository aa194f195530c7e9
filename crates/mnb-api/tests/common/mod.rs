use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use axum_extra::extract::cookie::Key;
use http_body_util::BodyExt;
use mnb_api::{ApiConfig, router, state::ApiState};
use mnb_db::MemoryStore;
use mnb_srs::ZeroLevelPolicy;
use serde::Deserialize;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test_jwt_secret_minimum_32_characters_long";
pub const COOKIE_SECRET: &str =
    "test_cookie_secret_minimum_64_characters_long_for_secure_encryption";

/// Test state builder backed by the in-memory store
pub struct TestStateBuilder {
    config: ApiConfig,
}

impl TestStateBuilder {
    pub fn new() -> Self {
        Self {
            config: ApiConfig {
                jwt_secret: JWT_SECRET.to_string(),
                cookie_secret: COOKIE_SECRET.to_string(),
                ..ApiConfig::default()
            },
        }
    }

    pub fn zero_level(mut self, policy: ZeroLevelPolicy) -> Self {
        self.config.srs_zero_level_status = policy;
        self
    }

    pub fn build(self) -> TestApp {
        let store = Arc::new(MemoryStore::new());
        let state = ApiState::new(&self.config, store.clone(), store.clone())
            .expect("Failed to create test state");

        TestApp {
            client: TestClient::new(router::router().with_state(state.clone())),
            state,
            store,
        }
    }
}

impl Default for TestStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Router plus direct access to its backing store for seeding
pub struct TestApp {
    pub client: TestClient,
    pub state: ApiState,
    pub store: Arc<MemoryStore>,
}

/// Helper to make requests to the test app
pub struct TestClient {
    router: Router,
}

impl TestClient {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Send a request and get the response
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        TestResponse {
            status,
            body: body_bytes.to_vec(),
            headers,
        }
    }

    /// Send an unauthenticated GET request
    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request");

        self.request(request).await
    }

    /// Send a GET request with a bearer token
    pub async fn get_with_auth(&self, uri: &str, token: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .expect("Failed to build authenticated request");

        self.request(request).await
    }

    /// Send a DELETE request with a bearer token
    pub async fn delete_with_auth(&self, uri: &str, token: &str) -> TestResponse {
        let request = Request::builder()
            .method("DELETE")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .expect("Failed to build authenticated request");

        self.request(request).await
    }

    /// Send a POST request with JSON body and a bearer token
    pub async fn post_json_with_auth<T: serde::Serialize>(
        &self,
        uri: &str,
        body: &T,
        token: &str,
    ) -> TestResponse {
        let json_body = serde_json::to_string(body).expect("Failed to serialize body");

        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(json_body))
            .expect("Failed to build authenticated request");

        self.request(request).await
    }

    /// Send a GET request with the token in the private auth cookie
    pub async fn get_with_cookie(&self, uri: &str, token: &str, cookie_key: &Key) -> TestResponse {
        use cookie::{CookieJar as RawCookieJar, Key as RawKey};

        let raw_key = RawKey::try_from(cookie_key.master()).expect("Invalid key");
        let mut raw_jar = RawCookieJar::new();
        let raw_cookie = cookie::Cookie::new("auth_token", token.to_string());
        raw_jar.private_mut(&raw_key).add(raw_cookie);

        let encrypted = raw_jar.get("auth_token").expect("Cookie should exist");

        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header(
                "cookie",
                format!("{}={}", encrypted.name(), encrypted.value()),
            )
            .body(Body::empty())
            .expect("Failed to build authenticated request");

        self.request(request).await
    }
}

/// Test response wrapper
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
    #[allow(dead_code)]
    pub headers: axum::http::HeaderMap,
}

impl TestResponse {
    /// Get response body as string
    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("Response body is not valid UTF-8")
    }

    /// Parse response body as JSON
    pub fn json<T: for<'de> Deserialize<'de>>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Assert status code
    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
    }
}

/// JWT test helpers
pub mod jwt {
    use mnb_api::auth::jwt::generate_jwt_token;
    use uuid::Uuid;

    /// Generate a test JWT
    pub fn create_test_token(user_id: Uuid) -> String {
        generate_jwt_token(user_id, super::JWT_SECRET, 24)
            .expect("Failed to generate test JWT token")
    }
}

/// Seed data helpers
pub mod fixtures {
    use chrono::{Duration, Utc};
    use mnb_db::{MemoryStore, models::Mistake};
    use mnb_srs::MasteryStatus;
    use uuid::Uuid;

    /// Insert a fresh, never reviewed mistake. `order` spaces creation times so
    /// listing order is deterministic.
    pub async fn mistake(
        store: &MemoryStore,
        user_id: Uuid,
        subject_id: Uuid,
        error_reason: Option<&str>,
        order: i64,
    ) -> Mistake {
        mistake_with_mastery(
            store,
            user_id,
            subject_id,
            error_reason,
            order,
            MasteryStatus::NotMastered,
            0,
        )
        .await
    }

    pub async fn mistake_with_mastery(
        store: &MemoryStore,
        user_id: Uuid,
        subject_id: Uuid,
        error_reason: Option<&str>,
        order: i64,
        mastery_status: MasteryStatus,
        mastery_level: i32,
    ) -> Mistake {
        let mistake = Mistake {
            id: Uuid::new_v4(),
            user_id,
            subject_id,
            error_reason: error_reason.map(str::to_owned),
            mastery_status,
            mastery_level,
            created_at: Utc::now() - Duration::days(30) + Duration::seconds(order),
        };
        store.insert_mistake(mistake.clone()).await;
        mistake
    }
}
