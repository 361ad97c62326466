/// Common test utilities for API integration tests
///
/// Provides a test context that wires a real database into the router,
/// plus request/response helpers. Requires `DATABASE_URL`; the suites
/// using it are `#[ignore]`d by default.

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use serde_json::Value;
use sqlx::PgPool;
use teamdeck_api::app::{build_router, AppState};
use teamdeck_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, RedisConfig};
use tower::ServiceExt as _;
use uuid::Uuid;

pub const ACCESS_SECRET: &str = "test-access-secret-at-least-32-bytes!";
pub const REFRESH_SECRET: &str = "test-refresh-secret-at-least-32-byte";

/// Test context containing the app and its backing pool
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
}

/// A registered test user with live credentials
pub struct TestUser {
    pub user_id: Uuid,
    pub email: String,
    pub password: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestContext {
    /// Creates a context over a fresh router and migrated database
    pub async fn new() -> anyhow::Result<Self> {
        let url = std::env::var("DATABASE_URL")?;
        let db = PgPool::connect(&url).await?;
        sqlx::migrate!("../migrations").run(&db).await?;

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url,
                max_connections: 5,
            },
            jwt: JwtConfig {
                access_secret: ACCESS_SECRET.to_string(),
                refresh_secret: REFRESH_SECRET.to_string(),
                access_ttl_minutes: 15,
                refresh_ttl_days: 7,
            },
            redis: RedisConfig { url: None },
        };

        let state = AppState::new(db.clone(), config)?;
        let app = build_router(state);

        Ok(TestContext { db, app })
    }

    /// Sends a JSON POST without authentication
    pub async fn post(&self, path: &str, body: Value) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Sends a JSON request with a bearer token
    pub async fn request_authed(
        &self,
        method: &str,
        path: &str,
        token: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(path)
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json");

        let request = match body {
            Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Sends a GET without authentication
    pub async fn get(&self, path: &str) -> Response<Body> {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Registers a fresh user through the API and returns their credentials
    pub async fn register_user(&self, name: &str) -> anyhow::Result<TestUser> {
        let email = format!("test-{}@example.com", Uuid::new_v4());
        let password = "workable9pass".to_string();

        let response = self
            .post(
                "/v1/auth/register",
                serde_json::json!({
                    "name": name,
                    "email": email,
                    "password": password,
                }),
            )
            .await;

        let status = response.status();
        let body = body_json(response).await;
        if status != StatusCode::CREATED {
            anyhow::bail!("register failed with {}: {}", status, body);
        }

        Ok(TestUser {
            user_id: body["user"]["id"]
                .as_str()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| anyhow::anyhow!("missing user id in response"))?,
            email,
            password,
            access_token: body["access_token"].as_str().unwrap_or_default().to_string(),
            refresh_token: body["refresh_token"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
        })
    }

    /// Removes a test user and their cascaded rows
    pub async fn cleanup_user(&self, user: &TestUser) {
        let _ = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user.user_id)
            .execute(&self.db)
            .await;
    }

    /// Removes a test organization and its cascaded rows
    pub async fn cleanup_org(&self, org_id: Uuid) {
        let _ = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(org_id)
            .execute(&self.db)
            .await;
    }
}

/// Reads a response body as JSON
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}
