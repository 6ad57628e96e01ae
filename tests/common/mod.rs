//! Common test utilities for E2E tests

#![allow(dead_code)]

use serde_json::{Value, json};
use socialgraph::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            database: config::DatabaseConfig {
                path: db_path,
                max_connections: 8,
                busy_timeout_ms: 5_000,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        socialgraph::metrics::init_metrics();

        // Initialize app state
        let state = AppState::new(&config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = socialgraph::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Register a user through the API and return its id
    pub async fn create_user(&self, name: &str) -> String {
        let response = self
            .client
            .post(self.url("/users"))
            .json(&json!({ "user_name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);

        let body: Value = response.json().await.unwrap();
        body["user_id"].as_str().unwrap().to_string()
    }

    /// Publish a post through the API and return its id
    pub async fn create_post(&self, user_id: &str, date: &str, has_promo: bool) -> String {
        let response = self
            .client
            .post(self.url("/products/publish"))
            .json(&json!({
                "user_id": user_id,
                "date": date,
                "category": 1,
                "price": 100.0,
                "has_promo": has_promo,
                "discount": if has_promo { Some(0.1) } else { None },
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);

        let body: Value = response.json().await.unwrap();
        body["post_id"].as_str().unwrap().to_string()
    }

    /// POST without a body and return the status code
    pub async fn post_status(&self, path: &str) -> u16 {
        self.client
            .post(self.url(path))
            .send()
            .await
            .unwrap()
            .status()
            .as_u16()
    }

    /// GET a JSON document
    pub async fn get_json(&self, path: &str) -> (u16, Value) {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        let status = response.status().as_u16();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    /// Current follower count of a user
    pub async fn followers_count(&self, user_id: &str) -> i64 {
        let (status, body) = self
            .get_json(&format!("/users/{user_id}/followers/count"))
            .await;
        assert_eq!(status, 200);
        body["followers_count"].as_i64().unwrap()
    }

    /// Current like count of a post
    pub async fn likes_count(&self, post_id: &str) -> i64 {
        let (status, body) = self.get_json(&format!("/products/posts/{post_id}")).await;
        assert_eq!(status, 200);
        body["likes_count"].as_i64().unwrap()
    }
}

/// Date `days` days before today, as `YYYY-MM-DD`
pub fn days_ago(days: i64) -> String {
    (chrono::Utc::now().date_naive() - chrono::Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}
