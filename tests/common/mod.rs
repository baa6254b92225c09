//! Common test utilities for E2E tests

#![allow(dead_code)]

pub mod schema_validator;

use std::sync::Arc;

use serde_json::Value;
use tavern::error::AppError;
use tavern::federation::{ContextCompactor, KeyPair, KeyPairProvider};
use tavern::service::ProvisionService;
use tavern::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Domain every test server answers for
pub const TEST_DOMAIN: &str = "test.example.com";

/// `Accept` / `Content-Type` value admitted by the gate
pub const ACTIVITY_JSON: &str = "application/activity+json";

/// Hands out fixed keys so tests skip RSA generation
pub struct StaticKeys;

impl KeyPairProvider for StaticKeys {
    fn generate(&self) -> Result<KeyPair, AppError> {
        Ok(KeyPair {
            private_key_pem: "test_private_key".to_string(),
            public_key_pem: "test_public_key".to_string(),
        })
    }
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a test server with no actors
    pub async fn new() -> Self {
        Self::with_users(&[]).await
    }

    /// Create a test server that provisions `users` on startup
    pub async fn with_users(users: &[&str]) -> Self {
        Self::build(users, config::DEFAULT_PAGE_SIZE).await
    }

    /// Create a test server with a custom collection page size
    pub async fn with_page_size(users: &[&str], page_size: usize) -> Self {
        Self::build(users, page_size).await
    }

    async fn build(users: &[&str], page_size: usize) -> Self {
        tavern::metrics::init_metrics();

        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: TEST_DOMAIN.to_string(),
            },
            database: config::DatabaseConfig { path: db_path },
            collections: config::CollectionsConfig { page_size },
            provisioning: config::ProvisioningConfig {
                enabled: !users.is_empty(),
                users: users.iter().map(|user| user.to_string()).collect(),
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::with_providers(config, Arc::new(StaticKeys), Arc::new(ContextCompactor))
            .await
            .unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = tavern::build_router(state.clone());

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

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Canonical URI of a local actor
    pub fn actor_uri(&self, user: &str) -> String {
        format!("https://{}/users/{}", TEST_DOMAIN, user)
    }

    /// Create a local actor after startup
    pub async fn create_actor(&self, user: &str) {
        ProvisionService::new(
            self.state.db.clone(),
            Arc::new(StaticKeys),
            TEST_DOMAIN.to_string(),
        )
        .ensure_actor(user)
        .await
        .unwrap();
    }

    /// Record that `follower` follows `actor` (both full URIs)
    pub async fn add_follower(&self, actor: &str, follower: &str) {
        self.state
            .db
            .insert_graph_edge_if_absent(follower, actor)
            .await
            .unwrap();
    }

    /// GET with the ActivityPub Accept header
    pub async fn get_activity(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header("Accept", ACTIVITY_JSON)
            .send()
            .await
            .unwrap()
    }

    /// POST a document to `user`'s outbox with the ActivityPub Content-Type
    pub async fn post_outbox(&self, user: &str, document: &Value) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/users/{}/outbox", user)))
            .header("Content-Type", ACTIVITY_JSON)
            .body(document.to_string())
            .send()
            .await
            .unwrap()
    }

    /// Publish a minimal Note and return the stored activity
    pub async fn publish_note(&self, user: &str, content: &str) -> Value {
        let note = serde_json::json!({
            "type": "Note",
            "published": "2024-01-01T00:00:00Z",
            "content": content
        });
        let response = self.post_outbox(user, &note).await;
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }
}
