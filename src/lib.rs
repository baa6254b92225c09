//! Tavern - a small ActivityPub node
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Media type gate, local actor gate                        │
//! │  - WebFinger, actor, collection and outbox endpoints        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Outbox ingestion                                         │
//! │  - Actor provisioning                                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers and request gates
//! - `service`: Business logic layer
//! - `federation`: ActivityPub documents, identity URIs, keys
//! - `data`: Database layer
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod federation;
pub mod metrics;
pub mod service;

use std::sync::Arc;

use federation::{Compactor, ContextCompactor, KeyPairProvider, Paginator, RsaKeyPairProvider};

/// Application state shared across all handlers
///
/// Cloned for each request; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// JSON-LD compaction
    pub compactor: Arc<dyn Compactor>,

    /// Collection renderer, sized from `collections.page_size`
    pub paginator: Paginator,
}

impl AppState {
    /// Initialize application state with RSA keys and the default compactor
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        Self::with_providers(
            config,
            Arc::new(RsaKeyPairProvider::default()),
            Arc::new(ContextCompactor),
        )
        .await
    }

    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database
    /// 2. Build the collection paginator
    /// 3. Provision configured actors (if enabled)
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn with_providers(
        config: config::AppConfig,
        keys: Arc<dyn KeyPairProvider>,
        compactor: Arc<dyn Compactor>,
    ) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to SQLite database
        let db = Arc::new(data::Database::connect(&config.database.path).await?);

        // 2. Build the collection paginator
        let paginator = Paginator::new(config.collections.page_size, compactor.clone());

        // 3. Provision configured actors
        if config.provisioning.enabled {
            let provisioner = service::ProvisionService::new(
                db.clone(),
                keys.clone(),
                config.server.domain.clone(),
            );
            provisioner.provision(&config.provisioning.users).await?;
        } else {
            let total = db.count_actors(&config.server.domain).await?;
            metrics::set_actors_total(total);
        }

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            db,
            compactor,
            paginator,
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, middleware::from_fn};
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(api::wellknown_router())
        .merge(api::activitypub_router(state.clone()))
        .merge(api::metrics_router())
        .layer(from_fn(api::middleware::record_http_metrics))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
