//! brandlens-enrich library interface
//!
//! Exposes the pipeline and HTTP surface for the service binary, the batch
//! CLI and integration tests.

pub mod api;
pub mod error;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod services;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use brandlens_common::events::EventBus;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::pipeline::PipelineSettings;
use crate::services::{Classifier, CreatorDataProvider};
use crate::store::TaskStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// System of record for tasks, polled by external callers
    pub store: TaskStore,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Creator data-provider boundary
    pub provider: Arc<dyn CreatorDataProvider>,
    /// Classification boundary
    pub classifier: Arc<dyn Classifier>,
    /// Default pipeline settings; per-request overrides apply on top
    pub settings: PipelineSettings,
    /// Cancellation tokens for running tasks
    pub cancel_tokens: Arc<RwLock<HashMap<Uuid, CancellationToken>>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        event_bus: EventBus,
        provider: Arc<dyn CreatorDataProvider>,
        classifier: Arc<dyn Classifier>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store: TaskStore::new(event_bus.clone()),
            event_bus,
            provider,
            classifier,
            settings,
            cancel_tokens: Arc::new(RwLock::new(HashMap::new())),
            startup_time: Utc::now(),
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::analyze_routes())
        .merge(api::artifact_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .with_state(state)
}
