//! brandlens-enrich - Creator Enrichment Service
//!
//! Accepts uploaded creator/video batches, enriches them against external
//! data providers, classifies creators into brand categories and exposes the
//! task-store polling surface plus artifact downloads.

use anyhow::Result;
use brandlens_common::config::{
    load_config, resolve_classifier_api_key, resolve_provider_api_key,
};
use brandlens_common::events::EventBus;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use brandlens_enrich::pipeline::PipelineSettings;
use brandlens_enrich::services::{
    Classifier, CreatorDataProvider, PromptClassifier, ProviderClient,
};
use brandlens_enrich::AppState;

const BIND_ADDR: &str = "127.0.0.1:5731";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting brandlens-enrich (creator enrichment service)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    let provider_key = resolve_provider_api_key(None, &config)?;
    let classifier_key = resolve_classifier_api_key(None, &config)?;

    let provider: Arc<dyn CreatorDataProvider> = Arc::new(ProviderClient::new(
        &config.provider.base_url,
        provider_key,
        Duration::from_secs(config.provider.timeout_secs),
    )?);
    let classifier: Arc<dyn Classifier> = Arc::new(PromptClassifier::new(
        &config.classifier.base_url,
        classifier_key,
        &config.classifier.model,
        Duration::from_secs(config.classifier.timeout_secs),
    )?);

    let settings = PipelineSettings::from_config(&config);
    info!(
        output_dir = %settings.output_dir.display(),
        max_workers = settings.max_workers,
        "Pipeline configured"
    );

    let event_bus = EventBus::new(100);
    let state = AppState::new(event_bus, provider, classifier, settings);
    let app = brandlens_enrich::build_router(state);

    let listener = tokio::net::TcpListener::bind(BIND_ADDR).await?;
    info!("Listening on http://{}", BIND_ADDR);
    info!("Health check: http://{}/health", BIND_ADDR);

    axum::serve(listener, app).await?;

    Ok(())
}
