//! brandlens-cli - Batch creator analysis
//!
//! Runs the enrichment pipeline in-process against one input file and prints
//! the result summary. Exit status is non-zero only for unrecoverable task
//! failures (unreadable input, timeout, artifact write failure); individual
//! record enrichment failures do not fail the run.

use anyhow::{anyhow, Result};
use brandlens_common::config::{
    load_config, resolve_classifier_api_key, resolve_provider_api_key,
};
use brandlens_common::events::EventBus;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use brandlens_enrich::models::TaskStatus;
use brandlens_enrich::parser::InputFormat;
use brandlens_enrich::pipeline::{PipelineRunner, PipelineSettings};
use brandlens_enrich::services::{
    Classifier, CreatorDataProvider, PromptClassifier, ProviderClient,
};
use brandlens_enrich::store::TaskStore;

/// Batch creator brand analysis
#[derive(Debug, Parser)]
#[command(name = "brandlens-cli", version, about)]
struct Args {
    /// Input file (CSV of video links or JSON creator export)
    input: PathBuf,

    /// Input format; inferred from the file extension when omitted
    #[arg(long)]
    format: Option<InputFormat>,

    /// Output directory for result artifacts
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Records per progress-report batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Concurrent enrichment workers
    #[arg(long)]
    max_workers: Option<usize>,

    /// Cap on input records, applied from the head
    #[arg(long)]
    max_records: Option<usize>,

    /// Wall-clock budget for the whole run, in seconds
    #[arg(long)]
    task_budget_secs: Option<u64>,

    /// Data provider API key (overrides env and TOML)
    #[arg(long, env = "BRANDLENS_PROVIDER_API_KEY", hide_env_values = true)]
    provider_key: Option<String>,

    /// Classifier API key (overrides env and TOML)
    #[arg(long, env = "BRANDLENS_CLASSIFIER_API_KEY", hide_env_values = true)]
    classifier_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = load_config()?;

    let format = match args.format {
        Some(format) => format,
        None => InputFormat::from_path(&args.input)
            .ok_or_else(|| anyhow!("Cannot infer input format from: {}", args.input.display()))?,
    };

    let provider_key = resolve_provider_api_key(args.provider_key.as_deref(), &config)?;
    let classifier_key = resolve_classifier_api_key(args.classifier_key.as_deref(), &config)?;

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

    let mut settings = PipelineSettings::from_config(&config);
    if let Some(output_dir) = args.output_dir {
        settings.output_dir = output_dir;
    }
    if let Some(batch_size) = args.batch_size {
        settings.batch_size = batch_size.max(1);
    }
    if let Some(max_workers) = args.max_workers {
        settings.max_workers = max_workers.max(1);
    }
    if let Some(max_records) = args.max_records {
        settings.max_records = Some(max_records);
    }
    if let Some(budget) = args.task_budget_secs {
        settings.task_budget = Duration::from_secs(budget);
    }

    let store = TaskStore::new(EventBus::new(100));
    let filename = args
        .input
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| args.input.display().to_string());
    let task = store.create(&filename).await;

    let runner = PipelineRunner::new(store.clone(), provider, classifier, settings);
    runner
        .run(task.task_id, &args.input, format, CancellationToken::new())
        .await;

    let final_task = store
        .snapshot(task.task_id)
        .await
        .ok_or_else(|| anyhow!("task vanished from store"))?;

    match final_task.status {
        TaskStatus::Completed => {
            let results = final_task
                .results
                .ok_or_else(|| anyhow!("completed task carried no results"))?;
            info!(
                total = results.total_processed,
                brand_related = results.brand_related_count,
                non_brand = results.non_brand_count,
                "Analysis finished"
            );
            println!("Total creators processed: {}", results.total_processed);
            println!(
                "Brand related: {} ({}%)",
                results.brand_related_count,
                brandlens_enrich::models::summary::percentage(
                    results.brand_related_count as usize,
                    results.total_processed as usize
                )
            );
            println!(
                "  Official brand accounts: {} ({}% of related)",
                results.brand_in_related, results.brand_in_related_percentage
            );
            println!(
                "  Matrix accounts: {} ({}% of related)",
                results.matrix_in_related, results.matrix_in_related_percentage
            );
            println!(
                "  UGC creators: {} ({}% of related)",
                results.ugc_in_related, results.ugc_in_related_percentage
            );
            println!(
                "Non-brand creators: {} ({}%)",
                results.non_brand_count, results.non_branded_creator_percentage
            );
            println!("Brand-related artifact: {}", results.brand_file);
            println!("Non-brand artifact: {}", results.non_brand_file);
            Ok(())
        }
        status => {
            let cause = final_task
                .error
                .unwrap_or_else(|| format!("task ended in unexpected state: {:?}", status));
            eprintln!("Analysis failed: {}", cause);
            std::process::exit(1);
        }
    }
}
