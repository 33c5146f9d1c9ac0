//! Task runner
//!
//! Drives one task through its whole lifecycle: parse → (link conversion) →
//! enrichment → aggregation → terminal state. The entire run executes under a
//! wall-clock budget; on overrun the in-flight work is abandoned and the task
//! fails with a distinguished timeout cause. Record- and field-level failures
//! are absorbed by the lower layers and only surface in the task log.

use anyhow::Result;
use brandlens_common::config::TomlConfig;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::{CreatorRecord, EnrichedCreator, VideoRef};
use crate::parser::{self, InputFormat};
use crate::services::workers::run_bounded;
use crate::services::{
    Classifier, CreatorDataProvider, CreatorEnricher, DedupSet, LinkConverter, ResultAggregator,
};
use crate::store::TaskStore;

/// Tuning parameters for one pipeline instance
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub output_dir: PathBuf,
    pub max_workers: usize,
    pub batch_size: usize,
    pub max_records: Option<usize>,
    pub task_budget: Duration,
    pub fetch_timeout: Duration,
    pub classify_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("analyzed_data"),
            max_workers: 5,
            batch_size: 35,
            max_records: None,
            task_budget: Duration::from_secs(300),
            fetch_timeout: Duration::from_secs(15),
            classify_timeout: Duration::from_secs(20),
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            output_dir: config.pipeline.output_dir.clone(),
            max_workers: config.pipeline.max_workers,
            batch_size: config.pipeline.batch_size,
            max_records: config.pipeline.max_records,
            task_budget: Duration::from_secs(config.pipeline.task_budget_secs),
            fetch_timeout: Duration::from_secs(config.provider.timeout_secs),
            classify_timeout: Duration::from_secs(config.classifier.timeout_secs),
        }
    }
}

/// Batched progress reporting shared by all workers of one phase
struct ProgressCounter {
    total: usize,
    batch: usize,
    done: AtomicUsize,
}

impl ProgressCounter {
    fn new(total: usize, batch: usize) -> Self {
        Self {
            total,
            batch: batch.max(1),
            done: AtomicUsize::new(0),
        }
    }

    /// Count one completion; returns a progress line at batch boundaries
    fn tick(&self, verb: &str) -> Option<String> {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        if done == self.total || done % self.batch == 0 {
            Some(format!("{} {}/{} creators...", verb, done, self.total))
        } else {
            None
        }
    }
}

/// Executes one task's pipeline
pub struct PipelineRunner {
    store: TaskStore,
    provider: Arc<dyn CreatorDataProvider>,
    classifier: Arc<dyn Classifier>,
    settings: PipelineSettings,
}

impl PipelineRunner {
    pub fn new(
        store: TaskStore,
        provider: Arc<dyn CreatorDataProvider>,
        classifier: Arc<dyn Classifier>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            provider,
            classifier,
            settings,
        }
    }

    /// Run the task to a terminal state
    ///
    /// Never returns an error: every failure mode ends in the task's `error`
    /// state instead.
    pub async fn run(
        &self,
        task_id: Uuid,
        input_path: &Path,
        format: InputFormat,
        cancel: CancellationToken,
    ) {
        let budget = self.settings.task_budget;

        match tokio::time::timeout(budget, self.execute(task_id, input_path, format, &cancel)).await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.store.fail(task_id, &e.to_string()).await;
            }
            Err(_) => {
                // Dropping the execute future abandons in-flight workers; the
                // token stops anything holding its own clone.
                cancel.cancel();
                self.store
                    .fail(task_id, &format!("analysis timed out after {:?}", budget))
                    .await;
            }
        }
    }

    async fn execute(
        &self,
        task_id: Uuid,
        input_path: &Path,
        format: InputFormat,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let filename = input_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| input_path.display().to_string());
        let input_base = input_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "input".to_string());

        tracing::info!(
            task_id = %task_id,
            input = %input_path.display(),
            format = format.as_str(),
            max_workers = self.settings.max_workers,
            "Starting analysis pipeline"
        );

        self.store
            .begin_processing(task_id, "Loading creator data...")
            .await;

        let dedup = Arc::new(DedupSet::new());

        let (records, claim_in_enrich) = match format {
            InputFormat::Csv => {
                let outcome = parser::parse_video_csv(input_path, self.settings.max_records)?;
                self.store
                    .append_log(
                        task_id,
                        &format!("Loaded {} video links from {}", outcome.records.len(), filename),
                    )
                    .await;
                if outcome.skipped > 0 {
                    self.store
                        .append_log(
                            task_id,
                            &format!("Skipped {} malformed rows", outcome.skipped),
                        )
                        .await;
                }

                self.store
                    .set_progress(task_id, "Resolving video links...")
                    .await;
                let converted = self
                    .convert_links(task_id, outcome.records, &dedup, cancel)
                    .await;
                self.store
                    .append_log(
                        task_id,
                        &format!("Resolved {} unique creators", converted.len()),
                    )
                    .await;

                // Conversion already claimed every surviving handle.
                (converted, false)
            }
            InputFormat::Json => {
                let outcome = parser::parse_creator_json(input_path, self.settings.max_records)?;
                self.store
                    .append_log(
                        task_id,
                        &format!("Loaded {} entries from {}", outcome.records.len(), filename),
                    )
                    .await;
                if outcome.skipped > 0 {
                    self.store
                        .append_log(
                            task_id,
                            &format!("Skipped {} malformed entries", outcome.skipped),
                        )
                        .await;
                }
                (outcome.records, true)
            }
        };

        if cancel.is_cancelled() {
            anyhow::bail!("analysis cancelled");
        }

        self.store
            .set_progress(
                task_id,
                &format!("Analyzing {} creators...", records.len()),
            )
            .await;

        let enriched = self
            .enrich_creators(task_id, records, &dedup, claim_in_enrich, cancel)
            .await;

        if cancel.is_cancelled() {
            anyhow::bail!("analysis cancelled");
        }

        self.store
            .set_progress(task_id, "Generating classification results...")
            .await;

        let aggregator = ResultAggregator::new(&self.settings.output_dir);
        let stamp = ResultAggregator::artifact_stamp();
        let summary = aggregator.aggregate(&input_base, &stamp, &enriched)?;

        self.store
            .append_log(
                task_id,
                &format!(
                    "Found {} official brand accounts",
                    summary.official_account_count
                ),
            )
            .await;
        self.store
            .append_log(
                task_id,
                &format!("Found {} matrix accounts", summary.matrix_account_count),
            )
            .await;
        self.store
            .append_log(
                task_id,
                &format!("Found {} UGC creators", summary.ugc_creator_count),
            )
            .await;
        self.store
            .append_log(
                task_id,
                &format!(
                    "Found {} non-branded creators",
                    summary.non_branded_creator_count
                ),
            )
            .await;
        self.store
            .set_progress(task_id, "Creating downloadable reports...")
            .await;

        self.store.complete(task_id, summary).await;
        Ok(())
    }

    /// Conversion pre-pass: video links → canonical creator records
    ///
    /// Same pool, dedup and timeout rules as enrichment, applied to the
    /// raw-link record shape.
    async fn convert_links(
        &self,
        task_id: Uuid,
        refs: Vec<VideoRef>,
        dedup: &Arc<DedupSet>,
        cancel: &CancellationToken,
    ) -> Vec<CreatorRecord> {
        let converter = LinkConverter::new(Arc::clone(&self.provider), self.settings.fetch_timeout);
        let progress = ProgressCounter::new(refs.len(), self.settings.batch_size);

        run_bounded(refs, self.settings.max_workers, cancel, |video| {
            let converter = &converter;
            let progress = &progress;
            let dedup = Arc::clone(dedup);
            async move {
                if !dedup.claim(&video.handle) {
                    self.store
                        .append_log(
                            task_id,
                            &format!("Skipping duplicate creator: {}", video.handle),
                        )
                        .await;
                    return None;
                }

                let record = converter.convert(&video).await;
                if let Some(message) = progress.tick("Converted") {
                    self.store.set_progress(task_id, &message).await;
                }
                Some(record)
            }
        })
        .await
    }

    /// Enrichment phase: canonical records → enriched output rows
    async fn enrich_creators(
        &self,
        task_id: Uuid,
        records: Vec<CreatorRecord>,
        dedup: &Arc<DedupSet>,
        claim: bool,
        cancel: &CancellationToken,
    ) -> Vec<EnrichedCreator> {
        let enricher = CreatorEnricher::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.classifier),
            self.settings.fetch_timeout,
            self.settings.classify_timeout,
        );
        let progress = ProgressCounter::new(records.len(), self.settings.batch_size);

        run_bounded(records, self.settings.max_workers, cancel, |record| {
            let enricher = &enricher;
            let progress = &progress;
            let dedup = Arc::clone(dedup);
            async move {
                if claim && !dedup.claim(&record.author_unique_id) {
                    self.store
                        .append_log(
                            task_id,
                            &format!("Skipping duplicate creator: {}", record.author_unique_id),
                        )
                        .await;
                    return None;
                }

                let enriched = enricher.enrich(record).await;
                if let Some(message) = progress.tick("Processed") {
                    self.store.set_progress(task_id, &message).await;
                }
                Some(enriched)
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_derive_from_config() {
        let mut config = TomlConfig::default();
        config.pipeline.max_workers = 7;
        config.pipeline.task_budget_secs = 60;
        config.provider.timeout_secs = 5;

        let settings = PipelineSettings::from_config(&config);
        assert_eq!(settings.max_workers, 7);
        assert_eq!(settings.task_budget, Duration::from_secs(60));
        assert_eq!(settings.fetch_timeout, Duration::from_secs(5));
        assert_eq!(settings.classify_timeout, Duration::from_secs(20));
    }

    #[test]
    fn progress_counter_reports_at_batch_boundaries() {
        let progress = ProgressCounter::new(7, 3);
        let mut messages = Vec::new();
        for _ in 0..7 {
            if let Some(message) = progress.tick("Processed") {
                messages.push(message);
            }
        }
        assert_eq!(
            messages,
            vec![
                "Processed 3/7 creators...",
                "Processed 6/7 creators...",
                "Processed 7/7 creators..."
            ]
        );
    }

    #[test]
    fn progress_counter_handles_zero_batch() {
        let progress = ProgressCounter::new(2, 0);
        assert!(progress.tick("Processed").is_some());
        assert!(progress.tick("Processed").is_some());
    }
}
