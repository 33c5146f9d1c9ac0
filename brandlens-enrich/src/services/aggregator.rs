//! Result aggregation and artifact writing
//!
//! Partitions enriched records into brand-related and non-brand sets, writes
//! one CSV artifact per partition with a stable column schema, and produces
//! the result summary. Artifact filenames derive deterministically from the
//! input base name, the partition suffix and a timestamp.

use brandlens_common::{Error, Result};
use std::path::{Path, PathBuf};

use crate::models::{EnrichedCreator, ResultSummary};

/// Writes category artifacts and builds the result summary
pub struct ResultAggregator {
    output_dir: PathBuf,
}

impl ResultAggregator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Timestamp component used in artifact filenames
    pub fn artifact_stamp() -> String {
        chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string()
    }

    /// Artifact filename for one partition
    pub fn artifact_name(input_base: &str, partition: &str, stamp: &str) -> String {
        format!("{}_{}_{}.csv", input_base, partition, stamp)
    }

    /// Partition, persist and summarize the enriched records
    ///
    /// A failed artifact write is a task-level error: the task cannot be
    /// considered complete without its declared outputs.
    pub fn aggregate(
        &self,
        input_base: &str,
        stamp: &str,
        records: &[EnrichedCreator],
    ) -> Result<ResultSummary> {
        let (brand_related, non_brand): (Vec<_>, Vec<_>) = records
            .iter()
            .cloned()
            .partition(|record| record.is_brand_related());

        let brand_file = Self::artifact_name(input_base, "brand_related", stamp);
        let non_brand_file = Self::artifact_name(input_base, "non_brand", stamp);

        std::fs::create_dir_all(&self.output_dir)?;
        self.write_partition(&self.output_dir.join(&brand_file), &brand_related)?;
        self.write_partition(&self.output_dir.join(&non_brand_file), &non_brand)?;

        let summary =
            ResultSummary::from_partitions(&brand_related, &non_brand, brand_file, non_brand_file);

        tracing::info!(
            total = summary.total_processed,
            brand_related = summary.brand_related_count,
            non_brand = summary.non_brand_count,
            official = summary.official_account_count,
            matrix = summary.matrix_account_count,
            ugc = summary.ugc_creator_count,
            "Aggregation complete"
        );

        Ok(summary)
    }

    fn write_partition(&self, path: &Path, records: &[EnrichedCreator]) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_path(path)
            .map_err(|e| Error::Internal(format!("Create artifact {} failed: {}", path.display(), e)))?;

        for record in records {
            writer
                .serialize(record)
                .map_err(|e| Error::Internal(format!("Write artifact {} failed: {}", path.display(), e)))?;
        }

        writer
            .flush()
            .map_err(|e| Error::Internal(format!("Flush artifact {} failed: {}", path.display(), e)))?;

        tracing::info!(path = %path.display(), rows = records.len(), "Artifact written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreatorRecord;
    use crate::services::classifier::Classification;
    use tempfile::TempDir;

    fn enriched(handle: &str, is_brand: bool) -> EnrichedCreator {
        let classification = if is_brand {
            Classification {
                is_brand: true,
                is_ugc_creator: false,
                brand_name: handle.to_string(),
                ..Classification::default_ugc("")
            }
        } else {
            Classification::default_ugc("")
        };
        EnrichedCreator::from_parts(
            &CreatorRecord::from_handle("1", handle),
            classification,
            String::new(),
        )
    }

    #[test]
    fn artifact_names_are_deterministic() {
        assert_eq!(
            ResultAggregator::artifact_name("shoe_list", "brand_related", "20260201_120000"),
            "shoe_list_brand_related_20260201_120000.csv"
        );
        assert_eq!(
            ResultAggregator::artifact_name("shoe_list", "non_brand", "20260201_120000"),
            "shoe_list_non_brand_20260201_120000.csv"
        );
    }

    #[test]
    fn writes_both_partitions_and_counts_them() {
        let dir = TempDir::new().unwrap();
        let aggregator = ResultAggregator::new(dir.path());

        let records = vec![
            enriched("acme", true),
            enriched("nat", false),
            enriched("sam", false),
        ];

        let summary = aggregator.aggregate("creators", "20260201_120000", &records).unwrap();
        assert_eq!(summary.total_processed, 3);
        assert_eq!(summary.brand_related_count, 1);
        assert_eq!(summary.non_brand_count, 2);

        let brand_path = dir.path().join(&summary.brand_file);
        let non_brand_path = dir.path().join(&summary.non_brand_file);
        assert!(brand_path.exists());
        assert!(non_brand_path.exists());

        // Header plus one data row in the brand-related artifact.
        let mut reader = csv::Reader::from_path(&brand_path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.get(0), Some("video_id"));
        assert_eq!(headers.get(1), Some("author_unique_id"));
        assert_eq!(headers.len(), 14);
        assert_eq!(reader.records().count(), 1);
    }

    #[test]
    fn empty_partitions_still_produce_artifacts() {
        let dir = TempDir::new().unwrap();
        let aggregator = ResultAggregator::new(dir.path());

        let summary = aggregator.aggregate("empty", "20260201_120000", &[]).unwrap();
        assert_eq!(summary.total_processed, 0);
        assert_eq!(summary.official_account_percentage, 0);
        assert!(dir.path().join(&summary.brand_file).exists());
        assert!(dir.path().join(&summary.non_brand_file).exists());
    }

    #[test]
    fn unwritable_output_dir_is_an_error() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("not_a_dir");
        std::fs::write(&file_path, b"x").unwrap();

        let aggregator = ResultAggregator::new(&file_path);
        let result = aggregator.aggregate("creators", "20260201_120000", &[]);
        assert!(result.is_err());
    }
}
