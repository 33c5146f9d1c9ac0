//! Result summary attached to a completed task
//!
//! Two percentage bases are exposed side by side and must never be conflated:
//! `*_percentage` fields use all processed records as the denominator, while
//! `*_in_related_percentage` fields use only the brand-related subset.

use serde::{Deserialize, Serialize};

use crate::models::EnrichedCreator;

/// Aggregate counts, percentages and artifact references for one task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSummary {
    pub total_processed: u64,
    pub brand_related_count: u64,
    pub non_brand_count: u64,

    pub official_account_count: u64,
    pub matrix_account_count: u64,
    pub ugc_creator_count: u64,
    pub non_branded_creator_count: u64,

    /// Share of all processed records, rounded to the nearest integer
    pub official_account_percentage: u64,
    pub matrix_account_percentage: u64,
    pub ugc_creator_percentage: u64,
    pub non_branded_creator_percentage: u64,

    pub brand_in_related: u64,
    pub matrix_in_related: u64,
    pub ugc_in_related: u64,

    /// Share of the brand-related subset, rounded to the nearest integer
    pub brand_in_related_percentage: u64,
    pub matrix_in_related_percentage: u64,
    pub ugc_in_related_percentage: u64,

    /// Artifact filename for the brand-related partition
    pub brand_file: String,
    /// Artifact filename for the non-brand partition
    pub non_brand_file: String,
}

/// Integer percentage with a zero-denominator guard
pub fn percentage(count: usize, denominator: usize) -> u64 {
    if denominator == 0 {
        return 0;
    }
    ((count as f64 / denominator as f64) * 100.0).round() as u64
}

impl ResultSummary {
    /// Build the summary from the two partitions and their artifact filenames
    pub fn from_partitions(
        brand_related: &[EnrichedCreator],
        non_brand: &[EnrichedCreator],
        brand_file: String,
        non_brand_file: String,
    ) -> Self {
        let total = brand_related.len() + non_brand.len();

        let official = brand_related.iter().filter(|c| c.is_brand).count();
        let matrix = brand_related.iter().filter(|c| c.is_matrix_account).count();
        let ugc = brand_related.iter().filter(|c| c.is_ugc_creator).count();
        let non_branded = non_brand.len();
        let related = brand_related.len();

        Self {
            total_processed: total as u64,
            brand_related_count: related as u64,
            non_brand_count: non_branded as u64,

            official_account_count: official as u64,
            matrix_account_count: matrix as u64,
            ugc_creator_count: ugc as u64,
            non_branded_creator_count: non_branded as u64,

            official_account_percentage: percentage(official, total),
            matrix_account_percentage: percentage(matrix, total),
            ugc_creator_percentage: percentage(ugc, total),
            non_branded_creator_percentage: percentage(non_branded, total),

            brand_in_related: official as u64,
            matrix_in_related: matrix as u64,
            ugc_in_related: ugc as u64,

            brand_in_related_percentage: percentage(official, related),
            matrix_in_related_percentage: percentage(matrix, related),
            ugc_in_related_percentage: percentage(ugc, related),

            brand_file,
            non_brand_file,
        }
    }
}
