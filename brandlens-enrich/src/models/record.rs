//! Input and output record shapes
//!
//! `VideoRef` is one raw CSV row (video link + creator handle). `CreatorRecord`
//! is the canonical pre-enrichment shape both input formats normalize to.
//! `EnrichedCreator` is the canonical output row with a stable column schema.

use serde::{Deserialize, Serialize};

use crate::services::classifier::Classification;

/// One raw video reference from a CSV input row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    /// Full video URL
    pub link: String,
    /// Creator handle extracted from the link (dedup key)
    pub handle: String,
    /// Numeric video id extracted from the link
    pub video_id: String,
}

/// Canonical pre-enrichment creator record
///
/// Fields missing from the input or from a failed sub-fetch stay at their
/// zero/empty defaults; the record itself is never dropped for that reason.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatorRecord {
    pub video_id: String,
    /// Creator handle; the dedup key for the whole pipeline
    pub author_unique_id: String,
    pub author_nickname: String,
    pub signature: String,
    pub title: String,
    /// Unix timestamp as a string, empty when unknown
    pub create_time: String,
    pub author_avatar: String,
    pub author_followers_count: u64,
    pub author_followings_count: u64,
    pub video_count: u64,
    pub video_diggcount: u64,
    pub video_playcount: u64,
    pub video_sharecount: u64,
    pub video_commentcount: u64,
}

impl CreatorRecord {
    /// Minimal record carrying only identity, for link conversion fallback
    pub fn from_handle(video_id: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            author_unique_id: handle.into(),
            ..Self::default()
        }
    }

    /// Profile URL for this creator
    pub fn author_link(&self) -> String {
        format!("https://www.tiktok.com/@{}", self.author_unique_id)
    }
}

/// Canonical enriched output record
///
/// Column order here is the artifact CSV schema; keep it stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedCreator {
    pub video_id: String,
    pub author_unique_id: String,
    pub author_link: String,
    pub signature: String,
    pub is_brand: bool,
    pub is_matrix_account: bool,
    pub is_ugc_creator: bool,
    pub brand_name: String,
    pub analysis_details: String,
    pub author_followers_count: u64,
    pub author_followings_count: u64,
    pub video_count: u64,
    pub author_avatar: String,
    /// Creation date as YYYY-MM-DD, empty when unknown
    pub create_times: String,
}

impl EnrichedCreator {
    /// Assemble the output record from the canonical input and its classification
    pub fn from_parts(record: &CreatorRecord, classification: Classification, create_times: String) -> Self {
        Self {
            video_id: record.video_id.clone(),
            author_unique_id: record.author_unique_id.clone(),
            author_link: record.author_link(),
            // Newlines would break single-row CSV semantics downstream.
            signature: record.signature.replace(['\n', '\r'], " "),
            is_brand: classification.is_brand,
            is_matrix_account: classification.is_matrix_account,
            is_ugc_creator: classification.is_ugc_creator,
            brand_name: classification.brand_name,
            analysis_details: classification.details.replace(['\n', '\r'], " "),
            author_followers_count: record.author_followers_count,
            author_followings_count: record.author_followings_count,
            video_count: record.video_count,
            author_avatar: record.author_avatar.clone(),
            create_times,
        }
    }

    /// Whether this creator belongs to the brand-related partition
    ///
    /// Brand-related means a concrete brand was extracted, or the account is
    /// an official brand or matrix account.
    pub fn is_brand_related(&self) -> bool {
        !self.brand_name.trim().is_empty() || self.is_brand || self.is_matrix_account
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_link_derives_from_handle() {
        let record = CreatorRecord::from_handle("123", "getnoteai");
        assert_eq!(record.author_link(), "https://www.tiktok.com/@getnoteai");
    }

    #[test]
    fn brand_related_covers_all_three_signals() {
        let record = CreatorRecord::from_handle("1", "a");

        let brand = EnrichedCreator::from_parts(
            &record,
            Classification {
                is_brand: true,
                ..Classification::default_ugc("")
            },
            String::new(),
        );
        assert!(brand.is_brand_related());

        let matrix = EnrichedCreator::from_parts(
            &record,
            Classification {
                is_matrix_account: true,
                is_ugc_creator: false,
                ..Classification::default_ugc("")
            },
            String::new(),
        );
        assert!(matrix.is_brand_related());

        let ugc_with_brand = EnrichedCreator::from_parts(
            &record,
            Classification {
                brand_name: "Nike".to_string(),
                ..Classification::default_ugc("")
            },
            String::new(),
        );
        assert!(ugc_with_brand.is_brand_related());

        let plain = EnrichedCreator::from_parts(&record, Classification::default_ugc(""), String::new());
        assert!(!plain.is_brand_related());
    }

    #[test]
    fn from_parts_strips_newlines() {
        let mut record = CreatorRecord::from_handle("1", "a");
        record.signature = "line one\nline two\r\n".to_string();
        let enriched = EnrichedCreator::from_parts(&record, Classification::default_ugc(""), String::new());
        assert!(!enriched.signature.contains('\n'));
        assert!(!enriched.signature.contains('\r'));
    }
}
