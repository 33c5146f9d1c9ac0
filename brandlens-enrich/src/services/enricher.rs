//! Per-creator enrichment
//!
//! Takes one canonical creator record, refreshes its profile fields from the
//! data provider and asks the classifier for a category decision. Either step
//! failing or timing out leaves the corresponding fields at defaults; the
//! record always produces exactly one output row.

use chrono::DateTime;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::models::{CreatorRecord, EnrichedCreator};
use crate::services::classifier::{Classification, Classifier, ClassifyRequest};
use crate::services::provider::CreatorDataProvider;

/// Enriches canonical creator records into output rows
pub struct CreatorEnricher {
    provider: Arc<dyn CreatorDataProvider>,
    classifier: Arc<dyn Classifier>,
    profile_timeout: Duration,
    classify_timeout: Duration,
}

impl CreatorEnricher {
    pub fn new(
        provider: Arc<dyn CreatorDataProvider>,
        classifier: Arc<dyn Classifier>,
        profile_timeout: Duration,
        classify_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            classifier,
            profile_timeout,
            classify_timeout,
        }
    }

    /// Produce exactly one enriched record for this creator
    pub async fn enrich(&self, mut record: CreatorRecord) -> EnrichedCreator {
        let handle = record.author_unique_id.clone();

        // Sub-fetch 1: refresh profile fields from the provider.
        match timeout(self.profile_timeout, self.provider.fetch_profile(&handle)).await {
            Ok(Ok(profile)) => {
                if !profile.signature.is_empty() {
                    record.signature = profile.signature;
                }
                if !profile.nickname.is_empty() {
                    record.author_nickname = profile.nickname;
                }
                record.author_followers_count = profile.follower_count;
                record.author_followings_count = profile.following_count;
                record.video_count = profile.video_count;
                // Input-supplied avatars win over the provider thumbnail.
                if record.author_avatar.is_empty() {
                    record.author_avatar = profile.avatar;
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(handle = %handle, error = %e, "Profile sub-fetch failed, keeping defaults");
            }
            Err(_) => {
                tracing::warn!(handle = %handle, "Profile sub-fetch timed out, keeping defaults");
            }
        }

        if record.signature.is_empty() && !record.author_nickname.is_empty() {
            record.signature = format!("Creator: {}", record.author_nickname);
        }

        // Sub-fetch 2: category decision from the classifier.
        let request = ClassifyRequest {
            unique_id: handle.clone(),
            nickname: record.author_nickname.clone(),
            signature: record.signature.clone(),
            context: build_context(&record.title, &record.signature),
        };

        let classification = match timeout(self.classify_timeout, self.classifier.classify(&request)).await
        {
            Ok(Ok(classification)) => classification.normalized(&handle),
            Ok(Err(e)) => {
                tracing::warn!(handle = %handle, error = %e, "Classification failed, defaulting to UGC");
                Classification::default_ugc("Analysis failed - defaulted to UGC creator")
            }
            Err(_) => {
                tracing::warn!(handle = %handle, "Classification timed out, defaulting to UGC");
                Classification::default_ugc("Analysis timed out - defaulted to UGC creator")
            }
        };

        let create_times = timestamp_to_date(&record.create_time);
        EnrichedCreator::from_parts(&record, classification, create_times)
    }
}

fn build_context(title: &str, description: &str) -> String {
    format!("Title: {}\nDescription: {}", title, description)
        .trim()
        .to_string()
}

/// Convert a unix-timestamp string into YYYY-MM-DD, empty when unparsable
pub fn timestamp_to_date(timestamp: &str) -> String {
    let Ok(seconds) = timestamp.trim().parse::<i64>() else {
        return String::new();
    };
    match DateTime::from_timestamp(seconds, 0) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => {
            tracing::warn!(timestamp = %timestamp, "Timestamp out of range");
            String::new()
        }
    }
}
