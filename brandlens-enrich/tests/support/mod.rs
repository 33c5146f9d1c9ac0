//! Shared test doubles for the pipeline integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use brandlens_enrich::services::classifier::{
    Classification, Classifier, ClassifyError, ClassifyRequest,
};
use brandlens_enrich::services::provider::{
    CreatorDataProvider, CreatorProfile, ProviderError, VideoDetails,
};

/// Call counters shared between a test and its mocks
#[derive(Debug, Default)]
pub struct Telemetry {
    pub profile_calls: AtomicUsize,
    pub content_calls: AtomicUsize,
    pub classify_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl Telemetry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn enter(&self) {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn total_provider_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst) + self.content_calls.load(Ordering::SeqCst)
    }
}

/// Scripted in-memory data provider
pub struct MockProvider {
    pub telemetry: Arc<Telemetry>,
    pub delay: Duration,
    pub fail_profile: bool,
    pub fail_content: bool,
}

impl MockProvider {
    pub fn new(telemetry: Arc<Telemetry>) -> Self {
        Self {
            telemetry,
            delay: Duration::ZERO,
            fail_profile: false,
            fail_content: false,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_profile = true;
        self.fail_content = true;
        self
    }
}

#[async_trait]
impl CreatorDataProvider for MockProvider {
    async fn fetch_profile(&self, unique_id: &str) -> Result<CreatorProfile, ProviderError> {
        self.telemetry.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.telemetry.enter();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.telemetry.exit();

        if self.fail_profile {
            return Err(ProviderError::Status(500));
        }
        Ok(CreatorProfile {
            nickname: format!("{} nickname", unique_id),
            signature: format!("bio of {}", unique_id),
            follower_count: 100,
            following_count: 10,
            video_count: 3,
            avatar: format!("http://img/{}", unique_id),
        })
    }

    async fn fetch_content(&self, video_link: &str) -> Result<VideoDetails, ProviderError> {
        self.telemetry.content_calls.fetch_add(1, Ordering::SeqCst);
        self.telemetry.enter();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.telemetry.exit();

        if self.fail_content {
            return Err(ProviderError::Status(500));
        }
        Ok(VideoDetails {
            title: format!("video at {}", video_link),
            create_time: "1700000000".to_string(),
            digg_count: 5,
            play_count: 50,
            ..VideoDetails::default()
        })
    }
}

/// Handle-prefix driven classifier
///
/// `brand*` → official brand, `matrix*` → matrix account, `partner*` → UGC
/// creator with a brand partnership, anything else → plain UGC.
pub struct MockClassifier {
    pub telemetry: Arc<Telemetry>,
    pub delay: Duration,
    pub fail: bool,
}

impl MockClassifier {
    pub fn new(telemetry: Arc<Telemetry>) -> Self {
        Self {
            telemetry,
            delay: Duration::ZERO,
            fail: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, request: &ClassifyRequest) -> Result<Classification, ClassifyError> {
        self.telemetry.classify_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.fail {
            return Err(ClassifyError::EmptyResponse);
        }

        let handle = request.unique_id.as_str();
        let classification = if handle.starts_with("brand") {
            Classification {
                is_brand: true,
                is_matrix_account: false,
                is_ugc_creator: false,
                brand_name: handle.to_string(),
                confidence: 0.95,
                details: "username contains the brand name".to_string(),
            }
        } else if handle.starts_with("matrix") {
            Classification {
                is_brand: false,
                is_matrix_account: true,
                is_ugc_creator: false,
                brand_name: "acme".to_string(),
                confidence: 0.85,
                details: "profile shows a brand affiliation".to_string(),
            }
        } else if handle.starts_with("partner") {
            Classification {
                is_brand: false,
                is_matrix_account: false,
                is_ugc_creator: true,
                brand_name: "acme".to_string(),
                confidence: 0.8,
                details: "partnership tags present".to_string(),
            }
        } else {
            Classification::default_ugc("no brand signals found")
        };

        Ok(classification)
    }
}

/// Write a nested-shape creator JSON file for the given handles
pub fn write_creator_json(path: &std::path::Path, handles: &[&str]) {
    let items: Vec<serde_json::Value> = handles
        .iter()
        .enumerate()
        .map(|(i, handle)| {
            serde_json::json!({
                "title": format!("video {}", i),
                "video_id": format!("{}", 1000 + i),
                "description": format!("bio of {}", handle),
                "basic_info": {
                    "author_unique_id": handle,
                    "author_nickname": format!("{} nickname", handle),
                    "create_time": 1700000000u64,
                    "author_followers": "100"
                }
            })
        })
        .collect();

    std::fs::write(path, serde_json::to_string_pretty(&items).unwrap()).unwrap();
}

/// Write a `video_link,creator_handler` CSV file from (handle, video id) rows
pub fn write_links_csv(path: &std::path::Path, rows: &[(&str, &str)]) {
    let mut content = String::from("video_link,creator_handler\n");
    for (handle, video_id) in rows {
        content.push_str(&format!(
            "https://www.tiktok.com/@{handle}/video/{video_id},{handle}\n"
        ));
    }
    std::fs::write(path, content).unwrap();
}
