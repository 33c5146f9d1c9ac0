//! Creator data-provider API client
//!
//! Two independent sub-fetches are exposed: creator profile info and video
//! content info. Callers treat every failure mode (transport error, bad
//! status, provider error code, malformed payload) uniformly as "field
//! unavailable" and keep the record with default values.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

const RATE_LIMIT_MS: u64 = 100;

/// Provider client errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("provider error code {0}")]
    Api(i64),

    #[error("malformed payload: {0}")]
    Parse(String),
}

/// Creator profile info from the provider
#[derive(Debug, Clone, Default)]
pub struct CreatorProfile {
    pub nickname: String,
    pub signature: String,
    pub follower_count: u64,
    pub following_count: u64,
    pub video_count: u64,
    pub avatar: String,
}

/// Video content info from the provider
#[derive(Debug, Clone, Default)]
pub struct VideoDetails {
    pub title: String,
    /// Unix timestamp as reported by the provider
    pub create_time: String,
    pub cover: String,
    pub digg_count: u64,
    pub play_count: u64,
    pub share_count: u64,
    pub comment_count: u64,
    /// Author fields as a fallback when the profile sub-fetch failed
    pub author_nickname: String,
    pub author_signature: String,
}

/// External data-provider boundary
#[async_trait]
pub trait CreatorDataProvider: Send + Sync {
    /// Fetch profile info for a creator handle
    async fn fetch_profile(&self, unique_id: &str) -> Result<CreatorProfile, ProviderError>;

    /// Fetch content info for a video link
    async fn fetch_content(&self, video_link: &str) -> Result<VideoDetails, ProviderError>;
}

/// Minimum-interval limiter to stay under provider rate limits
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::trace!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    code: i64,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ProfileData {
    #[serde(default)]
    user: ProfileUser,
    #[serde(default)]
    stats: ProfileStats,
}

#[derive(Debug, Default, Deserialize)]
struct ProfileUser {
    #[serde(default)]
    nickname: String,
    #[serde(default)]
    signature: String,
    #[serde(default, rename = "avatarThumb")]
    avatar_thumb: String,
}

#[derive(Debug, Default, Deserialize)]
struct ProfileStats {
    #[serde(default, rename = "followerCount")]
    follower_count: u64,
    #[serde(default, rename = "followingCount")]
    following_count: u64,
    #[serde(default, rename = "videoCount")]
    video_count: u64,
}

#[derive(Debug, Default, Deserialize)]
struct VideoData {
    #[serde(default)]
    title: String,
    #[serde(default)]
    create_time: serde_json::Value,
    #[serde(default)]
    cover: String,
    #[serde(default)]
    digg_count: u64,
    #[serde(default)]
    play_count: u64,
    #[serde(default)]
    share_count: u64,
    #[serde(default)]
    comment_count: u64,
    #[serde(default)]
    author: VideoAuthor,
}

#[derive(Debug, Default, Deserialize)]
struct VideoAuthor {
    #[serde(default)]
    nickname: String,
    #[serde(default)]
    signature: String,
}

/// HTTP client for the creator data provider
pub struct ProviderClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    rate_limiter: Arc<RateLimiter>,
}

impl ProviderClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        self.rate_limiter.wait().await;

        let response = self
            .http_client
            .get(url)
            .query(query)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        if envelope.code != 0 {
            return Err(ProviderError::Api(envelope.code));
        }

        envelope
            .data
            .ok_or_else(|| ProviderError::Parse("missing data field".to_string()))
    }
}

#[async_trait]
impl CreatorDataProvider for ProviderClient {
    async fn fetch_profile(&self, unique_id: &str) -> Result<CreatorProfile, ProviderError> {
        let url = format!("{}/user/info", self.base_url);
        tracing::debug!(handle = %unique_id, "Fetching creator profile");

        let data: ProfileData = self.get_json(&url, &[("unique_id", unique_id)]).await?;

        Ok(CreatorProfile {
            nickname: data.user.nickname,
            signature: data.user.signature,
            follower_count: data.stats.follower_count,
            following_count: data.stats.following_count,
            video_count: data.stats.video_count,
            avatar: data.user.avatar_thumb,
        })
    }

    async fn fetch_content(&self, video_link: &str) -> Result<VideoDetails, ProviderError> {
        let url = format!("{}/video/info", self.base_url);
        tracing::debug!(link = %video_link, "Fetching video details");

        let data: VideoData = self.get_json(&url, &[("url", video_link)]).await?;

        // Providers report create_time as either a number or a string.
        let create_time = match &data.create_time {
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::String(s) => s.clone(),
            _ => String::new(),
        };

        Ok(VideoDetails {
            title: data.title,
            create_time,
            cover: data.cover,
            digg_count: data.digg_count,
            play_count: data.play_count,
            share_count: data.share_count,
            comment_count: data.comment_count,
            author_nickname: data.author.nickname,
            author_signature: data.author.signature,
        })
    }
}
