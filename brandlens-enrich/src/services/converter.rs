//! Link conversion pre-pass
//!
//! CSV inputs carry raw video links; this pass resolves each link into the
//! canonical creator record by running the two provider sub-fetches (profile
//! info and content info) concurrently, each under its own timeout. A failed
//! or timed-out sub-fetch leaves its fields at defaults.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::models::{CreatorRecord, VideoRef};
use crate::services::provider::{CreatorDataProvider, ProviderError};

/// Resolves one `VideoRef` into a canonical `CreatorRecord`
pub struct LinkConverter {
    provider: Arc<dyn CreatorDataProvider>,
    fetch_timeout: Duration,
}

impl LinkConverter {
    pub fn new(provider: Arc<dyn CreatorDataProvider>, fetch_timeout: Duration) -> Self {
        Self {
            provider,
            fetch_timeout,
        }
    }

    /// Build the canonical record for one video link
    ///
    /// Both sub-fetches run concurrently and count as a single worker slot.
    pub async fn convert(&self, video: &VideoRef) -> CreatorRecord {
        let (profile, details) = tokio::join!(
            timeout(self.fetch_timeout, self.provider.fetch_profile(&video.handle)),
            timeout(self.fetch_timeout, self.provider.fetch_content(&video.link)),
        );

        let profile = unwrap_fetch("profile", &video.handle, profile);
        let details = unwrap_fetch("content", &video.handle, details);

        let mut record = CreatorRecord::from_handle(&video.video_id, &video.handle);

        if let Some(profile) = &profile {
            record.author_nickname = profile.nickname.clone();
            record.signature = profile.signature.clone();
            record.author_followers_count = profile.follower_count;
            record.author_followings_count = profile.following_count;
            record.video_count = profile.video_count;
            record.author_avatar = profile.avatar.clone();
        }

        if let Some(details) = details {
            record.title = details.title;
            record.create_time = details.create_time;
            record.video_diggcount = details.digg_count;
            record.video_playcount = details.play_count;
            record.video_sharecount = details.share_count;
            record.video_commentcount = details.comment_count;
            if record.author_avatar.is_empty() {
                record.author_avatar = details.cover;
            }
            // Author fields from the video payload stand in for a failed
            // profile fetch.
            if profile.is_none() {
                record.author_nickname = details.author_nickname;
                record.signature = details.author_signature;
            }
        }

        tracing::debug!(handle = %video.handle, video_id = %video.video_id, "Link converted");
        record
    }
}

fn unwrap_fetch<T>(
    kind: &str,
    handle: &str,
    result: Result<Result<T, ProviderError>, tokio::time::error::Elapsed>,
) -> Option<T> {
    match result {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            tracing::warn!(handle = %handle, error = %e, "{} sub-fetch failed, using defaults", kind);
            None
        }
        Err(_) => {
            tracing::warn!(handle = %handle, "{} sub-fetch timed out, using defaults", kind);
            None
        }
    }
}
