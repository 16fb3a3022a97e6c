use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod youtube;
pub mod ytdlp;

use crate::Result;

/// One entry of a search result page, in display rank order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_name: String,
}

/// Statistics for one video, as returned by the batch lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStats {
    /// Id echoed back by the provider; empty when the provider doesn't report it
    pub video_id: String,

    /// ISO-8601 duration token, passed through untouched
    pub duration: String,

    pub view_count: String,

    /// Decimal string, empty when hidden
    pub like_count: String,

    /// Decimal string, empty when hidden
    pub dislike_count: String,
}

/// One downloadable encoding variant of a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendition {
    /// Opaque identifier handed back to the downloader
    pub format_id: String,

    /// Audio codec name, empty for video-only renditions
    pub encoding_name: String,

    /// Audio bitrate in kbps, 0 when unknown
    pub bitrate: u32,

    pub file_extension: String,

    /// Whether the rendition carries a video stream
    pub has_video: bool,
}

impl Rendition {
    pub fn has_audio(&self) -> bool {
        !self.encoding_name.is_empty()
    }
}

/// Title and available renditions of a single video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    pub renditions: Vec<Rendition>,
}

/// Search and batch statistics lookups
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Search videos matching a free-text query
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;

    /// Fetch statistics for the given ids, index-aligned with the request
    async fn video_stats(&self, ids: &[String]) -> Result<Vec<VideoStats>>;
}

/// Resolves a video id into its title and renditions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoInfoProvider: Send + Sync {
    async fn video_info(&self, video_id: &str) -> Result<VideoInfo>;
}
