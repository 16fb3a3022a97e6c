//! audiograb - search YouTube from the terminal and grab the audio
//!
//! The library holds the decision core (aggregating search results, ranking audio
//! renditions, resolving the user's choice) and the plumbing around it: the Data API
//! client, the yt-dlp backed video-info provider and the download/transcode orchestrator.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod download;
pub mod metadata;
pub mod prompt;
pub mod rendition;
pub mod session;
pub mod utils;

pub use aggregate::{aggregate, AggregatedVideo, ApprovalRatio};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use download::{DownloadOrchestrator, ProcessRunner};
pub use metadata::{MetadataProvider, Rendition, SearchHit, VideoInfo, VideoInfoProvider, VideoStats};
pub use rendition::{ResolvedSelection, SelectionMode};
pub use session::Session;

/// Result type used throughout the library
pub type Result<T, E = GrabError> = std::result::Result<T, E>;

/// Error types for every stage of a session
#[derive(thiserror::Error, Debug)]
pub enum GrabError {
    #[error("Request rejected by the API (most likely an invalid API key): {0}")]
    Credential(String),

    #[error("Network request failed: {0}")]
    Network(String),

    #[error("Failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("Search results and video statistics do not line up: {0}")]
    Alignment(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("No {0} available")]
    EmptySet(String),

    #[error("Failed to get video info for {id}: {reason}")]
    VideoInfo { id: String, reason: String },

    #[error("Failed to create output file: {source}")]
    FileCreate {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Transcode failed: {0}")]
    Transcode(String),

    #[error("Converted to {}, but the intermediate file could not be removed: {source}", .output.display())]
    Cleanup {
        path: std::path::PathBuf,
        output: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl GrabError {
    pub(crate) fn parse(what: impl Into<String>, reason: impl ToString) -> Self {
        GrabError::Parse {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for GrabError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GrabError::parse("API response", err)
        } else {
            GrabError::Network(err.to_string())
        }
    }
}
