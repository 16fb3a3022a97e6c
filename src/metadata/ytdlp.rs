use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;

use super::{Rendition, VideoInfo, VideoInfoProvider};
use crate::{GrabError, Result};

/// Video info provider backed by `yt-dlp --dump-json`
pub struct YtDlpInfo {
    yt_dlp_path: String,
}

#[derive(Debug, Deserialize)]
struct DumpedVideo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    formats: Vec<DumpedFormat>,
}

#[derive(Debug, Deserialize)]
struct DumpedFormat {
    format_id: String,
    #[serde(default)]
    ext: String,
    acodec: Option<String>,
    vcodec: Option<String>,
    abr: Option<f64>,
}

impl YtDlpInfo {
    pub fn new(yt_dlp_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
        }
    }
}

fn codec_name(codec: Option<String>) -> String {
    match codec {
        Some(c) if c != "none" => c,
        _ => String::new(),
    }
}

impl From<DumpedFormat> for Rendition {
    fn from(format: DumpedFormat) -> Self {
        let bitrate = format
            .abr
            .filter(|abr| abr.is_finite() && *abr > 0.0)
            .map(|abr| abr.round() as u32)
            .unwrap_or(0);

        Rendition {
            format_id: format.format_id,
            encoding_name: codec_name(format.acodec),
            bitrate,
            file_extension: format.ext,
            has_video: !codec_name(format.vcodec).is_empty(),
        }
    }
}

/// Parse the JSON document yt-dlp prints for a single video.
///
/// Formats carrying neither audio nor video (storyboards) are dropped.
pub fn parse_video_info(json: &str) -> Result<VideoInfo> {
    let dumped: DumpedVideo =
        serde_json::from_str(json).map_err(|e| GrabError::parse("yt-dlp video info", e))?;

    let renditions: Vec<Rendition> = dumped
        .formats
        .into_iter()
        .map(Rendition::from)
        .filter(|r| r.has_audio() || r.has_video)
        .collect();

    Ok(VideoInfo {
        title: dumped.title,
        renditions,
    })
}

#[async_trait]
impl VideoInfoProvider for YtDlpInfo {
    async fn video_info(&self, video_id: &str) -> Result<VideoInfo> {
        tracing::debug!("Extracting video info for: {}", video_id);

        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--no-playlist", url.as_str()])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| GrabError::VideoInfo {
                id: video_id.to_string(),
                reason: format!("failed to run {}: {}", self.yt_dlp_path, e),
            })?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(GrabError::VideoInfo {
                id: video_id.to_string(),
                reason: error.trim().to_string(),
            });
        }

        let json = String::from_utf8_lossy(&output.stdout);
        parse_video_info(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"{
        "id": "A",
        "title": "Lofi beats / 24h",
        "formats": [
            {"format_id": "sb0", "ext": "mhtml", "acodec": "none", "vcodec": "none"},
            {"format_id": "140", "ext": "m4a", "acodec": "mp4a.40.2", "vcodec": "none", "abr": 129.482},
            {"format_id": "251", "ext": "webm", "acodec": "opus", "vcodec": "none", "abr": 160.0},
            {"format_id": "18", "ext": "mp4", "acodec": "mp4a.40.2", "vcodec": "avc1.42001E", "abr": null}
        ]
    }"#;

    #[test]
    fn test_parse_video_info() {
        let info = parse_video_info(DUMP).unwrap();
        assert_eq!(info.title, "Lofi beats / 24h");
        assert_eq!(info.renditions.len(), 3);

        assert_eq!(info.renditions[0].bitrate, 129);
        assert_eq!(info.renditions[1].encoding_name, "opus");

        let muxed = &info.renditions[2];
        assert!(muxed.has_audio());
        assert!(muxed.has_video);
        assert_eq!(muxed.bitrate, 0);
    }

    #[test]
    fn test_storyboards_never_become_best() {
        let dump = r#"{
            "title": "Only muxed",
            "formats": [
                {"format_id": "sb2", "ext": "mhtml", "acodec": "none", "vcodec": "none"},
                {"format_id": "18", "ext": "mp4", "acodec": "mp4a.40.2", "vcodec": "avc1.42001E"}
            ]
        }"#;

        let info = parse_video_info(dump).unwrap();
        assert!(info.renditions.iter().all(|r| r.format_id != "sb2"));

        let menu = crate::rendition::RenditionMenu::new(&info.renditions).unwrap();
        assert_eq!(menu.best().format_id, "18");
    }

    #[test]
    fn test_parse_video_info_rejects_garbage() {
        assert!(matches!(
            parse_video_info("ERROR: not json"),
            Err(GrabError::Parse { .. })
        ));
    }
}
