use async_trait::async_trait;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::rendition::{ResolvedSelection, SelectionMode};
use crate::{GrabError, Result};

/// How an external process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    pub success: bool,
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn success() -> Self {
        Self {
            success: true,
            code: Some(0),
        }
    }

    #[cfg(test)]
    pub fn failed(code: i32) -> Self {
        Self {
            success: false,
            code: Some(code),
        }
    }

    fn describe(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "termination by signal".to_string(),
        }
    }
}

/// Runs an external program to completion
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<ProcessExit>;
}

/// Runs programs attached to this process's stdin, stdout and stderr
pub struct InheritedStdioRunner;

#[async_trait]
impl ProcessRunner for InheritedStdioRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<ProcessExit> {
        tracing::debug!("Running {} {}", program, args.join(" "));

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;

        Ok(ProcessExit {
            success: status.success(),
            code: status.code(),
        })
    }
}

/// Drives the downloader and, in fastest mode, the transcoder
pub struct DownloadOrchestrator {
    runner: Box<dyn ProcessRunner>,
    downloader: String,
    transcoder: String,
    default_bitrate_kbps: u32,
}

impl DownloadOrchestrator {
    pub fn new(
        runner: Box<dyn ProcessRunner>,
        downloader: impl Into<String>,
        transcoder: impl Into<String>,
        default_bitrate_kbps: u32,
    ) -> Self {
        Self {
            runner,
            downloader: downloader.into(),
            transcoder: transcoder.into(),
            default_bitrate_kbps,
        }
    }

    /// Bitrate passed to the transcoder, in kbps
    pub fn transcode_bitrate(&self, selection: &ResolvedSelection) -> u32 {
        match selection.rendition.bitrate {
            0 => self.default_bitrate_kbps,
            known => known,
        }
    }

    /// Download the selection next to `destination_base` and return the final artifact.
    ///
    /// Every failure is final. When transcoding succeeds but the intermediate file
    /// can't be removed, the mp3 is already complete and stays on disk. Status
    /// notices go to `out`; the external tools write to the inherited streams.
    pub async fn execute<W: Write>(
        &self,
        selection: &ResolvedSelection,
        destination_base: &Path,
        video_id: &str,
        out: &mut W,
    ) -> Result<PathBuf> {
        let download_path = with_extension(destination_base, &selection.rendition.file_extension);

        fs_err::File::create(&download_path).map_err(|source| GrabError::FileCreate {
            path: download_path.clone(),
            source,
        })?;

        tracing::info!(
            "Downloading format {} of {} to {}",
            selection.rendition.format_id,
            video_id,
            download_path.display()
        );

        let download_args = vec![
            "-f".to_string(),
            selection.rendition.format_id.clone(),
            "--force-overwrites".to_string(),
            "-o".to_string(),
            download_path.to_string_lossy().into_owned(),
            "--".to_string(),
            video_id.to_string(),
        ];
        let exit = self
            .runner
            .run(&self.downloader, &download_args)
            .await
            .map_err(|e| GrabError::Download(format!("failed to launch {}: {}", self.downloader, e)))?;
        if !exit.success {
            return Err(GrabError::Download(format!(
                "{} ended with {}",
                self.downloader,
                exit.describe()
            )));
        }

        if selection.mode != SelectionMode::Fastest {
            return Ok(download_path);
        }

        let bitrate = self.transcode_bitrate(selection);
        let mp3_path = with_extension(destination_base, "mp3");
        writeln!(out, "\nConverting to mp3 with bitrate {}k... \n", bitrate)?;
        out.flush()?;

        let transcode_args = vec![
            "-i".to_string(),
            download_path.to_string_lossy().into_owned(),
            "-f".to_string(),
            "mp3".to_string(),
            "-b:a".to_string(),
            format!("{}k", bitrate),
            "-vn".to_string(),
            mp3_path.to_string_lossy().into_owned(),
        ];
        let exit = self
            .runner
            .run(&self.transcoder, &transcode_args)
            .await
            .map_err(|e| GrabError::Transcode(format!("failed to launch {}: {}", self.transcoder, e)))?;
        if !exit.success {
            return Err(GrabError::Transcode(format!(
                "{} ended with {}",
                self.transcoder,
                exit.describe()
            )));
        }

        fs_err::remove_file(&download_path).map_err(|source| GrabError::Cleanup {
            path: download_path.clone(),
            output: mp3_path.clone(),
            source,
        })?;
        tracing::debug!("Removed intermediate file {}", download_path.display());

        Ok(mp3_path)
    }
}

/// Append `.ext` without touching dots already in the base name
fn with_extension(base: &Path, ext: &str) -> PathBuf {
    let mut name: OsString = base.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Rendition;
    use mockall::Sequence;

    fn selection(ext: &str, bitrate: u32, mode: SelectionMode) -> ResolvedSelection {
        ResolvedSelection {
            rendition: Rendition {
                format_id: "18".to_string(),
                encoding_name: "mp4a.40.2".to_string(),
                bitrate,
                file_extension: ext.to_string(),
                has_video: mode == SelectionMode::Fastest,
            },
            mode,
        }
    }

    fn orchestrator(runner: MockProcessRunner) -> DownloadOrchestrator {
        DownloadOrchestrator::new(Box::new(runner), "yt-dlp", "ffmpeg", 192)
    }

    #[test]
    fn test_with_extension_keeps_dots() {
        let path = with_extension(Path::new("/tmp/Track 1.0 remix"), "m4a");
        assert_eq!(path, PathBuf::from("/tmp/Track 1.0 remix.m4a"));
    }

    #[tokio::test]
    async fn test_numbered_download_keeps_native_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("song");

        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|program: &str, args: &[String]| {
                program == "yt-dlp"
                    && args[0] == "-f"
                    && args[1] == "18"
                    && args.last().map(String::as_str) == Some("vid123")
            })
            .times(1)
            .returning(|_, _| Ok(ProcessExit::success()));

        let result = orchestrator(runner)
            .execute(&selection("m4a", 128, SelectionMode::Numbered), &base, "vid123", &mut std::io::sink())
            .await
            .unwrap();

        assert_eq!(result, dir.path().join("song.m4a"));
        assert!(result.exists());
    }

    #[tokio::test]
    async fn test_fastest_uses_default_bitrate_then_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("song");
        let mut seq = Sequence::new();

        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|program: &str, _: &[String]| program == "yt-dlp")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(ProcessExit::success()));

        let intermediate = dir.path().join("song.mp4");
        runner
            .expect_run()
            .withf(|program: &str, args: &[String]| {
                program == "ffmpeg" && args.iter().any(|a| a == "192k") && args.iter().any(|a| a == "-vn")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, _| {
                assert!(intermediate.exists(), "intermediate removed before transcode finished");
                Ok(ProcessExit::success())
            });

        let result = orchestrator(runner)
            .execute(&selection("mp4", 0, SelectionMode::Fastest), &base, "vid123", &mut std::io::sink())
            .await
            .unwrap();

        assert_eq!(result, dir.path().join("song.mp3"));
        assert!(!dir.path().join("song.mp4").exists());
    }

    #[tokio::test]
    async fn test_fastest_announces_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("song");

        let mut runner = MockProcessRunner::new();
        runner.expect_run().returning(|_, _| Ok(ProcessExit::success()));

        let mut out = Vec::new();
        orchestrator(runner)
            .execute(&selection("mp4", 0, SelectionMode::Fastest), &base, "vid123", &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Converting to mp3 with bitrate 192k"));
    }

    #[tokio::test]
    async fn test_numbered_download_prints_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("song");

        let mut runner = MockProcessRunner::new();
        runner.expect_run().times(1).returning(|_, _| Ok(ProcessExit::success()));

        let mut out = Vec::new();
        orchestrator(runner)
            .execute(&selection("m4a", 128, SelectionMode::Numbered), &base, "vid123", &mut out)
            .await
            .unwrap();

        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_failed_cleanup_reports_finished_mp3() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("song");

        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|program: &str, _: &[String]| program == "yt-dlp")
            .returning(|_, _| Ok(ProcessExit::success()));

        let intermediate = dir.path().join("song.mp4");
        let mp3 = dir.path().join("song.mp3");
        let written = mp3.clone();
        runner
            .expect_run()
            .withf(|program: &str, _: &[String]| program == "ffmpeg")
            .times(1)
            .returning(move |_, _| {
                fs_err::write(&written, b"ID3").unwrap();
                fs_err::remove_file(&intermediate).unwrap();
                Ok(ProcessExit::success())
            });

        let result = orchestrator(runner)
            .execute(&selection("mp4", 0, SelectionMode::Fastest), &base, "vid123", &mut std::io::sink())
            .await;

        match result {
            Err(GrabError::Cleanup { path, output, .. }) => {
                assert_eq!(path, dir.path().join("song.mp4"));
                assert_eq!(output, mp3);
                assert!(mp3.exists());
            }
            other => panic!("expected a cleanup error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fastest_uses_known_bitrate() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("song");

        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|program: &str, _: &[String]| program == "yt-dlp")
            .returning(|_, _| Ok(ProcessExit::success()));
        runner
            .expect_run()
            .withf(|program: &str, args: &[String]| program == "ffmpeg" && args.iter().any(|a| a == "256k"))
            .times(1)
            .returning(|_, _| Ok(ProcessExit::success()));

        orchestrator(runner)
            .execute(&selection("mp4", 256, SelectionMode::Fastest), &base, "vid123", &mut std::io::sink())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_transcode_leaves_intermediate() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("song");

        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|program: &str, _: &[String]| program == "yt-dlp")
            .returning(|_, _| Ok(ProcessExit::success()));
        runner
            .expect_run()
            .withf(|program: &str, _: &[String]| program == "ffmpeg")
            .returning(|_, _| Ok(ProcessExit::failed(1)));

        let result = orchestrator(runner)
            .execute(&selection("mp4", 0, SelectionMode::Fastest), &base, "vid123", &mut std::io::sink())
            .await;

        assert!(matches!(result, Err(GrabError::Transcode(_))));
        assert!(dir.path().join("song.mp4").exists());
    }

    #[tokio::test]
    async fn test_download_failure_skips_transcode() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("song");

        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|program: &str, _: &[String]| program == "yt-dlp")
            .times(1)
            .returning(|_, _| Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no such file")));
        runner
            .expect_run()
            .withf(|program: &str, _: &[String]| program == "ffmpeg")
            .never();

        let result = orchestrator(runner)
            .execute(&selection("mp4", 0, SelectionMode::Fastest), &base, "vid123", &mut std::io::sink())
            .await;

        assert!(matches!(result, Err(GrabError::Download(_))));
    }

    #[tokio::test]
    async fn test_unwritable_destination_is_file_create_error() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("missing-dir").join("song");

        let mut runner = MockProcessRunner::new();
        runner.expect_run().never();

        let result = orchestrator(runner)
            .execute(&selection("m4a", 128, SelectionMode::Best), &base, "vid123", &mut std::io::sink())
            .await;

        assert!(matches!(result, Err(GrabError::FileCreate { .. })));
    }
}
