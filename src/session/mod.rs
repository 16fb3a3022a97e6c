use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use crate::aggregate::aggregate;
use crate::download::DownloadOrchestrator;
use crate::metadata::{MetadataProvider, VideoInfoProvider};
use crate::prompt::Console;
use crate::rendition::RenditionMenu;
use crate::utils::sanitize_filename;
use crate::{GrabError, Result};

/// How a session ended when nothing went wrong
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    NoResults,
    Completed(PathBuf),
}

/// One search → select → download run
pub struct Session {
    metadata: Box<dyn MetadataProvider>,
    video_info: Box<dyn VideoInfoProvider>,
    orchestrator: DownloadOrchestrator,
    output_dir: PathBuf,
    show_progress: bool,
}

impl Session {
    pub fn new(
        metadata: Box<dyn MetadataProvider>,
        video_info: Box<dyn VideoInfoProvider>,
        orchestrator: DownloadOrchestrator,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            metadata,
            video_info,
            orchestrator,
            output_dir,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn spinner(&self, message: &'static str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
            progress.set_style(style);
        }
        progress.set_message(message);
        progress.enable_steady_tick(Duration::from_millis(100));
        progress
    }

    pub async fn run<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
        query: Option<String>,
    ) -> Result<SessionOutcome> {
        let query = match query {
            Some(q) => q,
            None => console.ask("Enter search query: ")?,
        };

        tracing::info!("Searching for {:?}", query);
        let progress = self.spinner("Searching...");
        let hits = self.metadata.search(&query).await;
        progress.finish_and_clear();
        let hits = hits?;

        if hits.is_empty() {
            console.println("No videos found for that query.")?;
            return Ok(SessionOutcome::NoResults);
        }

        let ids: Vec<String> = hits.iter().map(|h| h.video_id.clone()).collect();
        let progress = self.spinner("Fetching video statistics...");
        let stats = self.metadata.video_stats(&ids).await;
        progress.finish_and_clear();

        let results = aggregate(&hits, &stats?)?;
        console.show_results(&results)?;

        let rank = console.choose_video(&results)?;
        let video_id = results
            .at_rank(rank)
            .map(|v| v.video_id.clone())
            .ok_or_else(|| GrabError::InvalidSelection(format!("no video at position {}", rank + 1)))?;

        console.println("Fetching info...")?;
        let progress = self.spinner("Resolving formats...");
        let info = self.video_info.video_info(&video_id).await;
        progress.finish_and_clear();
        let info = info?;

        let menu = RenditionMenu::new(&info.renditions)?;
        console.show_renditions(&menu)?;
        let selection = console.choose_rendition(&menu)?;
        tracing::info!(
            "Selected format {} ({:?}) of {}",
            selection.rendition.format_id,
            selection.mode,
            video_id
        );

        let mut base_name = sanitize_filename(&info.title);
        if base_name.is_empty() {
            base_name = sanitize_filename(&video_id);
        }
        let destination_base = self.output_dir.join(base_name);

        let artifact = self
            .orchestrator
            .execute(&selection, &destination_base, &video_id, console.writer())
            .await?;

        console.println("Done")?;
        Ok(SessionOutcome::Completed(artifact))
    }
}
