use console::style;
use std::io::{self, BufRead, Write};

use crate::aggregate::AggregatedResults;
use crate::rendition::{parse_numbered, RenditionMenu, ResolvedSelection};
use crate::{GrabError, Result};

pub const RENDITION_PROMPT: &str = "Select an audio format by typing the number, or type \"best\" for the best audio, \
\"worst\" for the worst audio, or \"fastest\" to download the full video and then convert to mp3 audio with ffmpeg (fastest method): ";

/// State of a selection prompt
#[derive(Debug)]
enum PromptState<T> {
    Prompting,
    Rejected,
    Validated(T),
}

/// Line-oriented console used for every interactive step
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Output stream for status lines written by other stages
    pub fn writer(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Write text without a newline and flush it
    pub fn print(&mut self, text: &str) -> Result<()> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;
        Ok(())
    }

    pub fn println(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    /// Read one line. End of input is an error since nothing more can be asked.
    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim().to_string())
    }

    /// Ask once and return the trimmed answer
    pub fn ask(&mut self, prompt: &str) -> Result<String> {
        self.print(prompt)?;
        Ok(self.read_line()?)
    }

    /// Ask until a non-empty answer arrives
    pub fn ask_non_empty(&mut self, prompt: &str) -> Result<String> {
        self.print(prompt)?;
        loop {
            let answer = self.read_line()?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            self.print("No input found, try again: ")?;
        }
    }

    /// Prompt until `resolve` accepts the answer.
    ///
    /// Rejected answers and unreadable lines re-prompt; closed input and any error
    /// other than an invalid selection end the loop.
    pub fn select<T>(&mut self, prompt: &str, mut resolve: impl FnMut(&str) -> Result<T>) -> Result<T> {
        self.print(prompt)?;
        let mut state = PromptState::Prompting;

        loop {
            state = match state {
                PromptState::Prompting => match self.read_line() {
                    Ok(token) => match resolve(&token) {
                        Ok(value) => PromptState::Validated(value),
                        Err(GrabError::InvalidSelection(reason)) => {
                            tracing::debug!("Rejected selection: {}", reason);
                            PromptState::Rejected
                        }
                        Err(other) => return Err(other),
                    },
                    Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Err(e.into()),
                    Err(e) => {
                        tracing::debug!("Unreadable input line: {}", e);
                        PromptState::Rejected
                    }
                },
                PromptState::Rejected => {
                    self.print("Invalid selection, try again: ")?;
                    PromptState::Prompting
                }
                PromptState::Validated(value) => return Ok(value),
            };
        }
    }

    pub fn show_results(&mut self, results: &AggregatedResults) -> Result<()> {
        let mut listing = format!("\n{}\n\n", style("--SEARCH RESULTS--").bold());
        for (rank, video) in results.ranked().enumerate() {
            listing.push_str(&format!(
                "{}) {} ({})\nChannel: {}\nViews: {}\nLikes: {}\n\n",
                rank + 1,
                video.title,
                video.duration,
                video.channel_name,
                video.view_count,
                video.approval_ratio
            ));
        }
        self.println(&listing)
    }

    /// Returns the 0-based rank of the chosen video
    pub fn choose_video(&mut self, results: &AggregatedResults) -> Result<usize> {
        let count = results.rank_count();
        self.select("Select a Video: ", |token| parse_numbered(token, count))
    }

    pub fn show_renditions(&mut self, menu: &RenditionMenu) -> Result<()> {
        let mut listing = format!("\n{}\n\n", style("--AUDIO FORMATS--").bold());
        for (index, rendition) in menu.numbered().iter().enumerate() {
            let suffix = if menu.is_best(rendition) {
                style(" [BEST]").green().to_string()
            } else {
                String::new()
            };
            listing.push_str(&format!(
                "{}) Encoding: {}, Bitrate: {}, Extension: {}{}\n",
                index + 1,
                rendition.encoding_name,
                rendition.bitrate,
                rendition.file_extension,
                suffix
            ));
        }
        self.println(&listing)
    }

    pub fn choose_rendition(&mut self, menu: &RenditionMenu) -> Result<ResolvedSelection> {
        self.select(RENDITION_PROMPT, |token| menu.resolve(token))
    }
}
