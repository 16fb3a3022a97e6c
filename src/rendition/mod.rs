use serde::{Deserialize, Serialize};

use crate::metadata::Rendition;
use crate::{GrabError, Result};

/// How the chosen rendition came about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Picked by its number in the audio list
    Numbered,
    /// Highest audio bitrate
    Best,
    /// Full audio+video stream, transcoded locally afterwards
    Fastest,
}

/// A concrete download plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSelection {
    pub rendition: Rendition,
    pub mode: SelectionMode,
}

/// Keep renditions that carry audio, in provider order
pub fn filter_audio_renditions(all: &[Rendition]) -> Vec<Rendition> {
    all.iter().filter(|r| r.has_audio()).cloned().collect()
}

/// Rendition with the highest audio bitrate; the first one wins ties
pub fn pick_best(all: &[Rendition]) -> Result<&Rendition> {
    let mut iter = all.iter();
    let first = iter
        .next()
        .ok_or_else(|| GrabError::EmptySet("renditions".to_string()))?;

    Ok(iter.fold(first, |best, r| if r.bitrate > best.bitrate { r } else { best }))
}

/// Combined audio+video stream used by the fastest mode.
///
/// Falls back to the first rendition when the provider lists no muxed stream.
pub fn full_stream_fallback(all: &[Rendition]) -> Result<&Rendition> {
    all.iter()
        .find(|r| r.has_audio() && r.has_video)
        .or_else(|| all.first())
        .ok_or_else(|| GrabError::EmptySet("renditions".to_string()))
}

/// Parse a 1-based choice into a 0-based index below `len`
pub fn parse_numbered(token: &str, len: usize) -> Result<usize> {
    match token.parse::<usize>() {
        Ok(n) if n >= 1 && n <= len => Ok(n - 1),
        Ok(n) => Err(GrabError::InvalidSelection(format!(
            "{} is not between 1 and {}",
            n, len
        ))),
        Err(_) => Err(GrabError::InvalidSelection(format!("{:?}", token))),
    }
}

/// Turn a user token into a download plan
pub fn resolve_selection(
    token: &str,
    numbered: &[Rendition],
    best: &Rendition,
    full_stream: &Rendition,
) -> Result<ResolvedSelection> {
    match token {
        "best" => Ok(ResolvedSelection {
            rendition: best.clone(),
            mode: SelectionMode::Best,
        }),
        "fastest" => Ok(ResolvedSelection {
            rendition: full_stream.clone(),
            mode: SelectionMode::Fastest,
        }),
        other => {
            let index = parse_numbered(other, numbered.len())?;
            Ok(ResolvedSelection {
                rendition: numbered[index].clone(),
                mode: SelectionMode::Numbered,
            })
        }
    }
}

/// The audio choices offered for one video
#[derive(Debug, Clone)]
pub struct RenditionMenu {
    numbered: Vec<Rendition>,
    best: Rendition,
    full_stream: Rendition,
}

impl RenditionMenu {
    pub fn new(all: &[Rendition]) -> Result<Self> {
        let numbered = filter_audio_renditions(all);
        if numbered.is_empty() {
            return Err(GrabError::EmptySet("audio renditions".to_string()));
        }

        Ok(Self {
            best: pick_best(all)?.clone(),
            full_stream: full_stream_fallback(all)?.clone(),
            numbered,
        })
    }

    pub fn numbered(&self) -> &[Rendition] {
        &self.numbered
    }

    pub fn best(&self) -> &Rendition {
        &self.best
    }

    pub fn is_best(&self, rendition: &Rendition) -> bool {
        rendition.format_id == self.best.format_id
    }

    pub fn resolve(&self, token: &str) -> Result<ResolvedSelection> {
        resolve_selection(token, &self.numbered, &self.best, &self.full_stream)
    }
}
