use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::metadata::{SearchHit, VideoStats};
use crate::{GrabError, Result};

/// Share of likes among likes + dislikes, or no signal at all
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ApprovalRatio {
    /// Always within 0.0..=1.0
    Ratio(f64),
    Unavailable,
}

impl ApprovalRatio {
    pub fn from_counts(likes: u64, dislikes: u64) -> Self {
        if likes == 0 && dislikes == 0 {
            ApprovalRatio::Unavailable
        } else {
            ApprovalRatio::Ratio(likes as f64 / (likes as f64 + dislikes as f64))
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            ApprovalRatio::Ratio(r) => Some(*r),
            ApprovalRatio::Unavailable => None,
        }
    }
}

impl fmt::Display for ApprovalRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalRatio::Ratio(r) => write!(f, "{:.2}%", r * 100.0),
            ApprovalRatio::Unavailable => write!(f, "Unavailable"),
        }
    }
}

/// A search hit joined with its statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedVideo {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_name: String,
    pub duration: String,
    pub view_count: String,
    pub approval_ratio: ApprovalRatio,
}

/// Aggregated videos keyed by id, remembering the search rank order
#[derive(Debug, Clone, Default)]
pub struct AggregatedResults {
    by_id: HashMap<String, AggregatedVideo>,
    ranked_ids: Vec<String>,
}

impl AggregatedResults {
    pub fn get(&self, video_id: &str) -> Option<&AggregatedVideo> {
        self.by_id.get(video_id)
    }

    /// Number of distinct videos
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Videos in search rank order, one per hit
    pub fn ranked(&self) -> impl Iterator<Item = &AggregatedVideo> {
        self.ranked_ids.iter().filter_map(|id| self.by_id.get(id))
    }

    /// Number of ranked entries, i.e. the choices offered to the user
    pub fn rank_count(&self) -> usize {
        self.ranked_ids.len()
    }

    /// Video at a 0-based rank
    pub fn at_rank(&self, index: usize) -> Option<&AggregatedVideo> {
        self.ranked_ids.get(index).and_then(|id| self.by_id.get(id))
    }
}

/// Join search hits with their statistics by position.
///
/// Fails without producing anything when the lists differ in length, when the
/// provider echoes back an id that doesn't match the hit at the same position,
/// or when a like/dislike count is not a decimal number. Empty counts read as zero.
pub fn aggregate(hits: &[SearchHit], stats: &[VideoStats]) -> Result<AggregatedResults> {
    if hits.len() != stats.len() {
        return Err(GrabError::Alignment(format!(
            "{} search hits but {} statistics records",
            hits.len(),
            stats.len()
        )));
    }

    let mut results = AggregatedResults {
        by_id: HashMap::with_capacity(hits.len()),
        ranked_ids: Vec::with_capacity(hits.len()),
    };

    for (index, (hit, stat)) in hits.iter().zip(stats).enumerate() {
        if !stat.video_id.is_empty() && stat.video_id != hit.video_id {
            return Err(GrabError::Alignment(format!(
                "position {} holds statistics for {} but the search hit is {}",
                index + 1,
                stat.video_id,
                hit.video_id
            )));
        }

        let likes = parse_count("likeCount", &stat.like_count)?;
        let dislikes = parse_count("dislikeCount", &stat.dislike_count)?;

        let video = AggregatedVideo {
            video_id: hit.video_id.clone(),
            title: hit.title.clone(),
            description: hit.description.clone(),
            channel_name: hit.channel_name.clone(),
            duration: stat.duration.clone(),
            view_count: stat.view_count.clone(),
            approval_ratio: ApprovalRatio::from_counts(likes, dislikes),
        };

        if results.by_id.insert(hit.video_id.clone(), video).is_some() {
            tracing::warn!(
                "Video {} appears more than once in the search results; keeping the later entry",
                hit.video_id
            );
        }
        results.ranked_ids.push(hit.video_id.clone());
    }

    Ok(results)
}

fn parse_count(field: &str, raw: &str) -> Result<u64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<u64>()
        .map_err(|e| GrabError::parse(format!("{} {:?}", field, raw), e))
}
