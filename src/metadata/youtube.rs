use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use url::Url;

use super::{MetadataProvider, SearchHit, VideoStats};
use crate::{GrabError, Result};

/// YouTube Data API v3 client for search and statistics lookups
pub struct YoutubeDataApi {
    client: Client,
    api_key: String,
    base_url: String,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    #[serde(default)]
    video_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Snippet {
    title: String,
    description: String,
    channel_title: String,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    #[serde(default)]
    id: String,
    #[serde(default)]
    content_details: ContentDetails,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContentDetails {
    duration: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Statistics {
    view_count: String,
    like_count: String,
    dislike_count: String,
}

impl YoutubeDataApi {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, max_results: u32) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_results,
        }
    }

    /// Build the search request URL
    pub fn search_url(&self, query: &str) -> Result<Url> {
        let max_results = self.max_results.to_string();
        self.endpoint(
            "search",
            &[
                ("part", "snippet"),
                ("maxResults", max_results.as_str()),
                ("type", "video"),
                ("q", query),
            ],
        )
    }

    /// Build the batch statistics request URL
    pub fn stats_url(&self, ids: &[String]) -> Result<Url> {
        let joined = ids.join(",");
        self.endpoint(
            "videos",
            &[("id", joined.as_str()), ("part", "contentDetails,statistics")],
        )
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url, path);
        let key = [("key", self.api_key.as_str())];
        Url::parse_with_params(&raw, params.iter().chain(key.iter()))
            .map_err(|e| GrabError::Config(format!("invalid API base URL {}: {}", self.base_url, e)))
    }

    /// Fetch a response body; any non-success status counts as a rejected key or quota
    async fn get_body(&self, url: Url, what: &str) -> Result<String> {
        tracing::debug!("GET {}", redact_key(&url));

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(GrabError::Credential(format!(
                "{} request returned HTTP {}",
                what,
                response.status()
            )));
        }

        Ok(response.text().await?)
    }
}

/// Convert a raw search response body into ranked hits
fn parse_search_response(body: &str) -> Result<Vec<SearchHit>> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| GrabError::parse("search response", e))?;
    Ok(hits_from(response))
}

/// Convert a raw videos response body into statistics records
fn parse_stats_response(body: &str) -> Result<Vec<VideoStats>> {
    let response: VideosResponse =
        serde_json::from_str(body).map_err(|e| GrabError::parse("videos response", e))?;
    Ok(stats_from(response))
}

fn hits_from(response: SearchResponse) -> Vec<SearchHit> {
    response
        .items
        .into_iter()
        .map(|item| SearchHit {
            video_id: item.id.video_id,
            title: item.snippet.title,
            description: item.snippet.description,
            channel_name: item.snippet.channel_title,
        })
        .collect()
}

fn stats_from(response: VideosResponse) -> Vec<VideoStats> {
    response
        .items
        .into_iter()
        .map(|item| VideoStats {
            video_id: item.id,
            duration: item.content_details.duration,
            view_count: item.statistics.view_count,
            like_count: item.statistics.like_count,
            dislike_count: item.statistics.dislike_count,
        })
        .collect()
}

/// Ids in first-seen order. The videos endpoint answers a repeated id only once.
fn unique_ids(ids: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(id.clone());
        }
    }
    unique
}

/// Spread statistics fetched for `unique` back over every requested position.
///
/// A response that doesn't cover the unique ids one-to-one is returned as is so
/// the join reports the misalignment.
fn expand_to_requested(requested: &[String], unique: &[String], stats: Vec<VideoStats>) -> Vec<VideoStats> {
    if stats.len() != unique.len() || requested.len() == unique.len() {
        return stats;
    }

    let by_id: HashMap<&str, &VideoStats> = unique.iter().map(String::as_str).zip(stats.iter()).collect();
    requested
        .iter()
        .filter_map(|id| by_id.get(id.as_str()).map(|s| (*s).clone()))
        .collect()
}

fn redact_key(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

#[async_trait]
impl MetadataProvider for YoutubeDataApi {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let url = self.search_url(query)?;
        let body = self.get_body(url, "search").await?;
        let hits = parse_search_response(&body)?;
        tracing::debug!("Search for {:?} returned {} hits", query, hits.len());
        Ok(hits)
    }

    async fn video_stats(&self, ids: &[String]) -> Result<Vec<VideoStats>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let unique = unique_ids(ids);
        if unique.len() != ids.len() {
            tracing::debug!("Requesting statistics for {} distinct of {} ids", unique.len(), ids.len());
        }

        let url = self.stats_url(&unique)?;
        let body = self.get_body(url, "videos").await?;
        let stats = parse_stats_response(&body)?;
        Ok(expand_to_requested(ids, &unique, stats))
    }
}
