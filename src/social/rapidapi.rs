//! RapidAPI timeline source (twttrapi).
//!
//! Fetches a handle's timeline through the twttrapi RapidAPI gateway and
//! extracts the most recent tweet entry. Auth is a per-request
//! `X-RapidAPI-Key` header.
//!
//! Base URL: https://twttrapi.p.rapidapi.com
//! The timeline response nests tweets inside a GraphQL-style instruction
//! envelope; we only deserialize the path we need.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::PostSource;
use crate::types::FetchedPost;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://twttrapi.p.rapidapi.com";
const RAPIDAPI_HOST: &str = "twttrapi.p.rapidapi.com";
const SOURCE_NAME: &str = "rapidapi";

/// Timeline entry ids carry this prefix in front of the bare tweet id.
const TWEET_ENTRY_PREFIX: &str = "tweet-";

// ---------------------------------------------------------------------------
// API response types (twttrapi JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    data: TimelineData,
}

#[derive(Debug, Deserialize)]
struct TimelineData {
    user_result: UserResult,
}

#[derive(Debug, Deserialize)]
struct UserResult {
    result: UserResultInner,
}

#[derive(Debug, Deserialize)]
struct UserResultInner {
    timeline_response: TimelineEnvelope,
}

#[derive(Debug, Deserialize)]
struct TimelineEnvelope {
    timeline: Timeline,
}

#[derive(Debug, Deserialize)]
struct Timeline {
    #[serde(default)]
    instructions: Vec<Instruction>,
}

#[derive(Debug, Deserialize)]
struct Instruction {
    #[serde(rename = "__typename", default)]
    typename: String,
    #[serde(default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(rename = "entryId", default)]
    entry_id: String,
    #[serde(default)]
    content: Option<EntryContent>,
}

#[derive(Debug, Deserialize)]
struct EntryContent {
    #[serde(default)]
    content: Option<EntryContentInner>,
}

#[derive(Debug, Deserialize)]
struct EntryContentInner {
    #[serde(rename = "tweetResult", default)]
    tweet_result: Option<TweetResult>,
}

#[derive(Debug, Deserialize)]
struct TweetResult {
    #[serde(default)]
    result: Option<TweetResultInner>,
}

#[derive(Debug, Deserialize)]
struct TweetResultInner {
    #[serde(default)]
    legacy: Option<LegacyTweet>,
}

#[derive(Debug, Deserialize)]
struct LegacyTweet {
    #[serde(default)]
    full_text: String,
    #[serde(default)]
    extended_entities: Option<ExtendedEntities>,
}

#[derive(Debug, Deserialize)]
struct ExtendedEntities {
    #[serde(default)]
    media: Vec<MediaItem>,
}

#[derive(Debug, Deserialize)]
struct MediaItem {
    #[serde(default)]
    media_url_https: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// twttrapi timeline client.
pub struct RapidApiClient {
    http: Client,
    api_key: SecretString,
}

impl RapidApiClient {
    pub fn new(api_key: SecretString) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("HERALD/0.1.0 (social-signal-agent)")
            .build()
            .context("Failed to build HTTP client for RapidAPI")?;

        Ok(Self { http, api_key })
    }

    /// Pull the newest tweet entry out of the instruction envelope.
    ///
    /// Returns `Ok(None)` for an account with no tweet entries; malformed
    /// entries (a `tweet-` id with no tweet body) are errors.
    fn extract_latest(response: TimelineResponse) -> Result<Option<FetchedPost>> {
        let instructions = response
            .data
            .user_result
            .result
            .timeline_response
            .timeline
            .instructions;

        let entries = instructions
            .into_iter()
            .find(|i| i.typename == "TimelineAddEntries")
            .map(|i| i.entries)
            .unwrap_or_default();

        let Some(entry) = entries
            .into_iter()
            .find(|e| e.entry_id.starts_with(TWEET_ENTRY_PREFIX))
        else {
            return Ok(None);
        };

        let id = entry.entry_id[TWEET_ENTRY_PREFIX.len()..].to_string();
        if id.is_empty() {
            return Err(anyhow!("Timeline entry has an empty tweet id"));
        }

        let legacy = entry
            .content
            .and_then(|c| c.content)
            .and_then(|c| c.tweet_result)
            .and_then(|r| r.result)
            .and_then(|r| r.legacy)
            .ok_or_else(|| anyhow!("Timeline entry {id} has no tweet body"))?;

        let media_urls = legacy
            .extended_entities
            .map(|e| e.media.into_iter().filter_map(|m| m.media_url_https).collect())
            .unwrap_or_default();

        Ok(Some(FetchedPost {
            id,
            text: legacy.full_text,
            media_urls,
        }))
    }
}

#[async_trait]
impl PostSource for RapidApiClient {
    async fn latest_post(&self, handle: &str) -> Result<Option<FetchedPost>> {
        let url = format!(
            "{BASE_URL}/user-tweets?username={}",
            urlencoding::encode(handle),
        );

        debug!(handle, "Fetching timeline via RapidAPI");

        let resp = self
            .http
            .get(&url)
            .header("X-RapidAPI-Key", self.api_key.expose_secret())
            .header("X-RapidAPI-Host", RAPIDAPI_HOST)
            .send()
            .await
            .with_context(|| format!("Timeline request failed for @{handle}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Timeline request for @{handle} returned {status}: {body}"
            ));
        }

        let timeline: TimelineResponse = resp
            .json()
            .await
            .with_context(|| format!("Malformed timeline response for @{handle}"))?;

        Self::extract_latest(timeline)
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
