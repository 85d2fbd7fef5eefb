//! Google Gemini classifier integration.
//!
//! Implements the `Classifier` trait using the Generative Language API.
//! Handles prompt construction, JSON extraction from the model reply,
//! rate limiting with exponential backoff, and a keyword fallback for
//! replies that carry no parseable JSON.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::Classifier;
use crate::types::Verdict;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Maximum retries on rate limit / server errors.
const MAX_RETRIES: u32 = 2;

/// Base delay for exponential backoff (ms).
const BASE_BACKOFF_MS: u64 = 1000;

/// Fallback signal words when the model reply carries no JSON.
const POSITIVE_KEYWORDS: &[&str] = &[
    "launch",
    "partnership",
    "update",
    "milestone",
    "announcement",
    "bullish",
    "moon",
];

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// The JSON object the prompt asks the model to emit.
#[derive(Debug, Deserialize)]
struct VerdictWire {
    #[serde(default)]
    is_worth_buying: bool,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    confidence_score: f64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct GeminiClassifier {
    http: Client,
    /// None when no key is configured — classify then returns a negative
    /// verdict instead of erroring, matching the operator expectation that
    /// a keyless deployment observes but never buys.
    api_key: Option<SecretString>,
    model: String,
}

impl GeminiClassifier {
    pub fn new(api_key: Option<SecretString>, model: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to build Gemini HTTP client")?;

        Ok(Self {
            http,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    fn build_prompt(text: &str, media_urls: &[String]) -> String {
        let mut prompt = format!(
            "Analyze the following post from a crypto project founder/team member \
             and determine if it indicates a good buying opportunity.\n\n\
             Post: \"{text}\"\n",
        );

        if !media_urls.is_empty() {
            prompt.push_str(&format!(
                "\nThe post also contains {} attached image(s):\n",
                media_urls.len()
            ));
            for url in media_urls {
                prompt.push_str(&format!("- {url}\n"));
            }
        }

        prompt.push_str(
            "\nConsider:\n\
             - Is this announcing a major update, partnership, or milestone?\n\
             - Does it show positive momentum or development progress?\n\
             - Is it just casual conversation or spam?\n\
             - Does it indicate potential price movement?\n\n\
             Respond ONLY in valid JSON format:\n\
             {\"is_worth_buying\": true, \"reason\": \"Brief explanation\", \"confidence_score\": 0.85}",
        );

        prompt
    }

    /// Send a generateContent request with retry + backoff, returning the
    /// concatenated reply text.
    async fn call_api(&self, key: &SecretString, prompt: &str) -> Result<String> {
        let url = format!(
            "{API_BASE}/{}:generateContent?key={}",
            self.model,
            key.expose_secret(),
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = BASE_BACKOFF_MS * 2u64.pow(attempt - 1);
                debug!(attempt, delay_ms = delay, "Retrying Gemini API call");
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            }

            let resp = match self.http.post(&url).json(&request).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(anyhow!(e).context("Gemini request failed"));
                    continue;
                }
            };

            let status = resp.status();
            if status.as_u16() == 429 || status.is_server_error() {
                let body = resp.text().await.unwrap_or_default();
                last_error = Some(anyhow!("Gemini returned {status}: {body}"));
                continue;
            }
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(anyhow!("Gemini returned {status}: {body}"));
            }

            let parsed: GenerateResponse = resp
                .json()
                .await
                .context("Malformed Gemini response body")?;

            let text: String = parsed
                .candidates
                .into_iter()
                .filter_map(|c| c.content)
                .flat_map(|c| c.parts)
                .filter_map(|p| p.text)
                .collect();

            if text.is_empty() {
                return Err(anyhow!("Gemini response contained no text candidates"));
            }

            return Ok(text);
        }

        Err(last_error.unwrap_or_else(|| anyhow!("Gemini call failed with no error detail")))
    }

    /// Parse the first JSON object embedded in the model reply.
    fn parse_verdict(reply: &str) -> Option<Verdict> {
        let start = reply.find('{')?;
        let end = reply.rfind('}')?;
        if end <= start {
            return None;
        }

        let wire: VerdictWire = serde_json::from_str(&reply[start..=end]).ok()?;
        Some(Verdict {
            worth_buying: wire.is_worth_buying,
            reason: wire.reason.unwrap_or_else(|| "No reason provided".to_string()),
            confidence: wire.confidence_score.clamp(0.0, 1.0),
        })
    }

    /// Keyword fallback, used when the reply carries no parseable JSON.
    fn keyword_verdict(text: &str) -> Verdict {
        let lowered = text.to_lowercase();
        let positive = POSITIVE_KEYWORDS.iter().any(|kw| lowered.contains(kw));

        if positive {
            Verdict {
                worth_buying: true,
                reason: "Contains positive keywords".to_string(),
                confidence: 0.6,
            }
        } else {
            Verdict {
                worth_buying: false,
                reason: "No significant positive indicators".to_string(),
                confidence: 0.3,
            }
        }
    }
}

#[async_trait]
impl Classifier for GeminiClassifier {
    async fn classify(&self, text: &str, media_urls: &[String]) -> Result<Verdict> {
        let Some(key) = &self.api_key else {
            return Ok(Verdict::unavailable("Classifier API key not configured"));
        };

        let prompt = Self::build_prompt(text, media_urls);
        let reply = self.call_api(key, &prompt).await?;

        match Self::parse_verdict(&reply) {
            Some(verdict) => Ok(verdict),
            None => {
                warn!("Gemini reply carried no parseable JSON, using keyword fallback");
                Ok(Self::keyword_verdict(text))
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
