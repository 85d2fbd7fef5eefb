//! Post classification.
//!
//! Defines the `Classifier` trait: given a post's text and media URLs,
//! decide whether it signals a buying opportunity for the associated token.
//! The scheduler treats an unavailable classifier as a negative verdict,
//! never as a tick failure.

pub mod gemini;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::Verdict;

/// Abstraction over buy-signal classifiers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify one post. `media_urls` may be empty.
    async fn classify(&self, text: &str, media_urls: &[String]) -> Result<Verdict>;

    /// Model identifier string.
    fn model_name(&self) -> &str;
}
