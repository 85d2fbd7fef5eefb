//! Social platform integrations.
//!
//! Defines the `PostSource` trait — the transport that fetches the most
//! recent post for a monitored handle. Rate limiting and duplicate
//! suppression live in the monitor's fetch client, not here.

pub mod rapidapi;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::FetchedPost;

/// Abstraction over a social timeline source.
///
/// Implementors return the single most recent post for a handle, or `None`
/// when the account has no posts. Transport and parse failures are errors;
/// the caller decides how far they propagate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Fetch the most recent post for `handle`.
    async fn latest_post(&self, handle: &str) -> Result<Option<FetchedPost>>;

    /// Source name for logging and identification.
    fn name(&self) -> &str;
}
