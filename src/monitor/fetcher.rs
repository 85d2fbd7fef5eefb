//! Idempotency-aware fetch client.
//!
//! Wraps a `PostSource` with two concerns the transport doesn't have:
//! a global minimum spacing between requests (across all handles — the
//! scheduler calls this client sequentially) and a duplicate-suppression
//! index of every post id seen during the process lifetime.
//!
//! No retry happens here; a failed fetch is retried naturally at the next
//! scheduled tick.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::social::PostSource;
use crate::types::{FetchedPost, HeraldError};

/// Rate-limited, duplicate-suppressing fetch client.
///
/// The dedup index is owned here and lives exactly as long as this
/// instance; the scheduler keeps one instance for its lifetime, so a
/// post id is forwarded downstream at most once per process.
pub struct FetchClient {
    source: Arc<dyn PostSource>,
    seen: HashSet<String>,
    min_spacing: Duration,
    last_request: Option<Instant>,
}

impl FetchClient {
    pub fn new(source: Arc<dyn PostSource>, min_spacing: Duration) -> Self {
        Self {
            source,
            seen: HashSet::new(),
            min_spacing,
            last_request: None,
        }
    }

    /// Fetch the newest post for `handle`, or `None` when there is nothing
    /// new (no post at all, or the latest one was already seen).
    pub async fn fetch(&mut self, handle: &str) -> Result<Option<FetchedPost>, HeraldError> {
        self.pace().await;

        let post = self
            .source
            .latest_post(handle)
            .await
            .map_err(|e| HeraldError::Fetch {
                handle: handle.to_string(),
                message: format!("{e:#}"),
            })?;

        let Some(post) = post else {
            debug!(handle, "No posts on timeline");
            return Ok(None);
        };

        if self.seen.contains(&post.id) {
            debug!(handle, post_id = %post.id, "Post already processed, skipping");
            return Ok(None);
        }

        self.seen.insert(post.id.clone());
        Ok(Some(post))
    }

    /// Suspend until the minimum spacing since the previous request has
    /// elapsed. The timestamp is taken after the wait, so consecutive
    /// calls are separated by at least `min_spacing` no matter how fast
    /// the caller loops.
    async fn pace(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_spacing {
                tokio::time::sleep(self.min_spacing - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    /// Number of distinct post ids recorded so far.
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
