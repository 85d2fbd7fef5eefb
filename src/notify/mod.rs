//! Operator notifications.
//!
//! Defines the `Notifier` trait and the `best_effort` helper the monitor
//! uses everywhere: a notification that cannot be delivered is logged and
//! swallowed, never propagated back into the pipeline.

pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

/// Abstraction over the operator notification channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message to the operator channel.
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Send a notification, logging and swallowing any delivery failure.
pub async fn best_effort(notifier: &dyn Notifier, message: &str) {
    if let Err(e) = notifier.notify(message).await {
        warn!(error = %e, "Notification delivery failed");
    }
}
