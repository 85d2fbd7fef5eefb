//! Shared types for the HERALD agent.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that social, chain, trade,
//! and monitor modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Chain constants
// ---------------------------------------------------------------------------

/// Wrapped-SOL mint address — the input side of every swap.
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Lamports per SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Convert a SOL amount to lamports, flooring (never round a swap up).
pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64).floor() as u64
}

// ---------------------------------------------------------------------------
// Social
// ---------------------------------------------------------------------------

/// One observed post from a monitored account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedPost {
    /// Opaque unique post id (bare id, no platform prefix).
    pub id: String,
    pub text: String,
    pub media_urls: Vec<String>,
}

impl FetchedPost {
    /// Public URL of this post under the given handle.
    pub fn url(&self, handle: &str) -> String {
        format!("https://x.com/{handle}/status/{}", self.id)
    }
}

impl fmt::Display for FetchedPost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.text.chars().take(80).collect();
        write!(
            f,
            "[{}] {}{} ({} media)",
            self.id,
            preview,
            if self.text.chars().count() > 80 { "…" } else { "" },
            self.media_urls.len(),
        )
    }
}

/// Classifier verdict for a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub worth_buying: bool,
    pub reason: String,
    /// Classifier self-reported confidence (0–1).
    pub confidence: f64,
}

impl Verdict {
    /// A negative verdict carrying the reason the classifier could not run.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            worth_buying: false,
            reason: reason.into(),
            confidence: 0.0,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (conf={:.0}%): {}",
            if self.worth_buying { "WORTH BUYING" } else { "NOT WORTH BUYING" },
            self.confidence * 100.0,
            self.reason,
        )
    }
}

// ---------------------------------------------------------------------------
// Token mapping
// ---------------------------------------------------------------------------

/// Token configured for a monitored handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    /// Chain-level mint address of the token.
    pub mint: String,
}

/// Handle → token association as stored in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandleTokenMapping {
    pub handle: String,
    pub token: TokenInfo,
}

impl fmt::Display for HandleTokenMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{} -> {} ({})", self.handle, self.token.symbol, self.token.mint)
    }
}

// ---------------------------------------------------------------------------
// Swap types
// ---------------------------------------------------------------------------

/// A priced swap route, normalized from the aggregator's wire format.
///
/// Amounts are in the smallest integer unit of the respective mint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: u64,
    pub out_amount: u64,
    pub price_impact_pct: f64,
    pub route_label: String,
    pub slippage_bps: u16,
    /// Full aggregator response (preserved for the build step and audit).
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} {} via {} (impact {:.4}%, slippage {}bps)",
            self.in_amount,
            self.input_mint,
            self.out_amount,
            self.output_mint,
            self.route_label,
            self.price_impact_pct,
            self.slippage_bps,
        )
    }
}

/// An unsigned swap transaction returned by the aggregator's build step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapTransaction {
    /// Base64-encoded serialized transaction, ready to sign.
    pub payload_base64: String,
    pub compute_unit_limit: u32,
    pub prioritization_fee_lamports: u64,
    pub last_valid_block_height: u64,
}

/// Terminal record of one trade attempt.
///
/// `confirmed == false` with a signature means the transaction was broadcast
/// but rejected on-chain — a reportable outcome, not a pipeline error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeResult {
    pub signature: String,
    pub confirmed: bool,
    pub quote: Quote,
}

impl fmt::Display for TradeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            if self.confirmed { "CONFIRMED" } else { "UNCONFIRMED" },
            self.signature,
            self.quote,
        )
    }
}

// ---------------------------------------------------------------------------
// Monitor state
// ---------------------------------------------------------------------------

/// Scheduler run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Stopped,
    Running,
    Paused,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Stopped => write!(f, "STOPPED"),
            RunState::Running => write!(f, "RUNNING"),
            RunState::Paused => write!(f, "PAUSED"),
        }
    }
}

/// Cumulative monitoring statistics, in memory for the process lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorStats {
    pub posts_processed: u64,
    pub purchases_made: u64,
    pub errors: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub uptime_secs: i64,
}

impl fmt::Display for MonitorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed={} purchased={} errors={} uptime={}s",
            self.posts_processed, self.purchases_made, self.errors, self.uptime_secs,
        )
    }
}

/// Snapshot returned by `Monitor::status` and served by the control API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub state: RunState,
    pub handles: Vec<String>,
    pub target_usd: f64,
    pub stats: MonitorStats,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for HERALD.
///
/// Confirmation failure is deliberately absent: an on-chain rejection is a
/// `TradeResult { confirmed: false }`, not an error.
#[derive(Debug, thiserror::Error)]
pub enum HeraldError {
    #[error("Fetch failed for @{handle}: {message}")]
    Fetch { handle: String, message: String },

    #[error("No token configured for @{0}")]
    NoTokenConfigured(String),

    #[error("Insufficient balance: need {required_sol:.6} SOL, have {available_sol:.6} SOL")]
    InsufficientBalance {
        required_sol: f64,
        available_sol: f64,
    },

    #[error("Quote failed: {0}")]
    Quote(String),

    #[error("Transaction build failed: {0}")]
    Build(String),

    #[error("Broadcast failed: {0}")]
    Broadcast(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Chain error: {0}")]
    Chain(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
