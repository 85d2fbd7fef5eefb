//! Monitoring scheduler.
//!
//! Owns the run-state machine (Stopped / Running / Paused), drives the
//! periodic tick that walks the monitored handles, and wires the fetch
//! client, classifier, trade pipeline, and notifier together. State is
//! shared behind an `Arc` so the control API and the tick task see the
//! same monitor without a process-wide singleton.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::fetcher::FetchClient;
use crate::classify::Classifier;
use crate::notify::{self, Notifier};
use crate::social::PostSource;
use crate::trade::TradePipeline;
use crate::types::{
    HeraldError, MonitorStats, MonitorStatus, RunState, TradeResult, Verdict, LAMPORTS_PER_SOL,
};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Static scheduler parameters, fixed at construction.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub tick_interval: Duration,
    pub min_fetch_spacing: Duration,
    /// Initial monitored-handle list, in processing order.
    pub handles: Vec<String>,
    pub target_usd: f64,
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

/// Handle to one running tick loop. Dropped (and replaced) on stop/start;
/// each loop generation carries its own stop flag so a stale loop can
/// never be revived by a later `start`.
struct LoopHandle {
    stop_flag: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

struct Shared {
    tick_interval: Duration,
    paused: AtomicBool,
    current: Mutex<Option<LoopHandle>>,
    started_at: RwLock<Option<chrono::DateTime<Utc>>>,
    stats: RwLock<MonitorStats>,
    handles: RwLock<Vec<String>>,
    target_usd: RwLock<f64>,

    /// One fetch client for the monitor's lifetime — its dedup index must
    /// survive stop/start cycles.
    fetcher: Mutex<FetchClient>,
    classifier: Arc<dyn Classifier>,
    notifier: Arc<dyn Notifier>,
    pipeline: TradePipeline,
}

/// The monitoring scheduler.
#[derive(Clone)]
pub struct Monitor {
    shared: Arc<Shared>,
}

impl Monitor {
    pub fn new(
        settings: MonitorSettings,
        source: Arc<dyn PostSource>,
        classifier: Arc<dyn Classifier>,
        notifier: Arc<dyn Notifier>,
        pipeline: TradePipeline,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                tick_interval: settings.tick_interval,
                paused: AtomicBool::new(false),
                current: Mutex::new(None),
                started_at: RwLock::new(None),
                stats: RwLock::new(MonitorStats::default()),
                handles: RwLock::new(settings.handles),
                target_usd: RwLock::new(settings.target_usd),
                fetcher: Mutex::new(FetchClient::new(source, settings.min_fetch_spacing)),
                classifier,
                notifier,
                pipeline,
            }),
        }
    }

    /// Begin monitoring: an immediate first tick, then one every interval.
    /// No-op if already running.
    pub async fn start(&self) {
        let mut current = self.shared.current.lock().await;
        if current.is_some() {
            info!("Monitor is already running");
            return;
        }

        self.shared.paused.store(false, Ordering::SeqCst);
        *self.shared.started_at.write().await = Some(Utc::now());

        let stop_flag = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(Notify::new());
        tokio::spawn(run_loop(
            self.shared.clone(),
            stop_flag.clone(),
            shutdown.clone(),
        ));

        *current = Some(LoopHandle {
            stop_flag,
            shutdown,
        });

        let handles = self.shared.handles.read().await;
        info!(handles = ?*handles, "Monitor started");
    }

    /// Stop monitoring. The timer is cancelled immediately; an in-flight
    /// tick is allowed to finish (cooperative, not preemptive).
    pub async fn stop(&self) {
        let mut current = self.shared.current.lock().await;
        let Some(handle) = current.take() else {
            info!("Monitor is not running");
            return;
        };

        handle.stop_flag.store(true, Ordering::SeqCst);
        handle.shutdown.notify_one();
        self.shared.paused.store(false, Ordering::SeqCst);
        info!("Monitor stopped");
    }

    /// Suspend handle processing. Observed at tick entry and again before
    /// each handle, so a pause lands mid-cycle without aborting work
    /// already started for the current handle.
    pub async fn pause(&self) {
        if self.shared.current.lock().await.is_none() {
            info!("Cannot pause: monitor is not running");
            return;
        }
        if self.shared.paused.swap(true, Ordering::SeqCst) {
            info!("Monitor is already paused");
            return;
        }
        info!("Monitor paused — handle processing suspended");
    }

    /// Resume handle processing on the next tick.
    pub async fn resume(&self) {
        if self.shared.current.lock().await.is_none() {
            info!("Cannot resume: monitor is not running");
            return;
        }
        if !self.shared.paused.swap(false, Ordering::SeqCst) {
            info!("Monitor is not paused");
            return;
        }
        info!("Monitor resumed — handle processing active");
    }

    /// Replace the monitored-handle list, effective from the next tick.
    pub async fn update_handles(&self, handles: Vec<String>) {
        info!(?handles, "Updating monitored handles");
        *self.shared.handles.write().await = handles;
    }

    /// Set the per-trade USD target. Rejected synchronously when the
    /// amount is not strictly positive.
    pub async fn update_target_usd(&self, amount: f64) -> Result<(), HeraldError> {
        if !(amount > 0.0) {
            return Err(HeraldError::Config(
                "Target USD amount must be greater than 0".to_string(),
            ));
        }
        *self.shared.target_usd.write().await = amount;
        info!(amount, "Updated target USD amount");
        Ok(())
    }

    pub async fn target_usd(&self) -> f64 {
        *self.shared.target_usd.read().await
    }

    /// Current run state and statistics snapshot.
    pub async fn status(&self) -> MonitorStatus {
        let running = self.shared.current.lock().await.is_some();
        let state = match (running, self.shared.paused.load(Ordering::SeqCst)) {
            (false, _) => RunState::Stopped,
            (true, false) => RunState::Running,
            (true, true) => RunState::Paused,
        };

        let mut stats = self.shared.stats.read().await.clone();
        if let Some(started) = *self.shared.started_at.read().await {
            stats.uptime_secs = (Utc::now() - started).num_seconds();
        }

        MonitorStatus {
            state,
            handles: self.shared.handles.read().await.clone(),
            target_usd: *self.shared.target_usd.read().await,
            stats,
        }
    }
}

// ---------------------------------------------------------------------------
// Tick loop
// ---------------------------------------------------------------------------

async fn run_loop(shared: Arc<Shared>, stop_flag: Arc<AtomicBool>, shutdown: Arc<Notify>) {
    let mut interval = tokio::time::interval(shared.tick_interval);
    // A tick that outlives the interval delays the next one; overlapping
    // ticks are unrepresentable in this loop.
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if stop_flag.load(Ordering::SeqCst) {
                    break;
                }
                run_tick(&shared).await;
            }
            _ = shutdown.notified() => break,
        }
    }

    debug!("Monitor loop exited");
}

/// One monitoring cycle over the configured handles.
async fn run_tick(shared: &Shared) {
    if shared.paused.load(Ordering::SeqCst) {
        debug!("Monitor is paused, skipping cycle");
        return;
    }

    {
        let mut stats = shared.stats.write().await;
        stats.last_run = Some(Utc::now());
        if let Some(started) = *shared.started_at.read().await {
            stats.uptime_secs = (Utc::now() - started).num_seconds();
        }
    }

    let handles = shared.handles.read().await.clone();
    debug!(count = handles.len(), "Monitoring handles");

    for handle in &handles {
        if shared.paused.load(Ordering::SeqCst) {
            info!("Paused mid-cycle, deferring remaining handles");
            break;
        }

        // Per-handle isolation: one handle failing never stops the rest
        // of this tick's list.
        if let Err(e) = process_handle(shared, handle).await {
            shared.stats.write().await.errors += 1;
            error!(handle = %handle, error = %e, "Handle processing failed");
        }
    }
}

/// Fetch → classify → (maybe) trade for one handle.
async fn process_handle(shared: &Shared, handle: &str) -> Result<(), HeraldError> {
    let post = shared.fetcher.lock().await.fetch(handle).await?;

    let Some(post) = post else {
        return Ok(());
    };

    info!(handle, post = %post, "New post detected");

    // An unavailable classifier is a negative verdict, never a tick failure.
    let verdict = match shared
        .classifier
        .classify(&post.text, &post.media_urls)
        .await
    {
        Ok(verdict) => verdict,
        Err(e) => {
            warn!(handle, error = %e, "Classifier unavailable, treating as negative");
            Verdict::unavailable(format!("Classifier unavailable: {e:#}"))
        }
    };

    info!(handle, verdict = %verdict, "Post classified");

    notify::best_effort(
        shared.notifier.as_ref(),
        &new_post_message(handle, &post.url(handle), &verdict),
    )
    .await;

    shared.stats.write().await.posts_processed += 1;

    if !verdict.worth_buying {
        return Ok(());
    }

    let target_usd = *shared.target_usd.read().await;
    match shared.pipeline.execute(handle, target_usd).await {
        Ok(result) => {
            notify::best_effort(shared.notifier.as_ref(), &trade_message(handle, &result)).await;
            if result.confirmed {
                shared.stats.write().await.purchases_made += 1;
            }
            Ok(())
        }
        Err(e) => {
            // Exactly one notification per terminal outcome; the error
            // still propagates so the handle boundary counts it.
            notify::best_effort(
                shared.notifier.as_ref(),
                &format!("⚠️ Trade attempt failed for @{handle}\n\n{e}"),
            )
            .await;
            Err(e)
        }
    }
}

// ---------------------------------------------------------------------------
// Notification messages
// ---------------------------------------------------------------------------

fn new_post_message(handle: &str, url: &str, verdict: &Verdict) -> String {
    format!(
        "🚨 NEW POST DETECTED\n\n\
         👤 @{handle} posted\n\
         🔗 {url}\n\n\
         🤖 Decision: {}\n\
         📊 Confidence: {:.0}%\n\
         💭 Reason: {}\n\n\
         {}",
        if verdict.worth_buying {
            "✅ WORTH BUYING"
        } else {
            "❌ NOT WORTH BUYING"
        },
        verdict.confidence * 100.0,
        verdict.reason,
        if verdict.worth_buying {
            "🚀 Initiating token purchase..."
        } else {
            "⏭️ Skipping this opportunity"
        },
    )
}

fn trade_message(handle: &str, result: &TradeResult) -> String {
    format!(
        "{} Swap {}\n\n\
         👤 Handle: @{handle}\n\
         🏠 Mint: {}\n\
         💵 Input: {:.6} SOL\n\
         💎 Output: {} (raw units)\n\
         🔏 Signature: {}\n\
         📦 Confirmed: {}",
        if result.confirmed { "✅" } else { "❌" },
        if result.confirmed {
            "executed"
        } else {
            "broadcast but not confirmed on-chain"
        },
        result.quote.output_mint,
        result.quote.in_amount as f64 / LAMPORTS_PER_SOL as f64,
        result.quote.out_amount,
        result.signature,
        result.confirmed,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
