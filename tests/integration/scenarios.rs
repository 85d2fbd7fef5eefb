//! End-to-end monitor scenarios.
//!
//! Each test stands up a full monitor against the in-memory collaborators,
//! runs one or more virtual ticks with the tokio clock paused, and asserts
//! on the recorded fetch/classify/trade/notify traffic.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use herald::classify::Classifier;
use herald::monitor::{Monitor, MonitorSettings};
use herald::registry::TokenStore;
use herald::social::PostSource;
use herald::trade::TradePipeline;
use herald::types::{RunState, Verdict};

use crate::mocks::{
    MapTokenStore, RecordingNotifier, ScriptedClassifier, ScriptedGateway, ScriptedSource,
    NATIVE_MINT, TEST_MINT,
};

const TICK: Duration = Duration::from_secs(5);
const SPACING: Duration = Duration::from_millis(1000);

struct Harness {
    monitor: Monitor,
    source: Arc<ScriptedSource>,
    classifier: Arc<ScriptedClassifier>,
    gateway: Arc<ScriptedGateway>,
    notifier: Arc<RecordingNotifier>,
}

/// Build a monitor over the given handles with an `alice → TEST_MINT`
/// style mapping for every handle that has a token.
fn harness(
    handles: &[&str],
    mapped: &[(&str, &str, &str)],
    classifier: Arc<ScriptedClassifier>,
    gateway: Arc<ScriptedGateway>,
) -> Harness {
    let source = ScriptedSource::new();
    let notifier = RecordingNotifier::new();
    let store: Arc<dyn TokenStore> = MapTokenStore::new(mapped);

    let pipeline = TradePipeline::new(gateway.clone(), store, 100);

    let monitor = Monitor::new(
        MonitorSettings {
            tick_interval: TICK,
            min_fetch_spacing: SPACING,
            handles: handles.iter().map(|h| h.to_string()).collect(),
            target_usd: 1.0,
        },
        source.clone() as Arc<dyn PostSource>,
        classifier.clone(),
        notifier.clone(),
        pipeline,
    );

    Harness {
        monitor,
        source,
        classifier,
        gateway,
        notifier,
    }
}

/// Let the running monitor work through `virtual_time` of paused-clock time.
async fn run_for(virtual_time: Duration) {
    tokio::time::sleep(virtual_time).await;
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_positive_post_executes_swap_end_to_end() {
    // $1 target at $100/SOL → 0.01 SOL → 10_000_000 lamports; wallet holds
    // 0.02 SOL, comfortably above the 0.011 required with the margin.
    let h = harness(
        &["alice"],
        &[("alice", "SYM", TEST_MINT)],
        ScriptedClassifier::positive(),
        ScriptedGateway::new(0.02, 100.0),
    );
    h.source.set_post("alice", "1001", "Huge partnership announcement!");

    h.monitor.start().await;
    run_for(Duration::from_secs(3)).await;
    h.monitor.stop().await;

    // Quote issued with exactly the configured parameters
    let quotes = h.gateway.quote_log();
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].amount, 10_000_000);
    assert_eq!(quotes[0].input_mint, NATIVE_MINT);
    assert_eq!(quotes[0].output_mint, TEST_MINT);
    assert_eq!(quotes[0].slippage_bps, 100);
    assert!(quotes[0].restrict_intermediate_tokens);

    assert_eq!(h.gateway.build_count(), 1);
    assert_eq!(h.gateway.send_count(), 1);

    // Exactly one new-post notification and one success notification,
    // the latter carrying the signature and the confirmed flag.
    let messages = h.notifier.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].contains("NEW POST DETECTED"));
    assert!(messages[0].contains("WORTH BUYING"));
    assert!(messages[1].contains("MockSig1"));
    assert!(messages[1].contains("Confirmed: true"));

    let status = h.monitor.status().await;
    assert_eq!(status.stats.posts_processed, 1);
    assert_eq!(status.stats.purchases_made, 1);
    assert_eq!(status.stats.errors, 0);
}

#[tokio::test(start_paused = true)]
async fn test_insufficient_balance_stops_before_quote() {
    // Same setup, but the wallet only holds 0.005 SOL (< 0.011 required).
    let h = harness(
        &["alice"],
        &[("alice", "SYM", TEST_MINT)],
        ScriptedClassifier::positive(),
        ScriptedGateway::new(0.005, 100.0),
    );
    h.source.set_post("alice", "1001", "Huge partnership announcement!");

    h.monitor.start().await;
    run_for(Duration::from_secs(3)).await;
    h.monitor.stop().await;

    // Zero quote/build/send traffic
    assert!(h.gateway.quote_log().is_empty());
    assert_eq!(h.gateway.build_count(), 0);
    assert_eq!(h.gateway.send_count(), 0);

    // Exactly one failure notification, naming the condition
    let messages = h.notifier.messages();
    let failures: Vec<_> = messages
        .iter()
        .filter(|m| m.contains("Trade attempt failed"))
        .collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("Insufficient balance"));

    assert_eq!(h.monitor.status().await.stats.errors, 1);
}

// ---------------------------------------------------------------------------
// Classification gating
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_negative_verdict_triggers_no_trade() {
    let h = harness(
        &["alice"],
        &[("alice", "SYM", TEST_MINT)],
        ScriptedClassifier::negative(),
        ScriptedGateway::new(1.0, 100.0),
    );
    h.source.set_post("alice", "1001", "just had a nice coffee");

    h.monitor.start().await;
    run_for(Duration::from_secs(3)).await;
    h.monitor.stop().await;

    assert_eq!(h.classifier.calls().len(), 1);
    assert!(h.gateway.quote_log().is_empty());
    assert_eq!(h.gateway.send_count(), 0);

    // The post itself is still reported, with the negative verdict.
    let messages = h.notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("NOT WORTH BUYING"));

    assert_eq!(h.monitor.status().await.stats.posts_processed, 1);
    assert_eq!(h.monitor.status().await.stats.purchases_made, 0);
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_classifier_degrades_to_negative() {
    let h = harness(
        &["alice"],
        &[("alice", "SYM", TEST_MINT)],
        ScriptedClassifier::positive(),
        ScriptedGateway::new(1.0, 100.0),
    );
    h.classifier.set_unavailable("upstream 503");
    h.source.set_post("alice", "1001", "Huge partnership announcement!");

    h.monitor.start().await;
    run_for(Duration::from_secs(3)).await;
    h.monitor.stop().await;

    // No trade, no tick error — just a negative verdict in the report.
    assert!(h.gateway.quote_log().is_empty());
    let status = h.monitor.status().await;
    assert_eq!(status.stats.errors, 0);
    assert_eq!(status.stats.posts_processed, 1);

    let messages = h.notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Classifier unavailable"));
}

#[tokio::test(start_paused = true)]
async fn test_missing_mapping_reports_no_token() {
    // alice posts a buy signal but has no token configured.
    let h = harness(
        &["alice"],
        &[],
        ScriptedClassifier::positive(),
        ScriptedGateway::new(1.0, 100.0),
    );
    h.source.set_post("alice", "1001", "Huge partnership announcement!");

    h.monitor.start().await;
    run_for(Duration::from_secs(3)).await;
    h.monitor.stop().await;

    // Terminal before any chain traffic
    assert!(h.gateway.quote_log().is_empty());
    assert_eq!(h.gateway.build_count(), 0);

    let messages = h.notifier.messages();
    let failures: Vec<_> = messages
        .iter()
        .filter(|m| m.contains("Trade attempt failed"))
        .collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("No token configured"));
}

// ---------------------------------------------------------------------------
// Dedup
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_post_id_classified_at_most_once_across_ticks() {
    let h = harness(
        &["alice"],
        &[("alice", "SYM", TEST_MINT)],
        ScriptedClassifier::negative(),
        ScriptedGateway::new(1.0, 100.0),
    );
    h.source.set_post("alice", "1001", "hello world");

    h.monitor.start().await;
    // Three full ticks
    run_for(Duration::from_secs(13)).await;
    h.monitor.stop().await;

    // Fetched every tick, classified exactly once.
    assert!(h.source.fetch_log().len() >= 3);
    assert_eq!(h.classifier.calls().len(), 1);
    assert_eq!(h.notifier.messages().len(), 1);
    assert_eq!(h.monitor.status().await.stats.posts_processed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_new_post_after_old_one_is_processed() {
    let h = harness(
        &["alice"],
        &[("alice", "SYM", TEST_MINT)],
        ScriptedClassifier::negative(),
        ScriptedGateway::new(1.0, 100.0),
    );
    h.source.set_post("alice", "1001", "first post");

    h.monitor.start().await;
    run_for(Duration::from_secs(3)).await;

    h.source.set_post("alice", "1002", "second post");
    run_for(Duration::from_secs(5)).await;
    h.monitor.stop().await;

    let calls = h.classifier.calls();
    assert_eq!(calls, vec!["first post".to_string(), "second post".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_no_new_post_means_no_traffic() {
    let h = harness(
        &["alice"],
        &[("alice", "SYM", TEST_MINT)],
        ScriptedClassifier::negative(),
        ScriptedGateway::new(1.0, 100.0),
    );
    // No posts scripted at all.

    h.monitor.start().await;
    run_for(Duration::from_secs(8)).await;
    h.monitor.stop().await;

    assert!(h.classifier.calls().is_empty());
    assert!(h.notifier.messages().is_empty());
    assert_eq!(h.monitor.status().await.stats.posts_processed, 0);
}

// ---------------------------------------------------------------------------
// Failure isolation
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_failing_handle_does_not_block_later_handles() {
    let h = harness(
        &["bad", "good"],
        &[("good", "SYM", TEST_MINT)],
        ScriptedClassifier::negative(),
        ScriptedGateway::new(1.0, 100.0),
    );
    h.source.fail_handle("bad", "connection reset");
    h.source.set_post("good", "2001", "post from good");

    h.monitor.start().await;
    run_for(Duration::from_secs(4)).await;
    h.monitor.stop().await;

    // Both handles were attempted, in order; good was fully processed.
    let log = h.source.fetch_log();
    assert_eq!(&log[..2], &["bad".to_string(), "good".to_string()]);
    assert_eq!(h.classifier.calls(), vec!["post from good".to_string()]);
    assert_eq!(h.monitor.status().await.stats.errors, 1);
}

// ---------------------------------------------------------------------------
// Unconfirmed outcomes
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_on_chain_rejection_is_reported_not_errored() {
    let h = harness(
        &["alice"],
        &[("alice", "SYM", TEST_MINT)],
        ScriptedClassifier::positive(),
        ScriptedGateway::new(1.0, 100.0),
    );
    h.gateway.set_confirm(Ok(false));
    h.source.set_post("alice", "1001", "Huge partnership announcement!");

    h.monitor.start().await;
    run_for(Duration::from_secs(3)).await;
    h.monitor.stop().await;

    let messages = h.notifier.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[1].contains("not confirmed on-chain"));
    assert!(messages[1].contains("Confirmed: false"));

    let status = h.monitor.status().await;
    assert_eq!(status.stats.purchases_made, 0);
    assert_eq!(status.stats.errors, 0);
}

#[tokio::test(start_paused = true)]
async fn test_confirmation_transport_error_is_unconfirmed_outcome() {
    let h = harness(
        &["alice"],
        &[("alice", "SYM", TEST_MINT)],
        ScriptedClassifier::positive(),
        ScriptedGateway::new(1.0, 100.0),
    );
    h.gateway.set_confirm(Err("blockhash expired".to_string()));
    h.source.set_post("alice", "1001", "Huge partnership announcement!");

    h.monitor.start().await;
    run_for(Duration::from_secs(3)).await;
    h.monitor.stop().await;

    let messages = h.notifier.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[1].contains("Confirmed: false"));
    assert_eq!(h.monitor.status().await.stats.errors, 0);
}

// ---------------------------------------------------------------------------
// Pause mid-cycle
// ---------------------------------------------------------------------------

/// Classifier wrapper that pauses the monitor when it sees the trigger
/// text — after that handle's processing has started, before the next
/// handle's pause check.
struct PauseOnClassify {
    inner: Arc<ScriptedClassifier>,
    monitor: Mutex<Option<Monitor>>,
    trigger: String,
}

#[async_trait]
impl Classifier for PauseOnClassify {
    async fn classify(&self, text: &str, media_urls: &[String]) -> Result<Verdict> {
        let verdict = self.inner.classify(text, media_urls).await;
        if text == self.trigger {
            let monitor = self.monitor.lock().unwrap().clone();
            if let Some(monitor) = monitor {
                monitor.pause().await;
            }
        }
        verdict
    }

    fn model_name(&self) -> &str {
        "pausing"
    }
}

#[tokio::test(start_paused = true)]
async fn test_pause_mid_cycle_defers_remaining_handles() {
    let source = ScriptedSource::new();
    let notifier = RecordingNotifier::new();
    let inner = ScriptedClassifier::negative();
    let pausing = Arc::new(PauseOnClassify {
        inner: inner.clone(),
        monitor: Mutex::new(None),
        trigger: "post a".to_string(),
    });
    let gateway = ScriptedGateway::new(1.0, 100.0);
    let store: Arc<dyn TokenStore> = MapTokenStore::new(&[]);
    let pipeline = TradePipeline::new(gateway, store, 100);

    let monitor = Monitor::new(
        MonitorSettings {
            tick_interval: TICK,
            min_fetch_spacing: SPACING,
            handles: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            target_usd: 1.0,
        },
        source.clone() as Arc<dyn PostSource>,
        pausing.clone(),
        notifier.clone(),
        pipeline,
    );
    *pausing.monitor.lock().unwrap() = Some(monitor.clone());

    source.set_post("a", "1", "post a");
    source.set_post("b", "2", "post b");
    source.set_post("c", "3", "post c");

    monitor.start().await;
    run_for(Duration::from_secs(4)).await;

    // Handle a completed (classified, reported); b and c were deferred.
    assert_eq!(source.fetch_log(), vec!["a".to_string()]);
    assert_eq!(inner.calls(), vec!["post a".to_string()]);
    assert_eq!(monitor.status().await.state, RunState::Paused);

    // Resume before the next scheduled tick; b and c run on the following
    // cycle (a's post is suppressed by the dedup index).
    monitor.resume().await;
    run_for(Duration::from_secs(5)).await;
    monitor.stop().await;

    assert_eq!(
        source.fetch_log(),
        vec![
            "a".to_string(),
            "a".to_string(),
            "b".to_string(),
            "c".to_string()
        ]
    );
    assert_eq!(
        inner.calls(),
        vec![
            "post a".to_string(),
            "post b".to_string(),
            "post c".to_string()
        ]
    );
}

// ---------------------------------------------------------------------------
// Configuration updates
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_updated_target_amount_flows_into_quotes() {
    let h = harness(
        &["alice"],
        &[("alice", "SYM", TEST_MINT)],
        ScriptedClassifier::positive(),
        ScriptedGateway::new(10.0, 100.0),
    );
    h.monitor.update_target_usd(2.0).await.unwrap();
    h.source.set_post("alice", "1001", "Huge partnership announcement!");

    h.monitor.start().await;
    run_for(Duration::from_secs(3)).await;
    h.monitor.stop().await;

    // $2 at $100/SOL → 0.02 SOL → 20_000_000 lamports
    let quotes = h.gateway.quote_log();
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].amount, 20_000_000);
}

#[tokio::test(start_paused = true)]
async fn test_updated_handles_take_effect_next_tick() {
    let h = harness(
        &["alice"],
        &[("alice", "SYM", TEST_MINT)],
        ScriptedClassifier::negative(),
        ScriptedGateway::new(1.0, 100.0),
    );
    h.source.set_post("alice", "1001", "from alice");
    h.source.set_post("carol", "2001", "from carol");

    h.monitor.start().await;
    run_for(Duration::from_secs(3)).await;

    h.monitor.update_handles(vec!["carol".to_string()]).await;
    run_for(Duration::from_secs(5)).await;
    h.monitor.stop().await;

    let calls = h.classifier.calls();
    assert_eq!(calls, vec!["from alice".to_string(), "from carol".to_string()]);
}
