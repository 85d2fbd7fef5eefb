//! HERALD — Social-Signal Token Acquisition Agent
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the social source, classifier, chain gateway, and notifier into
//! the monitoring scheduler, spawns the control API, and runs until
//! Ctrl+C.

use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use herald::chain::solana::SolanaGateway;
use herald::classify::gemini::GeminiClassifier;
use herald::config::AppConfig;
use herald::control::spawn_control_server;
use herald::monitor::{Monitor, MonitorSettings};
use herald::notify::telegram::TelegramNotifier;
use herald::registry::{JsonTokenStore, TokenStore};
use herald::social::rapidapi::RapidApiClient;
use herald::trade::TradePipeline;

const BANNER: &str = r#"
 _   _ _____ ____      _    _     ____
| | | | ____|  _ \    / \  | |   |  _ \
| |_| |  _| | |_) |  / _ \ | |   | | | |
|  _  | |___|  _ <  / ___ \| |___| |_| |
|_| |_|_____|_| \_\/_/   \_\_____|____/

  Handle-Event Reactive Auto-trade Listener Daemon
  v0.1.0 — Autonomous Agent
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        bot_name = %cfg.bot.name,
        tick_interval_secs = cfg.bot.tick_interval_secs,
        target_usd = cfg.bot.target_usd_amount,
        "HERALD starting up"
    );

    // -- Initialise collaborators ----------------------------------------

    // Token store; log the configured mappings once at startup.
    let store = JsonTokenStore::new(&cfg.tokens.path);
    let handles = store
        .handles()
        .with_context(|| format!("Failed to load token store: {}", cfg.tokens.path))?;
    for mapping in store.mappings()? {
        info!(mapping = %mapping, "Token mapping loaded");
    }
    let store: Arc<dyn TokenStore> = Arc::new(store);

    // Social timeline source
    let social_key = SecretString::from(AppConfig::resolve_env(&cfg.social.api_key_env)?);
    let source = Arc::new(RapidApiClient::new(social_key)?);

    // Classifier — runs keyless in observe-only mode
    let classifier_key = match std::env::var(&cfg.classifier.api_key_env) {
        Ok(key) if !key.is_empty() => Some(SecretString::from(key)),
        _ => {
            warn!("No classifier API key configured — every post will be scored as not worth buying");
            None
        }
    };
    let classifier = Arc::new(GeminiClassifier::new(
        classifier_key,
        Some(cfg.classifier.model.clone()),
    )?);

    // Chain gateway (wallet + RPC + aggregator)
    let private_key = SecretString::from(AppConfig::resolve_env(&cfg.chain.private_key_env)?);
    let gateway = Arc::new(SolanaGateway::new(&cfg.chain.rpc_url, &private_key)?);

    // Operator notifications
    let bot_token = SecretString::from(AppConfig::resolve_env(&cfg.notifier.bot_token_env)?);
    let chat_id = AppConfig::resolve_env(&cfg.notifier.chat_id_env)?;
    let notifier = Arc::new(TelegramNotifier::new(bot_token, chat_id)?);

    // -- Monitor ----------------------------------------------------------

    let pipeline = TradePipeline::new(gateway, store, cfg.chain.slippage_bps);

    let monitor = Monitor::new(
        MonitorSettings {
            tick_interval: Duration::from_secs(cfg.bot.tick_interval_secs),
            min_fetch_spacing: Duration::from_millis(cfg.bot.min_fetch_spacing_ms),
            handles,
            target_usd: cfg.bot.target_usd_amount,
        },
        source,
        classifier,
        notifier,
        pipeline,
    );

    if cfg.control.enabled {
        spawn_control_server(monitor.clone(), cfg.control.port)?;
    }

    if cfg.bot.autostart {
        monitor.start().await;
    } else {
        info!("Autostart disabled — waiting for /start on the control API");
    }

    // -- Run until shutdown ----------------------------------------------

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received.");

    monitor.stop().await;

    let status = monitor.status().await;
    info!(
        posts = status.stats.posts_processed,
        purchases = status.stats.purchases_made,
        errors = status.stats.errors,
        "HERALD shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("herald=info"));

    let json_logging = std::env::var("HERALD_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
