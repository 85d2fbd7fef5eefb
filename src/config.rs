//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys, wallet key) are referenced by env-var name in the
//! config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub bot: BotConfig,
    pub social: SocialConfig,
    pub classifier: ClassifierConfig,
    pub chain: ChainConfig,
    pub notifier: NotifierConfig,
    pub control: ControlConfig,
    pub tokens: TokensConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    pub name: String,
    pub tick_interval_secs: u64,
    pub min_fetch_spacing_ms: u64,
    pub target_usd_amount: f64,
    /// Start monitoring immediately at process start; otherwise wait for
    /// a `/start` on the control API.
    #[serde(default = "default_autostart")]
    pub autostart: bool,
}

fn default_autostart() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct SocialConfig {
    pub api_key_env: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    pub model: String,
    pub api_key_env: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub private_key_env: String,
    pub slippage_bps: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotifierConfig {
    pub bot_token_env: String,
    pub chat_id_env: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokensConfig {
    /// Path to the handle → token JSON store, re-read on every lookup.
    pub path: String,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
