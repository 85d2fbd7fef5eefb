//! Jupiter swap aggregator integration.
//!
//! Quote and swap-build calls against the Jupiter lite API, plus the SOL/USD
//! price lookup. Wire responses are validated and normalized into the domain
//! `Quote`/`SwapTransaction` records at this boundary — malformed payloads
//! never leave this module partially populated.
//!
//! Base URL: https://lite-api.jup.ag

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::QuoteRequest;
use crate::types::{Quote, SwapTransaction, SOL_MINT};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const SWAP_BASE_URL: &str = "https://lite-api.jup.ag/swap/v1";
const PRICE_URL: &str = "https://lite-api.jup.ag/price/v2";

// ---------------------------------------------------------------------------
// API types (Jupiter JSON → Rust)
// ---------------------------------------------------------------------------

/// Jupiter quote response — only the fields we validate. The full payload
/// is kept as raw JSON for the swap-build step.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteWire {
    input_mint: String,
    in_amount: String,
    output_mint: String,
    out_amount: String,
    #[serde(default)]
    price_impact_pct: Option<String>,
    #[serde(default)]
    slippage_bps: u16,
    #[serde(default)]
    route_plan: Vec<RoutePlanStep>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoutePlanStep {
    swap_info: SwapInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapInfo {
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapRequestWire<'a> {
    quote_response: &'a Value,
    user_public_key: &'a str,
    dynamic_compute_unit_limit: bool,
    prioritization_fee_lamports: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponseWire {
    swap_transaction: String,
    #[serde(default)]
    last_valid_block_height: u64,
    #[serde(default)]
    prioritization_fee_lamports: u64,
    #[serde(default)]
    compute_unit_limit: u32,
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    #[serde(default)]
    data: std::collections::HashMap<String, PriceEntry>,
}

#[derive(Debug, Deserialize)]
struct PriceEntry {
    #[serde(default)]
    price: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Jupiter lite-API client.
pub struct JupiterClient {
    http: Client,
}

impl JupiterClient {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("HERALD/0.1.0 (social-signal-agent)")
            .build()
            .context("Failed to build HTTP client for Jupiter")?;

        Ok(Self { http })
    }

    /// Request a quote and normalize it.
    pub async fn quote(&self, request: &QuoteRequest) -> Result<Quote> {
        let url = format!(
            "{SWAP_BASE_URL}/quote?inputMint={}&outputMint={}&amount={}&slippageBps={}&restrictIntermediateTokens={}",
            request.input_mint,
            request.output_mint,
            request.amount,
            request.slippage_bps,
            request.restrict_intermediate_tokens,
        );

        debug!(url = %url, "Requesting Jupiter quote");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("Jupiter quote request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Jupiter quote API returned {status}: {body}"));
        }

        let raw: Value = resp
            .json()
            .await
            .context("Malformed Jupiter quote response")?;

        normalize_quote(raw)
    }

    /// Build an unsigned swap transaction from a quote.
    ///
    /// Dynamic compute-unit limit estimation is always requested; the
    /// prioritization fee is left to the aggregator ("auto").
    pub async fn build_swap(&self, quote: &Quote, user_public_key: &str) -> Result<SwapTransaction> {
        let request = SwapRequestWire {
            quote_response: &quote.raw,
            user_public_key,
            dynamic_compute_unit_limit: true,
            prioritization_fee_lamports: "auto",
        };

        debug!(user = user_public_key, "Building Jupiter swap transaction");

        let resp = self
            .http
            .post(format!("{SWAP_BASE_URL}/swap"))
            .json(&request)
            .send()
            .await
            .context("Jupiter swap request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Jupiter swap API returned {status}: {body}"));
        }

        let wire: SwapResponseWire = resp
            .json()
            .await
            .context("Malformed Jupiter swap response")?;

        if wire.swap_transaction.is_empty() {
            return Err(anyhow!("Jupiter swap response carried no transaction payload"));
        }

        Ok(SwapTransaction {
            payload_base64: wire.swap_transaction,
            compute_unit_limit: wire.compute_unit_limit,
            prioritization_fee_lamports: wire.prioritization_fee_lamports,
            last_valid_block_height: wire.last_valid_block_height,
        })
    }

    /// Current SOL price in USD via the Jupiter price API.
    pub async fn sol_price_usd(&self) -> Result<f64> {
        let url = format!("{PRICE_URL}?ids={SOL_MINT}");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("Jupiter price request failed")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("Jupiter price API returned {status}"));
        }

        let parsed: PriceResponse = resp
            .json()
            .await
            .context("Malformed Jupiter price response")?;

        let price = parsed
            .data
            .get(SOL_MINT)
            .and_then(|entry| entry.price.as_deref())
            .ok_or_else(|| anyhow!("Jupiter price response missing SOL entry"))?
            .parse::<f64>()
            .context("Unparseable SOL price")?;

        if !price.is_finite() || price <= 0.0 {
            return Err(anyhow!("Implausible SOL price: {price}"));
        }

        Ok(price)
    }
}

/// Validate a raw Jupiter quote payload and normalize it into the domain
/// `Quote`. String amounts must parse as u64; a missing route degrades to
/// an "Unknown" label rather than an error.
fn normalize_quote(raw: Value) -> Result<Quote> {
    let wire: QuoteWire = serde_json::from_value(raw.clone())
        .context("Jupiter quote payload missing required fields")?;

    let in_amount = wire
        .in_amount
        .parse::<u64>()
        .with_context(|| format!("Unparseable quote inAmount: {}", wire.in_amount))?;
    let out_amount = wire
        .out_amount
        .parse::<u64>()
        .with_context(|| format!("Unparseable quote outAmount: {}", wire.out_amount))?;

    let price_impact_pct = wire
        .price_impact_pct
        .as_deref()
        .map(str::parse::<f64>)
        .transpose()
        .context("Unparseable quote priceImpactPct")?
        .unwrap_or(0.0);

    let route_label = wire
        .route_plan
        .first()
        .and_then(|step| step.swap_info.label.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    Ok(Quote {
        input_mint: wire.input_mint,
        output_mint: wire.output_mint,
        in_amount,
        out_amount,
        price_impact_pct,
        route_label,
        slippage_bps: wire.slippage_bps,
        raw,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
