//! Trade execution pipeline.
//!
//! Runs the full purchase protocol for a handle whose post was classified
//! as a buy signal: resolve token mapping → read balance → price → safety
//! check → quote → build → sign/send → confirm. Every step is a hard
//! boundary; failure surfaces a typed `HeraldError` to the caller. An
//! on-chain rejection at the confirmation step is NOT an error — it comes
//! back as `TradeResult { confirmed: false }`.

use std::sync::Arc;
use tracing::{info, warn};

use crate::chain::{ChainGateway, QuoteRequest};
use crate::registry::TokenStore;
use crate::types::{sol_to_lamports, HeraldError, TradeResult, SOL_MINT};

/// Balance required beyond the swap amount itself, reserved for network
/// fees and slippage.
const BALANCE_SAFETY_MARGIN: f64 = 1.1;

/// The balance/quote/build/send/confirm purchase protocol.
///
/// Holds the chain gateway (and with it the wallet credential) for its
/// lifetime; one instance, used serially by the monitor.
pub struct TradePipeline {
    chain: Arc<dyn ChainGateway>,
    tokens: Arc<dyn TokenStore>,
    slippage_bps: u16,
}

impl TradePipeline {
    pub fn new(
        chain: Arc<dyn ChainGateway>,
        tokens: Arc<dyn TokenStore>,
        slippage_bps: u16,
    ) -> Self {
        Self {
            chain,
            tokens,
            slippage_bps,
        }
    }

    /// Execute one purchase attempt for `handle`, spending `target_usd`
    /// worth of SOL.
    pub async fn execute(&self, handle: &str, target_usd: f64) -> Result<TradeResult, HeraldError> {
        // 1. Resolve the token mapping. Missing mapping is terminal — no
        //    fallback token.
        let token = self
            .tokens
            .lookup(handle)
            .map_err(|e| HeraldError::Config(format!("Token store read failed: {e:#}")))?
            .ok_or_else(|| HeraldError::NoTokenConfigured(handle.to_string()))?;

        info!(handle, token = %token.symbol, mint = %token.mint, "Starting trade attempt");

        // 2. Wallet balance.
        let balance_sol = self
            .chain
            .balance_sol()
            .await
            .map_err(|e| HeraldError::Chain(format!("{e:#}")))?;

        // 3. Price the target amount in SOL.
        let price_usd = self
            .chain
            .native_price_usd()
            .await
            .map_err(|e| HeraldError::Chain(format!("{e:#}")))?;
        if !(price_usd > 0.0) {
            return Err(HeraldError::Chain(format!(
                "Non-positive SOL price: {price_usd}"
            )));
        }
        let required_sol = target_usd / price_usd;

        // 4. Safety check, before any quote is issued.
        let required_with_margin = required_sol * BALANCE_SAFETY_MARGIN;
        if balance_sol < required_with_margin {
            return Err(HeraldError::InsufficientBalance {
                required_sol: required_with_margin,
                available_sol: balance_sol,
            });
        }

        // 5. Quote: SOL → token, direct routes only, amount floored to
        //    lamports.
        let request = QuoteRequest {
            input_mint: SOL_MINT.to_string(),
            output_mint: token.mint.clone(),
            amount: sol_to_lamports(required_sol),
            slippage_bps: self.slippage_bps,
            restrict_intermediate_tokens: true,
        };
        let quote = self
            .chain
            .quote(&request)
            .await
            .map_err(|e| HeraldError::Quote(format!("{e:#}")))?;

        if quote.output_mint != token.mint {
            return Err(HeraldError::Quote(format!(
                "Quote output mint {} does not match configured mint {}",
                quote.output_mint, token.mint,
            )));
        }

        info!(handle, quote = %quote, "Quote received");

        // 6. Build the unsigned transaction.
        let tx = self
            .chain
            .build_swap(&quote)
            .await
            .map_err(|e| HeraldError::Build(format!("{e:#}")))?;

        // 7. Sign and broadcast.
        let signature = self
            .chain
            .sign_and_send(&tx)
            .await
            .map_err(|e| HeraldError::Broadcast(format!("{e:#}")))?;

        // 8. Confirm. A failure here is a reportable outcome, not an error.
        let confirmed = match self.chain.confirm(&signature).await {
            Ok(confirmed) => confirmed,
            Err(e) => {
                warn!(handle, signature = %signature, error = %e, "Confirmation failed");
                false
            }
        };

        info!(handle, signature = %signature, confirmed, "Trade attempt complete");

        Ok(TradeResult {
            signature,
            confirmed,
            quote,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
