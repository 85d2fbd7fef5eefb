//! Chain integrations.
//!
//! Defines the `ChainGateway` trait — every on-chain step of a trade
//! (balance, price, quote, build, sign+send, confirm) behind one seam —
//! and provides the Solana/Jupiter implementation.

pub mod jupiter;
pub mod solana;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{Quote, SwapTransaction};

/// Parameters for a swap quote request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub input_mint: String,
    pub output_mint: String,
    /// Input amount in the chain's smallest integer unit.
    pub amount: u64,
    pub slippage_bps: u16,
    /// Restrict routing to direct/simple routes only.
    pub restrict_intermediate_tokens: bool,
}

/// Abstraction over the chain side of a trade.
///
/// A single instance holds the wallet credential and is used serially;
/// the monitor never runs two trades concurrently.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// The held wallet's public address.
    fn wallet_address(&self) -> String;

    /// Wallet balance in native-currency units (SOL).
    async fn balance_sol(&self) -> Result<f64>;

    /// Current native-currency price in USD.
    async fn native_price_usd(&self) -> Result<f64>;

    /// Request a priced swap route.
    async fn quote(&self, request: &QuoteRequest) -> Result<Quote>;

    /// Build an unsigned transaction from a quote, with dynamic
    /// compute-unit limit estimation.
    async fn build_swap(&self, quote: &Quote) -> Result<SwapTransaction>;

    /// Sign with the held credential and broadcast. Returns the signature.
    async fn sign_and_send(&self, tx: &SwapTransaction) -> Result<String>;

    /// Await chain confirmation for a broadcast signature.
    /// `Ok(false)` means the transaction was rejected on-chain.
    async fn confirm(&self, signature: &str) -> Result<bool>;
}
