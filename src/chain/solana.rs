//! Solana chain gateway.
//!
//! Holds the wallet keypair and the RPC connection, and implements
//! `ChainGateway` by combining direct RPC calls (balance, send, confirm)
//! with the Jupiter client (price, quote, build). The keypair is decoded
//! once from a base58 secret at construction and never leaves this module.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use secrecy::{ExposeSecret, SecretString};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::commitment_config::CommitmentLevel;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::VersionedTransaction;
use tracing::{debug, info, warn};

use super::jupiter::JupiterClient;
use super::{ChainGateway, QuoteRequest};
use crate::types::{Quote, SwapTransaction, LAMPORTS_PER_SOL};

/// Network-level retries for transient broadcast failures.
const BROADCAST_MAX_RETRIES: usize = 3;

/// RPC request timeout.
const RPC_TIMEOUT_SECS: u64 = 30;

/// Production chain gateway: Solana RPC + Jupiter aggregator.
pub struct SolanaGateway {
    rpc: RpcClient,
    keypair: Keypair,
    jupiter: JupiterClient,
}

impl std::fmt::Debug for SolanaGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaGateway")
            .field("pubkey", &self.keypair.pubkey())
            .finish_non_exhaustive()
    }
}

impl SolanaGateway {
    /// Build a gateway from an RPC endpoint and a base58-encoded secret key.
    pub fn new(rpc_url: &str, private_key_base58: &SecretString) -> Result<Self> {
        let bytes = bs58::decode(private_key_base58.expose_secret())
            .into_vec()
            .context("Wallet private key is not valid base58")?;
        let keypair = Keypair::from_bytes(&bytes)
            .map_err(|e| anyhow!("Wallet private key is not a valid keypair: {e}"))?;

        let rpc = RpcClient::new_with_timeout(
            rpc_url.to_string(),
            std::time::Duration::from_secs(RPC_TIMEOUT_SECS),
        );

        info!(wallet = %keypair.pubkey(), rpc = rpc_url, "Solana gateway ready");

        Ok(Self {
            rpc,
            keypair,
            jupiter: JupiterClient::new()?,
        })
    }

    /// Decode a base64 transaction payload and sign it with `keypair`.
    fn decode_and_sign(payload_base64: &str, keypair: &Keypair) -> Result<VersionedTransaction> {
        let bytes = BASE64
            .decode(payload_base64)
            .context("Transaction payload is not valid base64")?;

        let unsigned: VersionedTransaction =
            bincode::deserialize(&bytes).context("Transaction payload failed to deserialize")?;

        VersionedTransaction::try_new(unsigned.message, &[keypair])
            .context("Failed to sign transaction")
    }
}

#[async_trait]
impl ChainGateway for SolanaGateway {
    fn wallet_address(&self) -> String {
        self.keypair.pubkey().to_string()
    }

    async fn balance_sol(&self) -> Result<f64> {
        let lamports = self
            .rpc
            .get_balance(&self.keypair.pubkey())
            .await
            .context("Balance lookup failed")?;
        Ok(lamports as f64 / LAMPORTS_PER_SOL as f64)
    }

    async fn native_price_usd(&self) -> Result<f64> {
        self.jupiter.sol_price_usd().await
    }

    async fn quote(&self, request: &QuoteRequest) -> Result<Quote> {
        self.jupiter.quote(request).await
    }

    async fn build_swap(&self, quote: &Quote) -> Result<SwapTransaction> {
        self.jupiter.build_swap(quote, &self.wallet_address()).await
    }

    async fn sign_and_send(&self, tx: &SwapTransaction) -> Result<String> {
        let signed = Self::decode_and_sign(&tx.payload_base64, &self.keypair)?;

        debug!(
            compute_unit_limit = tx.compute_unit_limit,
            priority_fee = tx.prioritization_fee_lamports,
            "Broadcasting signed transaction"
        );

        let config = RpcSendTransactionConfig {
            skip_preflight: false,
            preflight_commitment: Some(CommitmentLevel::Confirmed),
            max_retries: Some(BROADCAST_MAX_RETRIES),
            ..Default::default()
        };

        let signature = self
            .rpc
            .send_transaction_with_config(&signed, config)
            .await
            .map_err(|e| {
                // Surface the on-chain message when the RPC error carries one.
                match e.get_transaction_error() {
                    Some(tx_err) => anyhow!("Broadcast rejected: {tx_err} ({e})"),
                    None => anyhow!("Broadcast failed: {e}"),
                }
            })?;

        info!(signature = %signature, "Transaction broadcast");
        Ok(signature.to_string())
    }

    async fn confirm(&self, signature: &str) -> Result<bool> {
        let parsed: Signature = signature
            .parse()
            .with_context(|| format!("Invalid signature: {signature}"))?;

        match self.rpc.confirm_transaction(&parsed).await {
            Ok(confirmed) => Ok(confirmed),
            Err(e) => {
                warn!(signature, error = %e, "Confirmation query failed");
                Err(anyhow!("Confirmation failed: {e}"))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
