//! In-memory collaborators for integration testing.
//!
//! Deterministic implementations of the five external seams — social
//! source, classifier, chain gateway, notifier, and token store — all
//! fully controllable and inspectable from test code.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use herald::chain::{ChainGateway, QuoteRequest};
use herald::classify::Classifier;
use herald::notify::Notifier;
use herald::registry::TokenStore;
use herald::social::PostSource;
use herald::types::{FetchedPost, Quote, SwapTransaction, TokenInfo, Verdict, SOL_MINT};

// ---------------------------------------------------------------------------
// Social source
// ---------------------------------------------------------------------------

/// A social source whose per-handle "latest post" is set from test code.
pub struct ScriptedSource {
    posts: Mutex<HashMap<String, FetchedPost>>,
    failing: Mutex<HashMap<String, String>>,
    fetch_log: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            posts: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashMap::new()),
            fetch_log: Mutex::new(Vec::new()),
        })
    }

    /// Set the latest post for a handle. The source keeps returning it;
    /// duplicate suppression is the fetch client's job.
    pub fn set_post(&self, handle: &str, id: &str, text: &str) {
        self.posts.lock().unwrap().insert(
            handle.to_string(),
            FetchedPost {
                id: id.to_string(),
                text: text.to_string(),
                media_urls: vec![],
            },
        );
    }

    /// Make fetches for a handle fail with the given message.
    pub fn fail_handle(&self, handle: &str, message: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert(handle.to_string(), message.to_string());
    }

    /// Handles fetched so far, in call order.
    pub fn fetch_log(&self) -> Vec<String> {
        self.fetch_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostSource for ScriptedSource {
    async fn latest_post(&self, handle: &str) -> Result<Option<FetchedPost>> {
        self.fetch_log.lock().unwrap().push(handle.to_string());

        if let Some(message) = self.failing.lock().unwrap().get(handle) {
            return Err(anyhow!("{message}"));
        }

        Ok(self.posts.lock().unwrap().get(handle).cloned())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// A classifier returning a fixed verdict, recording every call.
pub struct ScriptedClassifier {
    verdict: Mutex<Verdict>,
    unavailable: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClassifier {
    pub fn negative() -> Arc<Self> {
        Arc::new(Self {
            verdict: Mutex::new(Verdict {
                worth_buying: false,
                reason: "nothing special".to_string(),
                confidence: 0.3,
            }),
            unavailable: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn positive() -> Arc<Self> {
        let this = Self::negative();
        this.set_verdict(Verdict {
            worth_buying: true,
            reason: "major launch".to_string(),
            confidence: 0.9,
        });
        this
    }

    pub fn set_verdict(&self, verdict: Verdict) {
        *self.verdict.lock().unwrap() = verdict;
    }

    /// Make classification fail — the monitor must degrade to a negative
    /// verdict, not a tick error.
    pub fn set_unavailable(&self, message: &str) {
        *self.unavailable.lock().unwrap() = Some(message.to_string());
    }

    /// Post texts classified so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, text: &str, _media_urls: &[String]) -> Result<Verdict> {
        self.calls.lock().unwrap().push(text.to_string());

        if let Some(message) = self.unavailable.lock().unwrap().as_ref() {
            return Err(anyhow!("{message}"));
        }

        Ok(self.verdict.lock().unwrap().clone())
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

// ---------------------------------------------------------------------------
// Chain gateway
// ---------------------------------------------------------------------------

/// Deterministic chain gateway: configurable balance/price/confirmation,
/// records every quote/build/send call.
pub struct ScriptedGateway {
    balance_sol: Mutex<f64>,
    price_usd: Mutex<f64>,
    confirm_result: Mutex<Result<bool, String>>,
    quote_log: Mutex<Vec<QuoteRequest>>,
    build_count: Mutex<u64>,
    send_count: Mutex<u64>,
}

impl ScriptedGateway {
    pub fn new(balance_sol: f64, price_usd: f64) -> Arc<Self> {
        Arc::new(Self {
            balance_sol: Mutex::new(balance_sol),
            price_usd: Mutex::new(price_usd),
            confirm_result: Mutex::new(Ok(true)),
            quote_log: Mutex::new(Vec::new()),
            build_count: Mutex::new(0),
            send_count: Mutex::new(0),
        })
    }

    pub fn set_balance(&self, balance_sol: f64) {
        *self.balance_sol.lock().unwrap() = balance_sol;
    }

    pub fn set_confirm(&self, result: Result<bool, String>) {
        *self.confirm_result.lock().unwrap() = result;
    }

    pub fn quote_log(&self) -> Vec<QuoteRequest> {
        self.quote_log.lock().unwrap().clone()
    }

    pub fn build_count(&self) -> u64 {
        *self.build_count.lock().unwrap()
    }

    pub fn send_count(&self) -> u64 {
        *self.send_count.lock().unwrap()
    }
}

#[async_trait]
impl ChainGateway for ScriptedGateway {
    fn wallet_address(&self) -> String {
        "TestWallet11111111111111111111111111111111".to_string()
    }

    async fn balance_sol(&self) -> Result<f64> {
        Ok(*self.balance_sol.lock().unwrap())
    }

    async fn native_price_usd(&self) -> Result<f64> {
        Ok(*self.price_usd.lock().unwrap())
    }

    async fn quote(&self, request: &QuoteRequest) -> Result<Quote> {
        self.quote_log.lock().unwrap().push(request.clone());
        Ok(Quote {
            input_mint: request.input_mint.clone(),
            output_mint: request.output_mint.clone(),
            in_amount: request.amount,
            out_amount: request.amount * 4, // arbitrary fixed rate
            price_impact_pct: 0.01,
            route_label: "MockAmm".to_string(),
            slippage_bps: request.slippage_bps,
            raw: serde_json::Value::Null,
        })
    }

    async fn build_swap(&self, _quote: &Quote) -> Result<SwapTransaction> {
        *self.build_count.lock().unwrap() += 1;
        Ok(SwapTransaction {
            payload_base64: "AQAA".to_string(),
            compute_unit_limit: 140_000,
            prioritization_fee_lamports: 5_000,
            last_valid_block_height: 1,
        })
    }

    async fn sign_and_send(&self, _tx: &SwapTransaction) -> Result<String> {
        *self.send_count.lock().unwrap() += 1;
        Ok(format!("MockSig{}", self.send_count()))
    }

    async fn confirm(&self, _signature: &str) -> Result<bool> {
        match &*self.confirm_result.lock().unwrap() {
            Ok(confirmed) => Ok(*confirmed),
            Err(message) => Err(anyhow!("{message}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Records every delivered notification.
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(Vec::new()),
        })
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Token store
// ---------------------------------------------------------------------------

/// Fixed in-memory handle → token map.
pub struct MapTokenStore {
    map: HashMap<String, TokenInfo>,
}

impl MapTokenStore {
    pub fn new(entries: &[(&str, &str, &str)]) -> Arc<Self> {
        let map = entries
            .iter()
            .map(|(handle, symbol, mint)| {
                (
                    handle.to_string(),
                    TokenInfo {
                        symbol: symbol.to_string(),
                        mint: mint.to_string(),
                    },
                )
            })
            .collect();
        Arc::new(Self { map })
    }
}

impl TokenStore for MapTokenStore {
    fn lookup(&self, handle: &str) -> Result<Option<TokenInfo>> {
        Ok(self.map.get(handle).cloned())
    }

    fn handles(&self) -> Result<Vec<String>> {
        let mut handles: Vec<String> = self.map.keys().cloned().collect();
        handles.sort();
        Ok(handles)
    }
}

// ---------------------------------------------------------------------------
// Shared constants
// ---------------------------------------------------------------------------

pub const TEST_MINT: &str = "TestMint1111111111111111111111111111111111";

/// Expected input mint of every quote in these tests.
pub const NATIVE_MINT: &str = SOL_MINT;
