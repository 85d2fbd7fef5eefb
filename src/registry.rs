//! Handle → token configuration store.
//!
//! Defines the `TokenStore` trait and a JSON-file implementation that
//! re-reads the store on every call, so edits to the file take effect on
//! the next lookup without a restart. Nothing in the core caches it.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::types::{HandleTokenMapping, TokenInfo};

/// Abstraction over the static handle → token configuration.
#[cfg_attr(test, mockall::automock)]
pub trait TokenStore: Send + Sync {
    /// Token configured for a handle, or None if the handle has no entry.
    fn lookup(&self, handle: &str) -> Result<Option<TokenInfo>>;

    /// All configured handles, in a fixed (sorted) order.
    fn handles(&self) -> Result<Vec<String>>;
}

/// On-disk entry shape: `{ "handle": { "symbol": "...", "address": "..." } }`.
#[derive(Debug, Deserialize)]
struct TokenEntry {
    symbol: String,
    address: String,
}

/// JSON-file backed token store.
pub struct JsonTokenStore {
    path: PathBuf,
}

impl JsonTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<HashMap<String, TokenEntry>> {
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read token store: {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse token store: {}", self.path.display()))
    }

    /// All mappings at once, for startup logging.
    pub fn mappings(&self) -> Result<Vec<HandleTokenMapping>> {
        let store = self.load()?;
        let mut mappings: Vec<HandleTokenMapping> = store
            .into_iter()
            .map(|(handle, entry)| HandleTokenMapping {
                handle,
                token: TokenInfo {
                    symbol: entry.symbol,
                    mint: entry.address,
                },
            })
            .collect();
        mappings.sort_by(|a, b| a.handle.cmp(&b.handle));
        Ok(mappings)
    }
}

impl TokenStore for JsonTokenStore {
    fn lookup(&self, handle: &str) -> Result<Option<TokenInfo>> {
        let store = self.load()?;
        Ok(store.get(handle).map(|entry| TokenInfo {
            symbol: entry.symbol.clone(),
            mint: entry.address.clone(),
        }))
    }

    fn handles(&self) -> Result<Vec<String>> {
        let store = self.load()?;
        let mut handles: Vec<String> = store.into_keys().collect();
        handles.sort();
        Ok(handles)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
