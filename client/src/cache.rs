//! Durable local mirror of the transaction list and category map.
//!
//! Two fixed keys, one JSON file per key under a cache directory. Reads
//! never fail the caller: a missing or malformed entry falls back to the
//! default (empty list / seeded categories) with a logged warning, exactly
//! like first launch.

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::{CategoryMap, Transaction};
use std::path::PathBuf;
use tracing::warn;

/// Cache key holding the JSON-serialized transaction list.
pub const TRANSACTIONS_KEY: &str = "money_manager_transactions";
/// Cache key holding the JSON-serialized category map.
pub const CATEGORIES_KEY: &str = "money_manager_categories";

#[derive(Clone)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Cached transaction list, newest first. Empty on first launch or
    /// when the entry cannot be parsed.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.read(TRANSACTIONS_KEY).unwrap_or_default()
    }

    /// Cached category map, or the seeded defaults.
    pub fn categories(&self) -> CategoryMap {
        self.read(CATEGORIES_KEY).unwrap_or_default()
    }

    pub fn store_transactions(&self, transactions: &[Transaction]) -> Result<()> {
        self.write(TRANSACTIONS_KEY, &transactions)
    }

    pub fn store_categories(&self, categories: &CategoryMap) -> Result<()> {
        self.write(CATEGORIES_KEY, categories)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.entry_path(key);
        if !path.exists() {
            return None;
        }
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("failed to read cache entry {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("malformed cache entry {}, treating as empty: {}", key, e);
                None
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let raw = serde_json::to_string(value)?;
        std::fs::write(self.entry_path(key), raw)?;
        Ok(())
    }
}
