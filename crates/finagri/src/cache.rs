//! Optimizer memoization
//!
//! Basket construction is the expensive step of every equity run. Results are
//! keyed by a hash of the serialized [`OptimizerConfig`] combined with a
//! fingerprint of the dataset, so a changed parameter or a new dataset
//! export never returns a stale basket.

use std::collections::hash_map::Entry;
use std::hash::{Hash, Hasher};
use std::path::Path;

use finagri_core::optimization::OptimizerConfig;
use finagri_core::{Portfolio, SecurityDataset, optimize_portfolio};
use rustc_hash::{FxHashMap, FxHasher};

use crate::util::io::atomic_write;

/// Cache file name inside the data directory
pub const CACHE_FILE: &str = "optimizer_cache.json";

/// Hash of everything the optimizer reads from a dataset
pub fn dataset_fingerprint(dataset: &SecurityDataset) -> color_eyre::Result<u64> {
    let mut hasher = FxHasher::default();
    serde_json::to_vec(dataset.records())?.hash(&mut hasher);
    Ok(hasher.finish())
}

fn cache_key(fingerprint: u64, config: &OptimizerConfig) -> color_eyre::Result<u64> {
    let mut hasher = FxHasher::default();
    fingerprint.hash(&mut hasher);
    serde_json::to_vec(config)?.hash(&mut hasher);
    Ok(hasher.finish())
}

/// Portfolios already computed in this or an earlier session
#[derive(Debug, Default)]
pub struct OptimizationCache {
    entries: FxHashMap<u64, Portfolio>,
    hits: usize,
    misses: usize,
}

impl OptimizationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached basket for `(dataset, config)` or optimize and store it.
    ///
    /// Optimizer failures are returned and nothing is cached.
    pub fn get_or_optimize(
        &mut self,
        dataset: &SecurityDataset,
        fingerprint: u64,
        config: &OptimizerConfig,
    ) -> color_eyre::Result<Portfolio> {
        let key = cache_key(fingerprint, config)?;
        match self.entries.entry(key) {
            Entry::Occupied(entry) => {
                self.hits += 1;
                tracing::debug!(key, "optimizer cache hit");
                Ok(entry.get().clone())
            }
            Entry::Vacant(entry) => {
                self.misses += 1;
                let portfolio = optimize_portfolio(dataset, config)?;
                tracing::info!(
                    key,
                    securities = portfolio.len(),
                    strategy = ?portfolio.produced_by(),
                    "portfolio optimized"
                );
                Ok(entry.insert(portfolio).clone())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Load a cache file. A missing or unreadable file yields an empty cache.
    pub fn load(path: &Path) -> Self {
        let entries = match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "discarding corrupt optimizer cache");
                    FxHashMap::default()
                }
            },
            Err(_) => FxHashMap::default(),
        };
        Self {
            entries,
            ..Self::default()
        }
    }

    pub fn save(&self, path: &Path) -> color_eyre::Result<()> {
        let json = serde_json::to_string(&self.entries)?;
        atomic_write(path, &json)?;
        tracing::debug!(path = %path.display(), entries = self.entries.len(), "optimizer cache saved");
        Ok(())
    }
}
