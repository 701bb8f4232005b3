use serde::{Deserialize, Serialize};

/// Strategy used to build a basket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationStrategy {
    /// Rejection-sampled random weights
    Stochastic,
    /// Mixed-integer convex program, falls back to stochastic on failure
    Convex,
    /// Stochastic prefilter refined by the convex program
    #[default]
    Hybrid,
}

/// One selected security and its weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub name: String,
    pub sector: String,
    pub weight: f64,
    /// Mean historical dividend yield
    pub dividend_yield: f64,
    /// Mean dividend yield plus mean price variation
    pub total_return: f64,
}

/// Summary statistics of a weighted basket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    pub expected_return: f64,
    pub dividend_yield: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

/// Optimizer output. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    holdings: Vec<Holding>,
    stats: PortfolioStats,
    /// Strategy that actually produced the weights (after any fallback)
    produced_by: OptimizationStrategy,
}

impl Portfolio {
    pub(crate) fn new(
        holdings: Vec<Holding>,
        stats: PortfolioStats,
        produced_by: OptimizationStrategy,
    ) -> Self {
        Self {
            holdings,
            stats,
            produced_by,
        }
    }

    #[must_use]
    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    #[must_use]
    pub fn stats(&self) -> &PortfolioStats {
        &self.stats
    }

    #[must_use]
    pub fn produced_by(&self) -> OptimizationStrategy {
        self.produced_by
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.holdings.iter().map(|h| h.name.clone()).collect()
    }

    #[must_use]
    pub fn weights(&self) -> Vec<f64> {
        self.holdings.iter().map(|h| h.weight).collect()
    }

    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.holdings.iter().map(|h| h.weight).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}
