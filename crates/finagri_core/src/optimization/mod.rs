//! Portfolio optimizer
//!
//! Builds a dividend-oriented basket from the historical securities dataset.
//! Three strategies are available:
//!
//! - stochastic: rejection-sampled random weights, best blended score wins
//! - convex: branch-and-bound over selection indicators with per-asset
//!   weight bounds, a dividend floor and a minimum basket size
//! - hybrid: stochastic first, then the convex search on the securities the
//!   stochastic basket kept
//!
//! Convex failures fall back to the stochastic search; a failed hybrid
//! refinement returns the stochastic basket unchanged.
//!
//! # Example
//!
//! ```ignore
//! use finagri_core::optimization::{OptimizerConfig, optimize_portfolio};
//!
//! let config = OptimizerConfig {
//!     min_dividend_yield: 0.05,
//!     min_securities: 4,
//!     ..Default::default()
//! };
//! let portfolio = optimize_portfolio(&dataset, &config)?;
//! println!("{:.2}% expected yield", portfolio.stats().dividend_yield * 100.0);
//! ```

mod config;
mod convex;
mod result;
mod stochastic;
mod universe;

pub use config::OptimizerConfig;
pub use convex::convex_search;
pub use result::{Allocation, StrategyOutcome};
pub use stochastic::stochastic_search;
pub use universe::{MIN_REPORTED_WEIGHT, Universe};

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::error::Result;
use crate::model::{OptimizationStrategy, Portfolio, SecurityDataset};

/// Select a basket according to `config.strategy`.
///
/// # Errors
/// - `ConfigurationError` for out-of-range parameters
/// - `ValidationError` when fewer than `min_securities` pass the filters
/// - `OptimizationError` when the last strategy of the fallback chain fails
pub fn optimize_portfolio(dataset: &SecurityDataset, config: &OptimizerConfig) -> Result<Portfolio> {
    config.validate()?;
    let universe = Universe::from_dataset(dataset, config)?;
    tracing::debug!(
        eligible = universe.len(),
        strategy = ?config.strategy,
        "optimizing portfolio"
    );

    let (allocation, produced_by, basket) = match config.strategy {
        OptimizationStrategy::Stochastic => {
            let allocation = run_stochastic(&universe, config)?;
            (allocation, OptimizationStrategy::Stochastic, universe)
        }
        OptimizationStrategy::Convex => match convex_search(&universe, config) {
            StrategyOutcome::Success(allocation) => {
                (allocation, OptimizationStrategy::Convex, universe)
            }
            StrategyOutcome::Infeasible(reason) => {
                tracing::warn!(%reason, "convex search failed, falling back to stochastic");
                let allocation = run_stochastic(&universe, config)?;
                (allocation, OptimizationStrategy::Stochastic, universe)
            }
        },
        OptimizationStrategy::Hybrid => {
            let prefilter = run_stochastic(&universe, config)?;
            let kept: Vec<usize> = (0..universe.len())
                .filter(|&i| prefilter.weights[i] > MIN_REPORTED_WEIGHT)
                .collect();
            let candidates = universe.subset(&kept);

            match convex_search(&candidates, config) {
                StrategyOutcome::Success(allocation) => {
                    (allocation, OptimizationStrategy::Hybrid, candidates)
                }
                StrategyOutcome::Infeasible(reason) => {
                    tracing::warn!(%reason, "hybrid refinement failed, keeping stochastic basket");
                    (prefilter, OptimizationStrategy::Stochastic, universe)
                }
            }
        }
    };

    let portfolio = basket.portfolio(&allocation.weights, produced_by, config.risk_free_rate)?;
    tracing::info!(
        holdings = portfolio.len(),
        produced_by = ?produced_by,
        dividend_yield = portfolio.stats().dividend_yield,
        "portfolio optimized"
    );
    Ok(portfolio)
}

fn run_stochastic(universe: &Universe, config: &OptimizerConfig) -> Result<Allocation> {
    let mut rng = SmallRng::seed_from_u64(config.seed);
    Ok(stochastic_search(universe, config, &mut rng).into_result()?)
}
