//! Rejection-sampled random search
//!
//! Draws uniform weights, normalises them to one, and rejects samples that
//! break the per-asset cap or the basket dividend floor. The best-scoring
//! accepted sample wins.

use rand::Rng;

use crate::error::OptimizationError;
use crate::linalg::dot;

use super::config::OptimizerConfig;
use super::result::{Allocation, StrategyOutcome};
use super::universe::Universe;

pub fn stochastic_search<R: Rng + ?Sized>(
    universe: &Universe,
    config: &OptimizerConfig,
    rng: &mut R,
) -> StrategyOutcome {
    let n = universe.len();
    let mut best: Option<Allocation> = None;
    let mut weights = vec![0.0; n];

    for _ in 0..config.trials {
        for w in &mut weights {
            *w = rng.random::<f64>();
        }
        let sum: f64 = weights.iter().sum();
        if sum <= 0.0 {
            continue;
        }
        for w in &mut weights {
            *w /= sum;
        }

        if weights.iter().any(|w| *w > config.max_weight) {
            continue;
        }
        if dot(&weights, &universe.dividend_yields) < config.min_dividend_yield {
            continue;
        }

        let score = universe.score(&weights, config);
        if best.as_ref().is_none_or(|b| score > b.score) {
            best = Some(Allocation {
                weights: weights.clone(),
                score,
            });
        }
    }

    match best {
        Some(allocation) => StrategyOutcome::Success(allocation),
        None => StrategyOutcome::Infeasible(OptimizationError::NoFeasibleSample {
            trials: config.trials,
        }),
    }
}
