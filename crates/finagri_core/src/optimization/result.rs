use crate::error::OptimizationError;

/// Weights over a [`super::Universe`], in universe order
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub weights: Vec<f64>,
    pub score: f64,
}

/// What a single strategy produced. Fallbacks are chained on this value
/// rather than on propagated errors.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutcome {
    Success(Allocation),
    Infeasible(OptimizationError),
}

impl StrategyOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, StrategyOutcome::Success(_))
    }

    pub fn into_result(self) -> Result<Allocation, OptimizationError> {
        match self {
            StrategyOutcome::Success(allocation) => Ok(allocation),
            StrategyOutcome::Infeasible(reason) => Err(reason),
        }
    }
}
