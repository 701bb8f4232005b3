//! Optimizer configuration
//!
//! Every field has a reference default so a partial YAML record is enough.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::model::OptimizationStrategy;

/// Constraint and objective profile for basket construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Minimum mean dividend yield, per security and for the basket
    #[serde(default = "default_min_dividend_yield")]
    pub min_dividend_yield: f64,

    /// Penalty on basket volatility
    #[serde(default)]
    pub risk_aversion: f64,

    /// Used only for the Sharpe ratio
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,

    /// Keep only rows flagged as stable dividend payers
    #[serde(default = "default_true")]
    pub stable_payers_only: bool,

    /// Minimum number of eligible and selected securities
    #[serde(default = "default_min_securities")]
    pub min_securities: usize,

    /// 1.0 = dividend yield only, 0.0 = total return only
    #[serde(default = "default_dividend_weight")]
    pub dividend_weight: f64,

    #[serde(default)]
    pub strategy: OptimizationStrategy,

    /// Random samples drawn by the stochastic search
    #[serde(default = "default_trials")]
    pub trials: usize,

    #[serde(default = "default_max_weight")]
    pub max_weight: f64,

    /// Lower bound for selected securities (convex search only)
    #[serde(default = "default_min_weight")]
    pub min_weight: f64,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_min_dividend_yield() -> f64 {
    0.02
}

fn default_risk_free_rate() -> f64 {
    0.03
}

fn default_true() -> bool {
    true
}

fn default_min_securities() -> usize {
    5
}

fn default_dividend_weight() -> f64 {
    0.5
}

fn default_trials() -> usize {
    5000
}

fn default_max_weight() -> f64 {
    0.25
}

fn default_min_weight() -> f64 {
    0.05
}

fn default_seed() -> u64 {
    42
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            min_dividend_yield: default_min_dividend_yield(),
            risk_aversion: 0.0,
            risk_free_rate: default_risk_free_rate(),
            stable_payers_only: true,
            min_securities: default_min_securities(),
            dividend_weight: default_dividend_weight(),
            strategy: OptimizationStrategy::default(),
            trials: default_trials(),
            max_weight: default_max_weight(),
            min_weight: default_min_weight(),
            seed: default_seed(),
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |name: &'static str, reason: &str| {
            Err(ConfigurationError::InvalidParameter {
                name,
                reason: reason.to_string(),
            })
        };

        if !(0.0..=1.0).contains(&self.dividend_weight) {
            return invalid("dividend_weight", "must lie in [0, 1]");
        }
        if self.min_securities == 0 {
            return invalid("min_securities", "must be at least 1");
        }
        if self.trials == 0 {
            return invalid("trials", "must be at least 1");
        }
        if !(self.max_weight > 0.0 && self.max_weight <= 1.0) {
            return invalid("max_weight", "must lie in (0, 1]");
        }
        if self.min_weight < 0.0 || self.min_weight > self.max_weight {
            return invalid("min_weight", "must lie in [0, max_weight]");
        }
        if self.risk_aversion < 0.0 {
            return invalid("risk_aversion", "must be non-negative");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OptimizerConfig::default();
        assert_eq!(config.min_securities, 5);
        assert_eq!(config.strategy, OptimizationStrategy::Hybrid);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_record_uses_defaults() {
        let config: OptimizerConfig =
            serde_json::from_str(r#"{"strategy": "convex", "min_securities": 3}"#).unwrap();
        assert_eq!(config.strategy, OptimizationStrategy::Convex);
        assert_eq!(config.min_securities, 3);
        assert_eq!(config.trials, 5000);
        assert!((config.max_weight - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let config = OptimizerConfig {
            min_weight: 0.5,
            max_weight: 0.2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
