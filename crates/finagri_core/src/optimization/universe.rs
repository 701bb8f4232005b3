//! Eligible securities and their summary statistics

use nalgebra::DMatrix;

use crate::error::{OptimizationError, ValidationError};
use crate::linalg::{dot, volatility};
use crate::metrics;
use crate::model::{
    Holding, OptimizationStrategy, Portfolio, PortfolioStats, SecurityDataset,
};

use super::config::OptimizerConfig;

/// Holdings at or below this weight are dropped from a returned basket
pub const MIN_REPORTED_WEIGHT: f64 = 1e-4;

/// Securities that passed filtering, with the inputs every strategy scores on
#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    pub names: Vec<String>,
    pub sectors: Vec<String>,
    /// Mean historical dividend yield
    pub dividend_yields: Vec<f64>,
    /// Mean dividend yield plus mean price variation
    pub total_returns: Vec<f64>,
    /// Covariance of yearly price variations
    pub covariance: DMatrix<f64>,
}

impl Universe {
    /// Filter the dataset down to the securities an optimizer may pick.
    ///
    /// Rows without a closing price or dividend are ignored, then (optionally)
    /// rows not flagged as stable payers. A security is eligible when its mean
    /// dividend yield reaches `min_dividend_yield`.
    pub fn from_dataset(
        dataset: &SecurityDataset,
        config: &OptimizerConfig,
    ) -> Result<Self, ValidationError> {
        let mut usable =
            dataset.filtered(|r| r.closing_price.is_some() && r.dividend_paid.is_some());
        if config.stable_payers_only {
            usable = metrics::stable_payers(&usable);
        }

        let mean_yields = metrics::mean_dividend_yields(&usable);
        let eligible: Vec<String> = mean_yields
            .iter()
            .filter(|(_, y)| **y >= config.min_dividend_yield)
            .map(|(name, _)| name.clone())
            .collect();

        if eligible.len() < config.min_securities {
            return Err(ValidationError::InsufficientSecurities {
                eligible: eligible.len(),
                required: config.min_securities,
            });
        }

        let usable = usable.restricted_to(&eligible);
        let mean_variations = metrics::mean_price_variations(&usable);
        let variations = metrics::price_variations(&usable);

        let dividend_yields: Vec<f64> = eligible.iter().map(|n| mean_yields[n]).collect();
        let total_returns = eligible
            .iter()
            .zip(&dividend_yields)
            .map(|(n, d)| d + mean_variations.get(n).copied().unwrap_or(0.0))
            .collect();
        let sectors = eligible
            .iter()
            .map(|n| usable.sector_of(n).unwrap_or_default().to_string())
            .collect();

        // Columns of the pivot are sorted, like `eligible`
        let covariance = variations.covariance();

        Ok(Self {
            names: eligible,
            sectors,
            dividend_yields,
            total_returns,
            covariance,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Restriction to the given positions, in the given order
    #[must_use]
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            names: indices.iter().map(|&i| self.names[i].clone()).collect(),
            sectors: indices.iter().map(|&i| self.sectors[i].clone()).collect(),
            dividend_yields: indices.iter().map(|&i| self.dividend_yields[i]).collect(),
            total_returns: indices.iter().map(|&i| self.total_returns[i]).collect(),
            covariance: self.covariance.select_rows(indices).select_columns(indices),
        }
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Blended objective `pond * div + (1 - pond) * total - aversion * vol`
    #[must_use]
    pub fn score(&self, weights: &[f64], config: &OptimizerConfig) -> f64 {
        let div = dot(weights, &self.dividend_yields);
        let total = dot(weights, &self.total_returns);
        config.dividend_weight * div + (1.0 - config.dividend_weight) * total
            - config.risk_aversion * volatility(weights, &self.covariance)
    }

    /// Turn raw weights into an immutable basket.
    ///
    /// Negligible weights are dropped and the rest renormalised before the
    /// statistics are computed. Fails when no weight survives the cut.
    pub fn portfolio(
        &self,
        weights: &[f64],
        produced_by: OptimizationStrategy,
        risk_free_rate: f64,
    ) -> Result<Portfolio, OptimizationError> {
        let kept: Vec<usize> = (0..self.len())
            .filter(|&i| weights[i] > MIN_REPORTED_WEIGHT)
            .collect();
        let total: f64 = kept.iter().map(|&i| weights[i]).sum();
        if total <= 0.0 {
            return Err(OptimizationError::Infeasible(format!(
                "no weight above {MIN_REPORTED_WEIGHT}"
            )));
        }

        let mut normalized = vec![0.0; self.len()];
        for &i in &kept {
            normalized[i] = weights[i] / total;
        }

        let holdings = kept
            .iter()
            .map(|&i| Holding {
                name: self.names[i].clone(),
                sector: self.sectors[i].clone(),
                weight: normalized[i],
                dividend_yield: self.dividend_yields[i],
                total_return: self.total_returns[i],
            })
            .collect();

        let expected_return = dot(&normalized, &self.total_returns);
        let vol = volatility(&normalized, &self.covariance);
        let sharpe_ratio = if vol > 0.0 {
            (expected_return - risk_free_rate) / vol
        } else {
            0.0
        };
        let stats = PortfolioStats {
            expected_return,
            dividend_yield: dot(&normalized, &self.dividend_yields),
            volatility: vol,
            sharpe_ratio,
        };

        Ok(Portfolio::new(holdings, stats, produced_by))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe() -> Universe {
        Universe {
            names: vec!["A".into(), "B".into(), "C".into()],
            sectors: vec!["X".into(), "X".into(), "Y".into()],
            dividend_yields: vec![0.06, 0.05, 0.08],
            total_returns: vec![0.10, 0.07, 0.12],
            covariance: DMatrix::from_diagonal_element(3, 3, 0.01),
        }
    }

    #[test]
    fn test_portfolio_drops_negligible_weights() {
        let p = universe().portfolio(&[0.6, 0.00005, 0.39995], OptimizationStrategy::Convex, 0.03)
            .unwrap();
        assert_eq!(p.len(), 2);
        assert!((p.total_weight() - 1.0).abs() < 1e-12);
        assert_eq!(p.names(), vec!["A".to_string(), "C".to_string()]);
    }

    #[test]
    fn test_zero_volatility_sharpe() {
        let mut u = universe();
        u.covariance = DMatrix::zeros(3, 3);
        let p = u
            .portfolio(&[0.5, 0.5, 0.0], OptimizationStrategy::Stochastic, 0.03)
            .unwrap();
        assert_eq!(p.stats().sharpe_ratio, 0.0);
    }

    #[test]
    fn test_all_negligible_weights_rejected() {
        let result =
            universe().portfolio(&[0.00005, 0.0, 0.00009], OptimizationStrategy::Convex, 0.03);
        assert!(matches!(result, Err(OptimizationError::Infeasible(_))));
    }

    #[test]
    fn test_subset_keeps_alignment() {
        let sub = universe().subset(&[2, 0]);
        assert_eq!(sub.names, vec!["C".to_string(), "A".to_string()]);
        assert_eq!(sub.dividend_yields, vec![0.08, 0.06]);
        assert_eq!(sub.covariance.nrows(), 2);
    }
}
