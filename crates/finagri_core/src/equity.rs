//! Equity wealth simulator
//!
//! Projects the capital and dividend income of an optimized basket over the
//! investment horizon. Each path follows a three-state regime chain; the
//! regime picks the mean, covariance and dividend parameters of the year.
//! Persistent sector shocks shift the mean returns and heavy-tailed
//! Student-t innovations are correlated through the regime's Cholesky factor.

use std::collections::BTreeSet;

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_distr::{Distribution, Normal, StudentT};
use serde::{Deserialize, Serialize};

use crate::batch::run_seeded;
use crate::error::{ConfigurationError, Result};
use crate::financing::plan_capital;
use crate::linalg::{cholesky_with_jitter, dot};
use crate::metrics::{self, median, percentile};
use crate::model::{
    CapitalPlan, EquitySimulationResult, EquitySummary, FinancingMode, Portfolio, Regime,
    SecurityDataset, SimulationProgress, TransitionMatrix,
};
use crate::optimization::{OptimizerConfig, optimize_portfolio};

/// Degrees of freedom of the return innovations
pub const STUDENT_T_DOF: f64 = 5.0;
/// Share of last year's sector shock carried into this year
pub const SECTOR_CARRYOVER: f64 = 0.7;
pub const SECTOR_SHOCK_SIGMA: f64 = 0.03;
/// Multiplier applied to the sector state in a crisis year
pub const CRISIS_SECTOR_AMPLIFIER: f64 = 2.0;
pub const CRISIS_DIVIDEND_FACTOR: f64 = 0.6;
pub const CRISIS_RETURN_FACTOR: f64 = 0.4;
pub const DOWNSIDE_THRESHOLD: f64 = 0.0;
pub const DOWNSIDE_FACTOR: f64 = 0.7;
/// Percentiles of final capital reported in the summary
pub const FINAL_CAPITAL_PERCENTILES: [f64; 3] = [0.05, 0.50, 0.95];

/// (mean, covariance, dividend) multipliers of each regime, in `Regime::ALL` order
const REGIME_SCALES: [(f64, f64, f64); 3] = [(1.0, 1.0, 1.0), (0.8, 1.5, 0.7), (0.5, 3.0, 0.4)];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquitySimulationConfig {
    #[serde(default = "default_horizon_years")]
    pub horizon_years: u32,

    /// Number of Monte Carlo paths
    #[serde(default = "default_paths")]
    pub paths: usize,

    /// Fee charged on yearly injections
    #[serde(default = "default_purchase_fee")]
    pub purchase_fee: f64,

    /// Withholding tax on dividends
    #[serde(default = "default_dividend_tax")]
    pub dividend_tax: f64,

    #[serde(default = "default_true")]
    pub reinvest_dividends: bool,

    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default)]
    pub transition: TransitionMatrix,
}

fn default_horizon_years() -> u32 {
    10
}

fn default_paths() -> usize {
    1000
}

fn default_purchase_fee() -> f64 {
    0.012
}

fn default_dividend_tax() -> f64 {
    0.15
}

fn default_true() -> bool {
    true
}

fn default_seed() -> u64 {
    1234
}

impl Default for EquitySimulationConfig {
    fn default() -> Self {
        Self {
            horizon_years: default_horizon_years(),
            paths: default_paths(),
            purchase_fee: default_purchase_fee(),
            dividend_tax: default_dividend_tax(),
            reinvest_dividends: true,
            seed: default_seed(),
            transition: TransitionMatrix::default(),
        }
    }
}

impl EquitySimulationConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        let invalid = |name: &'static str, reason: &str| {
            Err(ConfigurationError::InvalidParameter {
                name,
                reason: reason.to_string(),
            })
        };
        if self.horizon_years == 0 {
            return invalid("horizon_years", "must be at least 1");
        }
        if self.paths == 0 {
            return invalid("paths", "must be at least 1");
        }
        if !(0.0..1.0).contains(&self.purchase_fee) {
            return invalid("purchase_fee", "must lie in [0, 1)");
        }
        if !(0.0..=1.0).contains(&self.dividend_tax) {
            return invalid("dividend_tax", "must lie in [0, 1]");
        }
        if !self.transition.is_valid() {
            return invalid("transition", "rows must be probabilities summing to 1");
        }
        Ok(())
    }
}

/// Distribution parameters of one regime
#[derive(Debug, Clone)]
struct RegimeParameters {
    mean: DVector<f64>,
    dividends: DVector<f64>,
    cholesky: DMatrix<f64>,
}

/// Everything a path needs, estimated once from history
#[derive(Debug, Clone)]
pub struct EquityModel {
    names: Vec<String>,
    weights: Vec<f64>,
    /// Index into the sector list for every holding
    sector_of: Vec<usize>,
    sector_count: usize,
    regimes: [RegimeParameters; 3],
    last_year: i32,
}

impl EquityModel {
    /// Estimate return and dividend parameters of the basket's securities.
    ///
    /// Means and covariance come from the yearly total-return table; the
    /// dividend mean from the yield table. Securities with no usable history
    /// get a zero mean.
    pub fn estimate(dataset: &SecurityDataset, portfolio: &Portfolio) -> Result<Self> {
        let names = portfolio.names();
        let returns = metrics::total_returns(dataset).select(&names)?;
        let yields = metrics::dividend_yields(dataset).select(&names)?;

        let mean = DVector::from_iterator(
            names.len(),
            returns.means().into_iter().map(|m| m.unwrap_or(0.0)),
        );
        let dividends = DVector::from_iterator(
            names.len(),
            yields.means().into_iter().map(|m| m.unwrap_or(0.0)),
        );
        let covariance = returns.covariance();

        let sectors: BTreeSet<&str> = portfolio.holdings().iter().map(|h| h.sector.as_str()).collect();
        let sectors: Vec<&str> = sectors.into_iter().collect();
        let sector_of = portfolio
            .holdings()
            .iter()
            .map(|h| sectors.iter().position(|s| *s == h.sector).unwrap_or(0))
            .collect();

        let regime = |(mean_scale, cov_scale, div_scale): (f64, f64, f64)| -> Result<RegimeParameters> {
            Ok(RegimeParameters {
                mean: &mean * mean_scale,
                dividends: &dividends * div_scale,
                cholesky: cholesky_with_jitter(&(&covariance * cov_scale))?,
            })
        };
        let regimes = [
            regime(REGIME_SCALES[0])?,
            regime(REGIME_SCALES[1])?,
            regime(REGIME_SCALES[2])?,
        ];

        let last_year = returns
            .years()
            .last()
            .copied()
            .or_else(|| dataset.last_year())
            .unwrap_or_default();

        Ok(Self {
            names,
            weights: portfolio.weights(),
            sector_of,
            sector_count: sectors.len(),
            regimes,
            last_year,
        })
    }

    #[must_use]
    pub fn last_year(&self) -> i32 {
        self.last_year
    }
}

/// Year-end capital and net dividend cash of one path
#[derive(Debug, Clone, PartialEq)]
struct PathOutcome {
    capital: Vec<f64>,
    dividends: Vec<f64>,
}

fn simulate_path<R: Rng + ?Sized>(
    model: &EquityModel,
    plan: &CapitalPlan,
    config: &EquitySimulationConfig,
    innovations: &StudentT<f64>,
    sector_noise: &Normal<f64>,
    rng: &mut R,
) -> PathOutcome {
    let years = config.horizon_years as usize;
    let n = model.weights.len();
    let mut capital = plan.initial_capital;
    let mut regime = Regime::default();
    let mut sector_shocks = vec![0.0; model.sector_count];
    let mut outcome = PathOutcome {
        capital: Vec::with_capacity(years),
        dividends: Vec::with_capacity(years),
    };

    for year in 0..config.horizon_years {
        capital += plan.injection(year) * (1.0 - config.purchase_fee);

        regime = config.transition.next(regime, rng);
        let crisis = regime == Regime::Crisis;

        for shock in &mut sector_shocks {
            *shock = SECTOR_CARRYOVER * *shock + sector_noise.sample(rng);
            if crisis {
                *shock *= CRISIS_SECTOR_AMPLIFIER;
            }
        }

        let params = &model.regimes[regime.index()];
        let mut mean = params.mean.clone();
        for (i, m) in mean.iter_mut().enumerate() {
            *m += sector_shocks[model.sector_of[i]];
        }
        let z = DVector::from_fn(n, |_, _| innovations.sample(rng));
        let mut returns = mean + &params.cholesky * z;
        let mut dividends = params.dividends.clone();
        if crisis {
            dividends *= CRISIS_DIVIDEND_FACTOR;
            returns *= CRISIS_RETURN_FACTOR;
        }

        let mut total_return = dot(returns.as_slice(), &model.weights);
        let dividend_yield = dot(dividends.as_slice(), &model.weights);
        if total_return < DOWNSIDE_THRESHOLD {
            total_return *= DOWNSIDE_FACTOR;
        }

        let net_dividends = capital * dividend_yield * (1.0 - config.dividend_tax);
        if config.reinvest_dividends {
            capital *= 1.0 + total_return;
        } else {
            capital *= 1.0 + total_return - dividend_yield;
        }

        outcome.capital.push(capital);
        outcome.dividends.push(net_dividends);
    }

    outcome
}

/// Run the Monte Carlo projection for a given basket and capital plan.
pub fn simulate_equity(
    dataset: &SecurityDataset,
    portfolio: &Portfolio,
    plan: &CapitalPlan,
    config: &EquitySimulationConfig,
    progress: Option<&SimulationProgress>,
) -> Result<EquitySimulationResult> {
    config.validate()?;
    let model = EquityModel::estimate(dataset, portfolio)?;

    let innovations = StudentT::new(STUDENT_T_DOF).map_err(|_| ConfigurationError::InvalidParameter {
        name: "student_t_dof",
        reason: "degrees of freedom must be positive".into(),
    })?;
    let sector_noise =
        Normal::new(0.0, SECTOR_SHOCK_SIGMA).map_err(|_| ConfigurationError::InvalidParameter {
            name: "sector_shock_sigma",
            reason: "standard deviation must be non-negative".into(),
        })?;

    tracing::debug!(
        paths = config.paths,
        years = config.horizon_years,
        holdings = model.names.len(),
        "starting equity simulation"
    );

    let paths = run_seeded(config.paths, config.seed, progress, |_, seed| {
        let mut rng = SmallRng::seed_from_u64(seed);
        Ok(simulate_path(&model, plan, config, &innovations, &sector_noise, &mut rng))
    })?;

    let result = summarize(&model, &paths, config);
    tracing::info!(
        median_final_capital = result.summary.median_final_capital,
        "equity simulation finished"
    );
    Ok(result)
}

fn summarize(
    model: &EquityModel,
    paths: &[PathOutcome],
    config: &EquitySimulationConfig,
) -> EquitySimulationResult {
    let horizon = config.horizon_years as usize;
    let capital_at = |year: usize| -> Vec<f64> { paths.iter().map(|p| p.capital[year]).collect() };
    let dividends_at =
        |year: usize| -> Vec<f64> { paths.iter().map(|p| p.dividends[year]).collect() };

    let median_capital = (0..horizon).map(|y| median(&capital_at(y))).collect();
    let median_dividends = (0..horizon).map(|y| median(&dividends_at(y))).collect();

    let final_capital = capital_at(horizon - 1);
    let cumulative_dividends: Vec<f64> = paths.iter().map(|p| p.dividends.iter().sum()).collect();

    EquitySimulationResult {
        years: (1..=config.horizon_years as i32)
            .map(|i| model.last_year + i)
            .collect(),
        median_capital,
        median_dividends,
        summary: EquitySummary {
            median_final_capital: median(&final_capital),
            median_cumulative_dividends: median(&cumulative_dividends),
            reinvest_dividends: config.reinvest_dividends,
            final_capital_percentiles: FINAL_CAPITAL_PERCENTILES
                .iter()
                .map(|p| (*p, percentile(&final_capital, *p)))
                .collect(),
            paths: paths.len(),
        },
        holdings: model
            .names
            .iter()
            .cloned()
            .zip(model.weights.iter().copied())
            .collect(),
    }
}

/// Optimize a basket, plan the financing and simulate it, in one call.
pub fn run_equity_simulation(
    dataset: &SecurityDataset,
    optimizer: &OptimizerConfig,
    financing: &FinancingMode,
    config: &EquitySimulationConfig,
    progress: Option<&SimulationProgress>,
) -> Result<(Portfolio, CapitalPlan, EquitySimulationResult)> {
    config.validate()?;
    let plan = plan_capital(financing, config.horizon_years)?;
    let portfolio = optimize_portfolio(dataset, optimizer)?;
    let result = simulate_equity(dataset, &portfolio, &plan, config, progress)?;
    Ok((portfolio, plan, result))
}
