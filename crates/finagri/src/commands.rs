//! Command implementations shared by the binary and the tests
//!
//! Each command loads what it needs from a [`RunFile`], runs the core, and
//! writes its result files under `out`.

use std::path::Path;

use finagri_core::equity::EquitySimulationConfig;
use finagri_core::optimization::OptimizerConfig;
use finagri_core::{
    AgriculturalSimulationResult, CapitalPlan, EquitySimulationResult, FinancingMode, Portfolio,
    SecurityDataset, SimulationProgress, plan_capital, simulate_agricultural_project,
    simulate_equity,
};
use serde::Serialize;

use crate::cache::{OptimizationCache, dataset_fingerprint};
use crate::config::{self, AgricultureSection, ConfigError, RunFile};
use crate::output::{write_agriculture, write_equity_series, write_json};

/// A dataset together with its cache fingerprint
pub struct Market {
    pub dataset: SecurityDataset,
    pub fingerprint: u64,
}

impl Market {
    pub fn load(run: &RunFile) -> color_eyre::Result<Self> {
        let dataset = config::load_dataset(run.dataset_path()?)?;
        let fingerprint = dataset_fingerprint(&dataset)?;
        Ok(Self {
            dataset,
            fingerprint,
        })
    }
}

pub fn optimize(
    market: &Market,
    cache: &mut OptimizationCache,
    optimizer: &OptimizerConfig,
    out: &Path,
) -> color_eyre::Result<Portfolio> {
    let portfolio = cache.get_or_optimize(&market.dataset, market.fingerprint, optimizer)?;
    write_json(&out.join("portfolio.json"), &portfolio)?;
    Ok(portfolio)
}

/// Everything one equity run produced
#[derive(Debug)]
pub struct EquityRun {
    pub portfolio: Portfolio,
    pub plan: CapitalPlan,
    pub result: EquitySimulationResult,
}

/// Plan capital, fetch or build the basket, then project it.
///
/// The financing plan is validated before the optimizer runs so a bad loan
/// fails fast.
pub fn equity(
    market: &Market,
    cache: &mut OptimizationCache,
    optimizer: &OptimizerConfig,
    financing: &FinancingMode,
    config: &EquitySimulationConfig,
    progress: Option<&SimulationProgress>,
    out: &Path,
) -> color_eyre::Result<EquityRun> {
    config.validate()?;
    let plan = plan_capital(financing, config.horizon_years)?;
    let portfolio = optimize(market, cache, optimizer, out)?;
    let result = simulate_equity(&market.dataset, &portfolio, &plan, config, progress)?;

    write_json(&out.join("capital_plan.json"), &plan)?;
    write_json(&out.join("equity.json"), &result)?;
    write_equity_series(&out.join("equity_series.csv"), &result)?;
    tracing::info!(
        financing = financing.label(),
        median_final_capital = result.summary.median_final_capital,
        out = %out.display(),
        "equity run written"
    );

    Ok(EquityRun {
        portfolio,
        plan,
        result,
    })
}

pub fn agriculture(
    section: &AgricultureSection,
    progress: Option<&SimulationProgress>,
    out: &Path,
) -> color_eyre::Result<AgriculturalSimulationResult> {
    let catalog = config::load_catalog(&section.catalog)?;
    let weather = match &section.weather {
        Some(path) => config::load_weather(path)?,
        None => Vec::new(),
    };
    let history = section
        .history
        .as_deref()
        .map(config::load_history)
        .transpose()?;

    let result = simulate_agricultural_project(
        &catalog,
        &section.simulation,
        &weather,
        history.as_ref(),
        progress,
    )?;
    let written = write_agriculture(out, &result)?;
    tracing::info!(
        scenarios = result.num_scenarios(),
        files = written.len(),
        out = %out.display(),
        "agricultural run written"
    );
    Ok(result)
}

/// One line of the batch overview
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub name: String,
    pub financing: &'static str,
    pub securities: usize,
    pub median_final_capital: f64,
    pub median_cumulative_dividends: f64,
    pub total_capital: f64,
}

/// Run every batch entry into `out/<name>` and write `out/batch.json`.
///
/// Entries share `cache`, so runs that differ only in financing or simulation
/// settings optimize once.
pub fn batch(
    run: &RunFile,
    market: &Market,
    cache: &mut OptimizationCache,
    out: &Path,
) -> color_eyre::Result<Vec<BatchSummary>> {
    if run.batch.is_empty() {
        return Err(ConfigError::Missing("batch").into());
    }

    let mut summaries = Vec::with_capacity(run.batch.len());
    for entry in &run.batch {
        let (optimizer, financing, config) = run.batch_records(entry)?;
        tracing::debug!(name = %entry.name, financing = financing.label(), "batch entry");
        let outcome = equity(
            market,
            cache,
            &optimizer,
            &financing,
            &config,
            None,
            &out.join(&entry.name),
        )?;
        summaries.push(BatchSummary {
            name: entry.name.clone(),
            financing: financing.label(),
            securities: outcome.portfolio.len(),
            median_final_capital: outcome.result.summary.median_final_capital,
            median_cumulative_dividends: outcome.result.summary.median_cumulative_dividends,
            total_capital: outcome.plan.total_capital(),
        });
    }

    write_json(&out.join("batch.json"), &summaries)?;
    tracing::info!(
        runs = summaries.len(),
        cache_hits = cache.hits(),
        cache_misses = cache.misses(),
        "batch finished"
    );
    Ok(summaries)
}
