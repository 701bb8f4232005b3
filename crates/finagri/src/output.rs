//! Result files
//!
//! Every file is written with [`atomic_write`], so an interrupted run never
//! leaves a half-written report next to a complete one.
//!
//! Layout of one run directory:
//! ```text
//! results/<run>/
//!   portfolio.json        # optimized basket
//!   capital_plan.json     # injections and amortization tables
//!   equity.json           # medians and summary
//!   equity_series.csv     # year, median capital, median dividends
//!   agriculture.json      # scenario totals and representatives
//!   cycles.csv            # every cycle row of every scenario
//!   cycles_minimum.csv    # one file per representative scenario
//!   cycles_median.csv
//!   cycles_maximum.csv
//! ```

use std::path::{Path, PathBuf};

use finagri_core::{AgriculturalSimulationResult, CycleRecord, EquitySimulationResult};
use serde::Serialize;

use crate::util::io::{atomic_write, atomic_write_bytes};

/// Pretty-printed JSON
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> color_eyre::Result<()> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    atomic_write(path, &json)?;
    Ok(())
}

fn write_csv<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> color_eyre::Result<()> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    atomic_write_bytes(path, &bytes)?;
    Ok(())
}

pub fn write_cycle_records<'a>(
    path: &Path,
    records: impl IntoIterator<Item = &'a CycleRecord>,
) -> color_eyre::Result<()> {
    write_csv(path, records)
}

#[derive(Serialize)]
struct EquityRow {
    year: i32,
    median_capital: f64,
    median_dividends: f64,
}

pub fn write_equity_series(path: &Path, result: &EquitySimulationResult) -> color_eyre::Result<()> {
    let rows = result
        .years
        .iter()
        .zip(&result.median_capital)
        .zip(&result.median_dividends)
        .map(|((&year, &median_capital), &median_dividends)| EquityRow {
            year,
            median_capital,
            median_dividends,
        });
    write_csv(path, rows)
}

/// Compact view of a multi-scenario run
#[derive(Debug, Serialize)]
pub struct AgricultureReport<'a> {
    pub scenarios: usize,
    pub mean_total_net_profit: f64,
    pub minimum_scenario: usize,
    pub median_scenario: usize,
    pub maximum_scenario: usize,
    pub scenario_totals: &'a [f64],
}

impl<'a> AgricultureReport<'a> {
    pub fn new(result: &'a AgriculturalSimulationResult) -> Self {
        let totals = &result.scenario_totals;
        let mean = if totals.is_empty() {
            0.0
        } else {
            totals.iter().sum::<f64>() / totals.len() as f64
        };
        let reps = &result.representatives;
        Self {
            scenarios: totals.len(),
            mean_total_net_profit: mean,
            minimum_scenario: reps.minimum.scenario,
            median_scenario: reps.median.scenario,
            maximum_scenario: reps.maximum.scenario,
            scenario_totals: totals,
        }
    }
}

/// Write the report, the full cycle table and one table per representative.
/// Returns the paths written.
pub fn write_agriculture(
    dir: &Path,
    result: &AgriculturalSimulationResult,
) -> color_eyre::Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    let report = dir.join("agriculture.json");
    write_json(&report, &AgricultureReport::new(result))?;
    written.push(report);

    let cycles = dir.join("cycles.csv");
    write_cycle_records(&cycles, &result.records)?;
    written.push(cycles);

    let reps = &result.representatives;
    for (label, table) in [
        ("minimum", &reps.minimum),
        ("median", &reps.median),
        ("maximum", &reps.maximum),
    ] {
        let path = dir.join(format!("cycles_{label}.csv"));
        write_cycle_records(&path, &table.records)?;
        written.push(path);
    }
    Ok(written)
}
