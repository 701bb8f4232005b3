//! Simulation outputs
//!
//! Plain data tables and records, ready for rendering or export.

use serde::{Deserialize, Serialize};

use super::crops::CultivationMethod;

/// Cross-path summary of an equity simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquitySummary {
    pub median_final_capital: f64,
    pub median_cumulative_dividends: f64,
    pub reinvest_dividends: bool,
    /// (percentile, final capital) pairs
    pub final_capital_percentiles: Vec<(f64, f64)>,
    pub paths: usize,
}

/// Per-year medians across all simulated paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquitySimulationResult {
    /// Calendar years simulated
    pub years: Vec<i32>,
    /// Median year-end capital
    pub median_capital: Vec<f64>,
    /// Median after-tax dividend cash received that year
    pub median_dividends: Vec<f64>,
    pub summary: EquitySummary,
    /// (security, weight) pairs of the simulated basket
    pub holdings: Vec<(String, f64)>,
}

/// One row per (year, method, crop, cycle)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub scenario: usize,
    pub year: u32,
    pub method: CultivationMethod,
    pub crop: String,
    /// Hectares allocated to this crop and method
    pub surface: f64,
    pub cycle: u32,
    pub production_kg: f64,
    /// Stock carried into the next cycle
    pub carried_stock_kg: f64,
    /// Volume sold this cycle, net of post-harvest loss
    pub sold_kg: f64,
    pub price: f64,
    pub revenue: f64,
    /// Operating costs including insurance
    pub costs: f64,
    pub insurance: f64,
    pub loan_repayment: f64,
    pub tax: f64,
    pub net_profit: f64,
}

/// All rows of one scenario with its aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioTable {
    pub scenario: usize,
    pub total_net_profit: f64,
    pub records: Vec<CycleRecord>,
}

/// Minimum-, median- and maximum-outcome scenarios
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepresentativeScenarios {
    pub minimum: ScenarioTable,
    pub median: ScenarioTable,
    pub maximum: ScenarioTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgriculturalSimulationResult {
    /// Every cycle row of every scenario, scenario-major
    pub records: Vec<CycleRecord>,
    /// Total net profit per scenario; index 0 is scenario 1
    pub scenario_totals: Vec<f64>,
    pub representatives: RepresentativeScenarios,
}

impl AgriculturalSimulationResult {
    /// Rows belonging to one scenario (1-based)
    pub fn scenario_records(&self, scenario: usize) -> impl Iterator<Item = &CycleRecord> {
        self.records.iter().filter(move |r| r.scenario == scenario)
    }

    #[must_use]
    pub fn num_scenarios(&self) -> usize {
        self.scenario_totals.len()
    }
}
