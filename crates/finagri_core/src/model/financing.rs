use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A fixed-rate amortizing loan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub principal: f64,
    /// Annual rate as a fraction (0.05 = 5%)
    pub annual_rate: f64,
    pub duration_years: u32,
    /// Project year (0-based) in which the principal is received
    pub start_year: u32,
}

/// One yearly line of an amortization table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub year: u32,
    pub annuity: f64,
    pub interest: f64,
    pub principal: f64,
    pub remaining_principal: f64,
}

/// How an equity investment is financed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FinancingMode {
    /// Everything invested at year 0
    SingleContribution { amount: f64 },
    /// Fixed monthly contribution, paid in every year of the horizon
    RecurringContribution { monthly_amount: f64 },
    SingleLoan { loan: Loan },
    MultipleLoans { loans: Vec<Loan> },
}

impl FinancingMode {
    /// Label used in logs and reports
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            FinancingMode::SingleContribution { .. } => "single_contribution",
            FinancingMode::RecurringContribution { .. } => "recurring_contribution",
            FinancingMode::SingleLoan { .. } => "single_loan",
            FinancingMode::MultipleLoans { .. } => "multiple_loans",
        }
    }
}

/// Normalized capital schedule derived from a financing mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapitalPlan {
    pub initial_capital: f64,
    /// Project year -> capital injected that year
    pub injections: BTreeMap<u32, f64>,
    /// Amortization table of every loan, in declaration order
    pub amortization: Vec<Vec<AmortizationRow>>,
}

impl CapitalPlan {
    /// Capital injected in `year`, zero when nothing is scheduled
    #[must_use]
    pub fn injection(&self, year: u32) -> f64 {
        self.injections.get(&year).copied().unwrap_or(0.0)
    }

    /// Initial capital plus every future injection
    #[must_use]
    pub fn total_capital(&self) -> f64 {
        self.initial_capital + self.injections.values().sum::<f64>()
    }
}
