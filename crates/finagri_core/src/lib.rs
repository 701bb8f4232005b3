//! Investment and agricultural project simulation library
//!
//! This crate provides the decision-support core for two kinds of projects:
//! - Dividend-oriented equity baskets built from historical securities data
//!   (stochastic, convex or hybrid optimization)
//! - Regime-switching Monte Carlo projection of the basket's capital and
//!   dividends, under several financing modes
//! - Multi-scenario cash-flow simulation of a greenhouse / open-field farm
//!   with climate, price and hazard shocks
//!
//! Every stochastic entry point takes an explicit seed; identical inputs
//! reproduce identical outputs whether or not the `parallel` feature is on.
//!
//! ```ignore
//! use finagri_core::{
//!     EquitySimulationConfig, FinancingMode, OptimizerConfig, read_securities,
//!     run_equity_simulation,
//! };
//!
//! let dataset = read_securities(std::fs::File::open("brvm.csv")?)?;
//! let financing = FinancingMode::SingleContribution { amount: 5_000_000.0 };
//! let (portfolio, _plan, result) = run_equity_simulation(
//!     &dataset,
//!     &OptimizerConfig::default(),
//!     &financing,
//!     &EquitySimulationConfig::default(),
//!     None,
//! )?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod agriculture;
pub mod batch;
pub mod data;
pub mod equity;
pub mod error;
pub mod financing;
pub mod linalg;
pub mod metrics;
pub mod optimization;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use agriculture::{AgriFinancing, AgriculturalConfig, simulate_agricultural_project};
pub use data::read_securities;
pub use equity::{EquitySimulationConfig, run_equity_simulation, simulate_equity};
pub use error::{
    ConfigurationError, DataError, NumericalError, OptimizationError, Result, SimulationError,
    ValidationError,
};
pub use financing::{amortization_schedule, plan_capital};
pub use model::*;
pub use optimization::{OptimizerConfig, optimize_portfolio};
