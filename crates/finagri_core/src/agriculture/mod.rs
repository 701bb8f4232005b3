//! Agricultural project simulator
//!
//! Monte Carlo model of a farm mixing greenhouse and open-field crops over a
//! multi-year project. Each scenario draws yearly correlated climate and
//! price shocks per crop, a system-wide unfavorable-year flag, and per-cycle
//! yield and price risks, then books revenues, costs, loan repayments and
//! taxes for every cultivation cycle.
//!
//! # Example
//!
//! ```ignore
//! use finagri_core::agriculture::{AgriculturalConfig, simulate_agricultural_project};
//!
//! let config = AgriculturalConfig {
//!     crops: vec!["tomato".into(), "cabbage".into()],
//!     scenarios: 200,
//!     ..Default::default()
//! };
//! let result = simulate_agricultural_project(&catalog, &config, &[], None, None)?;
//! println!("median profit {:.0}", result.representatives.median.total_net_profit);
//! ```

mod cashflow;
mod config;
mod correlation;
mod costs;
mod shocks;
mod simulator;

pub use cashflow::{CropYear, crop_year_cashflows};
pub use config::{AgriFinancing, AgriculturalConfig};
pub use correlation::ShockCorrelation;
pub use costs::{
    CycleCosts, allocate_surface, cycle_costs, greenhouse_depreciation, income_tax,
    insurance_premium,
};
pub use shocks::{seasonality, weather_adjusted_yield};
pub use simulator::simulate_agricultural_project;
