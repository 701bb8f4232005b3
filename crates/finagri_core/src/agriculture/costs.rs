//! Per-cycle cost model
//!
//! Costs are expressed per cultivation cycle. Items charged per year (health
//! levy, per-hectare insurance, greenhouse depreciation) are prorated by the
//! cycle's share of the year.

use crate::model::{CropCatalog, CultivationMethod, MethodParameters};

use super::config::AgriculturalConfig;

/// Yearly depreciation of the greenhouse park.
///
/// The build cost is `(greenhouse surface / unit surface) * unit cost`,
/// spread evenly over the depreciation period.
#[must_use]
pub fn greenhouse_depreciation(greenhouse_surface: f64, config: &AgriculturalConfig) -> f64 {
    if greenhouse_surface <= 0.0
        || config.greenhouse_unit_surface <= 0.0
        || config.greenhouse_depreciation_years == 0
    {
        return 0.0;
    }
    let units = greenhouse_surface / config.greenhouse_unit_surface;
    units * config.greenhouse_unit_cost / f64::from(config.greenhouse_depreciation_years)
}

/// Split `surface` evenly among the requested crops that can be grown with `method`.
///
/// Crops are kept in request order; unknown crops are skipped.
#[must_use]
pub fn allocate_surface(
    surface: f64,
    method: CultivationMethod,
    crops: &[String],
    catalog: &CropCatalog,
) -> Vec<(String, f64)> {
    let compatible: Vec<&String> = crops
        .iter()
        .filter(|c| {
            catalog
                .get(c)
                .is_ok_and(|entry| entry.method(method).is_some())
        })
        .collect();
    if compatible.is_empty() {
        return Vec::new();
    }
    let share = surface / compatible.len() as f64;
    compatible.into_iter().map(|c| (c.clone(), share)).collect()
}

/// Cost items of one cycle before insurance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleCosts {
    /// Inputs, labor, social charges, health levy and depreciation
    pub fixed: f64,
    /// Per-hectare insurance floor for the cycle
    pub insurance_floor: f64,
}

/// Fixed costs and insurance floor of one cycle on `surface` hectares.
///
/// `year_fraction` is the cycle duration over the year length.
#[must_use]
pub fn cycle_costs(
    params: &MethodParameters,
    surface: f64,
    year_fraction: f64,
    yearly_depreciation: f64,
    config: &AgriculturalConfig,
) -> CycleCosts {
    let social_charges = config.social_charge_rate * params.labor_cost;
    let health_levy =
        config.health_levy_per_worker * config.workers_per_hectare * surface * year_fraction;
    let depreciation = yearly_depreciation * year_fraction;

    CycleCosts {
        fixed: params.input_cost + params.labor_cost + social_charges + health_levy + depreciation,
        insurance_floor: config.insurance_per_hectare * surface * year_fraction,
    }
}

/// Insurance premium: the larger of the revenue-based premium and the per-hectare floor
#[must_use]
pub fn insurance_premium(cycle_revenue: f64, floor: f64, rate: f64) -> f64 {
    (rate * cycle_revenue).max(floor)
}

/// Income tax on a cycle's gross profit.
///
/// Farms operating at least `exemption_surface` hectares are exempt; losses
/// are never taxed.
#[must_use]
pub fn income_tax(gross_profit: f64, total_surface: f64, exemption_surface: f64, rate: f64) -> f64 {
    if total_surface >= exemption_surface {
        0.0
    } else {
        rate * gross_profit.max(0.0)
    }
}
