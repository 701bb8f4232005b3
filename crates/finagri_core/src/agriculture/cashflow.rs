//! Cash flows of one crop over one year
//!
//! A crop-year is split into `cycles_per_year` equal cycles. Each cycle draws
//! its own yield and price; the climate and price shocks of the crop-year are
//! shared by all its cycles.
//!
//! Harvest is stored and sold during the next cycle, net of the post-harvest
//! loss. The last cycle of the year sells its own harvest together with the
//! carried stock, so nothing is carried across years.

use rand::Rng;

use crate::model::{CultivationMethod, CycleRecord, MethodParameters, WeatherObservation};

use super::config::AgriculturalConfig;
use super::costs::{cycle_costs, income_tax, insurance_premium};
use super::shocks::{
    apply_hazards, apply_risk, apply_unfavorable_year, fluctuated_price, seasonality,
    weather_adjusted_yield,
};

/// Everything fixed for a crop within one simulated year
#[derive(Debug, Clone)]
pub struct CropYear<'a> {
    pub scenario: usize,
    /// Project year, 1-based
    pub year: u32,
    pub method: CultivationMethod,
    pub crop: &'a str,
    pub params: &'a MethodParameters,
    /// Hectares allocated to this crop and method
    pub surface: f64,
    pub climate_shock: f64,
    pub price_shock: f64,
    pub weather: Option<&'a WeatherObservation>,
    pub unfavorable: bool,
    /// Monthly loan instalment charged to this crop
    pub monthly_repayment: f64,
    /// Yearly greenhouse depreciation charged to this crop
    pub yearly_depreciation: f64,
}

/// Draw the yield of one cycle, in tonnes per hectare.
fn cycle_yield<R: Rng + ?Sized>(
    crop_year: &CropYear<'_>,
    config: &AgriculturalConfig,
    rng: &mut R,
) -> f64 {
    let params = crop_year.params;
    let sensitivity = params.climate_sensitivity;

    let mut y = weather_adjusted_yield(
        params.crop_yield,
        crop_year.weather,
        sensitivity,
        config.low_rainfall_threshold,
        config.high_temperature_threshold,
    );
    y *= 1.0 + crop_year.climate_shock;
    y = apply_risk(y, &params.yield_risk, rng);
    y = apply_hazards(y, sensitivity, &config.hazards, rng);
    apply_unfavorable_year(
        y,
        sensitivity,
        crop_year.unfavorable,
        config.mean_climate_impact,
        rng,
    )
}

/// Draw the price of one cycle.
fn cycle_price<R: Rng + ?Sized>(crop_year: &CropYear<'_>, rng: &mut R) -> f64 {
    let params = crop_year.params;
    let base = params.price * (1.0 + crop_year.price_shock) * seasonality(crop_year.year);
    fluctuated_price(base, params.sigma, &params.price_risk, rng)
}

/// One record per cycle of the crop-year, in cycle order.
pub fn crop_year_cashflows<R: Rng + ?Sized>(
    crop_year: &CropYear<'_>,
    config: &AgriculturalConfig,
    rng: &mut R,
) -> Vec<CycleRecord> {
    let cycles = crop_year.params.cycles_per_year.max(1);
    let cycle_months = f64::from(config.months_per_year) / f64::from(cycles);
    let year_fraction = cycle_months / f64::from(config.months_per_year);
    let kept = 1.0 - config.post_harvest_loss;

    let costs = cycle_costs(
        crop_year.params,
        crop_year.surface,
        year_fraction,
        crop_year.yearly_depreciation,
        config,
    );
    let loan_repayment = crop_year.monthly_repayment * cycle_months;

    let mut records = Vec::with_capacity(cycles as usize);
    let mut stock = 0.0;

    for cycle in 1..=cycles {
        let crop_yield = cycle_yield(crop_year, config, rng);
        let price = cycle_price(crop_year, rng);

        let production_kg = crop_yield * crop_year.surface * 1000.0;
        let last = cycle == cycles;

        let mut sold_kg = stock * kept;
        if last {
            sold_kg += production_kg * kept;
            stock = 0.0;
        } else {
            stock = production_kg;
        }

        let revenue = sold_kg * price;
        let insurance =
            insurance_premium(production_kg * price, costs.insurance_floor, config.insurance_rate);
        let total_costs = costs.fixed + insurance;

        let gross = revenue - total_costs - loan_repayment;
        let tax = income_tax(
            gross,
            config.total_surface,
            config.tax_exemption_surface,
            config.tax_rate,
        );

        records.push(CycleRecord {
            scenario: crop_year.scenario,
            year: crop_year.year,
            method: crop_year.method,
            crop: crop_year.crop.to_string(),
            surface: crop_year.surface,
            cycle,
            production_kg,
            carried_stock_kg: stock,
            sold_kg,
            price,
            revenue,
            costs: total_costs,
            insurance,
            loan_repayment,
            tax,
            net_profit: gross - tax,
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RiskEvent;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn calm_params(cycles: u32) -> MethodParameters {
        MethodParameters {
            crop_yield: 10.0,
            price: 100.0,
            input_cost: 1_000.0,
            labor_cost: 1_000.0,
            sigma: 0.0,
            yield_risk: RiskEvent::default(),
            price_risk: RiskEvent::default(),
            climate_sensitivity: 0.0,
            cycles_per_year: cycles,
        }
    }

    fn crop_year(params: &MethodParameters) -> CropYear<'_> {
        CropYear {
            scenario: 1,
            // seasonality factor is exactly 1 in year 5
            year: 5,
            method: CultivationMethod::OpenField,
            crop: "cabbage",
            params,
            surface: 2.0,
            climate_shock: 0.0,
            price_shock: 0.0,
            weather: None,
            unfavorable: false,
            monthly_repayment: 100.0,
            yearly_depreciation: 0.0,
        }
    }

    fn config() -> AgriculturalConfig {
        AgriculturalConfig {
            total_surface: 2.0,
            hazards: Vec::new(),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_cycle_deterministic() {
        let params = calm_params(1);
        let records = crop_year_cashflows(&crop_year(&params), &config(), &mut SmallRng::seed_from_u64(1));
        assert_eq!(records.len(), 1);
        let r = &records[0];

        assert_eq!(r.production_kg, 20_000.0);
        assert!((r.sold_kg - 18_000.0).abs() < 1e-9);
        assert!((r.revenue - 1_800_000.0).abs() < 1e-6);
        // 0.02 * 2M = 40k beats the 10k per-hectare floor
        assert!((r.insurance - 40_000.0).abs() < 1e-6);
        // 1k + 1k + 200 social + 12000 levy + 40k insurance
        assert!((r.costs - 54_200.0).abs() < 1e-6);
        assert!((r.loan_repayment - 1_200.0).abs() < 1e-9);
        let gross = 1_800_000.0 - 54_200.0 - 1_200.0;
        assert!((r.tax - 0.15 * gross).abs() < 1e-6);
        assert!((r.net_profit - 0.85 * gross).abs() < 1e-6);
        assert_eq!(r.carried_stock_kg, 0.0);
    }

    #[test]
    fn test_stock_carries_between_cycles() {
        let params = calm_params(3);
        let records = crop_year_cashflows(&crop_year(&params), &config(), &mut SmallRng::seed_from_u64(2));
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].sold_kg, 0.0);
        assert_eq!(records[0].revenue, 0.0);
        assert_eq!(records[0].carried_stock_kg, 20_000.0);
        assert!((records[1].sold_kg - 18_000.0).abs() < 1e-9);
        assert!((records[2].sold_kg - 36_000.0).abs() < 1e-9);
        assert_eq!(records[2].carried_stock_kg, 0.0);

        // whole harvest sold once, net of loss
        let sold: f64 = records.iter().map(|r| r.sold_kg).sum();
        let produced: f64 = records.iter().map(|r| r.production_kg).sum();
        assert!((sold - produced * 0.9).abs() < 1e-6);

        for r in &records {
            assert!((r.loan_repayment - 400.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_loss_cycle_is_never_taxed() {
        let params = calm_params(2);
        let records = crop_year_cashflows(&crop_year(&params), &config(), &mut SmallRng::seed_from_u64(3));
        // the first cycle sells nothing
        assert!(records[0].net_profit < 0.0);
        assert_eq!(records[0].tax, 0.0);
    }

    #[test]
    fn test_large_farm_exempt() {
        let params = calm_params(1);
        let config = AgriculturalConfig {
            total_surface: 10.0,
            hazards: Vec::new(),
            ..Default::default()
        };
        let records = crop_year_cashflows(&crop_year(&params), &config, &mut SmallRng::seed_from_u64(4));
        assert_eq!(records[0].tax, 0.0);
    }

    #[test]
    fn test_total_loss_yields_zero_production() {
        let mut params = calm_params(1);
        params.yield_risk = RiskEvent {
            probability: 1.0,
            impact: 1.0,
        };
        let records = crop_year_cashflows(&crop_year(&params), &config(), &mut SmallRng::seed_from_u64(5));
        assert_eq!(records[0].production_kg, 0.0);
        assert_eq!(records[0].revenue, 0.0);
        // floor insurance still paid
        assert!((records[0].insurance - 10_000.0).abs() < 1e-9);
    }
}
