//! Multi-scenario agricultural project simulator

use nalgebra::DMatrix;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::batch::run_seeded;
use crate::error::Result;
use crate::financing::monthly_payment;
use crate::linalg::{cholesky_with_jitter, correlated_normal};
use crate::metrics::median;
use crate::model::{
    AgriculturalSimulationResult, CropCatalog, CropHistory, CultivationMethod, CycleRecord,
    MethodParameters, RepresentativeScenarios, ScenarioTable, SimulationProgress,
    WeatherObservation,
};

use super::cashflow::{CropYear, crop_year_cashflows};
use super::config::{AgriFinancing, AgriculturalConfig};
use super::correlation::ShockCorrelation;
use super::costs::{allocate_surface, greenhouse_depreciation};

/// A crop planted with one method on its allocated surface
#[derive(Debug, Clone)]
struct Planting<'a> {
    method: CultivationMethod,
    crop: &'a str,
    params: &'a MethodParameters,
    surface: f64,
    /// Index into the shock vectors
    shock_index: usize,
    monthly_repayment: f64,
    yearly_depreciation: f64,
}

/// Scenario-invariant inputs, prepared once
#[derive(Debug)]
struct ProjectPlan<'a> {
    plantings: Vec<Planting<'a>>,
    climate_factor: DMatrix<f64>,
    price_factor: DMatrix<f64>,
}

impl<'a> ProjectPlan<'a> {
    fn prepare(
        catalog: &'a CropCatalog,
        config: &'a AgriculturalConfig,
        history: Option<&CropHistory>,
    ) -> Result<Self> {
        // crops usable with at least one method, in request order
        let mut considered: Vec<&'a str> = Vec::new();
        for crop in &config.crops {
            if catalog.get(crop)?.is_usable() && !considered.contains(&crop.as_str()) {
                considered.push(crop);
            }
        }
        let names: Vec<String> = considered.iter().map(|c| c.to_string()).collect();

        let correlation = ShockCorrelation::estimate(history, &names)?;
        let climate_factor =
            cholesky_with_jitter(&(correlation.climate * config.climate_sigma.powi(2)))?;
        let price_factor = cholesky_with_jitter(&(correlation.price * config.price_sigma.powi(2)))?;

        let monthly = match config.financing {
            AgriFinancing::Loan {
                amount,
                annual_rate,
            } if amount > 0.0 => monthly_payment(amount, annual_rate, config.duration_years),
            _ => 0.0,
        };

        let (greenhouse_surface, open_surface) = config.surfaces();
        let depreciation = greenhouse_depreciation(greenhouse_surface, config);

        let mut plantings = Vec::new();
        for (method, surface) in [
            (CultivationMethod::Greenhouse, greenhouse_surface),
            (CultivationMethod::OpenField, open_surface),
        ] {
            let allocation = allocate_surface(surface, method, &names, catalog);
            for (crop, crop_surface) in allocation {
                let Some(index) = considered.iter().position(|c| *c == crop) else {
                    continue;
                };
                let name = considered[index];
                let Some(params) = catalog.get(name)?.method(method) else {
                    continue;
                };
                let depreciation_share = match method {
                    CultivationMethod::Greenhouse if surface > 0.0 => {
                        depreciation * crop_surface / surface
                    }
                    _ => 0.0,
                };
                plantings.push(Planting {
                    method,
                    crop: name,
                    params,
                    surface: crop_surface,
                    shock_index: index,
                    monthly_repayment: 0.0,
                    yearly_depreciation: depreciation_share,
                });
            }
        }

        // the annuity is spread over the surface actually planted
        let planted: f64 = plantings.iter().map(|p| p.surface).sum();
        if planted > 0.0 {
            for planting in &mut plantings {
                planting.monthly_repayment = monthly * planting.surface / planted;
            }
        }

        Ok(Self {
            plantings,
            climate_factor,
            price_factor,
        })
    }
}

fn simulate_scenario<R: Rng + ?Sized>(
    scenario: usize,
    plan: &ProjectPlan<'_>,
    config: &AgriculturalConfig,
    weather: &[WeatherObservation],
    rng: &mut R,
) -> ScenarioTable {
    let mut records: Vec<CycleRecord> = Vec::new();

    for year in 1..=config.duration_years {
        let climate = correlated_normal(&plan.climate_factor, rng);
        let prices = correlated_normal(&plan.price_factor, rng);
        let unfavorable = rng.random::<f64>() < config.unfavorable_year_probability;
        let observation = weather.get(year as usize - 1);

        for planting in &plan.plantings {
            let crop_year = CropYear {
                scenario,
                year,
                method: planting.method,
                crop: planting.crop,
                params: planting.params,
                surface: planting.surface,
                climate_shock: climate[planting.shock_index],
                price_shock: prices[planting.shock_index],
                weather: observation,
                unfavorable,
                monthly_repayment: planting.monthly_repayment,
                yearly_depreciation: planting.yearly_depreciation,
            };
            records.extend(crop_year_cashflows(&crop_year, config, rng));
        }
    }

    ScenarioTable {
        scenario,
        total_net_profit: records.iter().map(|r| r.net_profit).sum(),
        records,
    }
}

/// Indices of the first minimum, the value closest to the median and the
/// first maximum.
fn representative_indices(totals: &[f64]) -> (usize, usize, usize) {
    let mid = median(totals);
    let mut min = 0;
    let mut max = 0;
    let mut med = 0;
    for (i, total) in totals.iter().enumerate() {
        if *total < totals[min] {
            min = i;
        }
        if *total > totals[max] {
            max = i;
        }
        if (total - mid).abs() < (totals[med] - mid).abs() {
            med = i;
        }
    }
    (min, med, max)
}

/// Run `config.scenarios` independent scenarios of the farm project.
///
/// `weather` holds observations for the first project years (index 0 is
/// year 1); later years have no weather adjustment. `history` drives the
/// cross-crop shock correlation; without it crops are uncorrelated.
///
/// # Errors
/// - `ConfigurationError` for invalid parameters or zero scenarios
/// - `DataError` for crops missing from the catalog or partial histories
/// - `Cancelled` when the progress handle is cancelled mid-batch
pub fn simulate_agricultural_project(
    catalog: &CropCatalog,
    config: &AgriculturalConfig,
    weather: &[WeatherObservation],
    history: Option<&CropHistory>,
    progress: Option<&SimulationProgress>,
) -> Result<AgriculturalSimulationResult> {
    config.validate()?;
    catalog.validate(&config.crops)?;
    let plan = ProjectPlan::prepare(catalog, config, history)?;

    tracing::debug!(
        scenarios = config.scenarios,
        years = config.duration_years,
        plantings = plan.plantings.len(),
        "starting agricultural simulation"
    );

    let tables = run_seeded(config.scenarios, config.seed, progress, |index, seed| {
        let mut rng = SmallRng::seed_from_u64(seed);
        Ok(simulate_scenario(index + 1, &plan, config, weather, &mut rng))
    })?;

    let scenario_totals: Vec<f64> = tables.iter().map(|t| t.total_net_profit).collect();
    let (min, med, max) = representative_indices(&scenario_totals);
    let representatives = RepresentativeScenarios {
        minimum: tables[min].clone(),
        median: tables[med].clone(),
        maximum: tables[max].clone(),
    };

    tracing::info!(
        scenarios = tables.len(),
        median_profit = representatives.median.total_net_profit,
        "agricultural simulation finished"
    );

    Ok(AgriculturalSimulationResult {
        records: tables.into_iter().flat_map(|t| t.records).collect(),
        scenario_totals,
        representatives,
    })
}
