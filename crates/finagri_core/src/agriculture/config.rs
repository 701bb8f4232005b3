use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::model::HazardEvent;

/// How the farm project is financed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AgriFinancing {
    #[default]
    SelfFinanced,
    /// Bank loan repaid in monthly instalments over the project duration
    Loan {
        amount: f64,
        #[serde(default = "default_loan_rate")]
        annual_rate: f64,
    },
}

fn default_loan_rate() -> f64 {
    0.02
}

/// Parameters of an agricultural project simulation.
///
/// Monetary values are in the same currency as the crop catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgriculturalConfig {
    /// Operated surface in hectares
    #[serde(default = "default_total_surface")]
    pub total_surface: f64,

    #[serde(default = "default_duration_years")]
    pub duration_years: u32,

    /// Fraction of the surface under greenhouses
    #[serde(default = "default_greenhouse_share")]
    pub greenhouse_share: f64,

    /// Crops to grow; surfaces are split evenly among compatible crops
    #[serde(default)]
    pub crops: Vec<String>,

    #[serde(default = "default_scenarios")]
    pub scenarios: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default)]
    pub financing: AgriFinancing,

    // Climate
    /// Annual rainfall (mm) below which yields suffer
    #[serde(default = "default_low_rainfall")]
    pub low_rainfall_threshold: f64,
    /// Mean temperature (°C) above which yields suffer
    #[serde(default = "default_high_temperature")]
    pub high_temperature_threshold: f64,
    #[serde(default = "HazardEvent::reference_set")]
    pub hazards: Vec<HazardEvent>,
    /// Yield loss of a fully exposed crop in an unfavorable year
    #[serde(default = "default_mean_climate_impact")]
    pub mean_climate_impact: f64,
    #[serde(default = "default_unfavorable_probability")]
    pub unfavorable_year_probability: f64,
    #[serde(default = "default_shock_sigma")]
    pub climate_sigma: f64,
    #[serde(default = "default_shock_sigma")]
    pub price_sigma: f64,

    // Costs, taxes and insurance
    #[serde(default = "default_insurance_rate")]
    pub insurance_rate: f64,
    #[serde(default = "default_insurance_per_hectare")]
    pub insurance_per_hectare: f64,
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    /// Farms at least this large (ha) pay no income tax
    #[serde(default = "default_tax_exemption_surface")]
    pub tax_exemption_surface: f64,
    #[serde(default = "default_social_charge_rate")]
    pub social_charge_rate: f64,
    /// Yearly health levy per worker
    #[serde(default = "default_health_levy")]
    pub health_levy_per_worker: f64,
    #[serde(default = "default_workers_per_hectare")]
    pub workers_per_hectare: f64,

    // Greenhouses
    /// Surface (ha) covered by one greenhouse unit
    #[serde(default = "default_greenhouse_unit_surface")]
    pub greenhouse_unit_surface: f64,
    #[serde(default = "default_greenhouse_unit_cost")]
    pub greenhouse_unit_cost: f64,
    #[serde(default = "default_depreciation_years")]
    pub greenhouse_depreciation_years: u32,

    // Harvest
    #[serde(default = "default_post_harvest_loss")]
    pub post_harvest_loss: f64,
    #[serde(default = "default_months_per_year")]
    pub months_per_year: u32,
}

fn default_total_surface() -> f64 {
    10.0
}

fn default_duration_years() -> u32 {
    5
}

fn default_greenhouse_share() -> f64 {
    0.2
}

fn default_scenarios() -> usize {
    100
}

fn default_seed() -> u64 {
    2024
}

fn default_low_rainfall() -> f64 {
    1000.0
}

fn default_high_temperature() -> f64 {
    30.0
}

fn default_mean_climate_impact() -> f64 {
    0.3
}

fn default_unfavorable_probability() -> f64 {
    0.2
}

fn default_shock_sigma() -> f64 {
    0.1
}

fn default_insurance_rate() -> f64 {
    0.02
}

fn default_insurance_per_hectare() -> f64 {
    5000.0
}

fn default_tax_rate() -> f64 {
    0.15
}

fn default_tax_exemption_surface() -> f64 {
    5.0
}

fn default_social_charge_rate() -> f64 {
    0.20
}

fn default_health_levy() -> f64 {
    12_000.0
}

fn default_workers_per_hectare() -> f64 {
    0.5
}

fn default_greenhouse_unit_surface() -> f64 {
    0.05
}

fn default_greenhouse_unit_cost() -> f64 {
    1_200_000.0
}

fn default_depreciation_years() -> u32 {
    10
}

fn default_post_harvest_loss() -> f64 {
    0.1
}

fn default_months_per_year() -> u32 {
    12
}

impl Default for AgriculturalConfig {
    fn default() -> Self {
        Self {
            total_surface: default_total_surface(),
            duration_years: default_duration_years(),
            greenhouse_share: default_greenhouse_share(),
            crops: Vec::new(),
            scenarios: default_scenarios(),
            seed: default_seed(),
            financing: AgriFinancing::default(),
            low_rainfall_threshold: default_low_rainfall(),
            high_temperature_threshold: default_high_temperature(),
            hazards: HazardEvent::reference_set(),
            mean_climate_impact: default_mean_climate_impact(),
            unfavorable_year_probability: default_unfavorable_probability(),
            climate_sigma: default_shock_sigma(),
            price_sigma: default_shock_sigma(),
            insurance_rate: default_insurance_rate(),
            insurance_per_hectare: default_insurance_per_hectare(),
            tax_rate: default_tax_rate(),
            tax_exemption_surface: default_tax_exemption_surface(),
            social_charge_rate: default_social_charge_rate(),
            health_levy_per_worker: default_health_levy(),
            workers_per_hectare: default_workers_per_hectare(),
            greenhouse_unit_surface: default_greenhouse_unit_surface(),
            greenhouse_unit_cost: default_greenhouse_unit_cost(),
            greenhouse_depreciation_years: default_depreciation_years(),
            post_harvest_loss: default_post_harvest_loss(),
            months_per_year: default_months_per_year(),
        }
    }
}

impl AgriculturalConfig {
    /// Surface under greenhouses and in open field, in hectares
    #[must_use]
    pub fn surfaces(&self) -> (f64, f64) {
        let greenhouse = self.total_surface * self.greenhouse_share;
        (greenhouse, self.total_surface - greenhouse)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |name: &'static str, reason: &str| {
            Err(ConfigurationError::InvalidParameter {
                name,
                reason: reason.to_string(),
            })
        };
        let unit = |x: f64| (0.0..=1.0).contains(&x);

        if self.scenarios == 0 {
            return invalid("scenarios", "at least one scenario is required");
        }
        if self.duration_years == 0 {
            return invalid("duration_years", "must be at least 1");
        }
        if !(self.total_surface.is_finite() && self.total_surface > 0.0) {
            return invalid("total_surface", "must be positive");
        }
        if !unit(self.greenhouse_share) {
            return invalid("greenhouse_share", "must lie in [0, 1]");
        }
        if self.crops.is_empty() {
            return invalid("crops", "at least one crop is required");
        }
        if self.months_per_year == 0 {
            return invalid("months_per_year", "must be at least 1");
        }
        if self.greenhouse_share > 0.0
            && (self.greenhouse_unit_surface <= 0.0 || self.greenhouse_depreciation_years == 0)
        {
            return invalid(
                "greenhouse_unit_surface",
                "greenhouse unit surface and depreciation period must be positive",
            );
        }
        for (name, p) in [
            ("unfavorable_year_probability", self.unfavorable_year_probability),
            ("post_harvest_loss", self.post_harvest_loss),
            ("tax_rate", self.tax_rate),
            ("mean_climate_impact", self.mean_climate_impact),
        ] {
            if !unit(p) {
                return invalid(name, "must lie in [0, 1]");
            }
        }
        if self.climate_sigma < 0.0 || self.price_sigma < 0.0 {
            return invalid("climate_sigma", "shock volatilities must be non-negative");
        }
        if self
            .hazards
            .iter()
            .any(|h| !unit(h.probability) || !unit(h.impact))
        {
            return invalid("hazards", "probabilities and impacts must lie in [0, 1]");
        }
        if let AgriFinancing::Loan {
            amount,
            annual_rate,
        } = self.financing
            && (amount < 0.0 || annual_rate < 0.0)
        {
            return invalid("financing", "loan amount and rate must be non-negative");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config: AgriculturalConfig = serde_json::from_str(r#"{"crops": ["tomato"]}"#).unwrap();
        assert_eq!(config.crops, vec!["tomato".to_string()]);
        assert_eq!(config.tax_exemption_surface, 5.0);
        assert_eq!(config.hazards.len(), 3);
        assert_eq!(config.financing, AgriFinancing::SelfFinanced);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_loan_financing_tag() {
        let financing: AgriFinancing =
            serde_json::from_str(r#"{"mode": "loan", "amount": 1000000}"#).unwrap();
        assert_eq!(
            financing,
            AgriFinancing::Loan {
                amount: 1_000_000.0,
                annual_rate: 0.02
            }
        );
    }

    #[test]
    fn test_zero_scenarios_rejected() {
        let config = AgriculturalConfig {
            scenarios: 0,
            crops: vec!["tomato".into()],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidParameter {
                name: "scenarios",
                ..
            })
        ));
    }

    #[test]
    fn test_surfaces_split() {
        let config = AgriculturalConfig {
            total_surface: 8.0,
            greenhouse_share: 0.25,
            ..Default::default()
        };
        assert_eq!(config.surfaces(), (2.0, 6.0));
    }
}
