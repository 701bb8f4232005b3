//! Crop parameter catalog
//!
//! Each crop carries an optional parameter set per cultivation method. A
//! missing set means the crop cannot be grown with that method.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, DataError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CultivationMethod {
    Greenhouse,
    OpenField,
}

impl CultivationMethod {
    /// Iteration order used by the simulator
    pub const ALL: [CultivationMethod; 2] =
        [CultivationMethod::Greenhouse, CultivationMethod::OpenField];
}

impl fmt::Display for CultivationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CultivationMethod::Greenhouse => write!(f, "greenhouse"),
            CultivationMethod::OpenField => write!(f, "open_field"),
        }
    }
}

/// Probability / impact pair for an idiosyncratic yield or price risk
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskEvent {
    pub probability: f64,
    /// Fraction lost when the event fires
    pub impact: f64,
}

/// Discrete climatic hazard (drought, flood, storm, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardEvent {
    pub name: String,
    pub probability: f64,
    pub impact: f64,
}

impl HazardEvent {
    #[must_use]
    pub fn new(name: &str, probability: f64, impact: f64) -> Self {
        Self {
            name: name.to_string(),
            probability,
            impact,
        }
    }

    /// Drought, flood and storm with their reference probabilities and impacts
    #[must_use]
    pub fn reference_set() -> Vec<HazardEvent> {
        vec![
            HazardEvent::new("drought", 0.15, 0.4),
            HazardEvent::new("flood", 0.10, 0.5),
            HazardEvent::new("storm", 0.05, 0.3),
        ]
    }
}

/// Agronomic and economic parameters of one crop under one method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodParameters {
    /// Tonnes per hectare per cycle
    #[serde(rename = "yield")]
    pub crop_yield: f64,
    /// Price per kg
    pub price: f64,
    /// Input cost per cycle
    pub input_cost: f64,
    /// Labor cost per cycle
    pub labor_cost: f64,
    /// Relative price volatility
    pub sigma: f64,
    #[serde(default)]
    pub yield_risk: RiskEvent,
    #[serde(default)]
    pub price_risk: RiskEvent,
    /// 0 = insensitive, 1 = fully exposed to climate effects
    pub climate_sensitivity: f64,
    pub cycles_per_year: u32,
}

impl MethodParameters {
    pub fn validate(&self, crop: &str) -> Result<(), ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidParameter {
            name: "crop parameters",
            reason: format!("{crop}: {reason}"),
        };

        if self.cycles_per_year == 0 {
            return Err(invalid("cycles_per_year must be at least 1".into()));
        }
        for (label, risk) in [("yield_risk", self.yield_risk), ("price_risk", self.price_risk)] {
            if !(0.0..=1.0).contains(&risk.probability) || !(0.0..=1.0).contains(&risk.impact) {
                return Err(invalid(format!("{label} must lie in [0, 1]")));
            }
        }
        if !(0.0..=1.0).contains(&self.climate_sensitivity) {
            return Err(invalid("climate_sensitivity must lie in [0, 1]".into()));
        }
        if self.sigma < 0.0 || self.crop_yield < 0.0 || self.price < 0.0 {
            return Err(invalid("yield, price and sigma must be non-negative".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CropEntry {
    #[serde(default)]
    pub open_field: Option<MethodParameters>,
    #[serde(default)]
    pub greenhouse: Option<MethodParameters>,
}

impl CropEntry {
    #[must_use]
    pub fn method(&self, method: CultivationMethod) -> Option<&MethodParameters> {
        match method {
            CultivationMethod::Greenhouse => self.greenhouse.as_ref(),
            CultivationMethod::OpenField => self.open_field.as_ref(),
        }
    }

    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.open_field.is_some() || self.greenhouse.is_some()
    }
}

/// Crop name -> per-method parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CropCatalog {
    crops: BTreeMap<String, CropEntry>,
}

impl CropCatalog {
    #[must_use]
    pub fn new(crops: BTreeMap<String, CropEntry>) -> Self {
        Self { crops }
    }

    pub fn insert(&mut self, name: &str, entry: CropEntry) {
        self.crops.insert(name.to_string(), entry);
    }

    pub fn get(&self, name: &str) -> Result<&CropEntry, DataError> {
        self.crops
            .get(name)
            .ok_or_else(|| DataError::UnknownCrop(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.crops.keys().map(String::as_str)
    }

    /// Validate every parameter set of the requested crops.
    pub fn validate(&self, crops: &[String]) -> crate::error::Result<()> {
        for crop in crops {
            let entry = self.get(crop)?;
            for method in CultivationMethod::ALL {
                if let Some(params) = entry.method(method) {
                    params.validate(crop)?;
                }
            }
        }
        Ok(())
    }
}

/// Observed weather for one project year
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// Annual rainfall in mm
    pub rainfall: Option<f64>,
    /// Mean temperature in degrees Celsius
    pub temperature: Option<f64>,
}

/// Historical per-crop series used only to estimate cross-crop correlation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CropHistory {
    #[serde(default)]
    pub rainfall: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    pub prices: BTreeMap<String, Vec<f64>>,
}
