//! YAML run files and the input files they point at
//!
//! A run file gathers every parameter record of one session:
//!
//! ```yaml
//! dataset: data/brvm.csv
//! optimizer:
//!   strategy: hybrid
//!   min_dividend_yield: 0.03
//! financing:
//!   mode: single_loan
//!   loan: { principal: 3000000, annual_rate: 0.05, duration_years: 5, start_year: 0 }
//! equity:
//!   horizon_years: 10
//! agriculture:
//!   catalog: data/crops.yaml
//!   weather: data/weather.csv
//!   simulation:
//!     total_surface: 10
//!     crops: [tomato, onion]
//! batch:
//!   - name: aggressive
//!     financing: { mode: single_contribution, amount: 10000000 }
//!     optimizer: { risk_aversion: 0.0 }
//! ```
//!
//! Relative paths are resolved against the directory holding the run file.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use finagri_core::agriculture::AgriculturalConfig;
use finagri_core::equity::EquitySimulationConfig;
use finagri_core::model::{CropCatalog, CropHistory, FinancingMode, WeatherObservation};
use finagri_core::optimization::OptimizerConfig;
use finagri_core::{DataError, SecurityDataset, read_securities};
use serde::{Deserialize, Serialize};

/// Error types for run-file and input loading
#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Data(DataError),
    /// A section needed by the requested command is absent
    Missing(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "IO error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::Data(err) => write!(f, "Data error: {}", err),
            ConfigError::Missing(section) => write!(f, "Run file has no `{}` section", section),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<DataError> for ConfigError {
    fn from(err: DataError) -> Self {
        ConfigError::Data(err)
    }
}

/// Inputs of the agricultural simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgricultureSection {
    /// YAML crop catalog
    pub catalog: PathBuf,
    #[serde(default)]
    pub simulation: AgriculturalConfig,
    /// CSV with `rainfall,temperature` columns, one row per project year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<PathBuf>,
    /// YAML rainfall/price series used for shock correlation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<PathBuf>,
}

/// One named equity run of a batch. Missing records inherit the top-level ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer: Option<OptimizerConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financing: Option<FinancingMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equity: Option<EquitySimulationConfig>,
}

/// Configuration stored in a run file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunFile {
    /// Securities CSV export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<PathBuf>,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financing: Option<FinancingMode>,
    #[serde(default)]
    pub equity: EquitySimulationConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agriculture: Option<AgricultureSection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub batch: Vec<BatchEntry>,
}

impl RunFile {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(yaml)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse run file: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_saphyr::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize run file: {}", e)))
    }

    /// Rewrite relative input paths so they are relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        if let Some(dataset) = self.dataset.as_mut() {
            resolve(dataset);
        }
        if let Some(agri) = self.agriculture.as_mut() {
            resolve(&mut agri.catalog);
            if let Some(weather) = agri.weather.as_mut() {
                resolve(weather);
            }
            if let Some(history) = agri.history.as_mut() {
                resolve(history);
            }
        }
    }

    pub fn dataset_path(&self) -> Result<&Path, ConfigError> {
        self.dataset.as_deref().ok_or(ConfigError::Missing("dataset"))
    }

    pub fn agriculture(&self) -> Result<&AgricultureSection, ConfigError> {
        self.agriculture
            .as_ref()
            .ok_or(ConfigError::Missing("agriculture"))
    }

    /// Records of a batch entry, falling back to the top-level ones.
    pub fn batch_records(
        &self,
        entry: &BatchEntry,
    ) -> Result<(OptimizerConfig, FinancingMode, EquitySimulationConfig), ConfigError> {
        let financing = entry
            .financing
            .clone()
            .or_else(|| self.financing.clone())
            .ok_or(ConfigError::Missing("financing"))?;
        Ok((
            entry
                .optimizer
                .clone()
                .unwrap_or_else(|| self.optimizer.clone()),
            financing,
            entry.equity.clone().unwrap_or_else(|| self.equity.clone()),
        ))
    }
}

fn read_text(path: &Path, what: &str) -> Result<String, ConfigError> {
    fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("Failed to read {} {}: {}", what, path.display(), e)))
}

/// Load a run file and resolve its paths against its own directory.
pub fn load_run_file(path: &Path) -> Result<RunFile, ConfigError> {
    let mut run = RunFile::from_yaml(&read_text(path, "run file")?)?;
    if let Some(base) = path.parent() {
        run.resolve_paths(base);
    }
    tracing::debug!(path = %path.display(), batch = run.batch.len(), "run file loaded");
    Ok(run)
}

pub fn load_dataset(path: &Path) -> Result<SecurityDataset, ConfigError> {
    let file = File::open(path).map_err(|e| {
        ConfigError::Io(format!("Failed to open dataset {}: {}", path.display(), e))
    })?;
    let dataset = read_securities(file)?;
    tracing::info!(
        path = %path.display(),
        rows = dataset.len(),
        securities = dataset.names().len(),
        "dataset loaded"
    );
    Ok(dataset)
}

pub fn load_catalog(path: &Path) -> Result<CropCatalog, ConfigError> {
    serde_saphyr::from_str(&read_text(path, "crop catalog")?)
        .map_err(|e| ConfigError::Parse(format!("Failed to parse crop catalog: {}", e)))
}

pub fn load_history(path: &Path) -> Result<CropHistory, ConfigError> {
    serde_saphyr::from_str(&read_text(path, "crop history")?)
        .map_err(|e| ConfigError::Parse(format!("Failed to parse crop history: {}", e)))
}

/// Read observed weather, one row per project year. Empty cells mean unknown.
pub fn read_weather<R: std::io::Read>(source: R) -> Result<Vec<WeatherObservation>, ConfigError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);
    reader
        .deserialize()
        .collect::<Result<Vec<WeatherObservation>, _>>()
        .map_err(|e| ConfigError::Parse(format!("Failed to parse weather: {}", e)))
}

pub fn load_weather(path: &Path) -> Result<Vec<WeatherObservation>, ConfigError> {
    let file = File::open(path).map_err(|e| {
        ConfigError::Io(format!("Failed to open weather {}: {}", path.display(), e))
    })?;
    read_weather(file)
}
