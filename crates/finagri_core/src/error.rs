use std::fmt;

/// Errors raised while reading or interpreting input datasets and catalogs
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    /// Required columns are absent from the securities dataset
    MissingColumns(Vec<String>),
    /// A row could not be parsed
    Malformed { line: u64, reason: String },
    /// The dataset contains no usable rows
    Empty,
    /// More than one row for the same security and year
    DuplicateRecord { name: String, year: i32 },
    /// A crop was requested that the catalog does not know
    UnknownCrop(String),
    /// A historical series is required for a crop but missing
    MissingSeries(String),
    /// Underlying reader failure
    Io(String),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::MissingColumns(cols) => {
                write!(f, "missing columns in dataset: {}", cols.join(", "))
            }
            DataError::Malformed { line, reason } => {
                write!(f, "malformed row at line {line}: {reason}")
            }
            DataError::Empty => write!(f, "dataset is empty"),
            DataError::DuplicateRecord { name, year } => {
                write!(f, "duplicate record for {name} in {year}")
            }
            DataError::UnknownCrop(name) => write!(f, "crop '{name}' not found in catalog"),
            DataError::MissingSeries(name) => {
                write!(f, "historical series missing for crop '{name}'")
            }
            DataError::Io(msg) => write!(f, "read error: {msg}"),
        }
    }
}

impl std::error::Error for DataError {}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map_or(0, csv::Position::line);
        match err.kind() {
            csv::ErrorKind::Io(e) => DataError::Io(e.to_string()),
            _ => DataError::Malformed {
                line,
                reason: err.to_string(),
            },
        }
    }
}

/// Errors caused by inconsistent user parameters
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    UnknownFinancingMode(String),
    /// Loan starting at `start_year` for `duration_years` does not fit the horizon
    LoanExceedsHorizon {
        start_year: u32,
        duration_years: u32,
        horizon_years: u32,
    },
    InvalidLoan(String),
    InvalidParameter {
        name: &'static str,
        reason: String,
    },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::UnknownFinancingMode(mode) => {
                write!(f, "unknown financing mode '{mode}'")
            }
            ConfigurationError::LoanExceedsHorizon {
                start_year,
                duration_years,
                horizon_years,
            } => write!(
                f,
                "loan starting in year {start_year} over {duration_years} years exceeds the {horizon_years}-year horizon"
            ),
            ConfigurationError::InvalidLoan(reason) => write!(f, "invalid loan: {reason}"),
            ConfigurationError::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter {name}: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Errors raised when the eligible universe is too small
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    InsufficientSecurities { eligible: usize, required: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InsufficientSecurities { eligible, required } => write!(
                f,
                "only {eligible} eligible securities after filtering, at least {required} required"
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Reasons an optimization strategy produced no basket
#[derive(Debug, Clone, PartialEq)]
pub enum OptimizationError {
    /// No random sample satisfied the weight cap and dividend constraint
    NoFeasibleSample { trials: usize },
    /// The convex program has no feasible point
    Infeasible(String),
    /// The convex search stopped before finding any feasible basket
    SolverFailed(String),
}

impl fmt::Display for OptimizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizationError::NoFeasibleSample { trials } => {
                write!(f, "no feasible portfolio found in {trials} random trials")
            }
            OptimizationError::Infeasible(reason) => {
                write!(f, "convex program infeasible: {reason}")
            }
            OptimizationError::SolverFailed(reason) => write!(f, "convex solver failed: {reason}"),
        }
    }
}

impl std::error::Error for OptimizationError {}

/// Linear-algebra failures that survived the regularisation retry
#[derive(Debug, Clone, PartialEq)]
pub enum NumericalError {
    NotPositiveDefinite { dimension: usize, jitter: f64 },
    DimensionMismatch { expected: usize, actual: usize },
}

impl fmt::Display for NumericalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericalError::NotPositiveDefinite { dimension, jitter } => write!(
                f,
                "{dimension}x{dimension} matrix not positive definite even with jitter {jitter}"
            ),
            NumericalError::DimensionMismatch { expected, actual } => {
                write!(f, "dimension mismatch: expected {expected}, got {actual}")
            }
        }
    }
}

impl std::error::Error for NumericalError {}

/// Umbrella error for every public entry point
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    Data(DataError),
    Configuration(ConfigurationError),
    Validation(ValidationError),
    Optimization(OptimizationError),
    Numerical(NumericalError),
    /// Run was cancelled through its progress handle
    Cancelled,
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Data(e) => write!(f, "{e}"),
            SimulationError::Configuration(e) => write!(f, "{e}"),
            SimulationError::Validation(e) => write!(f, "{e}"),
            SimulationError::Optimization(e) => write!(f, "{e}"),
            SimulationError::Numerical(e) => write!(f, "{e}"),
            SimulationError::Cancelled => write!(f, "simulation cancelled"),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Data(e) => Some(e),
            SimulationError::Configuration(e) => Some(e),
            SimulationError::Validation(e) => Some(e),
            SimulationError::Optimization(e) => Some(e),
            SimulationError::Numerical(e) => Some(e),
            SimulationError::Cancelled => None,
        }
    }
}

impl From<DataError> for SimulationError {
    fn from(err: DataError) -> Self {
        SimulationError::Data(err)
    }
}

impl From<ConfigurationError> for SimulationError {
    fn from(err: ConfigurationError) -> Self {
        SimulationError::Configuration(err)
    }
}

impl From<ValidationError> for SimulationError {
    fn from(err: ValidationError) -> Self {
        SimulationError::Validation(err)
    }
}

impl From<OptimizationError> for SimulationError {
    fn from(err: OptimizationError) -> Self {
        SimulationError::Optimization(err)
    }
}

impl From<NumericalError> for SimulationError {
    fn from(err: NumericalError) -> Self {
        SimulationError::Numerical(err)
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
