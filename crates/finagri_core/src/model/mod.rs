mod crops;
mod financing;
mod portfolio;
mod progress;
mod regime;
mod results;
mod securities;

pub use crops::{
    CropCatalog, CropEntry, CropHistory, CultivationMethod, HazardEvent, MethodParameters,
    RiskEvent, WeatherObservation,
};
pub use financing::{AmortizationRow, CapitalPlan, FinancingMode, Loan};
pub use portfolio::{Holding, OptimizationStrategy, Portfolio, PortfolioStats};
pub use progress::SimulationProgress;
pub use regime::{Regime, TransitionMatrix};
pub use results::{
    AgriculturalSimulationResult, CycleRecord, EquitySimulationResult, EquitySummary,
    RepresentativeScenarios, ScenarioTable,
};
pub use securities::{SecurityDataset, SecurityRecord, parse_stable_flag};
