mod engine;
mod mortgage;
mod types;

pub use engine::simulate;
pub use mortgage::{AmortizationSchedule, MortgageTerms};
pub use types::{ScenarioResult, SimulationError, SimulationInput};
