use serde::Serialize;
use thiserror::Error;

/// Full set of assumptions for one simulation run. Rates are annual
/// fractions (0.05 = 5%), monetary fields are plain currency amounts.
#[derive(Debug, Clone)]
pub struct SimulationInput {
    pub home_price: f64,
    pub down_payment: f64,
    pub years: u32,
    pub house_tax_rate: f64,
    /// Appreciation ceiling: one scenario per integer step 0..=max_return,
    /// where scenario `s` grows the home to `s`x over the horizon.
    pub max_return: u32,
    pub rental_base_monthly: f64,
    pub rental_raise_annual: f64,
    pub mortgage_interest_rate: f64,
    pub average_annual_investment_yield: f64,
}

/// Year-end series for one appreciation scenario. All three vectors have
/// exactly `years` elements; index `i` is the end of year `i + 1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    /// Home equity minus the net renter position (pool minus rent paid).
    pub diffs: Vec<f64>,
    /// Cumulative mortgage payments plus property tax.
    pub total_costs: Vec<f64>,
    /// Alternative-investment pool balance.
    pub investment_returns: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("years must be >= 1")]
    InvalidYears,
    #[error("homePrice must be > 0")]
    NonPositiveHomePrice,
    #[error("downPayment must be between 0 and homePrice")]
    DownPaymentOutOfRange,
    #[error("maxReturn must be >= 1")]
    InvalidMaxReturn,
    #[error("rentalBaseMonthly must be >= 0")]
    NegativeRentalBase,
    #[error("{field} must be >= 0")]
    NegativeRate { field: &'static str },
    #[error("{field} must be a finite number")]
    NonFiniteInput { field: &'static str },
}
