use super::mortgage::{AmortizationSchedule, MortgageTerms};
use super::types::{ScenarioResult, SimulationError, SimulationInput};

const MONTHS_PER_YEAR: u32 = 12;

/// Year-end samples of everything that does not depend on the appreciation
/// scenario: the loan balance, the running cost of ownership, the renter's
/// investment pool, and the rent paid so far. Computed once per run and
/// shared by every scenario.
#[derive(Debug)]
struct BaselineTrack {
    remaining_principal: Vec<f64>,
    total_costs: Vec<f64>,
    pool_balances: Vec<f64>,
    cumulative_rents: Vec<f64>,
}

/// Projects home equity against renting-and-investing for every
/// appreciation scenario `0..=max_return`. Pure and re-entrant; identical
/// input yields bit-identical output.
pub fn simulate(input: &SimulationInput) -> Result<Vec<ScenarioResult>, SimulationError> {
    validate(input)?;

    let track = run_baseline_track(input);
    let scenarios = (0..=input.max_return)
        .map(|scenario| build_scenario(input, &track, scenario))
        .collect();
    Ok(scenarios)
}

fn validate(input: &SimulationInput) -> Result<(), SimulationError> {
    for (field, value) in [
        ("homePrice", input.home_price),
        ("downPayment", input.down_payment),
        ("houseTaxRate", input.house_tax_rate),
        ("rentalBaseMonthly", input.rental_base_monthly),
        ("rentalRaiseAnnual", input.rental_raise_annual),
        ("mortgageInterestRate", input.mortgage_interest_rate),
        (
            "averageAnnualInvestmentYield",
            input.average_annual_investment_yield,
        ),
    ] {
        if !value.is_finite() {
            return Err(SimulationError::NonFiniteInput { field });
        }
    }

    if input.years == 0 {
        return Err(SimulationError::InvalidYears);
    }
    if input.home_price <= 0.0 {
        return Err(SimulationError::NonPositiveHomePrice);
    }
    if input.down_payment < 0.0 || input.down_payment > input.home_price {
        return Err(SimulationError::DownPaymentOutOfRange);
    }
    if input.max_return == 0 {
        return Err(SimulationError::InvalidMaxReturn);
    }
    if input.rental_base_monthly < 0.0 {
        return Err(SimulationError::NegativeRentalBase);
    }

    for (field, rate) in [
        ("houseTaxRate", input.house_tax_rate),
        ("rentalRaiseAnnual", input.rental_raise_annual),
        ("mortgageInterestRate", input.mortgage_interest_rate),
        (
            "averageAnnualInvestmentYield",
            input.average_annual_investment_yield,
        ),
    ] {
        if rate < 0.0 {
            return Err(SimulationError::NegativeRate { field });
        }
    }

    Ok(())
}

fn run_baseline_track(input: &SimulationInput) -> BaselineTrack {
    let year_count = input.years as usize;
    let mut track = BaselineTrack {
        remaining_principal: Vec::with_capacity(year_count),
        total_costs: Vec::with_capacity(year_count),
        pool_balances: Vec::with_capacity(year_count),
        cumulative_rents: Vec::with_capacity(year_count),
    };

    let mut loan = AmortizationSchedule::new(MortgageTerms {
        principal: input.home_price - input.down_payment,
        annual_rate: input.mortgage_interest_rate,
        term_months: input.years * MONTHS_PER_YEAR,
    });

    // Property tax accrues against the purchase price, not the projected
    // value, so it is flat across months and scenarios.
    let monthly_tax = input.house_tax_rate * input.home_price / 12.0;
    let monthly_yield = input.average_annual_investment_yield / 12.0;

    // The renter keeps the capital that would have gone into the down
    // payment; it seeds the pool.
    let mut pool = input.down_payment;
    let mut cost_paid = 0.0;
    let mut rent_paid = 0.0;

    for year in 0..input.years {
        let rent = input.rental_base_monthly
            * (1.0 + input.rental_raise_annual).powi(year as i32);

        for _ in 0..MONTHS_PER_YEAR {
            let payment = loan.monthly_payment();
            loan.advance_month();

            cost_paid += payment + monthly_tax;
            rent_paid += rent;

            pool *= 1.0 + monthly_yield;
            pool += payment + monthly_tax - rent;
        }

        track.remaining_principal.push(loan.remaining_principal());
        track.total_costs.push(cost_paid);
        track.pool_balances.push(pool);
        track.cumulative_rents.push(rent_paid);
    }

    track
}

/// Home value at each year end ramps linearly from the purchase price to
/// `scenario`x at the horizon; scenarios 0 and 1 are the flat baseline.
fn projected_home_value(input: &SimulationInput, scenario: u32, year_index: u32) -> f64 {
    let terminal_factor = f64::from(scenario.max(1));
    let progress = f64::from(year_index + 1) / f64::from(input.years);
    input.home_price * (1.0 + (terminal_factor - 1.0) * progress)
}

fn build_scenario(
    input: &SimulationInput,
    track: &BaselineTrack,
    scenario: u32,
) -> ScenarioResult {
    let diffs = (0..input.years)
        .map(|year_index| {
            let i = year_index as usize;
            let equity =
                projected_home_value(input, scenario, year_index) - track.remaining_principal[i];
            let renter_position = track.pool_balances[i] - track.cumulative_rents[i];
            equity - renter_position
        })
        .collect();

    ScenarioResult {
        diffs,
        total_costs: track.total_costs.clone(),
        investment_returns: track.pool_balances.clone(),
    }
}
