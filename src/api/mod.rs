use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{ScenarioResult, SimulationInput, simulate};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

/// Optional overrides supplied by the browser. Rates arrive as percents,
/// matching the form fields; anything omitted falls back to the `Cli`
/// defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    home_price: Option<f64>,
    down_payment: Option<f64>,
    years: Option<u32>,
    property_tax: Option<f64>,
    max_return: Option<u32>,
    rental_base: Option<f64>,
    rental_raise: Option<f64>,
    mortgage_rate: Option<f64>,
    avg_annual_yield: Option<f64>,
}

#[derive(Parser, Debug)]
#[command(
    name = "buyrent",
    about = "Rent-vs-buy simulator (home equity vs investing the difference)"
)]
struct Cli {
    #[arg(long, default_value_t = 300_000.0)]
    home_price: f64,
    #[arg(long, default_value_t = 60_000.0)]
    down_payment: f64,
    #[arg(long, default_value_t = 30, help = "Simulation horizon in years")]
    years: u32,
    #[arg(
        long,
        default_value_t = 1.0,
        help = "Annual property tax in percent of the purchase price"
    )]
    property_tax: f64,
    #[arg(
        long,
        default_value_t = 5,
        help = "Appreciation ceiling; one scenario per integer factor from 0"
    )]
    max_return: u32,
    #[arg(long, default_value_t = 1_500.0, help = "First month's rent")]
    rental_base: f64,
    #[arg(long, default_value_t = 3.0, help = "Annual rent raise in percent")]
    rental_raise: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Annual mortgage interest rate in percent"
    )]
    mortgage_rate: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Average annual yield of the alternative investment in percent"
    )]
    avg_annual_yield: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    years: u32,
    max_return: u32,
    scenarios: Vec<ScenarioResult>,
    /// Rent paid through each year end; the rent-vs-return chart plots
    /// this against the scenarios' investment returns.
    cumulative_rentals: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_input(cli: Cli) -> Result<SimulationInput, String> {
    if cli.years == 0 {
        return Err("--years must be >= 1".to_string());
    }

    if !cli.home_price.is_finite() || cli.home_price <= 0.0 {
        return Err("--home-price must be > 0".to_string());
    }

    if !cli.down_payment.is_finite()
        || cli.down_payment < 0.0
        || cli.down_payment > cli.home_price
    {
        return Err("--down-payment must be between 0 and --home-price".to_string());
    }

    if cli.max_return == 0 {
        return Err("--max-return must be >= 1".to_string());
    }

    if !cli.rental_base.is_finite() || cli.rental_base < 0.0 {
        return Err("--rental-base must be >= 0".to_string());
    }

    for (name, rate) in [
        ("--property-tax", cli.property_tax),
        ("--rental-raise", cli.rental_raise),
        ("--mortgage-rate", cli.mortgage_rate),
        ("--avg-annual-yield", cli.avg_annual_yield),
    ] {
        if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
            return Err(format!("{name} must be between 0 and 100"));
        }
    }

    Ok(SimulationInput {
        home_price: cli.home_price,
        down_payment: cli.down_payment,
        years: cli.years,
        house_tax_rate: cli.property_tax / 100.0,
        max_return: cli.max_return,
        rental_base_monthly: cli.rental_base,
        rental_raise_annual: cli.rental_raise / 100.0,
        mortgage_interest_rate: cli.mortgage_rate / 100.0,
        average_annual_investment_yield: cli.avg_annual_yield / 100.0,
    })
}

fn input_from_payload(payload: SimulatePayload) -> Result<SimulationInput, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.home_price {
        cli.home_price = v;
    }
    if let Some(v) = payload.down_payment {
        cli.down_payment = v;
    }
    if let Some(v) = payload.years {
        cli.years = v;
    }
    if let Some(v) = payload.property_tax {
        cli.property_tax = v;
    }
    if let Some(v) = payload.max_return {
        cli.max_return = v;
    }
    if let Some(v) = payload.rental_base {
        cli.rental_base = v;
    }
    if let Some(v) = payload.rental_raise {
        cli.rental_raise = v;
    }
    if let Some(v) = payload.mortgage_rate {
        cli.mortgage_rate = v;
    }
    if let Some(v) = payload.avg_annual_yield {
        cli.avg_annual_yield = v;
    }

    build_input(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        home_price: 300_000.0,
        down_payment: 60_000.0,
        years: 30,
        property_tax: 1.0,
        max_return: 5,
        rental_base: 1_500.0,
        rental_raise: 3.0,
        mortgage_rate: 5.0,
        avg_annual_yield: 7.0,
    }
}

/// Rent paid through each year end. Derived outside the engine because it
/// is a per-run chart input, not a per-scenario series.
fn cumulative_rentals(input: &SimulationInput) -> Vec<f64> {
    let mut totals = Vec::with_capacity(input.years as usize);
    let mut paid = 0.0;
    for year in 0..input.years {
        paid += input.rental_base_monthly
            * (1.0 + input.rental_raise_annual).powi(year as i32)
            * 12.0;
        totals.push(paid);
    }
    totals
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "rent-vs-buy HTTP API listening");
    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let input = match input_from_payload(payload) {
        Ok(input) => input,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let scenarios = match simulate(&input) {
        Ok(scenarios) => scenarios,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    tracing::debug!(
        years = input.years,
        max_return = input.max_return,
        "simulated scenarios"
    );

    let response = SimulateResponse {
        years: input.years,
        max_return: input.max_return,
        cumulative_rentals: cumulative_rentals(&input),
        scenarios,
    };
    json_response(StatusCode::OK, response)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn input_from_json(json: &str) -> Result<SimulationInput, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    input_from_payload(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    #[test]
    fn build_input_converts_percent_rates_to_fractions() {
        let input = build_input(sample_cli()).expect("valid defaults");
        assert_approx(input.house_tax_rate, 0.01);
        assert_approx(input.rental_raise_annual, 0.03);
        assert_approx(input.mortgage_interest_rate, 0.05);
        assert_approx(input.average_annual_investment_yield, 0.07);
    }

    #[test]
    fn build_input_rejects_down_payment_above_home_price() {
        let mut cli = sample_cli();
        cli.home_price = 200_000.0;
        cli.down_payment = 250_000.0;

        let err = build_input(cli).expect_err("must reject excessive down payment");
        assert!(err.contains("--down-payment"));
    }

    #[test]
    fn build_input_rejects_zero_years() {
        let mut cli = sample_cli();
        cli.years = 0;
        let err = build_input(cli).expect_err("must reject zero years");
        assert!(err.contains("--years"));
    }

    #[test]
    fn build_input_rejects_out_of_range_rates() {
        let mut cli = sample_cli();
        cli.mortgage_rate = -1.0;
        let err = build_input(cli).expect_err("must reject negative rate");
        assert!(err.contains("--mortgage-rate"));
    }

    #[test]
    fn input_from_json_parses_web_keys() {
        let json = r#"{
          "homePrice": 450000,
          "downPayment": 90000,
          "years": 25,
          "propertyTax": 1.2,
          "maxReturn": 9,
          "rentalBase": 1800,
          "rentalRaise": 2.5,
          "mortgageRate": 4.5,
          "avgAnnualYield": 6.5
        }"#;
        let input = input_from_json(json).expect("json should parse");

        assert_approx(input.home_price, 450_000.0);
        assert_approx(input.down_payment, 90_000.0);
        assert_eq!(input.years, 25);
        assert_approx(input.house_tax_rate, 0.012);
        assert_eq!(input.max_return, 9);
        assert_approx(input.rental_base_monthly, 1_800.0);
        assert_approx(input.rental_raise_annual, 0.025);
        assert_approx(input.mortgage_interest_rate, 0.045);
        assert_approx(input.average_annual_investment_yield, 0.065);
    }

    #[test]
    fn input_from_json_falls_back_to_defaults_for_missing_fields() {
        let input = input_from_json(r#"{ "years": 10 }"#).expect("json should parse");
        assert_eq!(input.years, 10);
        assert_approx(input.home_price, 300_000.0);
        assert_eq!(input.max_return, 5);
    }

    #[test]
    fn input_from_json_surfaces_validation_errors() {
        let err = input_from_json(r#"{ "years": 0 }"#).expect_err("must reject zero years");
        assert!(err.contains("--years"));
    }

    #[test]
    fn cumulative_rentals_accumulate_yearly_with_raise() {
        let mut input = build_input(sample_cli()).expect("valid defaults");
        input.years = 2;
        input.rental_base_monthly = 1_000.0;
        input.rental_raise_annual = 0.10;

        let rentals = cumulative_rentals(&input);
        assert_eq!(rentals.len(), 2);
        assert_approx(rentals[0], 12_000.0);
        assert_approx(rentals[1], 12_000.0 + 13_200.0);
    }

    #[test]
    fn cumulative_rentals_are_flat_per_year_without_raise() {
        let mut input = build_input(sample_cli()).expect("valid defaults");
        input.years = 3;
        input.rental_base_monthly = 1_000.0;
        input.rental_raise_annual = 0.0;

        let rentals = cumulative_rentals(&input);
        assert_eq!(rentals, vec![12_000.0, 24_000.0, 36_000.0]);
    }

    #[test]
    fn simulate_response_serialization_uses_chart_field_names() {
        let mut cli = sample_cli();
        cli.years = 3;
        cli.max_return = 2;

        let input = build_input(cli).expect("valid inputs");
        let scenarios = simulate(&input).expect("valid input");
        let response = SimulateResponse {
            years: input.years,
            max_return: input.max_return,
            cumulative_rentals: cumulative_rentals(&input),
            scenarios,
        };

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"maxReturn\""));
        assert!(json.contains("\"scenarios\""));
        assert!(json.contains("\"diffs\""));
        assert!(json.contains("\"totalCosts\""));
        assert!(json.contains("\"investmentReturns\""));
        assert!(json.contains("\"cumulativeRentals\""));
    }
}
