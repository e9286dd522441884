use napi::Result as NapiResult;
use napi_derive::napi;

use equity_valuation_core::assumptions::ModelAssumptions;
use equity_valuation_core::dividends::{calculate_dividend_selection, DividendSelectionInput};
use equity_valuation_core::qualitative::{calculate_qualitative_score, QualitativeAnswers};
use equity_valuation_core::snapshot::{normalize, FundamentalSnapshot, RawFundamentals};
use equity_valuation_core::valuation::{classify, run_valuation, upside};
use equity_valuation_core::verdict::{build_verdict as verdict_for, compare, EvaluationRequest};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse<T: serde::de::DeserializeOwned>(input_json: &str) -> NapiResult<T> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

fn render<T: serde::Serialize>(output: &T) -> NapiResult<String> {
    serde_json::to_string(output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Fundamentals
// ---------------------------------------------------------------------------

/// Raw provider document in, normalized snapshot out.
#[napi]
pub fn normalize_fundamentals(input_json: String) -> NapiResult<String> {
    let raw: RawFundamentals = parse(&input_json)?;
    render(&normalize(&raw))
}

#[derive(Deserialize)]
struct DividendRequest {
    #[serde(flatten)]
    input: DividendSelectionInput,
    #[serde(default)]
    assumptions: ModelAssumptions,
}

#[napi]
pub fn select_dividend(input_json: String) -> NapiResult<String> {
    let request: DividendRequest = parse(&input_json)?;
    request.assumptions.validate().map_err(to_napi_error)?;
    render(&calculate_dividend_selection(
        &request.input,
        &request.assumptions.policy,
    ))
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ValuationRequest {
    snapshot: FundamentalSnapshot,
    #[serde(default)]
    assumptions: ModelAssumptions,
}

#[napi]
pub fn evaluate_valuation(input_json: String) -> NapiResult<String> {
    let request: ValuationRequest = parse(&input_json)?;
    let output = run_valuation(&request.snapshot, &request.assumptions).map_err(to_napi_error)?;
    render(&output)
}

#[derive(Deserialize)]
struct ClassifyRequest {
    price: Decimal,
    fair_value: Decimal,
}

#[napi]
pub fn classify_upside(input_json: String) -> NapiResult<String> {
    let request: ClassifyRequest = parse(&input_json)?;
    let gap = upside(request.fair_value, request.price)
        .ok_or_else(|| to_napi_error("price must be positive"))?;
    render(&serde_json::json!({
        "upside": gap,
        "band": classify(gap),
    }))
}

// ---------------------------------------------------------------------------
// Qualitative + verdict
// ---------------------------------------------------------------------------

#[napi]
pub fn score_qualitative(input_json: String) -> NapiResult<String> {
    let answers: QualitativeAnswers = parse(&input_json)?;
    render(&calculate_qualitative_score(&answers))
}

/// One request object, or an array of them for a side-by-side comparison.
#[napi]
pub fn build_verdict(input_json: String) -> NapiResult<String> {
    let value: serde_json::Value = parse(&input_json)?;
    let base = ModelAssumptions::default();
    if value.is_array() {
        let requests: Vec<EvaluationRequest> = serde_json::from_value(value).map_err(to_napi_error)?;
        render(&compare(&requests, &base).map_err(to_napi_error)?)
    } else {
        let request: EvaluationRequest = serde_json::from_value(value).map_err(to_napi_error)?;
        render(&verdict_for(&request, &base).map_err(to_napi_error)?)
    }
}
