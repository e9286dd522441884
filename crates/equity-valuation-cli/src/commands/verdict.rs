use clap::Args;
use serde_json::Value;

use equity_valuation_core::snapshot::RawFundamentals;
use equity_valuation_core::valuation::run_valuation;
use equity_valuation_core::verdict::{build_verdict, compare, EvaluationRequest};
use equity_valuation_core::ValuationError;

use crate::input;
use crate::input::assumptions::AssumptionArgs;

/// Arguments for a single-ticker valuation or verdict
#[derive(Args)]
pub struct ValueArgs {
    /// Request JSON ({"fundamentals"|"snapshot", "answers", "assumptions"})
    /// or a bare provider document. Reads stdin when omitted.
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub rates: AssumptionArgs,
}

/// Arguments for a multi-ticker comparison
#[derive(Args)]
pub struct CompareArgs {
    /// JSON array of requests. Reads stdin when omitted.
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub rates: AssumptionArgs,
}

pub fn run_value(args: ValueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = args.rates.resolve()?;
    let request = read_request(args.input.as_deref())?;
    let assumptions = request.assumptions.clone().unwrap_or(assumptions);

    let mut snapshot = match (request.snapshot, request.fundamentals) {
        (Some(snapshot), _) => snapshot,
        (None, Some(raw)) => equity_valuation_core::snapshot::normalize(&raw),
        (None, None) => {
            return Err(ValuationError::InsufficientData(
                "Request carries neither fundamentals nor a snapshot".into(),
            )
            .into())
        }
    };
    if snapshot.ticker.is_none() {
        snapshot.ticker = request.ticker;
    }

    let result = run_valuation(&snapshot, &assumptions)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_verdict(args: ValueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = args.rates.resolve()?;
    let request = read_request(args.input.as_deref())?;
    let result = build_verdict(&request, &assumptions)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = args.rates.resolve()?;
    let data = input::stdin::file_or_stdin(args.input.as_deref())?
        .ok_or("Provide a JSON array of requests with --input or on stdin")?;

    let requests = match data {
        Value::Array(items) => items
            .into_iter()
            .map(request_from_json)
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err("compare expects a JSON array of requests".into()),
    };

    let result = compare(&requests, &assumptions)?;
    Ok(serde_json::to_value(result)?)
}

fn read_request(path: Option<&str>) -> Result<EvaluationRequest, Box<dyn std::error::Error>> {
    let data = input::stdin::file_or_stdin(path)?
        .ok_or("Provide the request with --input or on stdin")?;
    request_from_json(data)
}

/// A request envelope, or a bare provider document wrapped into one.
fn request_from_json(data: Value) -> Result<EvaluationRequest, Box<dyn std::error::Error>> {
    let is_envelope = data
        .as_object()
        .map(|m| m.contains_key("fundamentals") || m.contains_key("snapshot"))
        .unwrap_or(false);
    if is_envelope {
        return Ok(serde_json::from_value(data)?);
    }

    let raw: RawFundamentals = serde_json::from_value(data)
        .map_err(|e| format!("Request must be a JSON object: {e}"))?;
    Ok(EvaluationRequest {
        fundamentals: Some(raw),
        ..Default::default()
    })
}
