use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Instant;

use equity_valuation_core::assumptions::ValuationPolicy;
use equity_valuation_core::dividends::{calculate_dividend_selection, DividendSelectionInput};
use equity_valuation_core::snapshot::{normalize, FundamentalSnapshot, RawFundamentals};
use equity_valuation_core::with_metadata;

use crate::input;

/// Arguments for normalizing a raw provider document
#[derive(Args)]
pub struct NormalizeArgs {
    /// Path to the raw provider JSON (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for dividend source selection
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct DividendArgs {
    /// JSON file holding either a snapshot or the selection fields
    #[arg(long)]
    pub input: Option<String>,

    /// Current share price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Forward annual dividend rate
    #[arg(long)]
    pub forward: Option<Decimal>,

    /// Trailing annual dividend rate
    #[arg(long)]
    pub trailing: Option<Decimal>,

    /// Sum of dividends paid over the last twelve months
    #[arg(long)]
    pub ttm: Option<Decimal>,

    /// Payout ratio as a fraction
    #[arg(long)]
    pub payout: Option<Decimal>,

    /// EPS used for the payout estimate
    #[arg(long)]
    pub eps: Option<Decimal>,

    /// Largest plausible implied yield
    #[arg(long)]
    pub yield_ceiling: Option<Decimal>,
}

pub fn run_normalize(args: NormalizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let data = input::stdin::file_or_stdin(args.input.as_deref())?
        .ok_or("Provide the provider document with --input or on stdin")?;
    let raw: RawFundamentals = serde_json::from_value(data)
        .map_err(|e| format!("Provider document must be a JSON object: {e}"))?;

    let snapshot = normalize(&raw);
    let warnings = missing_core_fields(&snapshot);
    let elapsed = start.elapsed().as_micros() as u64;
    let out = with_metadata(
        "Provider field normalization",
        &serde_json::json!({ "fields": raw.0.len() }),
        warnings,
        elapsed,
        snapshot,
    );
    Ok(serde_json::to_value(out)?)
}

pub fn run_dividend(args: DividendArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let selection_input = match input::stdin::file_or_stdin(args.input.as_deref())? {
        Some(data) => selection_input_from_json(data)?,
        None => DividendSelectionInput {
            price: Some(args.price.ok_or("--price is required (or provide --input)")?),
            forward: args.forward,
            trailing: args.trailing,
            ttm: args.ttm,
            payout_ratio: args.payout,
            eps_for_div: args.eps,
        },
    };

    let mut policy = ValuationPolicy::default();
    if let Some(ceiling) = args.yield_ceiling {
        policy.dividend_yield_ceiling = ceiling;
    }
    policy.validate()?;

    let result = calculate_dividend_selection(&selection_input, &policy);
    Ok(serde_json::to_value(result)?)
}

/// Either the selection fields directly or a normalized snapshot.
fn selection_input_from_json(data: Value) -> Result<DividendSelectionInput, Box<dyn std::error::Error>> {
    let is_snapshot = data
        .as_object()
        .map(|m| m.contains_key("dividend_candidates") || m.contains_key("trailing_eps"))
        .unwrap_or(false);
    if is_snapshot {
        let snapshot: FundamentalSnapshot = serde_json::from_value(data)?;
        Ok(DividendSelectionInput::from_snapshot(&snapshot))
    } else {
        Ok(serde_json::from_value(data)?)
    }
}

fn missing_core_fields(snapshot: &FundamentalSnapshot) -> Vec<String> {
    let mut warnings = Vec::new();
    if snapshot.price.is_none() {
        warnings.push("No usable price; upside cannot be computed".to_string());
    }
    if snapshot.trailing_eps.is_none() {
        warnings.push("No trailing EPS; DCF-lite and relative P/E will be skipped".to_string());
    }
    if snapshot.dividend_candidates.is_empty() && snapshot.payout_ratio.is_none() {
        warnings.push("No dividend figures; the DDM will be skipped".to_string());
    }
    warnings
}
