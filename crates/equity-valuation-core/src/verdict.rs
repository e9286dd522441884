//! Per-ticker verdict: valuation result, qualitative score and the one-line
//! summary shown to the user.

use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assumptions::ModelAssumptions;
use crate::error::ValuationError;
use crate::qualitative::{score, QualitativeAnswers, QualitativeScore};
use crate::snapshot::{normalize, FundamentalSnapshot, RawFundamentals};
use crate::types::{with_metadata, ComputationOutput};
use crate::valuation::{self, ValuationResult};
use crate::EngineResult;

const MODELS_CLAUSE: &str = "Models: DCF-lite, sector multiples, Gordon (dividend payers).";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One ticker to evaluate. Exactly one of `fundamentals` (raw provider
/// fields) or `snapshot` (already normalized) is expected; when both are
/// given the snapshot wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fundamentals: Option<RawFundamentals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<FundamentalSnapshot>,
    /// Unanswered questions count as "no"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<QualitativeAnswers>,
    /// Replaces the caller's assumptions for this ticker only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assumptions: Option<ModelAssumptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    pub valuation: ValuationResult,
    pub qualitative: QualitativeScore,
    pub sentence: String,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Normalize (if needed), value and score one ticker.
pub fn build_verdict(
    request: &EvaluationRequest,
    base_assumptions: &ModelAssumptions,
) -> EngineResult<ComputationOutput<Verdict>> {
    let start = Instant::now();
    let assumptions = request.assumptions.as_ref().unwrap_or(base_assumptions);
    assumptions.validate()?;

    let mut snapshot = resolve_snapshot(request)?;
    if snapshot.ticker.is_none() {
        snapshot.ticker = request.ticker.clone();
    }

    let valuation = valuation::evaluate(&snapshot, assumptions);
    let qualitative = score(&request.answers.unwrap_or_default());
    let sentence = verdict_sentence(&qualitative, &valuation.result);

    let verdict = Verdict {
        ticker: snapshot.ticker,
        valuation: valuation.result,
        qualitative,
        sentence,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fair-value verdict with qualitative checklist",
        assumptions,
        valuation.warnings,
        elapsed,
        verdict,
    ))
}

/// Verdicts for several tickers, in request order. Each ticker is evaluated
/// on its own; a bad request fails the batch and names its position.
pub fn compare(
    requests: &[EvaluationRequest],
    base_assumptions: &ModelAssumptions,
) -> EngineResult<ComputationOutput<Vec<Verdict>>> {
    let start = Instant::now();
    if requests.is_empty() {
        return Err(ValuationError::InsufficientData(
            "At least one ticker is required".into(),
        ));
    }

    let mut verdicts = Vec::with_capacity(requests.len());
    let mut warnings = Vec::new();
    for (i, request) in requests.iter().enumerate() {
        let out = build_verdict(request, base_assumptions).map_err(|e| match e {
            ValuationError::InvalidInput { field, reason } => ValuationError::InvalidInput {
                field: format!("requests[{i}].{field}"),
                reason,
            },
            ValuationError::InsufficientData(msg) => {
                ValuationError::InsufficientData(format!("requests[{i}]: {msg}"))
            }
            other => other,
        })?;
        let label = out.result.ticker.clone().unwrap_or_else(|| format!("#{i}"));
        warnings.extend(out.warnings.into_iter().map(|w| format!("{label}: {w}")));
        verdicts.push(out.result);
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Side-by-side fair-value verdicts",
        &serde_json::json!({ "tickers": requests.len() }),
        warnings,
        elapsed,
        verdicts,
    ))
}

/// `"Qualitative profile: good. Valuation: undervalued (+12.3%). Models: ..."`
pub fn verdict_sentence(qualitative: &QualitativeScore, valuation: &ValuationResult) -> String {
    let valuation_clause = match (valuation.valuation_band, valuation.upside) {
        (Some(band), Some(upside)) => match upside.checked_mul(Decimal::ONE_HUNDRED) {
            Some(pct) => {
                let pct = pct.round_dp(1);
                let sign = if pct >= Decimal::ZERO { "+" } else { "" };
                format!("Valuation: {band} ({sign}{pct:.1}%).")
            }
            None => format!("Valuation: {band}."),
        },
        _ => "Valuation: N/A (insufficient data).".to_string(),
    };
    format!(
        "Qualitative profile: {}. {valuation_clause} {MODELS_CLAUSE}",
        qualitative.label
    )
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn resolve_snapshot(request: &EvaluationRequest) -> EngineResult<FundamentalSnapshot> {
    match (&request.snapshot, &request.fundamentals) {
        (Some(snapshot), _) => Ok(snapshot.clone()),
        (None, Some(raw)) => Ok(normalize(raw)),
        (None, None) => Err(ValuationError::InsufficientData(
            "Request carries neither fundamentals nor a snapshot".into(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
