//! Dividend source selection.
//!
//! Several provider fields claim to be "the" annual dividend per share and
//! they regularly disagree. Candidates are tried in a fixed priority order
//! (forward, TTM sum, trailing rate, payout estimate) and the first one whose
//! implied yield lies in `(0, ceiling]` wins. The ceiling screens out data
//! errors such as unadjusted special dividends or stale prices; it is a
//! heuristic and will occasionally reject a genuine high-yielder.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::ValuationPolicy;
use crate::snapshot::{DividendSource, FundamentalSnapshot};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Competing dividend-per-share figures for one ticker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DividendSelectionInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailing: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttm: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout_ratio: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps_for_div: Option<Decimal>,
}

impl DividendSelectionInput {
    pub fn from_snapshot(snapshot: &FundamentalSnapshot) -> Self {
        Self {
            price: snapshot.price,
            forward: snapshot.dividend(DividendSource::Forward),
            trailing: snapshot.dividend(DividendSource::Trailing),
            ttm: snapshot.dividend(DividendSource::Ttm),
            payout_ratio: snapshot.payout_ratio,
            eps_for_div: snapshot.eps_for_dividend(),
        }
    }
}

/// The dividend figure the engine decided to trust.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendSelection {
    pub dps: Money,
    pub source: DividendSource,
    /// dps / price
    pub implied_yield: Rate,
}

/// A candidate that was present but failed a gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedCandidate {
    pub source: DividendSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dps: Option<Money>,
    pub reason: String,
}

/// Full trace of a selection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendSelectionReport {
    pub selected: Option<DividendSelection>,
    pub rejected: Vec<RejectedCandidate>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Pick the first trustworthy dividend per share, or `None` when no
/// candidate passes. `None` means the DDM must be skipped.
pub fn select_dividend(input: &DividendSelectionInput, yield_ceiling: Rate) -> Option<DividendSelection> {
    select_dividend_detailed(input, yield_ceiling).selected
}

/// Selection for a normalized snapshot under the given policy.
pub fn select_for_snapshot(
    snapshot: &FundamentalSnapshot,
    policy: &ValuationPolicy,
) -> Option<DividendSelection> {
    select_dividend(
        &DividendSelectionInput::from_snapshot(snapshot),
        policy.dividend_yield_ceiling,
    )
}

/// Selection plus the reasons each earlier candidate was passed over.
pub fn select_dividend_detailed(
    input: &DividendSelectionInput,
    yield_ceiling: Rate,
) -> DividendSelectionReport {
    let mut rejected = Vec::new();

    let reported = [
        (DividendSource::Forward, input.forward),
        (DividendSource::Ttm, input.ttm),
        (DividendSource::Trailing, input.trailing),
    ];

    for (source, dps) in reported {
        let Some(dps) = dps else { continue };
        match gate(dps, input.price, yield_ceiling) {
            Ok(implied_yield) => {
                return DividendSelectionReport {
                    selected: Some(DividendSelection {
                        dps,
                        source,
                        implied_yield,
                    }),
                    rejected,
                }
            }
            Err(reason) => rejected.push(RejectedCandidate {
                source,
                dps: Some(dps),
                reason,
            }),
        }
    }

    match payout_estimate(input) {
        Ok(Some(dps)) => match gate(dps, input.price, yield_ceiling) {
            Ok(implied_yield) => {
                return DividendSelectionReport {
                    selected: Some(DividendSelection {
                        dps,
                        source: DividendSource::PayoutEstimate,
                        implied_yield,
                    }),
                    rejected,
                }
            }
            Err(reason) => rejected.push(RejectedCandidate {
                source: DividendSource::PayoutEstimate,
                dps: Some(dps),
                reason,
            }),
        },
        Ok(None) => {}
        Err(reason) => rejected.push(RejectedCandidate {
            source: DividendSource::PayoutEstimate,
            dps: None,
            reason,
        }),
    }

    tracing::debug!(rejected = rejected.len(), "no usable dividend per share");
    DividendSelectionReport {
        selected: None,
        rejected,
    }
}

/// Enveloped selection for adapters (CLI, bindings).
pub fn calculate_dividend_selection(
    input: &DividendSelectionInput,
    policy: &ValuationPolicy,
) -> ComputationOutput<DividendSelectionReport> {
    let start = Instant::now();
    let report = select_dividend_detailed(input, policy.dividend_yield_ceiling);

    let mut warnings: Vec<String> = report
        .rejected
        .iter()
        .map(|r| format!("{} dividend rejected: {}", r.source, r.reason))
        .collect();
    if report.selected.is_none() {
        warnings.push("No usable dividend per share; the DDM will be skipped".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Priority dividend selection with implied-yield gate",
        input,
        warnings,
        elapsed,
        report,
    )
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn gate(dps: Money, price: Option<Money>, ceiling: Rate) -> Result<Rate, String> {
    let price = match price {
        Some(p) if p > Decimal::ZERO => p,
        _ => return Err("no positive price to measure the implied yield".into()),
    };
    let implied = dps
        .checked_div(price)
        .ok_or_else(|| format!("implied yield of {dps} over price {price} overflows"))?;
    if implied <= Decimal::ZERO || implied > ceiling {
        return Err(format!("implied yield {implied} outside (0, {ceiling}]"));
    }
    Ok(implied)
}

/// `eps * payout` when both inputs are usable. `Ok(None)` means the inputs
/// were simply not reported.
fn payout_estimate(input: &DividendSelectionInput) -> Result<Option<Money>, String> {
    let (Some(payout), Some(eps)) = (input.payout_ratio, input.eps_for_div) else {
        return Ok(None);
    };
    if payout < Decimal::ZERO || payout > Decimal::ONE {
        return Err(format!("payout ratio {payout} outside [0, 1]"));
    }
    if eps <= Decimal::ZERO {
        return Err(format!("EPS {eps} is not positive"));
    }
    Ok(Some(eps * payout))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
