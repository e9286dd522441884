//! Full valuation of one snapshot: every model, the combined figure and the
//! verdict band.
//!
//! Models that lack inputs decline instead of failing; their reasons end up
//! in the envelope warnings. Only invalid assumptions are an error, and only
//! through [`run_valuation`].

use std::collections::BTreeMap;
use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assumptions::ModelAssumptions;
use crate::dividends::{select_dividend_detailed, DividendSelection, DividendSelectionInput};
use crate::snapshot::FundamentalSnapshot;
use crate::types::{with_metadata, ComputationOutput, Currency, Money, Multiple, Rate, ValuationModel};
use crate::EngineResult;

use super::capm::required_return;
use super::classify::{classify, upside, VerdictBand};
use super::combine::{combine_with, model_band, ModelBand};
use super::dcf_lite::{self, DcfLiteInput, DcfLitePolicy};
use super::gordon::{self, DdmInput, DdmPolicy};
use super::growth::{explicit_growth, GrowthEstimate};
use super::multiples::per_share_multiples;
use super::relative_pe;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The rates and inputs the models actually ran with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    pub beta_used: Decimal,
    pub beta_defaulted: bool,
    /// Required return r
    pub discount_rate: Rate,
    pub discount_rate_overridden: bool,
    /// Explicit-period growth g1
    pub growth: GrowthEstimate,
    /// Terminal growth g2 as configured
    pub terminal_growth: Rate,
    /// P/E applied by the relative model
    pub sector_pe: Multiple,
}

/// Everything the engine knows about one ticker's fair value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    /// One entry per model; `None` means the model declined
    pub fair_values: BTreeMap<ValuationModel, Option<Money>>,
    pub combined_fair_value: Option<Money>,
    /// Normalized weights behind the combined value
    pub weights: BTreeMap<ValuationModel, Decimal>,
    /// Dividend used by the DDM
    pub dividend: Option<DividendSelection>,
    pub model_band: Option<ModelBand>,
    /// combined / price - 1
    pub upside: Option<Rate>,
    pub valuation_band: Option<VerdictBand>,
    pub diagnostics: Diagnostics,
}

impl ValuationResult {
    pub fn fair_value(&self, model: ValuationModel) -> Option<Money> {
        self.fair_values.get(&model).copied().flatten()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value a snapshot under the given assumptions. Never fails; assumptions
/// are taken as already validated.
pub fn evaluate(
    snapshot: &FundamentalSnapshot,
    assumptions: &ModelAssumptions,
) -> ComputationOutput<ValuationResult> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let policy = &assumptions.policy;
    let ticker = snapshot.ticker.as_deref().unwrap_or("?");

    // --- Rates ---
    let rr = required_return(snapshot.beta, assumptions);
    if rr.beta_defaulted {
        warnings.push(format!("Beta not reported; assumed {}", rr.beta_used));
    }
    let growth = explicit_growth(&snapshot.eps_history, assumptions.growth_cap, policy);
    if growth.growth != growth.unclamped {
        warnings.push(format!(
            "EPS growth {} clamped to {}",
            growth.unclamped.round_dp(4),
            growth.growth
        ));
    }

    let mut fair_values: BTreeMap<ValuationModel, Option<Money>> = BTreeMap::new();

    // --- DCF-lite ---
    let dcf_input = DcfLiteInput {
        eps: snapshot.trailing_eps,
        payout_ratio: snapshot.payout_ratio,
        discount_rate: rr.rate,
        growth_rate: growth.growth,
        terminal_growth: assumptions.terminal_growth,
        policy: DcfLitePolicy::from(policy),
    };
    let dcf = match dcf_lite::evaluate(&dcf_input) {
        Ok(out) => {
            if out.payout_defaulted {
                warnings.push(format!(
                    "Payout ratio missing or outside [0, 1]; DCF-lite assumed {}",
                    out.payout_used
                ));
            }
            if out.terminal_growth_used != assumptions.terminal_growth {
                warnings.push(format!(
                    "Terminal growth reduced to {} to stay below r = {}",
                    out.terminal_growth_used, rr.rate
                ));
            }
            if out.fair_value < Decimal::ZERO {
                warnings.push("DCF-lite value is negative: EPS is negative".into());
            }
            Some(out.fair_value)
        }
        Err(reason) => {
            tracing::debug!(ticker, %reason, "DCF-lite declined");
            warnings.push(format!("DCF-lite skipped: {reason}"));
            None
        }
    };
    fair_values.insert(ValuationModel::Dcf, dcf);

    // --- Relative P/E ---
    let sector = snapshot.sector.as_deref();
    let (sector_pe, _) = relative_pe::sector_multiple(sector, assumptions);
    let pe = match relative_pe::evaluate(snapshot.trailing_eps, sector, assumptions) {
        Ok(out) => {
            if out.fair_value < Decimal::ZERO {
                warnings.push("Relative P/E value is negative: EPS is negative".into());
            }
            Some(out.fair_value)
        }
        Err(reason) => {
            tracing::debug!(ticker, %reason, "relative P/E declined");
            warnings.push(format!("Relative P/E skipped: {reason}"));
            None
        }
    };
    fair_values.insert(ValuationModel::RelativePe, pe);

    // --- Dividend selection + DDM ---
    let report = select_dividend_detailed(
        &DividendSelectionInput::from_snapshot(snapshot),
        policy.dividend_yield_ceiling,
    );
    for rejected in &report.rejected {
        warnings.push(format!(
            "{} dividend rejected: {}",
            rejected.source, rejected.reason
        ));
    }
    let ddm_input = DdmInput {
        dps: report.selected.as_ref().map(|s| s.dps),
        price: snapshot.price,
        required_return: rr.rate,
        growth_rate: growth.growth,
        policy: DdmPolicy::from(policy),
    };
    let ddm = match gordon::evaluate(&ddm_input) {
        Ok(out) => Some(out.fair_value),
        Err(reason) => {
            tracing::debug!(ticker, %reason, "DDM declined");
            warnings.push(format!("DDM skipped: {reason}"));
            None
        }
    };
    fair_values.insert(ValuationModel::Ddm, ddm);

    // --- Per-share multiples ---
    for (model, value) in per_share_multiples(snapshot, &assumptions.target_multiples) {
        if value.is_none() {
            tracing::debug!(ticker, model = %model, "per-share metric not available");
        }
        fair_values.insert(model, value);
    }

    // --- Combine + classify ---
    let combined = combine_with(&fair_values, ddm.is_some(), &policy.weights());
    if combined.is_none() {
        warnings.push("No weighted model produced a value; combined fair value unavailable".into());
    }
    let combined_fair_value = combined.as_ref().map(|c| c.fair_value);
    let weights = combined.map(|c| c.weights).unwrap_or_default();

    let upside = match (combined_fair_value, snapshot.price) {
        (Some(fv), Some(price)) => upside(fv, price),
        _ => None,
    };
    if combined_fair_value.is_some() && upside.is_none() {
        warnings.push("Price not available or unusable; upside not computed".into());
    }
    let valuation_band = upside.map(classify);

    tracing::debug!(
        ticker,
        combined = ?combined_fair_value,
        band = ?valuation_band,
        "valuation complete"
    );

    let result = ValuationResult {
        ticker: snapshot.ticker.clone(),
        currency: snapshot.currency.clone(),
        price: snapshot.price,
        model_band: model_band(&fair_values),
        fair_values,
        combined_fair_value,
        weights,
        dividend: report.selected,
        upside,
        valuation_band,
        diagnostics: Diagnostics {
            sector: snapshot.sector.clone(),
            beta_used: rr.beta_used,
            beta_defaulted: rr.beta_defaulted,
            discount_rate: rr.rate,
            discount_rate_overridden: rr.overridden,
            growth,
            terminal_growth: assumptions.terminal_growth,
            sector_pe,
        },
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Blended fair value: DCF-lite, sector P/E, Gordon DDM, per-share multiples",
        assumptions,
        warnings,
        elapsed,
        result,
    )
}

/// Validate the assumptions, then value the snapshot.
pub fn run_valuation(
    snapshot: &FundamentalSnapshot,
    assumptions: &ModelAssumptions,
) -> EngineResult<ComputationOutput<ValuationResult>> {
    assumptions.validate()?;
    Ok(evaluate(snapshot, assumptions))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{DividendCandidate, DividendSource, EpsObservation};
    use rust_decimal_macros::dec;

    fn utility() -> FundamentalSnapshot {
        FundamentalSnapshot {
            ticker: Some("ENEL.MI".into()),
            price: Some(dec!(6.5)),
            currency: Some(Currency::EUR),
            trailing_eps: Some(dec!(0.6)),
            payout_ratio: Some(dec!(0.7)),
            beta: Some(dec!(0.9)),
            sector: Some("Utilities".into()),
            dividend_candidates: vec![DividendCandidate {
                source: DividendSource::Forward,
                dps: dec!(0.43),
            }],
            eps_history: (0..6)
                .map(|i| EpsObservation {
                    year: 2019 + i,
                    eps: dec!(0.5) + Decimal::from(i) * dec!(0.02),
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_all_models_reported() {
        let out = evaluate(&utility(), &ModelAssumptions::default());
        assert_eq!(out.result.fair_values.len(), ValuationModel::ALL.len());
        assert!(out.result.fair_value(ValuationModel::Dcf).is_some());
        assert!(out.result.fair_value(ValuationModel::RelativePe).is_some());
        assert!(out.result.fair_value(ValuationModel::Ddm).is_some());
        assert!(out.result.fair_value(ValuationModel::PriceToBook).is_none());
    }

    #[test]
    fn test_relative_pe_uses_sector_table() {
        let out = evaluate(&utility(), &ModelAssumptions::default());
        // 0.6 * 14
        assert_eq!(out.result.fair_value(ValuationModel::RelativePe), Some(dec!(8.4)));
        assert_eq!(out.result.diagnostics.sector_pe, dec!(14.0));
    }

    #[test]
    fn test_ddm_weighted_when_present() {
        let out = evaluate(&utility(), &ModelAssumptions::default());
        let w = &out.result.weights;
        assert_eq!(w[&ValuationModel::Ddm], dec!(0.1));
        assert_eq!(out.result.dividend.as_ref().unwrap().source, DividendSource::Forward);
        assert!(out.result.upside.is_some());
        assert!(out.result.valuation_band.is_some());
    }

    #[test]
    fn test_no_dividend_uses_dcf_and_pe_only() {
        let mut snap = utility();
        snap.dividend_candidates.clear();
        snap.payout_ratio = None;
        let out = evaluate(&snap, &ModelAssumptions::default());
        assert_eq!(out.result.fair_value(ValuationModel::Ddm), None);
        assert!(out.result.dividend.is_none());

        let dcf = out.result.fair_value(ValuationModel::Dcf).unwrap();
        let pe = out.result.fair_value(ValuationModel::RelativePe).unwrap();
        let expected = dec!(0.6) * dcf + dec!(0.4) * pe;
        let combined = out.result.combined_fair_value.unwrap();
        assert!((combined - expected).abs() < dec!(0.0000001));
        assert_eq!(out.result.weights.len(), 2);
    }

    #[test]
    fn test_empty_snapshot_yields_absence_not_error() {
        let out = evaluate(&FundamentalSnapshot::default(), &ModelAssumptions::default());
        assert!(out.result.combined_fair_value.is_none());
        assert!(out.result.fair_values.values().all(Option::is_none));
        assert!(out.result.upside.is_none());
        assert!(out.result.model_band.is_none());
        assert!(out.result.diagnostics.beta_defaulted);
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_tiny_price_leaves_upside_absent() {
        let snap = FundamentalSnapshot {
            price: Some(dec!(0.0000000000000000000000000001)),
            ..utility()
        };
        let out = evaluate(&snap, &ModelAssumptions::default());
        assert!(out.result.combined_fair_value.is_some());
        assert!(out.result.upside.is_none());
        assert!(out.result.valuation_band.is_none());
        assert!(out.result.fair_value(ValuationModel::Ddm).is_none());
        assert!(out.warnings.iter().any(|w| w.contains("FORWARD dividend rejected")));
    }

    #[test]
    fn test_huge_eps_declines_models_instead_of_failing() {
        let snap = FundamentalSnapshot {
            trailing_eps: Some(dec!(70000000000000000000000000000)),
            beta: Some(Decimal::MAX),
            ..utility()
        };
        let out = evaluate(&snap, &ModelAssumptions::default());
        assert!(out.result.fair_value(ValuationModel::RelativePe).is_none());
        assert!(out.warnings.iter().any(|w| w.starts_with("Relative P/E skipped")));
    }

    #[test]
    fn test_invalid_assumptions_rejected_at_boundary() {
        let a = ModelAssumptions {
            market_risk_premium: dec!(5.5),
            ..ModelAssumptions::default()
        };
        assert!(run_valuation(&utility(), &a).is_err());
        assert!(run_valuation(&utility(), &ModelAssumptions::default()).is_ok());
    }

    #[test]
    fn test_diagnostics_report_rates() {
        let out = evaluate(&utility(), &ModelAssumptions::default());
        let d = &out.result.diagnostics;
        // 0.03 + 0.9 * 0.055
        assert_eq!(d.discount_rate, dec!(0.0795));
        assert_eq!(d.terminal_growth, dec!(0.02));
        assert_eq!(d.sector.as_deref(), Some("Utilities"));
    }
}
