use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::ValuationPolicy;
use crate::math::{compound, discount_factor};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};

use super::perpetuity::{gordon_value, perpetuity_growth};
use super::{Declined, ModelOutcome};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Policy knobs DCF-lite reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DcfLitePolicy {
    pub default_payout: Rate,
    pub explicit_years: u32,
    pub growth_step: Rate,
}

impl Default for DcfLitePolicy {
    fn default() -> Self {
        Self::from(&ValuationPolicy::default())
    }
}

impl From<&ValuationPolicy> for DcfLitePolicy {
    fn from(p: &ValuationPolicy) -> Self {
        Self {
            default_payout: p.default_payout,
            explicit_years: p.explicit_years,
            growth_step: p.growth_step,
        }
    }
}

/// Inputs to DCF-lite, where free cash flow per share is proxied by retained
/// earnings: FCF0 = EPS * (1 - payout).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfLiteInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout_ratio: Option<Rate>,
    /// Discount rate r
    pub discount_rate: Rate,
    /// Explicit-period growth g1
    pub growth_rate: Rate,
    /// Terminal growth g2
    pub terminal_growth: Rate,
    #[serde(default)]
    pub policy: DcfLitePolicy,
}

/// One explicit forecast year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfLiteYear {
    pub year: u32,
    pub fcf: Money,
    pub discount_factor: Rate,
    pub pv_fcf: Money,
}

/// Detailed DCF-lite result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfLiteOutput {
    pub fair_value: Money,
    pub fcf0: Money,
    pub payout_used: Rate,
    /// True when the reported payout was absent or outside [0, 1]
    pub payout_defaulted: bool,
    pub projections: Vec<DcfLiteYear>,
    pub pv_explicit: Money,
    pub terminal_value: Money,
    pub pv_terminal: Money,
    /// Terminal growth after the r > g adjustment
    pub terminal_growth_used: Rate,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// DCF-lite fair value per share, or `None` when it cannot be computed.
pub fn dcf_lite_fair_value(input: &DcfLiteInput) -> Option<Money> {
    evaluate(input).ok().map(|out| out.fair_value)
}

/// Run DCF-lite, reporting why it declined when it does.
pub fn evaluate(input: &DcfLiteInput) -> ModelOutcome<DcfLiteOutput> {
    let eps = input
        .eps
        .ok_or_else(|| Declined::new("EPS is not available"))?;

    let r = input.discount_rate;
    if r <= Decimal::ZERO {
        return Err(Declined::new(format!("discount rate {r} is not positive")));
    }

    let (payout_used, payout_defaulted) = match input.payout_ratio {
        Some(p) if p >= Decimal::ZERO && p <= Decimal::ONE => (p, false),
        _ => (input.policy.default_payout, true),
    };
    let fcf0 = eps * (Decimal::ONE - payout_used);
    let years = input.policy.explicit_years;
    let g1 = input.growth_rate;

    let mut projections = Vec::with_capacity(years as usize);
    for year in 1..=years {
        let fcf = compound(fcf0, g1, year).ok_or_else(overflow)?;
        let df = discount_factor(r, year).ok_or_else(overflow)?;
        projections.push(DcfLiteYear {
            year,
            fcf,
            discount_factor: df,
            pv_fcf: fcf * df,
        });
    }
    let pv_explicit = projections
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.pv_fcf))
        .ok_or_else(overflow)?;

    let fcf_terminal = compound(fcf0, g1, years).ok_or_else(overflow)?;
    let g2 = perpetuity_growth(r, input.terminal_growth, input.policy.growth_step).ok_or_else(|| {
        Declined::new(format!(
            "discount rate {r} does not exceed terminal growth {} even after adjustment",
            input.terminal_growth
        ))
    })?;
    let terminal_value = gordon_value(fcf_terminal, r, g2).ok_or_else(overflow)?;
    let pv_terminal = terminal_value * discount_factor(r, years).ok_or_else(overflow)?;
    let fair_value = pv_explicit.checked_add(pv_terminal).ok_or_else(overflow)?;

    Ok(DcfLiteOutput {
        fair_value,
        fcf0,
        payout_used,
        payout_defaulted,
        projections,
        pv_explicit,
        terminal_value,
        pv_terminal,
        terminal_growth_used: g2,
    })
}

/// Enveloped DCF-lite for adapters.
pub fn calculate_dcf_lite(input: &DcfLiteInput) -> ComputationOutput<Option<DcfLiteOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = match evaluate(input) {
        Ok(out) => {
            if out.payout_defaulted {
                warnings.push(format!(
                    "Payout ratio missing or outside [0, 1]; assumed {}",
                    out.payout_used
                ));
            }
            if out.terminal_growth_used != input.terminal_growth {
                warnings.push(format!(
                    "Terminal growth reduced from {} to {} to stay below the discount rate",
                    input.terminal_growth, out.terminal_growth_used
                ));
            }
            if out.fair_value < Decimal::ZERO {
                warnings.push("Negative fair value: EPS is negative".into());
            }
            let terminal_share = out.pv_terminal.checked_div(out.fair_value);
            if let Some(share) = terminal_share.filter(|s| *s > dec!(0.75)) {
                warnings.push(format!(
                    "Terminal value represents {:.1}% of fair value",
                    share.saturating_mul(dec!(100))
                ));
            }
            Some(out)
        }
        Err(reason) => {
            warnings.push(format!("DCF-lite not computable: {reason}"));
            None
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "DCF-lite (retained-earnings FCF proxy, Gordon terminal value)",
        input,
        warnings,
        elapsed,
        output,
    )
}

fn overflow() -> Declined {
    Declined::new("arithmetic overflow in cash-flow projection")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::MathematicalOps;

    fn sample_input() -> DcfLiteInput {
        DcfLiteInput {
            eps: Some(dec!(5.0)),
            payout_ratio: Some(dec!(0.4)),
            discount_rate: dec!(0.096), // 0.03 + 1.2 * 0.055
            growth_rate: dec!(0.08),
            terminal_growth: dec!(0.02),
            policy: DcfLitePolicy::default(),
        }
    }

    #[test]
    fn test_matches_hand_computation() {
        let input = sample_input();
        let out = evaluate(&input).unwrap();
        assert_eq!(out.fcf0, dec!(3.0));

        let r = dec!(0.096);
        let g1 = dec!(0.08);
        let mut expected = Decimal::ZERO;
        for t in 1..=5i64 {
            expected += dec!(3.0) * (Decimal::ONE + g1).powi(t) / (Decimal::ONE + r).powi(t);
        }
        let fcf5 = dec!(3.0) * (Decimal::ONE + g1).powi(5);
        let terminal = fcf5 * dec!(1.02) / (r - dec!(0.02));
        expected += terminal / (Decimal::ONE + r).powi(5);

        assert!(
            (out.fair_value - expected).abs() < dec!(0.0001),
            "expected {expected}, got {}",
            out.fair_value
        );
        // ~14.36 explicit + ~37.41 terminal
        assert!(out.fair_value > dec!(50) && out.fair_value < dec!(52));
    }

    #[test]
    fn test_absent_eps_declines() {
        let mut input = sample_input();
        input.eps = None;
        assert!(dcf_lite_fair_value(&input).is_none());
    }

    #[test]
    fn test_out_of_range_payout_uses_default() {
        let mut input = sample_input();
        input.payout_ratio = Some(dec!(1.7));
        let out = evaluate(&input).unwrap();
        assert!(out.payout_defaulted);
        assert_eq!(out.payout_used, dec!(0.4));
        assert_eq!(out.fcf0, dec!(3.0));

        input.payout_ratio = None;
        assert_eq!(evaluate(&input).unwrap().fcf0, dec!(3.0));
    }

    #[test]
    fn test_terminal_growth_adjusted_when_rate_too_low() {
        let mut input = sample_input();
        input.discount_rate = dec!(0.025);
        input.terminal_growth = dec!(0.03);
        let out = evaluate(&input).unwrap();
        assert_eq!(out.terminal_growth_used, dec!(0.02));
    }

    #[test]
    fn test_declines_when_adjustment_insufficient() {
        let mut input = sample_input();
        input.discount_rate = dec!(0.01);
        input.terminal_growth = dec!(0.04);
        let err = evaluate(&input).unwrap_err();
        assert!(err.0.contains("terminal growth"));
    }

    #[test]
    fn test_positive_for_positive_eps_across_grid() {
        for payout in [dec!(0), dec!(0.25), dec!(0.5), dec!(0.99)] {
            for r in [dec!(0.03), dec!(0.07), dec!(0.12), dec!(0.2)] {
                for g1 in [dec!(-0.1), dec!(0), dec!(0.15)] {
                    for g2 in [dec!(0), dec!(0.02), dec!(0.035)] {
                        let input = DcfLiteInput {
                            eps: Some(dec!(2.5)),
                            payout_ratio: Some(payout),
                            discount_rate: r,
                            growth_rate: g1,
                            terminal_growth: g2,
                            policy: DcfLitePolicy::default(),
                        };
                        let fv = dcf_lite_fair_value(&input).unwrap();
                        assert!(fv > Decimal::ZERO, "payout={payout} r={r} g1={g1} g2={g2}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_envelope_reports_decline() {
        let mut input = sample_input();
        input.eps = None;
        let out = calculate_dcf_lite(&input);
        assert!(out.result.is_none());
        assert!(out.warnings[0].contains("EPS"));
    }
}
