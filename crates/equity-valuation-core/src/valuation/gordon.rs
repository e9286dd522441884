use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::{DdmRateMode, ValuationPolicy};
use crate::math::clamp;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};

use super::perpetuity::{gordon_value, perpetuity_growth};
use super::{Declined, ModelOutcome};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Policy knobs the Gordon model reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DdmPolicy {
    pub growth_cap: Rate,
    pub rate_mode: DdmRateMode,
    pub rate_floor: Rate,
    pub rate_ceiling: Rate,
    /// Yields below this are too thin a dividend signal
    pub min_yield: Rate,
    pub growth_step: Rate,
}

impl Default for DdmPolicy {
    fn default() -> Self {
        Self::from(&ValuationPolicy::default())
    }
}

impl From<&ValuationPolicy> for DdmPolicy {
    fn from(p: &ValuationPolicy) -> Self {
        Self {
            growth_cap: p.ddm_growth_cap,
            rate_mode: p.ddm_rate_mode,
            rate_floor: p.ddm_rate_floor,
            rate_ceiling: p.ddm_rate_ceiling,
            min_yield: p.ddm_min_yield,
            growth_step: p.growth_step,
        }
    }
}

/// Inputs to the Gordon growth model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DdmInput {
    /// Selected dividend per share
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dps: Option<Money>,
    /// Current price, used for the minimum-yield gate when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    pub required_return: Rate,
    /// Dividend growth before clamping (normally g1)
    pub growth_rate: Rate,
    #[serde(default)]
    pub policy: DdmPolicy,
}

/// Gordon model detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DdmOutput {
    pub fair_value: Money,
    pub rate_used: Rate,
    pub growth_used: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implied_yield: Option<Rate>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// DPS * (1 + g) / (r - g), or `None` when not computable.
pub fn gordon_fair_value(input: &DdmInput) -> Option<Money> {
    evaluate(input).ok().map(|out| out.fair_value)
}

pub fn evaluate(input: &DdmInput) -> ModelOutcome<DdmOutput> {
    let dps = match input.dps {
        Some(d) if d > Decimal::ZERO => d,
        Some(d) => return Err(Declined::new(format!("dividend per share {d} is not positive"))),
        None => return Err(Declined::new("no usable dividend per share")),
    };

    let p = &input.policy;
    let implied_yield = match input.price {
        Some(price) if price > Decimal::ZERO => Some(dps.checked_div(price).ok_or_else(|| {
            Declined::new(format!("implied yield of {dps} over price {price} overflows"))
        })?),
        _ => None,
    };
    if let Some(y) = implied_yield {
        if y < p.min_yield {
            return Err(Declined::new(format!(
                "implied yield {y} below the {} minimum",
                p.min_yield
            )));
        }
    }

    let r = match p.rate_mode {
        DdmRateMode::Capm => input.required_return,
        DdmRateMode::Clamped => clamp(input.required_return, p.rate_floor, p.rate_ceiling),
    };
    let g = clamp(input.growth_rate, Decimal::ZERO, p.growth_cap);
    let g = perpetuity_growth(r, g, p.growth_step).ok_or_else(|| {
        Declined::new(format!(
            "required return {r} does not exceed dividend growth {g} even after adjustment"
        ))
    })?;

    let fair_value = gordon_value(dps, r, g)
        .ok_or_else(|| Declined::new("arithmetic overflow in Gordon value"))?;

    Ok(DdmOutput {
        fair_value,
        rate_used: r,
        growth_used: g,
        implied_yield,
    })
}

/// Enveloped Gordon model for adapters.
pub fn calculate_ddm(input: &DdmInput) -> ComputationOutput<Option<DdmOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = match evaluate(input) {
        Ok(out) => {
            if out.rate_used != input.required_return {
                warnings.push(format!(
                    "Required return {} clamped to {}",
                    input.required_return, out.rate_used
                ));
            }
            Some(out)
        }
        Err(reason) => {
            warnings.push(format!("DDM not computable: {reason}"));
            None
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Gordon growth dividend discount model",
        input,
        warnings,
        elapsed,
        output,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input() -> DdmInput {
        DdmInput {
            dps: Some(dec!(2.0)),
            price: Some(dec!(50)),
            required_return: dec!(0.09),
            growth_rate: dec!(0.04),
            policy: DdmPolicy::default(),
        }
    }

    #[test]
    fn test_basic_gordon() {
        // 2 * 1.04 / (0.09 - 0.04) = 41.6
        let out = evaluate(&sample_input()).unwrap();
        assert_eq!(out.fair_value, dec!(41.6));
        assert_eq!(out.implied_yield, Some(dec!(0.04)));
    }

    #[test]
    fn test_tiny_price_declines() {
        let mut input = sample_input();
        input.dps = Some(dec!(10));
        input.price = Some(dec!(0.0000000000000000000000000001));
        let reason = evaluate(&input).unwrap_err();
        assert!(reason.0.contains("overflows"), "{reason}");
        assert!(calculate_ddm(&input).result.is_none());
    }

    #[test]
    fn test_non_positive_dps_declines() {
        let mut input = sample_input();
        input.dps = None;
        assert!(gordon_fair_value(&input).is_none());
        input.dps = Some(Decimal::ZERO);
        assert!(gordon_fair_value(&input).is_none());
        input.dps = Some(dec!(-1));
        assert!(gordon_fair_value(&input).is_none());
    }

    #[test]
    fn test_growth_capped_at_eight_percent_and_floored_at_zero() {
        let mut input = sample_input();
        input.required_return = dec!(0.12);
        input.growth_rate = dec!(0.15);
        assert_eq!(evaluate(&input).unwrap().growth_used, dec!(0.08));

        input.growth_rate = dec!(-0.05);
        assert_eq!(evaluate(&input).unwrap().growth_used, Decimal::ZERO);
    }

    #[test]
    fn test_min_yield_gate() {
        let mut input = sample_input();
        input.price = Some(dec!(1000)); // 0.2% yield
        let err = evaluate(&input).unwrap_err();
        assert!(err.0.contains("minimum"));

        // Unknown price skips the gate
        input.price = None;
        assert!(evaluate(&input).is_ok());
    }

    #[test]
    fn test_clamped_rate_mode() {
        let mut input = sample_input();
        input.policy.rate_mode = DdmRateMode::Clamped;
        input.required_return = dec!(0.03);
        let out = evaluate(&input).unwrap();
        assert_eq!(out.rate_used, dec!(0.06));

        input.required_return = dec!(0.20);
        assert_eq!(evaluate(&input).unwrap().rate_used, dec!(0.14));
    }

    #[test]
    fn test_growth_reduced_when_rate_too_low() {
        let mut input = sample_input();
        input.required_return = dec!(0.05);
        input.growth_rate = dec!(0.055);
        let out = evaluate(&input).unwrap();
        assert_eq!(out.growth_used, dec!(0.045));
    }

    #[test]
    fn test_declines_when_rate_below_adjusted_growth() {
        let mut input = sample_input();
        input.required_return = dec!(0.03);
        input.growth_rate = dec!(0.08);
        assert!(evaluate(&input).is_err());
    }

    #[test]
    fn test_strictly_increasing_in_growth() {
        let mut previous: Option<Decimal> = None;
        for g in [dec!(0.0), dec!(0.01), dec!(0.02), dec!(0.03), dec!(0.05), dec!(0.07), dec!(0.08)] {
            let mut input = sample_input();
            input.required_return = dec!(0.10);
            input.growth_rate = g;
            let fv = gordon_fair_value(&input).unwrap();
            if let Some(prev) = previous {
                assert!(fv > prev, "g={g}: {fv} <= {prev}");
            }
            previous = Some(fv);
        }
    }
}
