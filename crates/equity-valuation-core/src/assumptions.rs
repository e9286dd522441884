use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::types::{Multiple, Rate, ValuationModel};
use crate::EngineResult;

// ---------------------------------------------------------------------------
// Model assumptions
// ---------------------------------------------------------------------------

/// User-supplied model parameters. All rates are fractions (0.03 = 3%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelAssumptions {
    /// Risk-free rate used in the CAPM discount rate
    pub risk_free_rate: Rate,
    /// Market risk premium used in the CAPM discount rate
    pub market_risk_premium: Rate,
    /// Upper bound for the explicit-period growth rate g1
    pub growth_cap: Rate,
    /// Perpetual growth rate g2 after the explicit period
    pub terminal_growth: Rate,
    /// Explicit discount rate; replaces the CAPM-derived rate when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Rate>,
    /// Target multiples for the relative and per-share models
    pub target_multiples: TargetMultiples,
    /// Heuristic constants
    pub policy: ValuationPolicy,
}

impl Default for ModelAssumptions {
    fn default() -> Self {
        Self {
            risk_free_rate: dec!(0.03),
            market_risk_premium: dec!(0.055),
            growth_cap: dec!(0.15),
            terminal_growth: dec!(0.02),
            discount_rate: None,
            target_multiples: TargetMultiples::default(),
            policy: ValuationPolicy::default(),
        }
    }
}

/// Target multiples applied to per-share metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetMultiples {
    /// Overrides the sector P/E table when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_earnings: Option<Multiple>,
    pub price_book: Multiple,
    pub price_ebitda: Multiple,
    pub price_sales: Multiple,
    pub price_fcf: Multiple,
}

impl Default for TargetMultiples {
    fn default() -> Self {
        Self {
            price_earnings: None,
            price_book: dec!(1.5),
            price_ebitda: dec!(10),
            price_sales: dec!(2),
            price_fcf: dec!(15),
        }
    }
}

// ---------------------------------------------------------------------------
// Heuristic policy
// ---------------------------------------------------------------------------

/// How the Gordon model chooses its discount rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DdmRateMode {
    /// Use the CAPM-derived rate as is
    #[default]
    Capm,
    /// Clamp the rate into `[ddm_rate_floor, ddm_rate_ceiling]`
    Clamped,
}

/// Which views feed the combined fair value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinerMode {
    /// DCF-lite and relative P/E, plus the DDM when it is available
    #[default]
    Blended,
    /// Relative P/E and DDM only; everything else is informational
    EarningsAndDividends,
}

/// Weight tables keyed by model, one for each DDM availability state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    pub without_ddm: BTreeMap<ValuationModel, Decimal>,
    pub with_ddm: BTreeMap<ValuationModel, Decimal>,
}

impl WeightTable {
    pub fn for_mode(mode: CombinerMode) -> Self {
        match mode {
            CombinerMode::Blended => Self {
                without_ddm: BTreeMap::from([
                    (ValuationModel::Dcf, dec!(0.6)),
                    (ValuationModel::RelativePe, dec!(0.4)),
                ]),
                with_ddm: BTreeMap::from([
                    (ValuationModel::Dcf, dec!(0.6)),
                    (ValuationModel::RelativePe, dec!(0.3)),
                    (ValuationModel::Ddm, dec!(0.1)),
                ]),
            },
            CombinerMode::EarningsAndDividends => Self {
                without_ddm: BTreeMap::from([(ValuationModel::RelativePe, dec!(1))]),
                with_ddm: BTreeMap::from([
                    (ValuationModel::RelativePe, dec!(0.5)),
                    (ValuationModel::Ddm, dec!(0.5)),
                ]),
            },
        }
    }

    /// The table that applies for the given DDM availability.
    pub fn select(&self, ddm_available: bool) -> &BTreeMap<ValuationModel, Decimal> {
        if ddm_available {
            &self.with_ddm
        } else {
            &self.without_ddm
        }
    }
}

/// Heuristic constants. These are policy, not derived financial truths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationPolicy {
    /// Implied yields above this are treated as bad source data
    pub dividend_yield_ceiling: Rate,
    /// Implied yields below this are too small for the DDM to be meaningful
    pub ddm_min_yield: Rate,
    /// Payout assumed by DCF-lite when the reported one is absent or outside [0, 1]
    pub default_payout: Rate,
    /// Growth assumed when no EPS CAGR can be measured
    pub default_growth: Rate,
    /// Lower bound for g1
    pub growth_floor: Rate,
    /// Upper bound for the dividend growth rate
    pub ddm_growth_cap: Rate,
    pub ddm_rate_floor: Rate,
    pub ddm_rate_ceiling: Rate,
    pub ddm_rate_mode: DdmRateMode,
    /// Growth reduction applied once when r <= g in a perpetuity
    pub growth_step: Rate,
    /// Beta assumed when the provider does not report one
    pub default_beta: Decimal,
    /// Explicit forecast years in DCF-lite
    pub explicit_years: u32,
    /// Primary and fallback CAGR windows (years) for the EPS growth estimate
    pub cagr_windows: Vec<u32>,
    pub sector_pe: BTreeMap<String, Multiple>,
    pub fallback_sector_pe: Multiple,
    pub combiner_mode: CombinerMode,
    /// Replaces the weight table implied by `combiner_mode` when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_weights: Option<WeightTable>,
}

impl Default for ValuationPolicy {
    fn default() -> Self {
        Self {
            dividend_yield_ceiling: dec!(0.15),
            ddm_min_yield: dec!(0.005),
            default_payout: dec!(0.4),
            default_growth: dec!(0.05),
            growth_floor: dec!(-0.10),
            ddm_growth_cap: dec!(0.08),
            ddm_rate_floor: dec!(0.06),
            ddm_rate_ceiling: dec!(0.14),
            ddm_rate_mode: DdmRateMode::Capm,
            growth_step: dec!(0.01),
            default_beta: Decimal::ONE,
            explicit_years: 5,
            cagr_windows: vec![5, 3],
            sector_pe: default_sector_pe(),
            fallback_sector_pe: dec!(15.0),
            combiner_mode: CombinerMode::Blended,
            custom_weights: None,
        }
    }
}

impl ValuationPolicy {
    /// Typical P/E for a sector, case-insensitive, with the fallback multiple
    /// for unknown or absent sectors.
    pub fn sector_pe_for(&self, sector: Option<&str>) -> Multiple {
        sector
            .map(str::trim)
            .and_then(|name| {
                self.sector_pe
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, pe)| *pe)
            })
            .unwrap_or(self.fallback_sector_pe)
    }

    /// The effective weight table.
    pub fn weights(&self) -> WeightTable {
        self.custom_weights
            .clone()
            .unwrap_or_else(|| WeightTable::for_mode(self.combiner_mode))
    }
}

fn default_sector_pe() -> BTreeMap<String, Multiple> {
    [
        ("Technology", dec!(22.0)),
        ("Communication Services", dec!(19.0)),
        ("Consumer Discretionary", dec!(18.0)),
        ("Health Care", dec!(18.0)),
        ("Industrials", dec!(16.0)),
        ("Materials", dec!(15.0)),
        ("Consumer Staples", dec!(18.0)),
        ("Energy", dec!(10.0)),
        ("Financial Services", dec!(11.0)),
        ("Utilities", dec!(14.0)),
        ("Real Estate", dec!(14.0)),
    ]
    .into_iter()
    .map(|(name, pe)| (name.to_string(), pe))
    .collect()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl ModelAssumptions {
    /// Reject configurations the engine cannot interpret. Rates at or beyond
    /// +/-100% are almost always percentages typed in by mistake.
    pub fn validate(&self) -> EngineResult<()> {
        check_rate("risk_free_rate", self.risk_free_rate)?;
        check_rate("market_risk_premium", self.market_risk_premium)?;
        check_rate("growth_cap", self.growth_cap)?;
        check_rate("terminal_growth", self.terminal_growth)?;
        if let Some(r) = self.discount_rate {
            check_rate("discount_rate", r)?;
        }

        let m = &self.target_multiples;
        if let Some(pe) = m.price_earnings {
            check_multiple("target_multiples.price_earnings", pe)?;
        }
        check_multiple("target_multiples.price_book", m.price_book)?;
        check_multiple("target_multiples.price_ebitda", m.price_ebitda)?;
        check_multiple("target_multiples.price_sales", m.price_sales)?;
        check_multiple("target_multiples.price_fcf", m.price_fcf)?;

        self.policy.validate()?;

        if self.growth_cap < self.policy.growth_floor {
            return Err(ValuationError::InvalidInput {
                field: "growth_cap".into(),
                reason: format!(
                    "Growth cap ({}) is below the growth floor ({})",
                    self.growth_cap, self.policy.growth_floor
                ),
            });
        }
        Ok(())
    }
}

impl ValuationPolicy {
    pub fn validate(&self) -> EngineResult<()> {
        check_rate("policy.dividend_yield_ceiling", self.dividend_yield_ceiling)?;
        if self.dividend_yield_ceiling <= Decimal::ZERO {
            return Err(invalid(
                "policy.dividend_yield_ceiling",
                "Yield ceiling must be positive",
            ));
        }
        check_rate("policy.ddm_min_yield", self.ddm_min_yield)?;
        if self.ddm_min_yield < Decimal::ZERO {
            return Err(invalid("policy.ddm_min_yield", "Cannot be negative"));
        }
        if self.default_payout < Decimal::ZERO || self.default_payout > Decimal::ONE {
            return Err(invalid(
                "policy.default_payout",
                "Default payout must be between 0 and 1",
            ));
        }
        check_rate("policy.default_growth", self.default_growth)?;
        check_rate("policy.growth_floor", self.growth_floor)?;
        check_rate("policy.ddm_growth_cap", self.ddm_growth_cap)?;
        if self.ddm_growth_cap < Decimal::ZERO {
            return Err(invalid("policy.ddm_growth_cap", "Cannot be negative"));
        }
        check_rate("policy.ddm_rate_floor", self.ddm_rate_floor)?;
        check_rate("policy.ddm_rate_ceiling", self.ddm_rate_ceiling)?;
        if self.ddm_rate_floor > self.ddm_rate_ceiling {
            return Err(ValuationError::InvalidInput {
                field: "policy.ddm_rate_floor".into(),
                reason: format!(
                    "DDM rate floor ({}) exceeds ceiling ({})",
                    self.ddm_rate_floor, self.ddm_rate_ceiling
                ),
            });
        }
        if self.growth_step < Decimal::ZERO || self.growth_step >= Decimal::ONE {
            return Err(invalid(
                "policy.growth_step",
                "Growth step must be in [0, 1)",
            ));
        }
        if self.explicit_years == 0 {
            return Err(invalid(
                "policy.explicit_years",
                "At least one explicit forecast year is required",
            ));
        }
        if self.cagr_windows.iter().any(|w| *w == 0) {
            return Err(invalid("policy.cagr_windows", "Windows must be positive"));
        }
        for (sector, pe) in &self.sector_pe {
            check_multiple(&format!("policy.sector_pe.{sector}"), *pe)?;
        }
        check_multiple("policy.fallback_sector_pe", self.fallback_sector_pe)?;

        let weights = self.weights();
        for (label, table) in [
            ("without_ddm", &weights.without_ddm),
            ("with_ddm", &weights.with_ddm),
        ] {
            if table.values().any(|w| *w < Decimal::ZERO) {
                return Err(invalid(
                    &format!("policy.weights.{label}"),
                    "Weights cannot be negative",
                ));
            }
            let total = table
                .values()
                .try_fold(Decimal::ZERO, |acc, w| acc.checked_add(*w))
                .ok_or_else(|| invalid(&format!("policy.weights.{label}"), "Weights total overflows"))?;
            if total <= Decimal::ZERO {
                return Err(invalid(
                    &format!("policy.weights.{label}"),
                    "Weights must have a positive total",
                ));
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ValuationError {
    ValuationError::InvalidInput {
        field: field.into(),
        reason: reason.into(),
    }
}

fn check_rate(field: &str, value: Rate) -> EngineResult<()> {
    if value <= dec!(-1) || value >= Decimal::ONE {
        return Err(ValuationError::InvalidInput {
            field: field.into(),
            reason: format!("Rate {value} is outside (-1, 1); rates are fractions, not percentages"),
        });
    }
    Ok(())
}

fn check_multiple(field: &str, value: Multiple) -> EngineResult<()> {
    if value <= Decimal::ZERO {
        return Err(ValuationError::InvalidInput {
            field: field.into(),
            reason: format!("Multiple must be positive, got {value}"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
