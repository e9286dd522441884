use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assumptions::ModelAssumptions;
use crate::types::{Money, Multiple};

use super::{Declined, ModelOutcome};

/// Relative P/E valuation detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativePeOutput {
    pub fair_value: Money,
    pub multiple: Multiple,
    /// True when a configured target P/E replaced the sector table
    pub target_override: bool,
}

/// The P/E applied to a sector: the configured target if any, else the
/// sector table (with its fallback for unknown sectors).
pub fn sector_multiple(sector: Option<&str>, assumptions: &ModelAssumptions) -> (Multiple, bool) {
    match assumptions.target_multiples.price_earnings {
        Some(pe) => (pe, true),
        None => (assumptions.policy.sector_pe_for(sector), false),
    }
}

/// EPS * sector P/E, or `None` when EPS is unknown or the product overflows.
pub fn relative_pe_fair_value(eps: Option<Decimal>, multiple: Multiple) -> Option<Money> {
    eps?.checked_mul(multiple)
}

pub fn evaluate(
    eps: Option<Decimal>,
    sector: Option<&str>,
    assumptions: &ModelAssumptions,
) -> ModelOutcome<RelativePeOutput> {
    let (multiple, target_override) = sector_multiple(sector, assumptions);
    let eps = eps.ok_or_else(|| Declined::new("EPS is not available"))?;
    let fair_value = relative_pe_fair_value(Some(eps), multiple)
        .ok_or_else(|| Declined::new(format!("EPS {eps} times P/E {multiple} overflows")))?;
    Ok(RelativePeOutput {
        fair_value,
        multiple,
        target_override,
    })
}
