//! Shared guard for perpetuity formulas, which need r > g.

use rust_decimal::Decimal;

use crate::types::Rate;

/// Growth rate usable in a perpetuity discounted at `rate`.
///
/// When `rate <= growth` the growth is reduced once by `step` (floored at
/// zero). Returns `None` if the denominator is still not positive.
pub fn perpetuity_growth(rate: Rate, growth: Rate, step: Rate) -> Option<Rate> {
    if rate > growth {
        return Some(growth);
    }
    let reduced = (growth - step).max(Decimal::ZERO);
    if rate > reduced {
        tracing::debug!(%rate, %growth, %reduced, "perpetuity growth reduced below discount rate");
        Some(reduced)
    } else {
        None
    }
}

/// Gordon perpetuity value of a cash flow growing at `growth` from next period:
/// CF * (1 + g) / (r - g). Callers pass a growth already checked by
/// [`perpetuity_growth`].
pub fn gordon_value(cash_flow: Decimal, rate: Rate, growth: Rate) -> Option<Decimal> {
    let spread = rate - growth;
    if spread <= Decimal::ZERO {
        return None;
    }
    cash_flow.checked_mul(Decimal::ONE + growth)?.checked_div(spread)
}
