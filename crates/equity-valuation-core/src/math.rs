use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::types::{Money, Rate};

/// Present-value factor 1 / (1 + r)^t for a whole number of periods.
///
/// Returns `None` when `r <= -1` (the compounding base would be non-positive).
pub fn discount_factor(rate: Rate, periods: u32) -> Option<Decimal> {
    let base = Decimal::ONE + rate;
    if base <= Decimal::ZERO {
        return None;
    }
    let growth = base.checked_powi(i64::from(periods))?;
    if growth.is_zero() {
        return None;
    }
    Decimal::ONE.checked_div(growth)
}

/// Value of `amount` compounded at `rate` for `periods` whole periods.
pub fn compound(amount: Money, rate: Rate, periods: u32) -> Option<Money> {
    let factor = (Decimal::ONE + rate).checked_powi(i64::from(periods))?;
    amount.checked_mul(factor)
}

/// Compound annual growth rate between two positive values over `years` periods.
///
/// CAGR = (last / first)^(1/n) - 1
pub fn cagr(first: Decimal, last: Decimal, years: u32) -> Option<Rate> {
    if first <= Decimal::ZERO || last <= Decimal::ZERO || years == 0 {
        return None;
    }
    let ratio = last.checked_div(first)?;
    let exponent = Decimal::ONE / Decimal::from(years);
    let grown = ratio.checked_powd(exponent)?;
    Some(grown - Decimal::ONE)
}

/// Clamp `value` into `[lo, hi]`. Callers guarantee `lo <= hi`.
pub fn clamp(value: Decimal, lo: Decimal, hi: Decimal) -> Decimal {
    value.max(lo).min(hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_discount_factor() {
        // 1 / 1.1^2 = 0.826446...
        let df = discount_factor(dec!(0.10), 2).unwrap();
        assert!((df - dec!(0.8264462809917355)).abs() < dec!(0.0000001));
        assert_eq!(discount_factor(dec!(0.10), 0), Some(Decimal::ONE));
    }

    #[test]
    fn test_discount_factor_rejects_total_loss_rate() {
        assert!(discount_factor(dec!(-1), 3).is_none());
        assert!(discount_factor(dec!(-1.5), 1).is_none());
    }

    #[test]
    fn test_compound() {
        let v = compound(dec!(100), dec!(0.05), 2).unwrap();
        assert!((v - dec!(110.25)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_cagr_doubling_over_five_years() {
        // 2^(1/5) - 1 = 0.148698...
        let g = cagr(dec!(1), dec!(2), 5).unwrap();
        assert!((g - dec!(0.148698355)).abs() < dec!(0.00001), "got {g}");
    }

    #[test]
    fn test_cagr_absent_when_ratio_overflows() {
        assert_eq!(cagr(dec!(0.0000000000000000000000000001), dec!(100), 5), None);
    }

    #[test]
    fn test_cagr_flat_is_zero() {
        let g = cagr(dec!(3.5), dec!(3.5), 4).unwrap();
        assert!(g.abs() < dec!(0.0000001));
    }

    #[test]
    fn test_cagr_rejects_non_positive_endpoints() {
        assert!(cagr(dec!(0), dec!(2), 5).is_none());
        assert!(cagr(dec!(-1), dec!(2), 5).is_none());
        assert!(cagr(dec!(1), dec!(-2), 5).is_none());
        assert!(cagr(dec!(1), dec!(2), 0).is_none());
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(dec!(0.2), dec!(-0.1), dec!(0.15)), dec!(0.15));
        assert_eq!(clamp(dec!(-0.3), dec!(-0.1), dec!(0.15)), dec!(-0.1));
        assert_eq!(clamp(dec!(0.07), dec!(-0.1), dec!(0.15)), dec!(0.07));
    }
}
