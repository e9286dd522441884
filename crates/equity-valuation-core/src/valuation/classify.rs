use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// Valuation gap bands, from most expensive to cheapest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictBand {
    VeryOvervalued,
    Overvalued,
    FairlyValued,
    Undervalued,
    VeryUndervalued,
}

impl VerdictBand {
    pub const ALL: [VerdictBand; 5] = [
        VerdictBand::VeryOvervalued,
        VerdictBand::Overvalued,
        VerdictBand::FairlyValued,
        VerdictBand::Undervalued,
        VerdictBand::VeryUndervalued,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            VerdictBand::VeryOvervalued => "very overvalued",
            VerdictBand::Overvalued => "overvalued",
            VerdictBand::FairlyValued => "fairly valued",
            VerdictBand::Undervalued => "undervalued",
            VerdictBand::VeryUndervalued => "very undervalued",
        }
    }
}

impl std::fmt::Display for VerdictBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// fair_value / price - 1, or `None` without a positive price or when the
/// ratio is not representable.
pub fn upside(fair_value: Money, price: Money) -> Option<Rate> {
    if price <= Decimal::ZERO {
        return None;
    }
    fair_value.checked_div(price)?.checked_sub(Decimal::ONE)
}

/// Band for an upside fraction.
///
/// At or below -30% is very overvalued. Exactly -15% and exactly +10% are
/// fairly valued and exactly +30% is undervalued.
pub fn classify(upside: Rate) -> VerdictBand {
    if upside <= dec!(-0.30) {
        VerdictBand::VeryOvervalued
    } else if upside < dec!(-0.15) {
        VerdictBand::Overvalued
    } else if upside <= dec!(0.10) {
        VerdictBand::FairlyValued
    } else if upside <= dec!(0.30) {
        VerdictBand::Undervalued
    } else {
        VerdictBand::VeryUndervalued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twenty_percent_below_is_overvalued() {
        let u = upside(dec!(80), dec!(100)).unwrap();
        assert_eq!(u, dec!(-0.20));
        assert_eq!(classify(u), VerdictBand::Overvalued);
    }

    #[test]
    fn test_small_premium_is_fairly_valued() {
        let u = upside(dec!(100.5), dec!(100)).unwrap();
        assert_eq!(u, dec!(0.005));
        assert_eq!(classify(u), VerdictBand::FairlyValued);
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(classify(dec!(-0.30)), VerdictBand::VeryOvervalued);
        assert_eq!(classify(dec!(-0.2999)), VerdictBand::Overvalued);
        assert_eq!(classify(dec!(-0.15)), VerdictBand::FairlyValued);
        assert_eq!(classify(dec!(-0.1501)), VerdictBand::Overvalued);
        assert_eq!(classify(dec!(0.10)), VerdictBand::FairlyValued);
        assert_eq!(classify(dec!(0.1001)), VerdictBand::Undervalued);
        assert_eq!(classify(dec!(0.30)), VerdictBand::Undervalued);
        assert_eq!(classify(dec!(0.3001)), VerdictBand::VeryUndervalued);
    }

    #[test]
    fn test_bands_are_ordered_and_exhaustive() {
        let mut seen = std::collections::BTreeSet::new();
        let mut previous = VerdictBand::VeryOvervalued;
        let mut u = dec!(-1.0);
        while u <= dec!(1.0) {
            let band = classify(u);
            assert!(band >= previous, "band went backwards at {u}");
            seen.insert(band);
            previous = band;
            u += dec!(0.0025);
        }
        assert_eq!(seen.len(), VerdictBand::ALL.len());
    }

    #[test]
    fn test_upside_requires_positive_price() {
        assert_eq!(upside(dec!(10), Decimal::ZERO), None);
        assert_eq!(upside(dec!(10), dec!(-5)), None);
    }

    #[test]
    fn test_upside_absent_when_ratio_overflows() {
        assert_eq!(upside(dec!(50), dec!(0.0000000000000000000000000001)), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(VerdictBand::FairlyValued.to_string(), "fairly valued");
        assert_eq!(
            serde_json::to_string(&VerdictBand::VeryUndervalued).unwrap(),
            "\"very_undervalued\""
        );
    }
}
