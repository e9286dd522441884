pub mod normalize;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Currency, Money, Multiple, Rate};

pub use normalize::{coerce_decimal, normalize, RawFundamentals};

/// Provenance of a dividend-per-share figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DividendSource {
    /// Indicated forward annual dividend rate
    Forward,
    /// Sum of dividends paid over the trailing twelve months
    Ttm,
    /// Provider's trailing annual dividend rate
    Trailing,
    /// EPS multiplied by the payout ratio
    PayoutEstimate,
}

impl std::fmt::Display for DividendSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DividendSource::Forward => write!(f, "FORWARD"),
            DividendSource::Ttm => write!(f, "TTM"),
            DividendSource::Trailing => write!(f, "TRAILING"),
            DividendSource::PayoutEstimate => write!(f, "PAYOUT_ESTIMATE"),
        }
    }
}

/// A dividend-per-share figure tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendCandidate {
    pub source: DividendSource,
    pub dps: Money,
}

/// Annual earnings per share for one fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpsObservation {
    pub year: i32,
    pub eps: Decimal,
}

/// Immutable per-ticker fundamentals. Absent fields stay `None`; the engine
/// never substitutes zero for an unknown quantity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailing_eps: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_eps: Option<Decimal>,
    /// Provider P/E, or price / EPS when the provider omits it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<Multiple>,
    /// Payout ratio as a fraction (0.35 = 35%)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout_ratio: Option<Rate>,
    /// Dividend yield in percent (3.1 = 3.1%)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dividend_yield_pct: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_value_per_share: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebitda_per_share: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_per_share: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcf_per_share: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares_outstanding: Option<Decimal>,
    #[serde(default)]
    pub dividend_candidates: Vec<DividendCandidate>,
    /// Chronological annual EPS
    #[serde(default)]
    pub eps_history: Vec<EpsObservation>,
}

impl FundamentalSnapshot {
    /// The candidate reported for `source`, if any.
    pub fn dividend(&self, source: DividendSource) -> Option<Money> {
        self.dividend_candidates
            .iter()
            .find(|c| c.source == source)
            .map(|c| c.dps)
    }

    /// EPS used for the payout-based dividend estimate: trailing, then forward.
    pub fn eps_for_dividend(&self) -> Option<Decimal> {
        self.trailing_eps.or(self.forward_eps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_dividend_lookup_by_source() {
        let snap = FundamentalSnapshot {
            dividend_candidates: vec![
                DividendCandidate {
                    source: DividendSource::Ttm,
                    dps: dec!(3.0),
                },
                DividendCandidate {
                    source: DividendSource::Trailing,
                    dps: dec!(2.9),
                },
            ],
            ..Default::default()
        };
        assert_eq!(snap.dividend(DividendSource::Ttm), Some(dec!(3.0)));
        assert_eq!(snap.dividend(DividendSource::Forward), None);
    }

    #[test]
    fn test_eps_for_dividend_falls_back_to_forward() {
        let snap = FundamentalSnapshot {
            forward_eps: Some(dec!(4.2)),
            ..Default::default()
        };
        assert_eq!(snap.eps_for_dividend(), Some(dec!(4.2)));

        let snap = FundamentalSnapshot {
            trailing_eps: Some(dec!(3.9)),
            forward_eps: Some(dec!(4.2)),
            ..Default::default()
        };
        assert_eq!(snap.eps_for_dividend(), Some(dec!(3.9)));
    }

    #[test]
    fn test_source_tags_serialize_upper_case() {
        let json = serde_json::to_string(&DividendSource::PayoutEstimate).unwrap();
        assert_eq!(json, "\"PAYOUT_ESTIMATE\"");
        assert_eq!(DividendSource::Ttm.to_string(), "TTM");
    }
}
