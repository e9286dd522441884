//! Input normalizer.
//!
//! Maps a duck-typed provider document (Yahoo-style field names) onto a
//! [`FundamentalSnapshot`]. Every coercion happens here, once; anything that
//! cannot be read as a number becomes `None` rather than an error.

use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{DividendCandidate, DividendSource, EpsObservation, FundamentalSnapshot};
use crate::types::{Currency, Money};

/// Raw provider response: field name to arbitrary JSON value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFundamentals(pub Map<String, Value>);

impl RawFundamentals {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    fn number(&self, key: &str) -> Option<Decimal> {
        let value = self.0.get(key)?;
        let coerced = coerce_decimal(value);
        if coerced.is_none() && !value.is_null() {
            tracing::debug!(field = key, raw = %value, "non-numeric provider value treated as absent");
        }
        coerced
    }

    /// First key holding a value that passes `accept`.
    fn first_number(&self, keys: &[&str], accept: impl Fn(Decimal) -> bool) -> Option<Decimal> {
        keys.iter()
            .filter_map(|k| self.number(k))
            .find(|v| accept(*v))
    }

    fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for RawFundamentals {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Coerce a numeric-like JSON value to a Decimal.
///
/// Numbers and numeric strings (including scientific notation) convert;
/// NaN, infinities, booleans, nulls and containers yield `None`.
pub fn coerce_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(Decimal::from(i));
            }
            if let Some(u) = n.as_u64() {
                return Some(Decimal::from(u));
            }
            parse_decimal(&n.to_string()).or_else(|| n.as_f64().and_then(Decimal::from_f64))
        }
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Build a snapshot from a raw provider document. Never fails.
pub fn normalize(raw: &RawFundamentals) -> FundamentalSnapshot {
    let price = raw.first_number(
        &["currentPrice", "regularMarketPrice", "previousClose"],
        |p| p > Decimal::ZERO,
    );

    // A zero trailingEps is a placeholder; the TTM field may still carry the figure
    let trailing_eps = raw.first_number(&["trailingEps", "epsTrailingTwelveMonths"], |eps| {
        !eps.is_zero()
    });
    let forward_eps = raw.number("forwardEps");

    let pe_ratio = raw
        .number("trailingPE")
        .filter(|pe| !pe.is_zero())
        .or_else(|| match (price, trailing_eps) {
            (Some(p), Some(eps)) => p.checked_div(eps),
            _ => None,
        });

    let shares_outstanding = raw.number("sharesOutstanding").filter(|s| *s > Decimal::ZERO);

    let per_share = |direct: &str, total: &str| -> Option<Money> {
        raw.number(direct).or_else(|| {
            let total = raw.number(total)?;
            let shares = shares_outstanding?;
            total.checked_div(shares)
        })
    };

    FundamentalSnapshot {
        ticker: raw.text("symbol"),
        name: raw.text("shortName").or_else(|| raw.text("longName")),
        price,
        currency: raw.text("currency").map(|c| Currency::from_code(&c)),
        trailing_eps,
        forward_eps,
        pe_ratio,
        payout_ratio: raw.number("payoutRatio"),
        dividend_yield_pct: raw.number("dividendYield").map(yield_as_percent),
        beta: raw.number("beta"),
        sector: raw.text("sector"),
        book_value_per_share: per_share("bookValue", "totalStockholderEquity"),
        ebitda_per_share: per_share("ebitdaPerShare", "ebitda"),
        sales_per_share: per_share("revenuePerShare", "totalRevenue"),
        fcf_per_share: per_share("freeCashflowPerShare", "freeCashflow"),
        shares_outstanding,
        dividend_candidates: dividend_candidates(raw),
        eps_history: eps_history(raw, shares_outstanding),
    }
}

/// Providers disagree on whether yield is a fraction or a percentage; values
/// below 1 are taken to be fractions.
fn yield_as_percent(value: Decimal) -> Decimal {
    if value < Decimal::ONE {
        value * dec!(100)
    } else {
        value
    }
}

fn dividend_candidates(raw: &RawFundamentals) -> Vec<DividendCandidate> {
    [
        ("dividendRate", DividendSource::Forward),
        ("trailingDividendsTtm", DividendSource::Ttm),
        ("trailingAnnualDividendRate", DividendSource::Trailing),
    ]
    .into_iter()
    .filter_map(|(key, source)| {
        raw.number(key)
            .filter(|dps| *dps > Decimal::ZERO)
            .map(|dps| DividendCandidate { source, dps })
    })
    .collect()
}

fn eps_history(raw: &RawFundamentals, shares: Option<Decimal>) -> Vec<EpsObservation> {
    let mut history = match raw.0.get("epsHistory") {
        Some(value) => observations(value, coerce_decimal),
        None => match (raw.0.get("earningsHistory"), shares) {
            (Some(value), Some(shares)) => {
                observations(value, |v| coerce_decimal(v)?.checked_div(shares))
            }
            _ => Vec::new(),
        },
    };
    history.sort_by_key(|o| o.year);
    history
}

/// Accepts `{ "2021": 3.1, ... }`, `[{"year": 2021, "eps": 3.1}, ...]` or a
/// plain chronological array of numbers.
fn observations(value: &Value, read: impl Fn(&Value) -> Option<Decimal>) -> Vec<EpsObservation> {
    match value {
        Value::Object(by_year) => by_year
            .iter()
            .filter_map(|(year, v)| {
                let label = year.trim();
                let year = label.get(..4).unwrap_or(label).parse::<i32>().ok()?;
                Some(EpsObservation { year, eps: read(v)? })
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| match item {
                Value::Object(obj) => {
                    let year = obj.get("year").and_then(coerce_decimal)?.to_i32()?;
                    let eps = obj.get("eps").or_else(|| obj.get("value"))?;
                    Some(EpsObservation {
                        year,
                        eps: read(eps)?,
                    })
                }
                other => Some(EpsObservation {
                    year: idx as i32,
                    eps: read(other)?,
                }),
            })
            .collect(),
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawFundamentals {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_coerce_numbers_and_strings() {
        assert_eq!(coerce_decimal(&json!(42)), Some(dec!(42)));
        assert_eq!(coerce_decimal(&json!(0.35)), Some(dec!(0.35)));
        assert_eq!(coerce_decimal(&json!("1.25")), Some(dec!(1.25)));
        assert_eq!(coerce_decimal(&json!(" 7 ")), Some(dec!(7)));
        assert_eq!(coerce_decimal(&json!("1e-3")), Some(dec!(0.001)));
    }

    #[test]
    fn test_coerce_rejects_non_numeric() {
        assert_eq!(coerce_decimal(&json!("N/A")), None);
        assert_eq!(coerce_decimal(&json!("NaN")), None);
        assert_eq!(coerce_decimal(&json!("")), None);
        assert_eq!(coerce_decimal(&json!(null)), None);
        assert_eq!(coerce_decimal(&json!(true)), None);
        assert_eq!(coerce_decimal(&json!([1, 2])), None);
    }

    #[test]
    fn test_dividend_yield_fraction_becomes_percent() {
        let snap = normalize(&raw(json!({"dividendYield": 0.031})));
        assert_eq!(snap.dividend_yield_pct, Some(dec!(3.1)));

        let snap = normalize(&raw(json!({"dividendYield": 3.1})));
        assert_eq!(snap.dividend_yield_pct, Some(dec!(3.1)));
    }

    #[test]
    fn test_eps_falls_back_to_ttm_field() {
        let snap = normalize(&raw(json!({"epsTrailingTwelveMonths": 2.5})));
        assert_eq!(snap.trailing_eps, Some(dec!(2.5)));

        let snap = normalize(&raw(json!({"trailingEps": 2.4, "epsTrailingTwelveMonths": 2.5})));
        assert_eq!(snap.trailing_eps, Some(dec!(2.4)));
    }

    #[test]
    fn test_zero_trailing_eps_falls_back_to_ttm_field() {
        let snap = normalize(&raw(json!({
            "currentPrice": 50,
            "trailingEps": 0,
            "epsTrailingTwelveMonths": 2.5
        })));
        assert_eq!(snap.trailing_eps, Some(dec!(2.5)));
        assert_eq!(snap.pe_ratio, Some(dec!(20)));

        let snap = normalize(&raw(json!({"trailingEps": 0})));
        assert_eq!(snap.trailing_eps, None);
    }

    #[test]
    fn test_tiny_eps_leaves_pe_absent() {
        let snap = normalize(&raw(json!({
            "currentPrice": 1e10,
            "trailingEps": "0.0000000000000000000000000001"
        })));
        assert_eq!(snap.trailing_eps, Some(dec!(0.0000000000000000000000000001)));
        assert_eq!(snap.pe_ratio, None);
    }

    #[test]
    fn test_tiny_share_count_leaves_per_share_metrics_absent() {
        let snap = normalize(&raw(json!({
            "sharesOutstanding": "0.0000000000000000001",
            "totalRevenue": 1e12,
            "bookValue": 4.0,
            "earningsHistory": {"2022": 1e12, "2023": 2}
        })));
        assert_eq!(snap.sales_per_share, None);
        assert_eq!(snap.book_value_per_share, Some(dec!(4.0)));
        let years: Vec<i32> = snap.eps_history.iter().map(|o| o.year).collect();
        assert_eq!(years, vec![2023]);
    }

    #[test]
    fn test_pe_derived_when_missing_or_zero() {
        let snap = normalize(&raw(json!({"currentPrice": 50, "trailingEps": 2.5, "trailingPE": 0})));
        assert_eq!(snap.pe_ratio, Some(dec!(20)));

        let snap = normalize(&raw(json!({"currentPrice": 50, "trailingEps": 2.5, "trailingPE": 18.2})));
        assert_eq!(snap.pe_ratio, Some(dec!(18.2)));

        let snap = normalize(&raw(json!({"currentPrice": 50, "trailingEps": 0})));
        assert_eq!(snap.pe_ratio, None);
    }

    #[test]
    fn test_price_falls_back_to_previous_close() {
        let snap = normalize(&raw(json!({"currentPrice": null, "previousClose": "101.5"})));
        assert_eq!(snap.price, Some(dec!(101.5)));

        let snap = normalize(&raw(json!({"currentPrice": 0, "regularMarketPrice": 99})));
        assert_eq!(snap.price, Some(dec!(99)));
    }

    #[test]
    fn test_per_share_metrics_derived_from_totals() {
        let snap = normalize(&raw(json!({
            "sharesOutstanding": 1000,
            "ebitda": 5000,
            "totalRevenue": "20000",
            "freeCashflow": 3000,
            "bookValue": 12.5,
        })));
        assert_eq!(snap.ebitda_per_share, Some(dec!(5)));
        assert_eq!(snap.sales_per_share, Some(dec!(20)));
        assert_eq!(snap.fcf_per_share, Some(dec!(3)));
        assert_eq!(snap.book_value_per_share, Some(dec!(12.5)));
    }

    #[test]
    fn test_missing_shares_leaves_metrics_absent() {
        let snap = normalize(&raw(json!({"ebitda": 5000, "sharesOutstanding": 0})));
        assert_eq!(snap.shares_outstanding, None);
        assert_eq!(snap.ebitda_per_share, None);
    }

    #[test]
    fn test_dividend_candidates_skip_non_positive() {
        let snap = normalize(&raw(json!({
            "dividendRate": 0,
            "trailingDividendsTtm": 3.0,
            "trailingAnnualDividendRate": "2.8",
        })));
        assert_eq!(snap.dividend_candidates.len(), 2);
        assert_eq!(snap.dividend(DividendSource::Ttm), Some(dec!(3.0)));
        assert_eq!(snap.dividend(DividendSource::Trailing), Some(dec!(2.8)));
        assert_eq!(snap.dividend(DividendSource::Forward), None);
    }

    #[test]
    fn test_eps_history_object_sorted_by_year() {
        let snap = normalize(&raw(json!({
            "epsHistory": {"2023": 3.0, "2021": 2.0, "2022": "bad", "2020": 1.5}
        })));
        let years: Vec<i32> = snap.eps_history.iter().map(|o| o.year).collect();
        assert_eq!(years, vec![2020, 2021, 2023]);
    }

    #[test]
    fn test_eps_history_from_earnings_totals() {
        let snap = normalize(&raw(json!({
            "sharesOutstanding": 100,
            "earningsHistory": [{"year": 2022, "value": 250}, {"year": 2023, "value": 300}]
        })));
        assert_eq!(snap.eps_history.len(), 2);
        assert_eq!(snap.eps_history[1].eps, dec!(3));
    }

    #[test]
    fn test_text_fields_and_currency() {
        let snap = normalize(&raw(json!({
            "symbol": "ENEL.MI",
            "shortName": "",
            "longName": "Enel SpA",
            "currency": "EUR",
            "sector": "Utilities",
        })));
        assert_eq!(snap.ticker.as_deref(), Some("ENEL.MI"));
        assert_eq!(snap.name.as_deref(), Some("Enel SpA"));
        assert_eq!(snap.currency, Some(Currency::EUR));
        assert_eq!(snap.sector.as_deref(), Some("Utilities"));
    }

    #[test]
    fn test_garbage_document_yields_empty_snapshot() {
        let snap = normalize(&raw(json!({
            "currentPrice": "—",
            "beta": "NaN",
            "payoutRatio": {"nested": true},
        })));
        assert_eq!(snap, FundamentalSnapshot::default());
    }
}
