//! Per-share multiples: metric per share times a target multiple. These views
//! are informational; the default combiner does not weight them.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::assumptions::TargetMultiples;
use crate::snapshot::FundamentalSnapshot;
use crate::types::{Money, Multiple, ValuationModel};

/// `metric * multiple`; an unknown or overflowing metric stays unknown.
pub fn multiple_fair_value(metric_per_share: Option<Money>, multiple: Multiple) -> Option<Money> {
    metric_per_share?.checked_mul(multiple)
}

/// P/BV, P/EBITDA, P/Sales and P/FCF fair values for a snapshot.
pub fn per_share_multiples(
    snapshot: &FundamentalSnapshot,
    targets: &TargetMultiples,
) -> BTreeMap<ValuationModel, Option<Money>> {
    let views: [(ValuationModel, Option<Decimal>, Multiple); 4] = [
        (ValuationModel::PriceToBook, snapshot.book_value_per_share, targets.price_book),
        (ValuationModel::PriceToEbitda, snapshot.ebitda_per_share, targets.price_ebitda),
        (ValuationModel::PriceToSales, snapshot.sales_per_share, targets.price_sales),
        (ValuationModel::PriceToFcf, snapshot.fcf_per_share, targets.price_fcf),
    ];
    views
        .into_iter()
        .map(|(model, metric, multiple)| (model, multiple_fair_value(metric, multiple)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_present_metrics_multiply() {
        let snap = FundamentalSnapshot {
            book_value_per_share: Some(dec!(20)),
            ebitda_per_share: Some(dec!(4)),
            sales_per_share: Some(dec!(30)),
            fcf_per_share: Some(dec!(2.5)),
            ..Default::default()
        };
        let out = per_share_multiples(&snap, &TargetMultiples::default());
        assert_eq!(out[&ValuationModel::PriceToBook], Some(dec!(30)));
        assert_eq!(out[&ValuationModel::PriceToEbitda], Some(dec!(40)));
        assert_eq!(out[&ValuationModel::PriceToSales], Some(dec!(60)));
        assert_eq!(out[&ValuationModel::PriceToFcf], Some(dec!(37.5)));
    }

    #[test]
    fn test_overflowing_metric_is_absent() {
        assert_eq!(multiple_fair_value(Some(Decimal::MAX), dec!(10)), None);
    }

    #[test]
    fn test_missing_metrics_stay_absent_not_zero() {
        let snap = FundamentalSnapshot {
            book_value_per_share: Some(dec!(10)),
            ..Default::default()
        };
        let out = per_share_multiples(&snap, &TargetMultiples::default());
        assert_eq!(out.len(), 4);
        assert_eq!(out[&ValuationModel::PriceToBook], Some(dec!(15)));
        assert_eq!(out[&ValuationModel::PriceToEbitda], None);
        assert_eq!(out[&ValuationModel::PriceToSales], None);
        assert_eq!(out[&ValuationModel::PriceToFcf], None);
    }
}
