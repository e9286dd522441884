use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assumptions::{CombinerMode, WeightTable};
use crate::types::{Money, ValuationModel};

/// Combined fair value and the normalized weights that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedValue {
    pub fair_value: Money,
    /// Weights over the present models only; they sum to 1
    pub weights: BTreeMap<ValuationModel, Decimal>,
}

/// Lowest and highest of the headline model values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBand {
    pub low: Money,
    pub high: Money,
}

/// Weighted fair value under the default blended weights.
pub fn combine(values: &BTreeMap<ValuationModel, Option<Money>>, ddm_available: bool) -> Option<Money> {
    combine_with(
        values,
        ddm_available,
        &WeightTable::for_mode(CombinerMode::Blended),
    )
    .map(|c| c.fair_value)
}

/// Weighted average over the models that are both weighted and present,
/// renormalized by the weight actually used. `None` when no weighted model
/// has a value.
pub fn combine_with(
    values: &BTreeMap<ValuationModel, Option<Money>>,
    ddm_available: bool,
    table: &WeightTable,
) -> Option<CombinedValue> {
    let present: Vec<(ValuationModel, Decimal, Money)> = table
        .select(ddm_available)
        .iter()
        .filter(|(_, w)| **w > Decimal::ZERO)
        .filter_map(|(model, w)| {
            values
                .get(model)
                .copied()
                .flatten()
                .map(|value| (*model, *w, value))
        })
        .collect();

    let total = present
        .iter()
        .try_fold(Decimal::ZERO, |acc, (_, w, _)| acc.checked_add(*w))?;
    if total.is_zero() {
        return None;
    }

    // Normalized weights; each term is bounded by its value
    let weights: BTreeMap<ValuationModel, Decimal> = present
        .iter()
        .map(|(model, w, _)| Some((*model, w.checked_div(total)?)))
        .collect::<Option<_>>()?;
    let fair_value = present.iter().try_fold(Decimal::ZERO, |acc, (model, _, v)| {
        acc.checked_add(weights.get(model)?.checked_mul(*v)?)
    })?;

    Some(CombinedValue {
        fair_value,
        weights,
    })
}

/// Min/max over the DCF-lite, relative P/E and DDM values that are present.
pub fn model_band(values: &BTreeMap<ValuationModel, Option<Money>>) -> Option<ModelBand> {
    let headline: Vec<Money> = [
        ValuationModel::Dcf,
        ValuationModel::RelativePe,
        ValuationModel::Ddm,
    ]
    .iter()
    .filter_map(|m| values.get(m).copied().flatten())
    .collect();

    let low = headline.iter().copied().min()?;
    let high = headline.iter().copied().max()?;
    Some(ModelBand { low, high })
}
