use serde::{Deserialize, Serialize};

use crate::assumptions::ValuationPolicy;
use crate::math::{cagr, clamp};
use crate::snapshot::EpsObservation;
use crate::types::Rate;

/// Where the explicit-period growth rate came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GrowthBasis {
    /// Historical EPS CAGR over the given window
    EpsCagr { years: u32 },
    /// No measurable history; the policy default was used
    Default,
}

/// Explicit-period growth g1 before and after clamping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthEstimate {
    pub unclamped: Rate,
    pub growth: Rate,
    pub basis: GrowthBasis,
}

/// EPS CAGR over a trailing window of `years`.
///
/// Uses the observation `years` steps before the latest one (or the oldest
/// available) as the start point. `None` with fewer than two observations or
/// non-positive endpoints.
pub fn eps_cagr(history: &[EpsObservation], years: u32) -> Option<Rate> {
    if history.len() < 2 {
        return None;
    }
    let mut sorted: Vec<&EpsObservation> = history.iter().collect();
    sorted.sort_by_key(|o| o.year);

    let len = sorted.len();
    let window = years as usize;
    let first = sorted[len.saturating_sub(window + 1)].eps;
    let last = sorted[len - 1].eps;
    let periods = window.min(len - 1) as u32;
    cagr(first, last, periods)
}

/// g1: EPS CAGR over the first window that yields one, else the default,
/// clamped to `[growth_floor, growth_cap]`.
pub fn explicit_growth(
    history: &[EpsObservation],
    growth_cap: Rate,
    policy: &ValuationPolicy,
) -> GrowthEstimate {
    let measured = policy
        .cagr_windows
        .iter()
        .find_map(|&years| eps_cagr(history, years).map(|g| (g, GrowthBasis::EpsCagr { years })));

    let (unclamped, basis) = measured.unwrap_or((policy.default_growth, GrowthBasis::Default));
    let growth = clamp(unclamped, policy.growth_floor, growth_cap);

    GrowthEstimate {
        unclamped,
        growth,
        basis,
    }
}
