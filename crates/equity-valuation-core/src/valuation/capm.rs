use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assumptions::ModelAssumptions;
use crate::types::Rate;

/// The discount rate applied to a ticker and how it was obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredReturn {
    pub rate: Rate,
    /// Beta actually used (the default when the provider had none)
    pub beta_used: Decimal,
    /// True when the beta came from the policy default
    pub beta_defaulted: bool,
    /// True when an explicit discount-rate assumption replaced CAPM
    pub overridden: bool,
}

/// CAPM required return: r = Rf + beta * MRP, saturating at the `Decimal`
/// bounds.
pub fn capm_rate(risk_free_rate: Rate, beta: Decimal, market_risk_premium: Rate) -> Rate {
    risk_free_rate.saturating_add(beta.saturating_mul(market_risk_premium))
}

/// Required return for a ticker with the given (possibly unknown) beta.
pub fn required_return(beta: Option<Decimal>, assumptions: &ModelAssumptions) -> RequiredReturn {
    let (beta_used, beta_defaulted) = match beta {
        Some(b) => (b, false),
        None => (assumptions.policy.default_beta, true),
    };

    match assumptions.discount_rate {
        Some(rate) => RequiredReturn {
            rate,
            beta_used,
            beta_defaulted,
            overridden: true,
        },
        None => RequiredReturn {
            rate: capm_rate(
                assumptions.risk_free_rate,
                beta_used,
                assumptions.market_risk_premium,
            ),
            beta_used,
            beta_defaulted,
            overridden: false,
        },
    }
}
