pub mod capm;
pub mod classify;
pub mod combine;
pub mod dcf_lite;
pub mod engine;
pub mod gordon;
pub mod growth;
pub mod multiples;
pub mod perpetuity;
pub mod relative_pe;

use serde::{Deserialize, Serialize};

/// Reason a model produced no fair value. Declining is never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declined(pub String);

impl Declined {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl std::fmt::Display for Declined {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a single model run.
pub type ModelOutcome<T> = Result<T, Declined>;

pub use classify::{classify, upside, VerdictBand};
pub use combine::{combine, combine_with, CombinedValue};
pub use engine::{evaluate, run_valuation, ValuationResult};
