pub mod assumptions;
pub mod error;
pub mod math;
pub mod snapshot;
pub mod types;

#[cfg(feature = "dividends")]
pub mod dividends;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "qualitative")]
pub mod qualitative;

#[cfg(feature = "verdict")]
pub mod verdict;

pub use error::ValuationError;
pub use types::*;

/// Standard result type for the fallible outer boundary of the engine
pub type EngineResult<T> = Result<T, ValuationError>;
