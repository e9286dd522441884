use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Prices and per-share values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Multiples (e.g., 15x earnings)
pub type Multiple = Decimal;

/// Quote currency
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    GBP,
    #[default]
    USD,
    EUR,
    CHF,
    JPY,
    CAD,
    AUD,
    HKD,
    SGD,
    Other(String),
}

impl Currency {
    /// Map a provider currency code onto the enum; unknown codes are kept verbatim.
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        // pence sterling, quoted 1/100 of GBP
        if code == "GBp" {
            return Currency::Other(code.to_string());
        }
        match code.to_ascii_uppercase().as_str() {
            "GBP" => Currency::GBP,
            "USD" => Currency::USD,
            "EUR" => Currency::EUR,
            "CHF" => Currency::CHF,
            "JPY" => Currency::JPY,
            "CAD" => Currency::CAD,
            "AUD" => Currency::AUD,
            "HKD" => Currency::HKD,
            "SGD" => Currency::SGD,
            other => Currency::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Currency::Other(code) => write!(f, "{code}"),
            known => write!(f, "{known:?}"),
        }
    }
}

/// The valuation models the engine knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValuationModel {
    #[serde(rename = "DCF")]
    Dcf,
    #[serde(rename = "PE")]
    RelativePe,
    #[serde(rename = "DDM")]
    Ddm,
    #[serde(rename = "PBV")]
    PriceToBook,
    #[serde(rename = "PEBITDA")]
    PriceToEbitda,
    #[serde(rename = "PSALES")]
    PriceToSales,
    #[serde(rename = "PFCF")]
    PriceToFcf,
}

impl ValuationModel {
    pub const ALL: [ValuationModel; 7] = [
        ValuationModel::Dcf,
        ValuationModel::RelativePe,
        ValuationModel::Ddm,
        ValuationModel::PriceToBook,
        ValuationModel::PriceToEbitda,
        ValuationModel::PriceToSales,
        ValuationModel::PriceToFcf,
    ];
}

impl std::fmt::Display for ValuationModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValuationModel::Dcf => write!(f, "DCF-lite"),
            ValuationModel::RelativePe => write!(f, "P/E"),
            ValuationModel::Ddm => write!(f, "DDM"),
            ValuationModel::PriceToBook => write!(f, "P/BV"),
            ValuationModel::PriceToEbitda => write!(f, "P/EBITDA"),
            ValuationModel::PriceToSales => write!(f, "P/Sales"),
            ValuationModel::PriceToFcf => write!(f, "P/FCF"),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_from_code() {
        assert_eq!(Currency::from_code("eur"), Currency::EUR);
        assert_eq!(Currency::from_code(" USD "), Currency::USD);
        assert_eq!(
            Currency::from_code("GBp"),
            Currency::Other("GBp".to_string())
        );
        assert_eq!(
            Currency::from_code("SEK"),
            Currency::Other("SEK".to_string())
        );
    }

    #[test]
    fn test_model_keys_serialize_as_short_names() {
        let json = serde_json::to_string(&ValuationModel::RelativePe).unwrap();
        assert_eq!(json, "\"PE\"");
        let back: ValuationModel = serde_json::from_str("\"PFCF\"").unwrap();
        assert_eq!(back, ValuationModel::PriceToFcf);
    }

    #[test]
    fn test_currency_display() {
        assert_eq!(Currency::EUR.to_string(), "EUR");
        assert_eq!(Currency::Other("NOK".into()).to_string(), "NOK");
    }
}
