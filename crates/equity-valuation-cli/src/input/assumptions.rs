use clap::Args;
use rust_decimal::Decimal;

use equity_valuation_core::assumptions::ModelAssumptions;

use super::file;

/// Rate flags shared by the commands that take model assumptions. Flags
/// override values loaded from `--assumptions`.
#[derive(Args, Debug, Default)]
#[command(allow_hyphen_values = true)]
pub struct AssumptionArgs {
    /// Assumptions file (JSON, or YAML for .yaml/.yml)
    #[arg(long)]
    pub assumptions: Option<String>,

    /// Risk-free rate (e.g. 0.03 for 3%)
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,

    /// Market risk premium (e.g. 0.055 for 5.5%)
    #[arg(long, alias = "mrp")]
    pub market_risk_premium: Option<Decimal>,

    /// Cap on explicit-period growth g1
    #[arg(long)]
    pub growth_cap: Option<Decimal>,

    /// Terminal growth g2
    #[arg(long)]
    pub terminal_growth: Option<Decimal>,

    /// Discount rate replacing the CAPM rate
    #[arg(long)]
    pub discount_rate: Option<Decimal>,
}

impl AssumptionArgs {
    /// Defaults, then the file, then the flags; validated.
    pub fn resolve(&self) -> Result<ModelAssumptions, Box<dyn std::error::Error>> {
        let mut a = match self.assumptions.as_deref() {
            Some(path) => load(path)?,
            None => ModelAssumptions::default(),
        };
        if let Some(v) = self.risk_free_rate {
            a.risk_free_rate = v;
        }
        if let Some(v) = self.market_risk_premium {
            a.market_risk_premium = v;
        }
        if let Some(v) = self.growth_cap {
            a.growth_cap = v;
        }
        if let Some(v) = self.terminal_growth {
            a.terminal_growth = v;
        }
        if self.discount_rate.is_some() {
            a.discount_rate = self.discount_rate;
        }
        a.validate()?;
        Ok(a)
    }
}

/// Load assumptions from JSON, or YAML when the extension says so. Missing
/// fields keep their defaults.
pub fn load(path: &str) -> Result<ModelAssumptions, Box<dyn std::error::Error>> {
    let (canonical, contents) = file::read_text(path)?;
    let is_yaml = canonical
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    let assumptions: ModelAssumptions = if is_yaml {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };
    Ok(assumptions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn temp_file(name: &str, contents: &str) -> String {
        let path = std::env::temp_dir().join(format!("eqv-{}-{name}", std::process::id()));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_yaml_file_with_flag_override() {
        let path = temp_file(
            "a.yaml",
            "risk_free_rate: \"0.04\"\npolicy:\n  combiner_mode: earnings_and_dividends\n",
        );
        let args = AssumptionArgs {
            assumptions: Some(path),
            terminal_growth: Some(dec!(0.015)),
            ..Default::default()
        };
        let a = args.resolve().unwrap();
        assert_eq!(a.risk_free_rate, dec!(0.04));
        assert_eq!(a.terminal_growth, dec!(0.015));
        assert_eq!(a.market_risk_premium, dec!(0.055));
    }

    #[test]
    fn test_json_file() {
        let path = temp_file("a.json", r#"{"growth_cap": "0.10"}"#);
        let a = load(&path).unwrap();
        assert_eq!(a.growth_cap, dec!(0.10));
    }

    #[test]
    fn test_percent_flag_rejected() {
        let args = AssumptionArgs {
            risk_free_rate: Some(dec!(3)),
            ..Default::default()
        };
        assert!(args.resolve().is_err());
    }
}
