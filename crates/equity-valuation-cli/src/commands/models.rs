use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Instant;

use equity_valuation_core::assumptions::{DdmRateMode, ModelAssumptions};
use equity_valuation_core::valuation::capm::required_return;
use equity_valuation_core::valuation::dcf_lite::{calculate_dcf_lite, DcfLiteInput, DcfLitePolicy};
use equity_valuation_core::valuation::gordon::{calculate_ddm, DdmInput, DdmPolicy};
use equity_valuation_core::valuation::{classify, upside};
use equity_valuation_core::with_metadata;

use crate::input;

/// Arguments for DCF-lite
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct DcfArgs {
    /// JSON file with a full DCF-lite input (overrides flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Earnings per share
    #[arg(long)]
    pub eps: Option<Decimal>,

    /// Payout ratio as a fraction; out-of-range values fall back to 0.4
    #[arg(long)]
    pub payout: Option<Decimal>,

    /// Equity beta (defaults to 1.0)
    #[arg(long)]
    pub beta: Option<Decimal>,

    /// Risk-free rate
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,

    /// Market risk premium
    #[arg(long)]
    pub mrp: Option<Decimal>,

    /// Explicit-period growth g1
    #[arg(long)]
    pub g1: Option<Decimal>,

    /// Terminal growth g2
    #[arg(long)]
    pub g2: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RateMode {
    Capm,
    Clamped,
}

impl From<RateMode> for DdmRateMode {
    fn from(m: RateMode) -> Self {
        match m {
            RateMode::Capm => DdmRateMode::Capm,
            RateMode::Clamped => DdmRateMode::Clamped,
        }
    }
}

/// Arguments for the Gordon dividend discount model
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct DdmArgs {
    /// JSON file with a full DDM input (overrides flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Dividend per share
    #[arg(long)]
    pub dps: Option<Decimal>,

    /// Current price (enables the minimum-yield check)
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Equity beta (defaults to 1.0)
    #[arg(long)]
    pub beta: Option<Decimal>,

    /// Risk-free rate
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,

    /// Market risk premium
    #[arg(long)]
    pub mrp: Option<Decimal>,

    /// Dividend growth before the 0..8% clamp
    #[arg(long)]
    pub growth: Option<Decimal>,

    /// How the discount rate is chosen
    #[arg(long, value_enum, default_value = "capm")]
    pub rate_mode: RateMode,
}

/// Arguments for verdict-band classification
#[derive(Args)]
pub struct ClassifyArgs {
    /// Current share price
    #[arg(long)]
    pub price: Decimal,

    /// Estimated fair value per share
    #[arg(long)]
    pub fair_value: Decimal,
}

pub fn run_dcf(args: DcfArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dcf_input: DcfLiteInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let assumptions = rate_assumptions(args.risk_free_rate, args.mrp)?;
        let defaults = ModelAssumptions::default();
        DcfLiteInput {
            eps: Some(args.eps.ok_or("--eps is required (or provide --input)")?),
            payout_ratio: args.payout,
            discount_rate: required_return(args.beta, &assumptions).rate,
            growth_rate: args.g1.unwrap_or(defaults.policy.default_growth),
            terminal_growth: args.g2.unwrap_or(defaults.terminal_growth),
            policy: DcfLitePolicy::default(),
        }
    };

    let result = calculate_dcf_lite(&dcf_input);
    Ok(serde_json::to_value(result)?)
}

pub fn run_ddm(args: DdmArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let ddm_input: DdmInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let assumptions = rate_assumptions(args.risk_free_rate, args.mrp)?;
        let policy = DdmPolicy {
            rate_mode: args.rate_mode.into(),
            ..DdmPolicy::default()
        };
        DdmInput {
            dps: Some(args.dps.ok_or("--dps is required (or provide --input)")?),
            price: args.price,
            required_return: required_return(args.beta, &assumptions).rate,
            growth_rate: args.growth.unwrap_or(assumptions.policy.default_growth),
            policy,
        }
    };

    let result = calculate_ddm(&ddm_input);
    Ok(serde_json::to_value(result)?)
}

pub fn run_classify(args: ClassifyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let gap = upside(args.fair_value, args.price)
        .ok_or("--price must be positive and the upside representable")?;
    let band = classify(gap);

    let elapsed = start.elapsed().as_micros() as u64;
    let out = with_metadata(
        "Five-band valuation gap classification",
        &serde_json::json!({
            "price": args.price.to_string(),
            "fair_value": args.fair_value.to_string(),
        }),
        Vec::new(),
        elapsed,
        serde_json::json!({
            "upside": gap.to_string(),
            "upside_pct": gap
                .checked_mul(Decimal::ONE_HUNDRED)
                .map(|pct| pct.round_dp(2).to_string()),
            "band": band,
            "label": band.label(),
        }),
    );
    Ok(serde_json::to_value(out)?)
}

fn rate_assumptions(
    risk_free_rate: Option<Decimal>,
    mrp: Option<Decimal>,
) -> Result<ModelAssumptions, Box<dyn std::error::Error>> {
    let mut a = ModelAssumptions::default();
    if let Some(rf) = risk_free_rate {
        a.risk_free_rate = rf;
    }
    if let Some(m) = mrp {
        a.market_risk_premium = m;
    }
    a.validate()?;
    Ok(a)
}
