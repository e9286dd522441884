use clap::Args;
use serde_json::Value;

use equity_valuation_core::qualitative::{calculate_qualitative_score, QualitativeAnswers};

use crate::input;

/// Arguments for the qualitative checklist. Omitted flags count as "no".
#[derive(Args)]
pub struct ScoreArgs {
    /// JSON file with the four answers (overrides flags)
    #[arg(long)]
    pub input: Option<String>,

    /// The business has a durable competitive advantage
    #[arg(long)]
    pub moat: bool,

    /// The financial position is solid
    #[arg(long)]
    pub solid_financials: bool,

    /// Earnings are growing
    #[arg(long)]
    pub growing_earnings: bool,

    /// Management is competent
    #[arg(long)]
    pub good_management: bool,
}

pub fn run_score(args: ScoreArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let answers: QualitativeAnswers = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else {
        QualitativeAnswers {
            durable_competitive_advantage: args.moat,
            solid_financials: args.solid_financials,
            growing_earnings: args.growing_earnings,
            competent_management: args.good_management,
        }
    };

    let result = calculate_qualitative_score(&answers);
    Ok(serde_json::to_value(result)?)
}
