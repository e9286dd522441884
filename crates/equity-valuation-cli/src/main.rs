mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::fundamentals::{DividendArgs, NormalizeArgs};
use commands::models::{ClassifyArgs, DcfArgs, DdmArgs};
use commands::qualitative::ScoreArgs;
use commands::verdict::{CompareArgs, ValueArgs};

/// Equity fair-value estimates and qualitative verdicts
#[derive(Parser)]
#[command(
    name = "eqv",
    version,
    about = "Equity fair-value estimates and qualitative verdicts",
    long_about = "Values a single equity with DCF-lite, sector P/E, the Gordon dividend \
                  discount model and per-share multiples, blends them into one fair value, \
                  classifies the gap to the market price and scores a four-question \
                  qualitative checklist. All arithmetic uses decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log model declines and normalizer decisions to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a raw provider document into a fundamentals snapshot
    Normalize(NormalizeArgs),
    /// Pick the most trustworthy dividend per share
    Dividend(DividendArgs),
    /// DCF-lite fair value from EPS, payout and CAPM inputs
    Dcf(DcfArgs),
    /// Gordon dividend discount model
    Ddm(DdmArgs),
    /// Classify the gap between a fair value and the price
    Classify(ClassifyArgs),
    /// Score the four-question qualitative checklist
    Score(ScoreArgs),
    /// Full valuation of one ticker
    Value(ValueArgs),
    /// Valuation, qualitative score and summary sentence for one ticker
    Verdict(ValueArgs),
    /// Verdicts for several tickers side by side
    Compare(CompareArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Normalize(args) => commands::fundamentals::run_normalize(args),
        Commands::Dividend(args) => commands::fundamentals::run_dividend(args),
        Commands::Dcf(args) => commands::models::run_dcf(args),
        Commands::Ddm(args) => commands::models::run_ddm(args),
        Commands::Classify(args) => commands::models::run_classify(args),
        Commands::Score(args) => commands::qualitative::run_score(args),
        Commands::Value(args) => commands::verdict::run_value(args),
        Commands::Verdict(args) => commands::verdict::run_verdict(args),
        Commands::Compare(args) => commands::verdict::run_compare(args),
        Commands::Version => {
            println!("eqv {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
