mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::cash_flow::{CashFlowArgs, MonthlyDcfArgs};
use commands::financing::MortgageArgs;
use commands::investment::{AnalyzeArgs, ScreenArgs, TotalReturnArgs};
use commands::rental::RentalArgs;

/// Real estate investment analysis with decimal precision
#[derive(Parser)]
#[command(
    name = "pfa",
    version,
    about = "Real estate investment analysis with decimal precision",
    long_about = "A CLI for analysing rental property investments with decimal precision. \
                  Supports mortgage amortization, cash-flow projection, NPV, IRR, \
                  cap rate, GRM, DSCR and payback across multiple holding periods."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Diagnostic log level written to stderr (RUST_LOG takes precedence)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Full buy-and-hold analysis over several holding periods
    Analyze(AnalyzeArgs),
    /// Mortgage payment, totals and amortization schedule
    Mortgage(MortgageArgs),
    /// NPV, IRR, ROI and payback for an arbitrary cash-flow series
    CashFlows(CashFlowArgs),
    /// Monthly rental cash flow after vacancy and expenses
    RentalCashFlow(RentalArgs),
    /// Total return from rental income plus appreciation
    TotalReturn(TotalReturnArgs),
    /// Quick leveraged acquisition screen
    Screen(ScreenArgs),
    /// Monthly discounted cash flow with monthly IRR
    MonthlyDcf(MonthlyDcfArgs),
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

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::investment::run_analyze(args),
        Commands::Mortgage(args) => commands::financing::run_mortgage(args),
        Commands::CashFlows(args) => commands::cash_flow::run_cash_flows(args),
        Commands::RentalCashFlow(args) => commands::rental::run_rental_cash_flow(args),
        Commands::TotalReturn(args) => commands::investment::run_total_return(args),
        Commands::Screen(args) => commands::investment::run_screen(args),
        Commands::MonthlyDcf(args) => commands::cash_flow::run_monthly_dcf(args),
        Commands::Version => {
            println!("pfa {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
