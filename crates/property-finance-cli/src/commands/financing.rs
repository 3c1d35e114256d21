use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use property_finance_core::financing::amortization::{self, MortgageInput};

use crate::input;

/// Arguments for the mortgage calculator
#[derive(Args)]
pub struct MortgageArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual rate (e.g. 0.065)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Schedule rows to include
    #[arg(long, default_value = "12", conflicts_with = "full_schedule")]
    pub schedule_periods: u32,

    /// Include every period of the amortization schedule
    #[arg(long)]
    pub full_schedule: bool,

    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_mortgage(args: MortgageArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mortgage_input: MortgageInput = match input::load(args.input.as_deref())? {
        Some(data) => data,
        None => MortgageInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_years: args.years.ok_or("--years is required (or provide --input)")?,
            schedule_periods: if args.full_schedule {
                None
            } else {
                Some(args.schedule_periods)
            },
        },
    };

    let result = amortization::analyze_mortgage(&mortgage_input)?;
    Ok(serde_json::to_value(result)?)
}
