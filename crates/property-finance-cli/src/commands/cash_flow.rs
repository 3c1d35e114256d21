use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use property_finance_core::cash_flow::analysis::{self, CashFlowAnalysisInput};
use property_finance_core::real_estate::monthly::{self, MonthlyDcfInput};
use property_finance_core::time_value::IrrConfig;

use crate::input;

/// Arguments for evaluating an arbitrary cash-flow series
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CashFlowArgs {
    /// Signed flows starting at period 0, comma separated (e.g. -1000,400,400,400)
    #[arg(long, value_delimiter = ',')]
    pub flows: Vec<Decimal>,

    /// Discount rates, comma separated
    #[arg(long, value_delimiter = ',')]
    pub discount_rates: Vec<Decimal>,

    /// IRR starting guess
    #[arg(long)]
    pub guess: Option<Decimal>,

    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the monthly DCF
#[derive(Args)]
pub struct MonthlyDcfArgs {
    /// Equity paid at month 0
    #[arg(long)]
    pub initial_investment: Option<Decimal>,

    #[arg(long)]
    pub monthly_rent: Option<Decimal>,

    #[arg(long)]
    pub monthly_expenses: Option<Decimal>,

    #[arg(long, default_value = "0")]
    pub monthly_loan_payment: Decimal,

    /// Analysis period in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Effective annual discount rate
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_cash_flows(args: CashFlowArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cf_input: CashFlowAnalysisInput = match input::load(args.input.as_deref())? {
        Some(data) => data,
        None => {
            if args.flows.is_empty() {
                return Err("--flows is required (or provide --input)".into());
            }
            let mut irr = IrrConfig::default();
            if let Some(guess) = args.guess {
                irr.guess = guess;
            }
            CashFlowAnalysisInput {
                cash_flows: args.flows,
                discount_rates: args.discount_rates,
                irr,
            }
        }
    };

    let result = analysis::evaluate_cash_flows(&cf_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_monthly_dcf(args: MonthlyDcfArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dcf_input: MonthlyDcfInput = match input::load(args.input.as_deref())? {
        Some(data) => data,
        None => monthly_input_from_flags(&args)?,
    };

    let result = monthly::analyze_monthly_dcf(&dcf_input)?;
    Ok(serde_json::to_value(result)?)
}

fn monthly_input_from_flags(
    args: &MonthlyDcfArgs,
) -> Result<MonthlyDcfInput, Box<dyn std::error::Error>> {
    Ok(MonthlyDcfInput {
        initial_investment: args
            .initial_investment
            .ok_or("--initial-investment is required (or provide --input)")?,
        monthly_rental_income: args
            .monthly_rent
            .ok_or("--monthly-rent is required (or provide --input)")?,
        monthly_expenses: args
            .monthly_expenses
            .ok_or("--monthly-expenses is required (or provide --input)")?,
        monthly_loan_payment: args.monthly_loan_payment,
        analysis_period_years: args
            .years
            .ok_or("--years is required (or provide --input)")?,
        annual_discount_rate: args
            .discount_rate
            .ok_or("--discount-rate is required (or provide --input)")?,
        irr: monthly::default_monthly_irr(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flags() -> MonthlyDcfArgs {
        MonthlyDcfArgs {
            initial_investment: Some(dec!(2250000)),
            monthly_rent: Some(dec!(75000)),
            monthly_expenses: Some(dec!(12000)),
            monthly_loan_payment: dec!(35230.34),
            years: Some(10),
            discount_rate: Some(dec!(0.10)),
            input: None,
        }
    }

    #[test]
    fn test_monthly_flags_use_monthly_irr_guess() {
        let dcf_input = monthly_input_from_flags(&flags()).unwrap();
        assert_eq!(dcf_input.irr.guess, dec!(0.01));
        assert_eq!(dcf_input.monthly_loan_payment, dec!(35230.34));
        assert_eq!(dcf_input.analysis_period_years, 10);
    }

    #[test]
    fn test_monthly_flags_missing_rent_rejected() {
        let mut args = flags();
        args.monthly_rent = None;
        let err = monthly_input_from_flags(&args).unwrap_err();
        assert!(err.to_string().contains("--monthly-rent"));
    }
}
