use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use property_finance_core::real_estate::investment::{self, InvestmentParameters};
use property_finance_core::real_estate::returns::{
    self, AcquisitionScreenInput, FinancingAssumptions, InvestmentType, MarketAssumptions,
    TotalReturnInput,
};
use property_finance_core::time_value::IrrConfig;

use crate::input;

/// Arguments for the full buy-and-hold analysis
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AnalyzeArgs {
    /// Purchase price
    #[arg(long)]
    pub property_value: Option<Decimal>,

    /// Down payment as a fraction of price (e.g. 0.20)
    #[arg(long, alias = "down")]
    pub down_payment: Option<Decimal>,

    /// Loan term in years
    #[arg(long)]
    pub loan_term: Option<u32>,

    /// Nominal annual mortgage rate (e.g. 0.05)
    #[arg(long)]
    pub interest_rate: Option<Decimal>,

    /// Gross monthly rent
    #[arg(long)]
    pub monthly_rent: Option<Decimal>,

    /// Annual property tax as a fraction of value
    #[arg(long, default_value = "0.01")]
    pub property_tax_rate: Decimal,

    /// Annual maintenance as a fraction of value
    #[arg(long, default_value = "0.01")]
    pub maintenance_rate: Decimal,

    /// Annual insurance cost
    #[arg(long, default_value = "0")]
    pub insurance: Decimal,

    /// Management fee as a fraction of rent
    #[arg(long, default_value = "0")]
    pub management_fee: Decimal,

    /// Vacancy as a fraction of rent
    #[arg(long, default_value = "0.05")]
    pub vacancy_rate: Decimal,

    /// Holding periods in years, comma separated (default 5,10,20)
    #[arg(long, value_delimiter = ',')]
    pub horizons: Vec<u32>,

    /// Discount rates, comma separated (default 0.05,0.08,0.10)
    #[arg(long, value_delimiter = ',')]
    pub discount_rates: Vec<Decimal>,

    /// Closing costs as a fraction of price
    #[arg(long, default_value = "0")]
    pub closing_costs: Decimal,

    /// Annual rent growth
    #[arg(long, default_value = "0")]
    pub rent_growth: Decimal,

    /// Annual growth of tax, maintenance and insurance
    #[arg(long, default_value = "0")]
    pub expense_growth: Decimal,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the total-return calculator
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct TotalReturnArgs {
    #[arg(long)]
    pub property_value: Option<Decimal>,

    /// Holding period in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Equity invested (default 20% of value)
    #[arg(long)]
    pub initial_investment: Option<Decimal>,

    /// Annual rental income (default 8% of value)
    #[arg(long)]
    pub rental_income: Option<Decimal>,

    /// Annual expenses (default 30% of rental income)
    #[arg(long)]
    pub expenses: Option<Decimal>,

    /// Annual appreciation (default 0.03)
    #[arg(long)]
    pub appreciation: Option<Decimal>,

    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the quick acquisition screen
#[derive(Args)]
pub struct ScreenArgs {
    #[arg(long)]
    pub property_value: Option<Decimal>,

    /// Analysis period in years
    #[arg(long, default_value = "10")]
    pub years: u32,

    /// Gross rental yield (e.g. 0.08)
    #[arg(long)]
    pub rental_yield: Option<Decimal>,

    /// Path to JSON/YAML input file with financing and market assumptions
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params: InvestmentParameters = match input::load(args.input.as_deref())? {
        Some(params) => params,
        None => InvestmentParameters {
            property_value: args
                .property_value
                .ok_or("--property-value is required (or provide --input)")?,
            down_payment_fraction: args
                .down_payment
                .ok_or("--down-payment is required (or provide --input)")?,
            loan_term_years: args
                .loan_term
                .ok_or("--loan-term is required (or provide --input)")?,
            annual_interest_rate: args
                .interest_rate
                .ok_or("--interest-rate is required (or provide --input)")?,
            monthly_rent: args
                .monthly_rent
                .ok_or("--monthly-rent is required (or provide --input)")?,
            property_tax_rate: args.property_tax_rate,
            maintenance_rate: args.maintenance_rate,
            insurance_cost_annual: args.insurance,
            management_fee_fraction: args.management_fee,
            vacancy_rate: args.vacancy_rate,
            analysis_horizons_years: if args.horizons.is_empty() {
                investment::default_horizons()
            } else {
                args.horizons
            },
            discount_rates: if args.discount_rates.is_empty() {
                investment::default_discount_rates()
            } else {
                args.discount_rates
            },
            closing_cost_fraction: args.closing_costs,
            rent_growth_rate: args.rent_growth,
            expense_growth_rate: args.expense_growth,
            irr: IrrConfig::default(),
        },
    };

    let result = investment::analyze_investment(&params)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_total_return(args: TotalReturnArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let total_input: TotalReturnInput = match input::load(args.input.as_deref())? {
        Some(data) => data,
        None => TotalReturnInput {
            property_value: args
                .property_value
                .ok_or("--property-value is required (or provide --input)")?,
            holding_period_years: args
                .years
                .ok_or("--years is required (or provide --input)")?,
            initial_investment: args.initial_investment,
            annual_rental_income: args.rental_income,
            annual_expenses: args.expenses,
            appreciation_rate: args.appreciation,
        },
    };

    let result = returns::calculate_total_return(&total_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_screen(args: ScreenArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let screen_input: AcquisitionScreenInput = match input::load(args.input.as_deref())? {
        Some(data) => data,
        None => {
            let mut market = MarketAssumptions::default();
            if let Some(rental_yield) = args.rental_yield {
                market.rental_yield = rental_yield;
            }
            AcquisitionScreenInput {
                property_value: args
                    .property_value
                    .ok_or("--property-value is required (or provide --input)")?,
                investment_type: InvestmentType::default(),
                financing: FinancingAssumptions::default(),
                market,
                analysis_period_years: args.years,
            }
        }
    };

    let result = returns::screen_acquisition(&screen_input)?;
    Ok(serde_json::to_value(result)?)
}
