use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use property_finance_core::real_estate::rental::{self, RentalCashFlowInput};

use crate::input;

/// Arguments for monthly rental cash flow
#[derive(Args)]
pub struct RentalArgs {
    /// Gross monthly rent
    #[arg(long)]
    pub rent: Option<Decimal>,

    /// Monthly mortgage payment
    #[arg(long, default_value = "0")]
    pub mortgage_payment: Decimal,

    /// Property value, used to default taxes and insurance
    #[arg(long)]
    pub property_value: Option<Decimal>,

    #[arg(long)]
    pub taxes: Option<Decimal>,

    #[arg(long)]
    pub insurance: Option<Decimal>,

    #[arg(long)]
    pub maintenance: Option<Decimal>,

    /// Vacancy as a fraction of rent (default 0.05)
    #[arg(long)]
    pub vacancy_rate: Option<Decimal>,

    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_rental_cash_flow(args: RentalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rental_input: RentalCashFlowInput = match input::load(args.input.as_deref())? {
        Some(data) => data,
        None => RentalCashFlowInput {
            monthly_rent: args.rent.ok_or("--rent is required (or provide --input)")?,
            monthly_mortgage_payment: args.mortgage_payment,
            property_value: args.property_value,
            monthly_property_taxes: args.taxes,
            monthly_insurance: args.insurance,
            monthly_maintenance: args.maintenance,
            vacancy_rate: args.vacancy_rate,
        },
    };

    let result = rental::analyze_rental_cash_flow(&rental_input)?;
    Ok(serde_json::to_value(result)?)
}
