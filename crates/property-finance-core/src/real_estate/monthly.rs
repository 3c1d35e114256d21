use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::cash_flow::projection::{CashFlowSeries, PeriodicFlows};
use crate::time_value::{self, IrrConfig, IrrOutcome};
use crate::types::*;
use crate::PropertyFinanceResult;

const MONTHS_PER_YEAR: u32 = 12;

/// Monthly IRR settings: a 1% per-month starting guess.
pub fn default_monthly_irr() -> IrrConfig {
    IrrConfig {
        guess: dec!(0.01),
        ..IrrConfig::default()
    }
}

/// Level monthly cash flows discounted at the monthly equivalent of an
/// annual rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyDcfInput {
    /// Equity paid at month 0
    pub initial_investment: Money,
    pub monthly_rental_income: Money,
    pub monthly_expenses: Money,
    #[serde(default)]
    pub monthly_loan_payment: Money,
    pub analysis_period_years: u32,
    /// Effective annual discount rate
    pub annual_discount_rate: Rate,
    #[serde(default = "default_monthly_irr")]
    pub irr: IrrConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyDcfOutput {
    pub months: u32,
    pub monthly_net_cash_flow: Money,
    pub monthly_discount_rate: Rate,
    pub npv: Money,
    pub monthly_irr: IrrOutcome,
    /// Monthly IRR × 12
    pub nominal_annual_irr: Option<Rate>,
    /// (1 + monthly IRR)^12 − 1
    pub effective_annual_irr: Option<Rate>,
    pub cash_flows: CashFlowSeries,
}

pub fn analyze_monthly_dcf(
    input: &MonthlyDcfInput,
) -> PropertyFinanceResult<ComputationOutput<MonthlyDcfOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_non_negative("initial_investment", input.initial_investment)?;
    require_non_negative("monthly_rental_income", input.monthly_rental_income)?;
    require_non_negative("monthly_expenses", input.monthly_expenses)?;
    require_non_negative("monthly_loan_payment", input.monthly_loan_payment)?;

    let months = input.analysis_period_years.saturating_mul(MONTHS_PER_YEAR);
    let monthly_net_cash_flow =
        input.monthly_rental_income - input.monthly_expenses - input.monthly_loan_payment;
    let cash_flows = CashFlowSeries::project(
        input.initial_investment,
        &PeriodicFlows::Constant(monthly_net_cash_flow),
        months,
    )?;

    let monthly_discount_rate =
        time_value::periodic_rate_from_annual(input.annual_discount_rate, MONTHS_PER_YEAR)?;
    let npv = time_value::npv(monthly_discount_rate, cash_flows.flows())?;

    let monthly_irr = time_value::irr(cash_flows.flows(), &input.irr)?;
    if let Some(reason) = monthly_irr.describe_failure() {
        warnings.push(reason);
    }
    let (nominal_annual_irr, effective_annual_irr) = match monthly_irr.converged_rate() {
        Some(rate) => (
            Some(rate * Decimal::from(MONTHS_PER_YEAR)),
            Some(time_value::effective_annual_rate(rate, MONTHS_PER_YEAR)?),
        ),
        None => (None, None),
    };

    if monthly_net_cash_flow <= Decimal::ZERO {
        warnings.push("Monthly net cash flow is not positive".into());
    }

    let output = MonthlyDcfOutput {
        months,
        monthly_net_cash_flow,
        monthly_discount_rate,
        npv,
        monthly_irr,
        nominal_annual_irr,
        effective_annual_irr,
        cash_flows,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Monthly DCF (annual rate converted to monthly effective rate)",
        input,
        warnings,
        elapsed,
        output,
    ))
}
