use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PropertyFinanceError;
use crate::financing::amortization::LoanTerms;
use crate::types::*;
use crate::PropertyFinanceResult;

/// Cash-on-cash hurdle for a `Proceed` recommendation.
const PROCEED_HURDLE: Rate = dec!(0.06);

// ---------------------------------------------------------------------------
// Total return with appreciation
// ---------------------------------------------------------------------------

/// Hold-period return from rental income plus appreciation.
///
/// Omitted figures default to rules of thumb: 20% of value invested, 8% gross
/// yield, expenses 30% of rent, 3% appreciation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalReturnInput {
    pub property_value: Money,
    pub holding_period_years: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_investment: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_rental_income: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_expenses: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appreciation_rate: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalReturnOutput {
    pub initial_investment: Money,
    pub net_annual_income: Money,
    /// Net annual income / initial investment
    pub cash_on_cash_return: Rate,
    pub future_property_value: Money,
    pub total_appreciation: Money,
    /// Net income over the hold + appreciation
    pub total_return: Money,
    /// Total return / initial investment
    pub total_roi: Rate,
    /// (1 + total ROI)^(1/years) − 1; undefined when more than the
    /// investment is lost
    pub annualized_roi: Option<Rate>,
}

pub fn calculate_total_return(
    input: &TotalReturnInput,
) -> PropertyFinanceResult<ComputationOutput<TotalReturnOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_positive("property_value", input.property_value)?;
    require_holding_period(input.holding_period_years)?;

    let initial_investment = input
        .initial_investment
        .unwrap_or(input.property_value * dec!(0.20));
    let annual_rental_income = input
        .annual_rental_income
        .unwrap_or(input.property_value * dec!(0.08));
    let annual_expenses = input
        .annual_expenses
        .unwrap_or(annual_rental_income * dec!(0.30));
    let appreciation_rate = input.appreciation_rate.unwrap_or(dec!(0.03));

    require_positive("initial_investment", initial_investment)?;
    require_non_negative("annual_rental_income", annual_rental_income)?;
    require_non_negative("annual_expenses", annual_expenses)?;
    require_rate_above_minus_one("appreciation_rate", appreciation_rate)?;

    let years = input.holding_period_years;
    let net_annual_income = annual_rental_income - annual_expenses;
    let cash_on_cash_return = net_annual_income / initial_investment;

    let future_property_value = input.property_value * compound(appreciation_rate, years)?;
    let total_appreciation = future_property_value - input.property_value;

    let total_return = net_annual_income * Decimal::from(years) + total_appreciation;
    let total_roi = total_return / initial_investment;
    let annualized_roi = annualize(total_roi, years, &mut warnings)?;

    if net_annual_income < Decimal::ZERO {
        warnings.push("Expenses exceed rental income".into());
    }

    let output = TotalReturnOutput {
        initial_investment,
        net_annual_income,
        cash_on_cash_return,
        future_property_value,
        total_appreciation,
        total_return,
        total_roi,
        annualized_roi,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Total Return (net rental income + compound appreciation)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Acquisition screen
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentType {
    #[default]
    BuyHold,
    FixFlip,
    Rental,
    Commercial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancingAssumptions {
    pub down_payment_fraction: Rate,
    pub interest_rate: Rate,
    pub loan_term_years: u32,
    pub closing_cost_fraction: Rate,
}

impl Default for FinancingAssumptions {
    fn default() -> Self {
        FinancingAssumptions {
            down_payment_fraction: dec!(0.20),
            interest_rate: dec!(0.065),
            loan_term_years: 30,
            closing_cost_fraction: dec!(0.03),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketAssumptions {
    pub annual_appreciation: Rate,
    /// Gross annual rent as a fraction of property value
    pub rental_yield: Rate,
    pub vacancy_rate: Rate,
    /// Operating expenses as a fraction of effective rent
    pub expense_ratio: Rate,
}

impl Default for MarketAssumptions {
    fn default() -> Self {
        MarketAssumptions {
            annual_appreciation: dec!(0.035),
            rental_yield: dec!(0.08),
            vacancy_rate: dec!(0.05),
            expense_ratio: dec!(0.35),
        }
    }
}

fn default_analysis_period() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionScreenInput {
    pub property_value: Money,
    #[serde(default)]
    pub investment_type: InvestmentType,
    #[serde(default)]
    pub financing: FinancingAssumptions,
    #[serde(default)]
    pub market: MarketAssumptions,
    #[serde(default = "default_analysis_period")]
    pub analysis_period_years: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Proceed,
    Reconsider,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionScreenOutput {
    pub investment_type: InvestmentType,
    pub down_payment: Money,
    pub closing_costs: Money,
    pub initial_investment: Money,
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
    pub annual_rental_income: Money,
    pub effective_rental_income: Money,
    pub annual_expenses: Money,
    pub annual_cash_flow: Money,
    pub cash_on_cash_return: Rate,
    pub final_property_value: Money,
    pub total_appreciation: Money,
    pub total_cash_flow: Money,
    pub total_return: Money,
    pub total_roi: Rate,
    pub annualized_return: Option<Rate>,
    pub recommendation: Recommendation,
}

/// Quick leveraged buy-and-hold screen driven by yield and expense-ratio
/// assumptions; recommends `Proceed` above a 6% cash-on-cash return.
pub fn screen_acquisition(
    input: &AcquisitionScreenInput,
) -> PropertyFinanceResult<ComputationOutput<AcquisitionScreenOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let fin = &input.financing;
    let mkt = &input.market;

    require_positive("property_value", input.property_value)?;
    require_holding_period(input.analysis_period_years)?;
    require_fraction("down_payment_fraction", fin.down_payment_fraction)?;
    require_fraction("closing_cost_fraction", fin.closing_cost_fraction)?;
    require_non_negative("interest_rate", fin.interest_rate)?;
    require_fraction("vacancy_rate", mkt.vacancy_rate)?;
    require_fraction("expense_ratio", mkt.expense_ratio)?;
    require_non_negative("rental_yield", mkt.rental_yield)?;
    require_rate_above_minus_one("annual_appreciation", mkt.annual_appreciation)?;

    let down_payment = input.property_value * fin.down_payment_fraction;
    let closing_costs = input.property_value * fin.closing_cost_fraction;
    let initial_investment = down_payment + closing_costs;
    if initial_investment.is_zero() {
        return Err(PropertyFinanceError::DivisionByZero {
            context: "cash-on-cash return with no equity invested".into(),
        });
    }

    let loan_amount = input.property_value - down_payment;
    let monthly_payment = if loan_amount > Decimal::ZERO {
        LoanTerms::new(loan_amount, fin.interest_rate, fin.loan_term_years)?.payment()?
    } else {
        Decimal::ZERO
    };
    let annual_debt_service = monthly_payment * dec!(12);

    let annual_rental_income = input.property_value * mkt.rental_yield;
    let effective_rental_income = annual_rental_income * (Decimal::ONE - mkt.vacancy_rate);
    let annual_expenses = effective_rental_income * mkt.expense_ratio;
    let annual_cash_flow = effective_rental_income - annual_expenses - annual_debt_service;
    let cash_on_cash_return = annual_cash_flow / initial_investment;

    let years = input.analysis_period_years;
    let final_property_value = input.property_value * compound(mkt.annual_appreciation, years)?;
    let total_appreciation = final_property_value - input.property_value;

    let total_cash_flow = annual_cash_flow * Decimal::from(years);
    let total_return = total_cash_flow + total_appreciation;
    let total_roi = total_return / initial_investment;
    let annualized_return = annualize(total_roi, years, &mut warnings)?;

    if years > fin.loan_term_years && loan_amount > Decimal::ZERO {
        warnings.push("Analysis period outlasts the loan; debt service is held constant".into());
    }

    let recommendation = if cash_on_cash_return > PROCEED_HURDLE {
        Recommendation::Proceed
    } else {
        Recommendation::Reconsider
    };

    let output = AcquisitionScreenOutput {
        investment_type: input.investment_type.clone(),
        down_payment,
        closing_costs,
        initial_investment,
        loan_amount,
        monthly_payment,
        annual_debt_service,
        annual_rental_income,
        effective_rental_income,
        annual_expenses,
        annual_cash_flow,
        cash_on_cash_return,
        final_property_value,
        total_appreciation,
        total_cash_flow,
        total_return,
        total_roi,
        annualized_return,
        recommendation,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Acquisition Screen (yield-based buy-and-hold with leverage)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn require_holding_period(years: u32) -> PropertyFinanceResult<()> {
    if years == 0 {
        return Err(PropertyFinanceError::invalid(
            "holding_period_years",
            "Holding period must be at least 1 year",
        ));
    }
    Ok(())
}

fn compound(rate: Rate, years: u32) -> PropertyFinanceResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powi(years as i64)
        .ok_or_else(|| PropertyFinanceError::NumericOverflow {
            context: format!("compounding over {years} years"),
        })
}

fn annualize(
    total_roi: Rate,
    years: u32,
    warnings: &mut Vec<String>,
) -> PropertyFinanceResult<Option<Rate>> {
    let growth = Decimal::ONE + total_roi;
    if growth <= Decimal::ZERO {
        warnings.push("Total loss exceeds the investment; annualised return undefined".into());
        return Ok(None);
    }
    let exponent = Decimal::ONE / Decimal::from(years);
    let factor = growth
        .checked_powd(exponent)
        .ok_or_else(|| PropertyFinanceError::NumericOverflow {
            context: "annualising total return".into(),
        })?;
    Ok(Some(factor - Decimal::ONE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_total_return_with_defaults() {
        let input = TotalReturnInput {
            property_value: dec!(500000),
            holding_period_years: 10,
            initial_investment: None,
            annual_rental_income: None,
            annual_expenses: None,
            appreciation_rate: None,
        };
        let out = calculate_total_return(&input).unwrap();
        let r = &out.result;
        assert_eq!(r.initial_investment, dec!(100000));
        // 40000 rent - 12000 expenses
        assert_eq!(r.net_annual_income, dec!(28000));
        assert_eq!(r.cash_on_cash_return, dec!(0.28));
        // 500000 * 1.03^10 = 671958.19
        assert!((r.future_property_value - dec!(671958.19)).abs() < dec!(0.01));
        assert!((r.total_return - dec!(451958.19)).abs() < dec!(0.01));
        let ann = r.annualized_roi.unwrap();
        // (1 + 4.5195819)^(1/10) - 1 ≈ 0.18629
        assert!((ann - dec!(0.18629)).abs() < dec!(0.0001), "annualized {ann}");
    }

    #[test]
    fn test_total_return_rejects_zero_period() {
        let input = TotalReturnInput {
            property_value: dec!(500000),
            holding_period_years: 0,
            initial_investment: None,
            annual_rental_income: None,
            annual_expenses: None,
            appreciation_rate: None,
        };
        assert!(calculate_total_return(&input).is_err());
    }

    #[test]
    fn test_total_loss_has_no_annualized_return() {
        let input = TotalReturnInput {
            property_value: dec!(100000),
            holding_period_years: 5,
            initial_investment: Some(dec!(10000)),
            annual_rental_income: Some(dec!(0)),
            annual_expenses: Some(dec!(5000)),
            appreciation_rate: Some(dec!(-0.10)),
        };
        let out = calculate_total_return(&input).unwrap();
        assert_eq!(out.result.annualized_roi, None);
        assert!(out.warnings.len() >= 2);
    }

    #[test]
    fn test_screen_with_default_assumptions() {
        let input = AcquisitionScreenInput {
            property_value: dec!(400000),
            investment_type: InvestmentType::BuyHold,
            financing: FinancingAssumptions::default(),
            market: MarketAssumptions::default(),
            analysis_period_years: 10,
        };
        let out = screen_acquisition(&input).unwrap();
        let r = &out.result;
        assert_eq!(r.down_payment, dec!(80000));
        assert_eq!(r.closing_costs, dec!(12000));
        assert_eq!(r.initial_investment, dec!(92000));
        assert_eq!(r.loan_amount, dec!(320000));
        // 320k at 6.5% over 30 years ≈ 2022.62 / month
        assert!((r.monthly_payment - dec!(2022.62)).abs() < dec!(0.01));
        assert_eq!(r.annual_rental_income, dec!(32000));
        assert_eq!(r.effective_rental_income, dec!(30400));
        assert_eq!(r.annual_expenses, dec!(10640));
        // 19760 NOI - 24271.41 debt service
        assert!((r.annual_cash_flow - dec!(-4511.41)).abs() < dec!(0.01));
        assert_eq!(r.recommendation, Recommendation::Reconsider);
        assert!(r.annualized_return.is_some());
    }

    #[test]
    fn test_screen_all_cash_proceeds() {
        let input = AcquisitionScreenInput {
            property_value: dec!(400000),
            investment_type: InvestmentType::Rental,
            financing: FinancingAssumptions {
                down_payment_fraction: Decimal::ONE,
                closing_cost_fraction: Decimal::ZERO,
                ..FinancingAssumptions::default()
            },
            market: MarketAssumptions {
                rental_yield: dec!(0.12),
                expense_ratio: dec!(0.30),
                vacancy_rate: Decimal::ZERO,
                ..MarketAssumptions::default()
            },
            analysis_period_years: 5,
        };
        let out = screen_acquisition(&input).unwrap();
        let r = &out.result;
        assert_eq!(r.monthly_payment, Decimal::ZERO);
        // 48000 * 0.7 / 400000 = 8.4%
        assert_eq!(r.cash_on_cash_return, dec!(0.084));
        assert_eq!(r.recommendation, Recommendation::Proceed);
    }

    #[test]
    fn test_screen_defaults_from_json() {
        let input: AcquisitionScreenInput =
            serde_json::from_str(r#"{ "property_value": "250000" }"#).unwrap();
        assert_eq!(input.analysis_period_years, 10);
        assert_eq!(input.investment_type, InvestmentType::BuyHold);
        assert_eq!(input.financing.loan_term_years, 30);
        assert_eq!(input.market.expense_ratio, dec!(0.35));
    }
}
