use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PropertyFinanceError;
use crate::types::*;
use crate::PropertyFinanceResult;

const DEFAULT_TAX_RATE: Decimal = dec!(0.01);
const DEFAULT_INSURANCE_RATE: Decimal = dec!(0.003);
const DEFAULT_MAINTENANCE_SHARE: Decimal = dec!(0.10);
const DEFAULT_VACANCY_RATE: Decimal = dec!(0.05);

/// Monthly rental cash-flow inputs. Omitted expenses fall back to rules of
/// thumb: taxes 1% and insurance 0.3% of property value per year, maintenance
/// 10% of rent, vacancy 5%.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalCashFlowInput {
    pub monthly_rent: Money,
    #[serde(default)]
    pub monthly_mortgage_payment: Money,
    /// Needed only when taxes or insurance are omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_value: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_property_taxes: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_insurance: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_maintenance: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacancy_rate: Option<Rate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CashFlowStatus {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseBreakdown {
    pub mortgage_payment: Money,
    pub property_taxes: Money,
    pub insurance: Money,
    pub maintenance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalCashFlowOutput {
    /// Rent net of vacancy
    pub effective_rent: Money,
    pub total_expenses: Money,
    pub monthly_cash_flow: Money,
    pub annual_cash_flow: Money,
    pub cash_flow_status: CashFlowStatus,
    /// Gross rent that exactly covers expenses after vacancy
    pub break_even_rent: Option<Money>,
    pub vacancy_rate: Rate,
    pub expense_breakdown: ExpenseBreakdown,
}

/// Monthly cash flow of a rental after vacancy, debt service and expenses.
pub fn analyze_rental_cash_flow(
    input: &RentalCashFlowInput,
) -> PropertyFinanceResult<ComputationOutput<RentalCashFlowOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_non_negative("monthly_rent", input.monthly_rent)?;
    require_non_negative("monthly_mortgage_payment", input.monthly_mortgage_payment)?;

    let property_taxes = match input.monthly_property_taxes {
        Some(v) => v,
        None => {
            let value = property_value_for("monthly_property_taxes", input)?;
            warnings.push("Property taxes defaulted to 1% of value per year".into());
            value * DEFAULT_TAX_RATE / dec!(12)
        }
    };
    let insurance = match input.monthly_insurance {
        Some(v) => v,
        None => {
            let value = property_value_for("monthly_insurance", input)?;
            warnings.push("Insurance defaulted to 0.3% of value per year".into());
            value * DEFAULT_INSURANCE_RATE / dec!(12)
        }
    };
    let maintenance = input
        .monthly_maintenance
        .unwrap_or(input.monthly_rent * DEFAULT_MAINTENANCE_SHARE);
    let vacancy_rate = input.vacancy_rate.unwrap_or(DEFAULT_VACANCY_RATE);

    require_non_negative("monthly_property_taxes", property_taxes)?;
    require_non_negative("monthly_insurance", insurance)?;
    require_non_negative("monthly_maintenance", maintenance)?;
    require_fraction("vacancy_rate", vacancy_rate)?;

    let effective_rent = input.monthly_rent * (Decimal::ONE - vacancy_rate);
    let total_expenses = input.monthly_mortgage_payment + property_taxes + insurance + maintenance;
    let monthly_cash_flow = effective_rent - total_expenses;
    let annual_cash_flow = monthly_cash_flow * dec!(12);

    let cash_flow_status = if monthly_cash_flow > Decimal::ZERO {
        CashFlowStatus::Positive
    } else {
        CashFlowStatus::Negative
    };

    let break_even_rent = if vacancy_rate == Decimal::ONE {
        warnings.push("Vacancy rate of 100% — no rent covers expenses".into());
        None
    } else {
        Some(total_expenses / (Decimal::ONE - vacancy_rate))
    };

    if cash_flow_status == CashFlowStatus::Negative {
        warnings.push(format!(
            "Monthly cash flow of {monthly_cash_flow:.2} does not cover expenses"
        ));
    }

    let output = RentalCashFlowOutput {
        effective_rent,
        total_expenses,
        monthly_cash_flow,
        annual_cash_flow,
        cash_flow_status,
        break_even_rent,
        vacancy_rate,
        expense_breakdown: ExpenseBreakdown {
            mortgage_payment: input.monthly_mortgage_payment,
            property_taxes,
            insurance,
            maintenance,
        },
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Monthly Rental Cash Flow (effective rent less debt service and expenses)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn property_value_for(field: &str, input: &RentalCashFlowInput) -> PropertyFinanceResult<Money> {
    let value = input.property_value.ok_or_else(|| {
        PropertyFinanceError::InsufficientData(format!(
            "{field} omitted and no property_value to derive it from"
        ))
    })?;
    require_non_negative("property_value", value)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn explicit_input() -> RentalCashFlowInput {
        RentalCashFlowInput {
            monthly_rent: dec!(2000),
            monthly_mortgage_payment: dec!(1100),
            property_value: None,
            monthly_property_taxes: Some(dec!(250)),
            monthly_insurance: Some(dec!(75)),
            monthly_maintenance: Some(dec!(200)),
            vacancy_rate: Some(dec!(0.05)),
        }
    }

    #[test]
    fn test_explicit_expenses() {
        let out = analyze_rental_cash_flow(&explicit_input()).unwrap();
        let r = &out.result;
        assert_eq!(r.effective_rent, dec!(1900));
        assert_eq!(r.total_expenses, dec!(1625));
        assert_eq!(r.monthly_cash_flow, dec!(275));
        assert_eq!(r.annual_cash_flow, dec!(3300));
        assert_eq!(r.cash_flow_status, CashFlowStatus::Positive);
        // 1625 / 0.95
        let be = r.break_even_rent.unwrap();
        assert!((be - dec!(1710.526316)).abs() < dec!(0.000001));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_defaults_from_property_value() {
        let input = RentalCashFlowInput {
            monthly_rent: dec!(2000),
            monthly_mortgage_payment: Decimal::ZERO,
            property_value: Some(dec!(300000)),
            monthly_property_taxes: None,
            monthly_insurance: None,
            monthly_maintenance: None,
            vacancy_rate: None,
        };
        let out = analyze_rental_cash_flow(&input).unwrap();
        let b = &out.result.expense_breakdown;
        assert_eq!(b.property_taxes, dec!(250));
        assert_eq!(b.insurance, dec!(75));
        assert_eq!(b.maintenance, dec!(200));
        assert_eq!(out.result.vacancy_rate, dec!(0.05));
        assert_eq!(out.warnings.len(), 2);
    }

    #[test]
    fn test_missing_value_for_defaults() {
        let mut input = explicit_input();
        input.monthly_insurance = None;
        assert!(matches!(
            analyze_rental_cash_flow(&input),
            Err(PropertyFinanceError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_negative_cash_flow() {
        let mut input = explicit_input();
        input.monthly_mortgage_payment = dec!(2000);
        let out = analyze_rental_cash_flow(&input).unwrap();
        assert_eq!(out.result.cash_flow_status, CashFlowStatus::Negative);
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_full_vacancy_has_no_break_even() {
        let mut input = explicit_input();
        input.vacancy_rate = Some(Decimal::ONE);
        let out = analyze_rental_cash_flow(&input).unwrap();
        assert_eq!(out.result.break_even_rent, None);
    }
}
