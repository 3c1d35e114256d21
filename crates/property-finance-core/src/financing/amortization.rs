use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PropertyFinanceError;
use crate::types::{require_non_negative, require_positive, with_metadata, ComputationOutput, Money, Rate};
use crate::PropertyFinanceResult;

/// Periodic rates below this are treated as interest-free.
const ZERO_RATE_EPSILON: Decimal = dec!(0.0000000001);

const MONTHS_PER_YEAR: u32 = 12;

fn default_schedule_periods() -> Option<u32> {
    Some(12)
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Fixed-rate, fully amortising loan with monthly payments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Amount borrowed
    pub principal: Money,
    /// Nominal annual interest rate (e.g. 0.05 = 5%)
    pub annual_rate: Rate,
    /// Loan term in years
    pub term_years: u32,
}

impl LoanTerms {
    /// Validated loan terms.
    pub fn new(principal: Money, annual_rate: Rate, term_years: u32) -> PropertyFinanceResult<Self> {
        let terms = LoanTerms {
            principal,
            annual_rate,
            term_years,
        };
        terms.validate()?;
        Ok(terms)
    }

    pub fn validate(&self) -> PropertyFinanceResult<()> {
        require_positive("principal", self.principal)?;
        require_non_negative("annual_rate", self.annual_rate)?;
        if self.term_years == 0 {
            return Err(PropertyFinanceError::invalid(
                "term_years",
                "Loan term must be at least 1 year",
            ));
        }
        Ok(())
    }

    /// Monthly rate = annual / 12
    pub fn periodic_rate(&self) -> Rate {
        self.annual_rate / Decimal::from(MONTHS_PER_YEAR)
    }

    /// Number of monthly payments = years * 12
    pub fn num_payments(&self) -> u32 {
        self.term_years * MONTHS_PER_YEAR
    }

    pub fn payment(&self) -> PropertyFinanceResult<Money> {
        compute_payment(self.principal, self.periodic_rate(), self.num_payments())
    }
}

/// One row of an amortisation schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    /// 1-based payment number
    pub period: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    /// Balance outstanding after this payment
    pub balance: Money,
}

/// Input for the mortgage calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageInput {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_years: u32,
    /// Number of schedule rows to emit (`null` = full term). Totals always
    /// cover the full term.
    #[serde(default = "default_schedule_periods")]
    pub schedule_periods: Option<u32>,
}

/// Mortgage calculator output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageOutput {
    pub monthly_payment: Money,
    pub num_payments: u32,
    pub total_payments: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    /// Balance left after the final payment (≈0)
    pub final_balance: Money,
    pub amortization_schedule: Vec<AmortizationEntry>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Level payment for a loan: `P * r(1+r)^n / ((1+r)^n - 1)`.
///
/// A periodic rate within 1e-10 of zero falls back to straight-line
/// repayment `P / n`.
pub fn compute_payment(
    principal: Money,
    periodic_rate: Rate,
    num_periods: u32,
) -> PropertyFinanceResult<Money> {
    validate_loan_inputs(principal, periodic_rate, num_periods)?;

    if periodic_rate.abs() < ZERO_RATE_EPSILON {
        return Ok(principal / Decimal::from(num_periods));
    }

    let compound = (Decimal::ONE + periodic_rate)
        .checked_powi(num_periods as i64)
        .ok_or_else(|| PropertyFinanceError::NumericOverflow {
            context: "(1 + r)^n in loan payment".into(),
        })?;

    let numerator = principal * periodic_rate * compound;
    let denominator = compound - Decimal::ONE;

    if denominator.is_zero() {
        return Err(PropertyFinanceError::DivisionByZero {
            context: "mortgage payment denominator".into(),
        });
    }

    Ok(numerator / denominator)
}

/// Period-by-period split of each payment into interest and principal.
pub fn build_schedule(
    principal: Money,
    periodic_rate: Rate,
    payment: Money,
    num_periods: u32,
) -> PropertyFinanceResult<Vec<AmortizationEntry>> {
    validate_loan_inputs(principal, periodic_rate, num_periods)?;

    let mut schedule = Vec::with_capacity(num_periods as usize);
    let mut balance = principal;

    for period in 1..=num_periods {
        let interest = balance * periodic_rate;
        let principal_paid = payment - interest;
        balance -= principal_paid;
        schedule.push(AmortizationEntry {
            period,
            payment,
            interest,
            principal: principal_paid,
            balance,
        });
    }

    Ok(schedule)
}

/// Outstanding balance after `payments_made` level payments.
pub fn remaining_balance(terms: &LoanTerms, payments_made: u32) -> PropertyFinanceResult<Money> {
    terms.validate()?;
    let n = terms.num_payments();
    if payments_made >= n {
        return Ok(Decimal::ZERO);
    }

    let rate = terms.periodic_rate();
    let payment = terms.payment()?;
    let mut balance = terms.principal;
    for _ in 0..payments_made {
        balance -= payment - balance * rate;
    }
    Ok(balance)
}

/// Mortgage calculator: payment, full-term totals and a (capped) schedule.
pub fn analyze_mortgage(
    input: &MortgageInput,
) -> PropertyFinanceResult<ComputationOutput<MortgageOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let terms = LoanTerms::new(input.principal, input.annual_rate, input.term_years)?;
    let rate = terms.periodic_rate();
    let n = terms.num_payments();
    let monthly_payment = terms.payment()?;

    let full_schedule = build_schedule(terms.principal, rate, monthly_payment, n)?;

    let total_interest: Money = full_schedule.iter().map(|e| e.interest).sum();
    let total_principal: Money = full_schedule.iter().map(|e| e.principal).sum();
    let total_payments = monthly_payment * Decimal::from(n);
    let final_balance = full_schedule
        .last()
        .map(|e| e.balance)
        .unwrap_or(terms.principal);

    if input.annual_rate.is_zero() {
        warnings.push("Interest-free loan — straight-line repayment".into());
    }
    if input.annual_rate > dec!(0.15) {
        warnings.push(format!(
            "Annual rate {:.2}% exceeds 15% — verify loan terms",
            input.annual_rate * dec!(100)
        ));
    }

    let amortization_schedule = match input.schedule_periods {
        Some(cap) => full_schedule.into_iter().take(cap as usize).collect(),
        None => full_schedule,
    };

    let output = MortgageOutput {
        monthly_payment,
        num_payments: n,
        total_payments,
        total_interest,
        total_principal,
        final_balance,
        amortization_schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Fixed-Rate Mortgage Amortization (level monthly payment)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_loan_inputs(
    principal: Money,
    periodic_rate: Rate,
    num_periods: u32,
) -> PropertyFinanceResult<()> {
    require_positive("principal", principal)?;
    if periodic_rate < Decimal::ZERO {
        return Err(PropertyFinanceError::invalid(
            "periodic_rate",
            "Interest rate must not be negative",
        ));
    }
    if num_periods == 0 {
        return Err(PropertyFinanceError::invalid(
            "num_periods",
            "Number of periods must be > 0",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
