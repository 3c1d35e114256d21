use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::cash_flow::analysis::{series_metrics, SeriesMetrics};
use crate::cash_flow::projection::{CashFlowSeries, PeriodicFlows};
use crate::error::PropertyFinanceError;
use crate::financing::amortization::{self, LoanTerms};
use crate::time_value::IrrConfig;
use crate::types::*;
use crate::PropertyFinanceResult;

pub fn default_horizons() -> Vec<u32> {
    vec![5, 10, 20]
}

pub fn default_discount_rates() -> Vec<Rate> {
    vec![dec!(0.05), dec!(0.08), dec!(0.10)]
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Buy-and-hold rental property assumptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentParameters {
    /// Purchase price / current value
    pub property_value: Money,
    /// Share of the price paid in cash (0.20 = 20% down)
    pub down_payment_fraction: Rate,
    pub loan_term_years: u32,
    /// Nominal annual mortgage rate
    pub annual_interest_rate: Rate,
    pub monthly_rent: Money,
    /// Annual property tax as a fraction of property value
    pub property_tax_rate: Rate,
    /// Annual maintenance as a fraction of property value
    pub maintenance_rate: Rate,
    pub insurance_cost_annual: Money,
    /// Management fee as a fraction of annual rent
    pub management_fee_fraction: Rate,
    /// Vacancy loss as a fraction of annual rent
    pub vacancy_rate: Rate,
    /// Holding periods to analyse, in years
    #[serde(default = "default_horizons")]
    pub analysis_horizons_years: Vec<u32>,
    #[serde(default = "default_discount_rates")]
    pub discount_rates: Vec<Rate>,
    /// Closing costs as a fraction of property value, paid up front
    #[serde(default)]
    pub closing_cost_fraction: Rate,
    /// Annual rent escalation
    #[serde(default)]
    pub rent_growth_rate: Rate,
    /// Annual growth of tax, maintenance and insurance
    #[serde(default)]
    pub expense_growth_rate: Rate,
    #[serde(default)]
    pub irr: IrrConfig,
}

/// Metrics for one holding period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonMetrics {
    pub horizon_years: u32,
    /// Signed annual flows, index 0 = −initial investment
    pub cash_flows: CashFlowSeries,
    #[serde(flatten)]
    pub metrics: SeriesMetrics,
}

/// Complete investment analysis output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentAnalysis {
    pub down_payment: Money,
    pub closing_costs: Money,
    /// Down payment + closing costs
    pub initial_investment: Money,
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
    /// Interest paid over the full loan term
    pub total_interest_over_term: Money,
    pub annual_rent: Money,
    /// Year-1 operating expenses including vacancy loss
    pub annual_expenses: Money,
    /// Annual rent − annual expenses (year 1)
    pub net_operating_income: Money,
    /// NOI − debt service (year 1)
    pub annual_cash_flow: Money,
    /// Year-1 cash flow / initial investment
    pub cash_on_cash_return: Option<Rate>,
    /// NOI / property value
    pub cap_rate: Rate,
    /// Property value / annual rent
    pub gross_rent_multiplier: Option<Multiple>,
    /// Annual rent / annual debt service
    pub debt_service_coverage_ratio: Option<Multiple>,
    pub horizons: Vec<HorizonMetrics>,
}

impl InvestmentAnalysis {
    pub fn horizon(&self, years: u32) -> Option<&HorizonMetrics> {
        self.horizons.iter().find(|h| h.horizon_years == years)
    }
}

/// Year-by-year operating model shared by every horizon.
struct OperatingModel<'a> {
    params: &'a InvestmentParameters,
    annual_rent: Money,
    fixed_expenses: Money,
    annual_debt_service: Money,
}

impl OperatingModel<'_> {
    /// Net cash flow in year `t` (1-based).
    fn net_cash_flow(&self, year: u32) -> PropertyFinanceResult<Money> {
        let p = self.params;
        let elapsed = (year - 1) as i64;
        let rent = self.annual_rent * grow(p.rent_growth_rate, elapsed)?;
        let fixed = self.fixed_expenses * grow(p.expense_growth_rate, elapsed)?;
        let variable = rent * (p.management_fee_fraction + p.vacancy_rate);
        let debt_service = if year <= p.loan_term_years {
            self.annual_debt_service
        } else {
            Decimal::ZERO
        };
        Ok(rent - fixed - variable - debt_service)
    }

    /// Constant flows unless growth or loan payoff changes them.
    fn is_level(&self, horizon: u32) -> bool {
        let p = self.params;
        p.rent_growth_rate.is_zero()
            && p.expense_growth_rate.is_zero()
            && (horizon <= p.loan_term_years || self.annual_debt_service.is_zero())
    }

    fn periodic_flows(&self, horizon: u32) -> PropertyFinanceResult<PeriodicFlows> {
        if self.is_level(horizon) {
            return Ok(PeriodicFlows::Constant(self.net_cash_flow(1)?));
        }
        let flows = (1..=horizon)
            .map(|year| self.net_cash_flow(year))
            .collect::<PropertyFinanceResult<Vec<_>>>()?;
        Ok(PeriodicFlows::Schedule(flows))
    }
}

fn grow(rate: Rate, years: i64) -> PropertyFinanceResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powi(years)
        .ok_or_else(|| PropertyFinanceError::NumericOverflow {
            context: format!("growth factor over {years} years"),
        })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Analyse a leveraged rental purchase over each requested horizon.
///
/// Amortisation gives the debt service, the projector turns the operating
/// model into an annual series per horizon, and each series is evaluated for
/// NPV at every discount rate, IRR, ROI and payback.
pub fn analyze_investment(
    params: &InvestmentParameters,
) -> PropertyFinanceResult<ComputationOutput<InvestmentAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_parameters(params, &mut warnings)?;

    // --- Financing ---
    let down_payment = params.property_value * params.down_payment_fraction;
    let closing_costs = params.property_value * params.closing_cost_fraction;
    let initial_investment = down_payment + closing_costs;
    let loan_amount = params.property_value - down_payment;

    let (monthly_payment, total_interest_over_term) = if loan_amount > Decimal::ZERO {
        let terms = LoanTerms::new(loan_amount, params.annual_interest_rate, params.loan_term_years)?;
        let payment = terms.payment()?;
        let schedule = amortization::build_schedule(
            terms.principal,
            terms.periodic_rate(),
            payment,
            terms.num_payments(),
        )?;
        let interest: Money = schedule.iter().map(|e| e.interest).sum();
        (payment, interest)
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };
    let annual_debt_service = monthly_payment * dec!(12);

    // --- Operating income (year 1) ---
    let annual_rent = params.monthly_rent * dec!(12);
    let fixed_expenses = params.property_value * params.property_tax_rate
        + params.property_value * params.maintenance_rate
        + params.insurance_cost_annual;
    let annual_expenses = fixed_expenses
        + annual_rent * params.management_fee_fraction
        + annual_rent * params.vacancy_rate;
    let net_operating_income = annual_rent - annual_expenses;
    let annual_cash_flow = net_operating_income - annual_debt_service;

    // --- Ratios ---
    let cap_rate = net_operating_income / params.property_value;
    let gross_rent_multiplier = if annual_rent.is_zero() {
        warnings.push("Annual rent is zero — gross rent multiplier undefined".into());
        None
    } else {
        Some(params.property_value / annual_rent)
    };
    let debt_service_coverage_ratio = if annual_debt_service.is_zero() {
        None
    } else {
        Some(annual_rent / annual_debt_service)
    };
    let cash_on_cash_return = if initial_investment.is_zero() {
        warnings.push("Initial investment is zero — cash-on-cash and ROI undefined".into());
        None
    } else {
        Some(annual_cash_flow / initial_investment)
    };

    // --- Warnings for unusual metrics ---
    if let Some(dscr) = debt_service_coverage_ratio {
        if dscr < dec!(1.2) {
            warnings.push(format!(
                "DSCR of {dscr:.2} is below 1.20x — lender covenant risk"
            ));
        }
    }
    if annual_cash_flow < Decimal::ZERO {
        warnings.push(format!(
            "Year-1 cash flow is negative ({annual_cash_flow:.2}) — the property does not carry its debt"
        ));
    }

    // --- Per-horizon projections ---
    let model = OperatingModel {
        params,
        annual_rent,
        fixed_expenses,
        annual_debt_service,
    };

    let mut horizons = Vec::with_capacity(params.analysis_horizons_years.len());
    for &horizon in &params.analysis_horizons_years {
        let periodic = model.periodic_flows(horizon)?;
        let cash_flows = CashFlowSeries::project(initial_investment, &periodic, horizon)?;
        let metrics = series_metrics(
            &cash_flows,
            initial_investment,
            &params.discount_rates,
            &params.irr,
            &mut warnings,
        )?;
        debug!(
            horizon,
            irr = ?metrics.irr,
            payback = ?metrics.payback_period,
            "horizon analysed"
        );
        horizons.push(HorizonMetrics {
            horizon_years: horizon,
            cash_flows,
            metrics,
        });
    }

    let output = InvestmentAnalysis {
        down_payment,
        closing_costs,
        initial_investment,
        loan_amount,
        monthly_payment,
        annual_debt_service,
        total_interest_over_term,
        annual_rent,
        annual_expenses,
        net_operating_income,
        annual_cash_flow,
        cash_on_cash_return,
        cap_rate,
        gross_rent_multiplier,
        debt_service_coverage_ratio,
        horizons,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Leveraged Rental Investment Analysis (amortisation, NPV, IRR, ROI)",
        params,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_parameters(
    params: &InvestmentParameters,
    warnings: &mut Vec<String>,
) -> PropertyFinanceResult<()> {
    require_positive("property_value", params.property_value)?;
    require_non_negative("monthly_rent", params.monthly_rent)?;
    require_non_negative("insurance_cost_annual", params.insurance_cost_annual)?;
    require_non_negative("annual_interest_rate", params.annual_interest_rate)?;

    require_fraction("down_payment_fraction", params.down_payment_fraction)?;
    require_fraction("property_tax_rate", params.property_tax_rate)?;
    require_fraction("maintenance_rate", params.maintenance_rate)?;
    require_fraction("management_fee_fraction", params.management_fee_fraction)?;
    require_fraction("vacancy_rate", params.vacancy_rate)?;
    require_fraction("closing_cost_fraction", params.closing_cost_fraction)?;

    require_rate_above_minus_one("rent_growth_rate", params.rent_growth_rate)?;
    require_rate_above_minus_one("expense_growth_rate", params.expense_growth_rate)?;

    if params.loan_term_years == 0 {
        return Err(PropertyFinanceError::invalid(
            "loan_term_years",
            "Loan term must be at least 1 year",
        ));
    }

    if params.analysis_horizons_years.is_empty() {
        return Err(PropertyFinanceError::InsufficientData(
            "at least one analysis horizon is required".into(),
        ));
    }
    if let Some(h) = params.analysis_horizons_years.iter().find(|h| **h == 0) {
        return Err(PropertyFinanceError::invalid(
            "analysis_horizons_years",
            format!("horizon must be at least 1 year, got {h}"),
        ));
    }
    for rate in &params.discount_rates {
        require_rate_above_minus_one("discount_rates", *rate)?;
    }

    if params.vacancy_rate > dec!(0.15) {
        warnings.push(format!(
            "Vacancy rate {:.1}% exceeds 15% — above typical market norms",
            params.vacancy_rate * dec!(100)
        ));
    }
    if let Some(h) = params
        .analysis_horizons_years
        .iter()
        .find(|h| **h > params.loan_term_years)
    {
        warnings.push(format!(
            "Horizon of {h} years exceeds the {}-year loan — debt service stops after payoff",
            params.loan_term_years
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
