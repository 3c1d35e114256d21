use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::projection::CashFlowSeries;
use crate::error::PropertyFinanceError;
use crate::time_value::{self, IrrConfig, IrrOutcome};
use crate::types::{require_rate_above_minus_one, with_metadata, ComputationOutput, Money, Rate};
use crate::PropertyFinanceResult;

/// NPV of a series at one discount rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountedValue {
    pub discount_rate: Rate,
    pub npv: Money,
}

/// Return metrics shared by every analysed series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesMetrics {
    /// NPV at each requested rate, in request order
    pub npv_by_rate: Vec<DiscountedValue>,
    pub irr: IrrOutcome,
    /// Converged IRR as a percentage
    pub irr_pct: Option<Decimal>,
    /// (distributed cash − initial investment) / initial investment × 100
    pub roi_pct: Option<Decimal>,
    pub cumulative_cash_flow: Vec<Money>,
    /// First period with positive cumulative cash flow
    pub payback_period: Option<u32>,
}

impl SeriesMetrics {
    pub fn npv_at(&self, rate: Rate) -> Option<Money> {
        self.npv_by_rate
            .iter()
            .find(|d| d.discount_rate == rate)
            .map(|d| d.npv)
    }
}

/// Input for evaluating an arbitrary signed cash-flow series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowAnalysisInput {
    /// Signed flows; index 0 is the initial flow (negative for an outlay)
    pub cash_flows: Vec<Money>,
    #[serde(default)]
    pub discount_rates: Vec<Rate>,
    #[serde(default)]
    pub irr: IrrConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowAnalysisOutput {
    pub periods: u32,
    pub undiscounted_total: Money,
    #[serde(flatten)]
    pub metrics: SeriesMetrics,
}

/// NPV / IRR / ROI / payback for a caller-supplied series.
pub fn evaluate_cash_flows(
    input: &CashFlowAnalysisInput,
) -> PropertyFinanceResult<ComputationOutput<CashFlowAnalysisOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.cash_flows.len() < 2 {
        return Err(PropertyFinanceError::InsufficientData(
            "at least an initial flow and one periodic flow are required".into(),
        ));
    }
    let series = CashFlowSeries::from_signed(input.cash_flows.clone())?;
    let initial_investment = -series.initial();
    if initial_investment <= Decimal::ZERO {
        warnings.push("Period-0 flow is not an outlay — ROI is undefined".into());
    }

    let metrics = series_metrics(
        &series,
        initial_investment,
        &input.discount_rates,
        &input.irr,
        &mut warnings,
    )?;

    let output = CashFlowAnalysisOutput {
        periods: series.horizon(),
        undiscounted_total: series.total(),
        metrics,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Discounted Cash Flow Analysis (NPV, Newton-Raphson IRR)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Metrics for one series. ROI counts only positive periodic flows as
/// distributed cash.
pub(crate) fn series_metrics(
    series: &CashFlowSeries,
    initial_investment: Money,
    discount_rates: &[Rate],
    irr_config: &IrrConfig,
    warnings: &mut Vec<String>,
) -> PropertyFinanceResult<SeriesMetrics> {
    let mut npv_by_rate = Vec::with_capacity(discount_rates.len());
    for &rate in discount_rates {
        require_rate_above_minus_one("discount_rates", rate)?;
        npv_by_rate.push(DiscountedValue {
            discount_rate: rate,
            npv: time_value::npv(rate, series.flows())?,
        });
    }

    let irr = time_value::irr(series.flows(), irr_config)?;
    if let Some(reason) = irr.describe_failure() {
        warnings.push(format!("{reason} (horizon {})", series.horizon()));
    }
    let irr_pct = irr.converged_percent();

    let roi_pct = if initial_investment > Decimal::ZERO {
        Some((series.distributed() - initial_investment) / initial_investment * dec!(100))
    } else {
        None
    };

    Ok(SeriesMetrics {
        npv_by_rate,
        irr_pct,
        irr,
        roi_pct,
        cumulative_cash_flow: series.cumulative(),
        payback_period: series.payback_period(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn lease_input() -> CashFlowAnalysisInput {
        let mut cash_flows = vec![dec!(-110000)];
        cash_flows.extend(std::iter::repeat(dec!(3200)).take(12));
        CashFlowAnalysisInput {
            cash_flows,
            discount_rates: vec![dec!(0.05), dec!(0.08), dec!(0.10)],
            irr: IrrConfig::default(),
        }
    }

    #[test]
    fn test_lease_metrics() {
        let out = evaluate_cash_flows(&lease_input()).unwrap();
        let r = &out.result;
        assert_eq!(r.periods, 12);
        assert_eq!(r.undiscounted_total, dec!(-71600));
        let npv8 = r.metrics.npv_at(dec!(0.08)).unwrap();
        assert!((npv8 - dec!(-85884.55)).abs() < dec!(0.01));
        assert!(r.metrics.irr.is_converged());
        // (38400 - 110000) / 110000 * 100
        let roi = r.metrics.roi_pct.unwrap();
        assert!((roi - dec!(-65.0909)).abs() < dec!(0.0001));
        assert_eq!(r.metrics.payback_period, None);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_zero_rate_npv_is_raw_sum() {
        let mut input = lease_input();
        input.discount_rates = vec![Decimal::ZERO];
        let out = evaluate_cash_flows(&input).unwrap();
        assert_eq!(
            out.result.metrics.npv_at(Decimal::ZERO),
            Some(out.result.undiscounted_total)
        );
    }

    #[test]
    fn test_unconverged_irr_produces_warning() {
        let mut input = lease_input();
        input.irr.max_iterations = 1;
        let out = evaluate_cash_flows(&input).unwrap();
        assert!(!out.result.metrics.irr.is_converged());
        assert!(out.result.metrics.irr_pct.is_none());
        assert!(out.warnings.iter().any(|w| w.contains("no convergence")));
    }

    #[test]
    fn test_rejects_discount_rate_at_minus_one() {
        let mut input = lease_input();
        input.discount_rates = vec![dec!(-1)];
        assert!(evaluate_cash_flows(&input).is_err());
    }

    #[test]
    fn test_payback_found() {
        let input = CashFlowAnalysisInput {
            cash_flows: vec![dec!(-1000), dec!(400), dec!(400), dec!(400)],
            discount_rates: vec![],
            irr: IrrConfig::default(),
        };
        let out = evaluate_cash_flows(&input).unwrap();
        assert_eq!(out.result.metrics.payback_period, Some(3));
        assert_eq!(out.result.metrics.roi_pct, Some(dec!(20)));
    }
}
