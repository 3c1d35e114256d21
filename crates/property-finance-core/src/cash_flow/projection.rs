use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PropertyFinanceError;
use crate::types::{require_non_negative, Money};
use crate::PropertyFinanceResult;

/// Net flows for periods 1..=horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodicFlows {
    /// The same net flow every period
    Constant(Money),
    /// One explicit net flow per period (rent escalation, irregular capex, ...)
    Schedule(Vec<Money>),
}

/// Signed cash flows for periods 0..=N.
///
/// Index 0 is the initial flow, negative for an outlay. The series cannot be
/// modified after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Money>", into = "Vec<Money>")]
pub struct CashFlowSeries {
    flows: Vec<Money>,
}

impl CashFlowSeries {
    /// `[-initial_outlay, p_1, ..., p_horizon]`.
    pub fn project(
        initial_outlay: Money,
        periodic: &PeriodicFlows,
        horizon: u32,
    ) -> PropertyFinanceResult<Self> {
        require_non_negative("initial_outlay", initial_outlay)?;
        require_horizon(horizon)?;

        let mut flows = Vec::with_capacity(horizon as usize + 1);
        flows.push(-initial_outlay);
        match periodic {
            PeriodicFlows::Constant(amount) => {
                flows.extend(std::iter::repeat(*amount).take(horizon as usize));
            }
            PeriodicFlows::Schedule(amounts) => {
                if amounts.len() != horizon as usize {
                    return Err(PropertyFinanceError::invalid(
                        "periodic",
                        format!(
                            "schedule has {} flows but the horizon is {horizon} periods",
                            amounts.len()
                        ),
                    ));
                }
                flows.extend_from_slice(amounts);
            }
        }

        Ok(CashFlowSeries { flows })
    }

    /// Build the periodic flows from a generator called with t = 1..=horizon.
    pub fn from_fn<F>(initial_outlay: Money, horizon: u32, mut generator: F) -> PropertyFinanceResult<Self>
    where
        F: FnMut(u32) -> Money,
    {
        let schedule = (1..=horizon).map(&mut generator).collect();
        Self::project(initial_outlay, &PeriodicFlows::Schedule(schedule), horizon)
    }

    /// Wrap an already-signed series.
    pub fn from_signed(flows: Vec<Money>) -> PropertyFinanceResult<Self> {
        if flows.is_empty() {
            return Err(PropertyFinanceError::InsufficientData(
                "cash flow series needs at least the period-0 flow".into(),
            ));
        }
        Ok(CashFlowSeries { flows })
    }

    pub fn flows(&self) -> &[Money] {
        &self.flows
    }

    /// Signed period-0 flow.
    pub fn initial(&self) -> Money {
        self.flows[0]
    }

    /// Flows for periods 1..=N.
    pub fn periodic(&self) -> &[Money] {
        &self.flows[1..]
    }

    /// Number of periods after period 0.
    pub fn horizon(&self) -> u32 {
        (self.flows.len() - 1) as u32
    }

    /// Undiscounted sum of every flow.
    pub fn total(&self) -> Money {
        self.flows.iter().copied().sum()
    }

    /// Sum of the positive periodic flows (cash actually distributed).
    pub fn distributed(&self) -> Money {
        self.periodic()
            .iter()
            .filter(|cf| **cf > Decimal::ZERO)
            .copied()
            .sum()
    }

    /// Running sum, same length as the series.
    pub fn cumulative(&self) -> Vec<Money> {
        self.flows
            .iter()
            .scan(Decimal::ZERO, |acc, cf| {
                *acc += *cf;
                Some(*acc)
            })
            .collect()
    }

    /// First period whose cumulative flow is strictly positive.
    pub fn payback_period(&self) -> Option<u32> {
        self.cumulative()
            .iter()
            .position(|c| *c > Decimal::ZERO)
            .map(|i| i as u32)
    }
}

impl TryFrom<Vec<Money>> for CashFlowSeries {
    type Error = PropertyFinanceError;

    fn try_from(flows: Vec<Money>) -> Result<Self, Self::Error> {
        Self::from_signed(flows)
    }
}

impl From<CashFlowSeries> for Vec<Money> {
    fn from(series: CashFlowSeries) -> Self {
        series.flows
    }
}

impl AsRef<[Money]> for CashFlowSeries {
    fn as_ref(&self) -> &[Money] {
        &self.flows
    }
}

fn require_horizon(horizon: u32) -> PropertyFinanceResult<()> {
    if horizon == 0 {
        return Err(PropertyFinanceError::invalid(
            "horizon",
            "Horizon must be at least 1 period",
        ));
    }
    Ok(())
}
