use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PropertyFinanceError;
use crate::types::{to_percent, Money, Rate};
use crate::PropertyFinanceResult;

/// Newton iterates are kept inside this band so discount factors stay finite.
const MIN_IRR_RATE: Decimal = dec!(-0.99);
const MAX_IRR_RATE: Decimal = dec!(10.0);
/// Halvings allowed to pull one Newton step back inside the band.
const MAX_STEP_HALVINGS: u32 = 64;
/// Consecutive shortened steps after which the iteration is declared divergent.
const MAX_DAMPED_STEPS: u32 = 20;

/// Net Present Value of a series of cash flows.
///
/// `cash_flows[0]` is the signed flow at t = 0 (negative for an outlay) and is
/// not discounted: `NPV = sum CF_t / (1 + rate)^t` for t = 0..n.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> PropertyFinanceResult<Money> {
    if rate <= dec!(-1) {
        return Err(PropertyFinanceError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r).ok_or_else(|| {
                PropertyFinanceError::NumericOverflow {
                    context: format!("NPV discount factor at period {t}"),
                }
            })?;
        }
        if discount.is_zero() {
            return Err(PropertyFinanceError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result = cf
            .checked_div(discount)
            .and_then(|pv| result.checked_add(pv))
            .ok_or_else(|| PropertyFinanceError::NumericOverflow {
                context: format!("NPV present value at period {t}"),
            })?;
    }

    Ok(result)
}

/// NPV(r) = sum CF_t / (1+r)^t and its derivative d(NPV)/dr.
///
/// Returns `None` when a discount factor or term leaves the Decimal range.
pub fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Money, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE; // 1 / (1+r)^t

    for (t, cf) in cash_flows.iter().enumerate() {
        let pv = cf.checked_mul(discount)?;
        npv = npv.checked_add(pv)?;
        if t > 0 {
            // d/dr of CF_t / (1+r)^t = -t * CF_t / (1+r)^(t+1)
            let term = pv
                .checked_mul(Decimal::from(t as i64))?
                .checked_div(one_plus_r)?;
            dnpv = dnpv.checked_sub(term)?;
        }
        discount = discount.checked_div(one_plus_r)?;
    }

    Some((npv, dnpv))
}

// ---------------------------------------------------------------------------
// IRR
// ---------------------------------------------------------------------------

/// Newton-Raphson settings for the IRR solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IrrConfig {
    /// Starting rate for the iteration
    pub guess: Rate,
    /// Iteration budget
    pub max_iterations: u32,
    /// Step size below which the iteration has converged; also the floor
    /// for |dNPV/dr| below which no reliable step can be taken
    pub tolerance: Decimal,
}

impl Default for IrrConfig {
    fn default() -> Self {
        IrrConfig {
            guess: dec!(0.10),
            max_iterations: 1000,
            tolerance: dec!(0.0000001),
        }
    }
}

/// How an IRR solve ended.
///
/// Only `Converged` carries a true root of NPV. The other variants keep the
/// solver's best guess (where one exists) so callers can decide whether an
/// approximate answer is acceptable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IrrOutcome {
    /// Successive iterates moved less than the tolerance.
    Converged { rate: Rate, iterations: u32 },
    /// dNPV/dr fell below the tolerance; `rate` is the last iterate.
    FlatDerivative { rate: Rate, iterations: u32 },
    /// Iteration budget exhausted.
    MaxIterationsExceeded { last_guess: Rate, iterations: u32 },
    /// Newton kept pushing the iterate out of the admissible band (20
    /// consecutive shortened steps), or no representable NPV was reachable.
    Diverged { last_guess: Rate, iterations: u32 },
    /// All flows share one sign, so NPV has no root.
    NoSignChange,
}

impl IrrOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, IrrOutcome::Converged { .. })
    }

    /// The converged rate, or `None` for any other outcome.
    pub fn converged_rate(&self) -> Option<Rate> {
        match self {
            IrrOutcome::Converged { rate, .. } => Some(*rate),
            _ => None,
        }
    }

    /// Best available rate, converged or not.
    pub fn rate(&self) -> Option<Rate> {
        match self {
            IrrOutcome::Converged { rate, .. } | IrrOutcome::FlatDerivative { rate, .. } => {
                Some(*rate)
            }
            IrrOutcome::MaxIterationsExceeded { last_guess, .. }
            | IrrOutcome::Diverged { last_guess, .. } => Some(*last_guess),
            IrrOutcome::NoSignChange => None,
        }
    }

    /// Converged rate as a percentage.
    pub fn converged_percent(&self) -> Option<Decimal> {
        self.converged_rate().map(to_percent)
    }

    pub fn iterations(&self) -> u32 {
        match self {
            IrrOutcome::Converged { iterations, .. }
            | IrrOutcome::FlatDerivative { iterations, .. }
            | IrrOutcome::MaxIterationsExceeded { iterations, .. }
            | IrrOutcome::Diverged { iterations, .. } => *iterations,
            IrrOutcome::NoSignChange => 0,
        }
    }

    /// Human-readable reason for a non-converged outcome.
    pub fn describe_failure(&self) -> Option<String> {
        match self {
            IrrOutcome::Converged { .. } => None,
            IrrOutcome::FlatDerivative { rate, iterations } => Some(format!(
                "IRR: derivative near zero after {iterations} iterations — best guess {rate} is not a root"
            )),
            IrrOutcome::MaxIterationsExceeded {
                last_guess,
                iterations,
            } => Some(format!(
                "IRR: no convergence within {iterations} iterations — last guess {last_guess}"
            )),
            IrrOutcome::Diverged {
                last_guess,
                iterations,
            } => Some(format!(
                "IRR: iteration diverged after {iterations} iterations — last guess {last_guess}"
            )),
            IrrOutcome::NoSignChange => {
                Some("IRR: cash flows never change sign — no rate zeroes NPV".into())
            }
        }
    }
}

/// Internal Rate of Return using Newton-Raphson with the analytic derivative.
///
/// With more than one sign change the series can have several roots; the
/// solver returns whichever one the iteration path from `config.guess` reaches.
pub fn irr(cash_flows: &[Money], config: &IrrConfig) -> PropertyFinanceResult<IrrOutcome> {
    validate_irr_config(config)?;
    if cash_flows.len() < 2 {
        return Err(PropertyFinanceError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let has_inflow = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    let has_outflow = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    if !(has_inflow && has_outflow) {
        warn!(periods = cash_flows.len(), "IRR undefined: no sign change");
        return Ok(IrrOutcome::NoSignChange);
    }

    let outcome = newton_raphson(cash_flows, config);
    if outcome.is_converged() {
        debug!(?outcome, "IRR solved");
    } else {
        warn!(?outcome, "IRR did not converge");
    }
    Ok(outcome)
}

fn validate_irr_config(config: &IrrConfig) -> PropertyFinanceResult<()> {
    if config.max_iterations == 0 {
        return Err(PropertyFinanceError::invalid(
            "max_iterations",
            "IRR needs at least one iteration",
        ));
    }
    if config.tolerance <= Decimal::ZERO {
        return Err(PropertyFinanceError::invalid(
            "tolerance",
            "IRR tolerance must be positive",
        ));
    }
    if config.guess <= MIN_IRR_RATE || config.guess >= MAX_IRR_RATE {
        return Err(PropertyFinanceError::invalid(
            "guess",
            format!("IRR guess must lie in ({MIN_IRR_RATE}, {MAX_IRR_RATE})"),
        ));
    }
    Ok(())
}

fn newton_raphson(cash_flows: &[Money], config: &IrrConfig) -> IrrOutcome {
    let mut rate = config.guess;
    let Some(mut current) = npv_and_derivative(cash_flows, rate) else {
        return IrrOutcome::Diverged {
            last_guess: rate,
            iterations: 0,
        };
    };
    let mut damped_run = 0u32;

    for i in 1..=config.max_iterations {
        let (npv_val, dnpv) = current;

        if dnpv.abs() < config.tolerance {
            return IrrOutcome::FlatDerivative {
                rate,
                iterations: i,
            };
        }

        let Some((new_rate, next, damped)) = npv_val
            .checked_div(dnpv)
            .and_then(|step| damped_step(cash_flows, rate, step))
        else {
            return IrrOutcome::Diverged {
                last_guess: rate,
                iterations: i,
            };
        };

        // A damped step is not a convergence signal: the iterate is being
        // held inside the band while Newton pushes it out.
        if damped {
            damped_run += 1;
            if damped_run >= MAX_DAMPED_STEPS {
                return IrrOutcome::Diverged {
                    last_guess: new_rate,
                    iterations: i,
                };
            }
        } else {
            damped_run = 0;
            if (new_rate - rate).abs() < config.tolerance {
                return IrrOutcome::Converged {
                    rate: new_rate,
                    iterations: i,
                };
            }
        }

        rate = new_rate;
        current = next;
    }

    IrrOutcome::MaxIterationsExceeded {
        last_guess: rate,
        iterations: config.max_iterations,
    }
}

/// Take the Newton step `rate - step`, halving it until the new rate lies
/// strictly inside the band and NPV there is representable.
///
/// Returns the new rate, NPV and derivative at it, and whether the step was
/// shortened. `None` when no admissible rate is found within the halving budget.
fn damped_step(
    cash_flows: &[Money],
    rate: Rate,
    step: Decimal,
) -> Option<(Rate, (Money, Decimal), bool)> {
    let mut step = step;
    for halvings in 0..=MAX_STEP_HALVINGS {
        if let Some(candidate) = rate.checked_sub(step) {
            if candidate > MIN_IRR_RATE && candidate < MAX_IRR_RATE {
                if let Some(eval) = npv_and_derivative(cash_flows, candidate) {
                    return Some((candidate, eval, halvings > 0));
                }
            }
        }
        step /= dec!(2);
    }
    None
}

// ---------------------------------------------------------------------------
// Rate conversions
// ---------------------------------------------------------------------------

/// Effective periodic rate equivalent to an effective annual rate:
/// `(1 + annual)^(1/periods) - 1`.
pub fn periodic_rate_from_annual(annual: Rate, periods_per_year: u32) -> PropertyFinanceResult<Rate> {
    if periods_per_year == 0 {
        return Err(PropertyFinanceError::invalid(
            "periods_per_year",
            "must be at least 1",
        ));
    }
    if annual <= dec!(-1) {
        return Err(PropertyFinanceError::invalid(
            "annual_rate",
            "must be greater than -100%",
        ));
    }
    if annual.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let exponent = Decimal::ONE / Decimal::from(periods_per_year);
    let factor = (Decimal::ONE + annual).checked_powd(exponent).ok_or_else(|| {
        PropertyFinanceError::NumericOverflow {
            context: "periodic rate conversion".into(),
        }
    })?;
    Ok(factor - Decimal::ONE)
}

/// Effective annual rate from a periodic rate: `(1 + periodic)^periods - 1`.
pub fn effective_annual_rate(periodic: Rate, periods_per_year: u32) -> PropertyFinanceResult<Rate> {
    let factor = (Decimal::ONE + periodic)
        .checked_powi(periods_per_year as i64)
        .ok_or_else(|| PropertyFinanceError::NumericOverflow {
            context: "annualising periodic rate".into(),
        })?;
    Ok(factor - Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn lease_flows() -> Vec<Money> {
        let mut cfs = vec![dec!(-110000)];
        cfs.extend(std::iter::repeat(dec!(3200)).take(12));
        cfs
    }

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_npv_initial_flow_undiscounted() {
        let result = npv(dec!(0.25), &[dec!(-500)]).unwrap();
        assert_eq!(result, dec!(-500));
    }

    #[test]
    fn test_npv_rejects_rate_at_minus_one() {
        assert!(npv(dec!(-1), &[dec!(-100), dec!(110)]).is_err());
    }

    #[test]
    fn test_npv_lease_at_8pct() {
        // -110000 + 3200 * annuity(8%, 12) = -110000 + 24115.45 = -85884.55
        let result = npv(dec!(0.08), &lease_flows()).unwrap();
        assert!(
            (result - dec!(-85884.55)).abs() < dec!(0.01),
            "NPV was {result}"
        );
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let outcome = irr(&cfs, &IrrConfig::default()).unwrap();
        let rate = outcome.converged_rate().unwrap();
        // IRR should be ~9.7%
        assert!((rate - dec!(0.0970)).abs() < dec!(0.001));
    }

    #[test]
    fn test_irr_negative_root_zeroes_npv() {
        let cfs = lease_flows();
        let outcome = irr(&cfs, &IrrConfig::default()).unwrap();
        let rate = outcome.converged_rate().expect("should converge");
        assert!((rate - dec!(-0.13367)).abs() < dec!(0.0001), "IRR was {rate}");
        let residual = npv(rate, &cfs).unwrap();
        assert!(residual.abs() < dec!(0.001), "NPV at IRR was {residual}");
    }

    #[test]
    fn test_irr_single_iteration_is_not_converged() {
        let config = IrrConfig {
            max_iterations: 1,
            ..IrrConfig::default()
        };
        let outcome = irr(&lease_flows(), &config).unwrap();
        assert!(!outcome.is_converged());
        assert!(matches!(
            outcome,
            IrrOutcome::MaxIterationsExceeded { iterations: 1, .. }
        ));
        assert!(outcome.rate().is_some());
        assert!(outcome.converged_rate().is_none());
    }

    #[test]
    fn test_irr_no_real_root_is_not_converged() {
        // 100 - 100/(1+r) + 100/(1+r)^2 > 0 for every r > -1
        let outcome = irr(&[dec!(100), dec!(-100), dec!(100)], &IrrConfig::default()).unwrap();
        assert!(!outcome.is_converged());
        assert!(outcome.describe_failure().is_some());
    }

    #[test]
    fn test_irr_deep_negative_root_converges() {
        // First Newton step from 10% lands far below -99%; the damped step
        // must keep the iterate where NPV is still representable.
        let mut cfs = vec![dec!(-900000)];
        cfs.extend(std::iter::repeat(dec!(1100)).take(20));
        let outcome = irr(&cfs, &IrrConfig::default()).unwrap();
        let rate = outcome.converged_rate().expect("should converge");
        assert!(rate > dec!(-0.25) && rate < dec!(-0.20), "IRR was {rate}");
        let residual = npv(rate, &cfs).unwrap();
        assert!(residual.abs() < dec!(0.01), "NPV at IRR was {residual}");
    }

    #[test]
    fn test_irr_flat_derivative() {
        // At 10%: NPV = -1 + 2 - 1 = 0 and dNPV/dr = -2.2/1.21 + 2.42/1.331 = 0
        let cfs = vec![dec!(-1), dec!(2.2), dec!(-1.21)];
        let outcome = irr(&cfs, &IrrConfig::default()).unwrap();
        match outcome {
            IrrOutcome::FlatDerivative { rate, iterations } => {
                assert_eq!(rate, dec!(0.10));
                assert_eq!(iterations, 1);
            }
            other => panic!("expected flat derivative, got {other:?}"),
        }
        assert!(outcome.describe_failure().is_some());
    }

    #[test]
    fn test_irr_root_beyond_band_diverges() {
        // -1 + 100/(1+r) has its root at 9900%; Newton keeps pushing past 1000%
        let outcome = irr(&[dec!(-1), dec!(100)], &IrrConfig::default()).unwrap();
        match outcome {
            IrrOutcome::Diverged { last_guess, .. } => {
                assert!(last_guess > dec!(9.9) && last_guess < MAX_IRR_RATE);
            }
            other => panic!("expected divergence, got {other:?}"),
        }
        assert_eq!(outcome.converged_rate(), None);
        assert!(outcome.describe_failure().unwrap().contains("diverged"));
    }

    #[test]
    fn test_irr_no_sign_change() {
        let outcome = irr(&[dec!(-900000), dec!(-100), dec!(-100)], &IrrConfig::default()).unwrap();
        assert_eq!(outcome, IrrOutcome::NoSignChange);
        assert!(outcome.rate().is_none());
    }

    #[test]
    fn test_irr_multiple_roots_follows_guess() {
        // -100 + 230/(1+r) - 132/(1+r)^2 has roots at 10% and 20%
        let cfs = vec![dec!(-100), dec!(230), dec!(-132)];
        let low = irr(&cfs, &IrrConfig::default()).unwrap();
        let high = irr(
            &cfs,
            &IrrConfig {
                guess: dec!(0.25),
                ..IrrConfig::default()
            },
        )
        .unwrap();
        assert!((low.converged_rate().unwrap() - dec!(0.10)).abs() < dec!(0.000001));
        assert!((high.converged_rate().unwrap() - dec!(0.20)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_irr_requires_two_flows() {
        assert!(irr(&[dec!(-100)], &IrrConfig::default()).is_err());
    }

    #[test]
    fn test_irr_rejects_zero_budget() {
        let config = IrrConfig {
            max_iterations: 0,
            ..IrrConfig::default()
        };
        assert!(irr(&lease_flows(), &config).is_err());
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = IrrOutcome::Converged {
            rate: dec!(0.05),
            iterations: 4,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "converged");
        assert_eq!(json["iterations"], 4);
    }

    #[test]
    fn test_periodic_rate_round_trip() {
        let monthly = periodic_rate_from_annual(dec!(0.10), 12).unwrap();
        // (1.1)^(1/12) - 1 ≈ 0.0079741
        assert!((monthly - dec!(0.0079741)).abs() < dec!(0.000001));
        let annual = effective_annual_rate(monthly, 12).unwrap();
        assert!((annual - dec!(0.10)).abs() < dec!(0.000001));
    }
}
