use property_finance_core::financing::amortization::{
    analyze_mortgage, build_schedule, compute_payment, remaining_balance, LoanTerms, MortgageInput,
};
use property_finance_core::PropertyFinanceError;
use proptest::prelude::{prop_assert, proptest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Payment and schedule
// ===========================================================================

#[test]
fn test_payment_on_casablanca_loan() {
    let terms = LoanTerms::new(dec!(3_600_000), dec!(0.05), 20).unwrap();
    assert_eq!(terms.num_payments(), 240);
    let payment = terms.payment().unwrap();
    assert!((payment - dec!(23758.41)).abs() < dec!(0.01));
}

#[test]
fn test_interest_share_falls_over_time() {
    let terms = LoanTerms::new(dec!(300_000), dec!(0.06), 30).unwrap();
    let payment = terms.payment().unwrap();
    let schedule = build_schedule(
        terms.principal,
        terms.periodic_rate(),
        payment,
        terms.num_payments(),
    )
    .unwrap();
    assert_eq!(schedule.len(), 360);
    assert!(schedule[0].interest > schedule[359].interest);
    assert!(schedule[0].principal < schedule[359].principal);
    assert!(schedule.last().unwrap().balance.abs() < dec!(0.01));
}

#[test]
fn test_remaining_balance_matches_schedule() {
    let terms = LoanTerms::new(dec!(250_000), dec!(0.045), 15).unwrap();
    let payment = terms.payment().unwrap();
    let schedule = build_schedule(
        terms.principal,
        terms.periodic_rate(),
        payment,
        terms.num_payments(),
    )
    .unwrap();
    let after_five_years = remaining_balance(&terms, 60).unwrap();
    assert!((after_five_years - schedule[59].balance).abs() < dec!(0.000001));
    assert_eq!(remaining_balance(&terms, 500).unwrap(), Decimal::ZERO);
}

#[test]
fn test_mortgage_calculator_totals() {
    let input = MortgageInput {
        principal: dec!(300_000),
        annual_rate: dec!(0.06),
        term_years: 30,
        schedule_periods: Some(12),
    };
    let out = analyze_mortgage(&input).unwrap();
    let r = &out.result;
    // 300k at 6% over 30 years ≈ 1798.65
    assert!((r.monthly_payment - dec!(1798.65)).abs() < dec!(0.01));
    assert_eq!(r.num_payments, 360);
    assert_eq!(r.amortization_schedule.len(), 12);
    assert!((r.total_principal - dec!(300_000)).abs() < dec!(0.01));
    assert!((r.total_interest - (r.total_payments - dec!(300_000))).abs() < dec!(0.01));
}

#[test]
fn test_zero_term_rejected() {
    assert!(matches!(
        compute_payment(dec!(100_000), dec!(0.005), 0),
        Err(PropertyFinanceError::InvalidInput { .. })
    ));
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(48))]

    #[test]
    fn prop_schedule_fully_amortizes(
        principal in 1_000u32..5_000_000,
        rate_bp in 0u32..1_500,
        term_years in 1u32..41
    ) {
        let terms = LoanTerms::new(
            Decimal::from(principal),
            Decimal::from(rate_bp) / dec!(10000),
            term_years,
        ).unwrap();
        let payment = terms.payment().unwrap();
        let n = terms.num_payments();
        let schedule = build_schedule(terms.principal, terms.periodic_rate(), payment, n).unwrap();

        let final_balance = schedule.last().unwrap().balance;
        prop_assert!(final_balance.abs() < dec!(0.01), "final balance {}", final_balance);

        let interest: Decimal = schedule.iter().map(|e| e.interest).sum();
        let principal_paid: Decimal = schedule.iter().map(|e| e.principal).sum();
        let total_paid = payment * Decimal::from(n);
        prop_assert!((interest + principal_paid - total_paid).abs() < dec!(0.01));
        prop_assert!((principal_paid - terms.principal).abs() < dec!(0.01));
    }
}
