//! Scenario: a ticker in the holdings map always has a positive quantity.

use rust_decimal_macros::dec;
use sb_portfolio::{FeeSchedule, Money, PortfolioError, PortfolioState};

#[test]
fn trim_then_liquidate_removes_entry() {
    let fees = FeeSchedule::zero();
    let mut pf = PortfolioState::new(Money::from_units(100_000));

    pf.apply_buy("AAA", 500, Money::from_units(10), &fees).unwrap();
    pf.apply_sell("AAA", 200, Money::from_units(12), &fees).unwrap();
    assert_eq!(pf.holdings.qty("AAA"), 300);

    pf.apply_sell("AAA", 300, Money::new(dec!(12.5)), &fees).unwrap();
    assert!(!pf.holdings.contains("AAA"));
    assert_eq!(pf.cash, Money::new(dec!(100000) - dec!(5000) + dec!(2400) + dec!(3750)));
}

#[test]
fn failed_sell_leaves_state_untouched() {
    let fees = FeeSchedule::zero();
    let mut pf = PortfolioState::new(Money::from_units(10_000));
    pf.apply_buy("AAA", 100, Money::from_units(10), &fees).unwrap();
    let before = pf.clone();

    let err = pf
        .apply_sell("AAA", 200, Money::from_units(10), &fees)
        .unwrap_err();
    assert!(matches!(err, PortfolioError::Holdings(_)));
    assert_eq!(pf, before);
}
