use crate::holdings::Holdings;
use crate::money::Money;
use crate::PriceMap;

/// Market value = Σ(qty * mark).
///
/// Tickers without a mark contribute zero; callers that must not lose value
/// resolve marks (including last-known fallbacks) before calling.
pub fn compute_market_value(holdings: &Holdings, marks: &PriceMap) -> Money {
    holdings
        .iter()
        .map(|(ticker, qty)| {
            marks
                .get(ticker)
                .map(|px| px.times_qty(qty))
                .unwrap_or(Money::ZERO)
        })
        .sum()
}

/// Equity = cash + Σ(qty * mark).
pub fn compute_equity(cash: Money, holdings: &Holdings, marks: &PriceMap) -> Money {
    cash + compute_market_value(holdings, marks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices;
    use rust_decimal_macros::dec;

    #[test]
    fn equity_sums_cash_and_marks() {
        let mut h = Holdings::new();
        h.add("AAA", 100);
        h.add("BBB", 200);
        let marks = prices([
            ("AAA", Money::new(dec!(10.5))),
            ("BBB", Money::from_units(3)),
        ]);
        assert_eq!(compute_market_value(&h, &marks), Money::new(dec!(1650)));
        assert_eq!(
            compute_equity(Money::from_units(50), &h, &marks),
            Money::new(dec!(1700))
        );
    }

    #[test]
    fn unmarked_ticker_contributes_zero() {
        let mut h = Holdings::new();
        h.add("AAA", 100);
        assert_eq!(compute_market_value(&h, &PriceMap::new()), Money::ZERO);
    }
}
