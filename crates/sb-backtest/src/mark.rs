use tracing::warn;

use sb_portfolio::{compute_equity, compute_market_value, Money, PortfolioState, PriceMap};

use crate::engine::BacktestError;
use crate::types::{DateGroup, SuspendedRecord};

/// Holdings revalued for one date.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkOutcome {
    pub holding_value: Money,
    /// `cash + holding_value`.
    pub total_asset: Money,
    /// Held tickers valued at their last known price.
    pub suspended: Vec<SuspendedRecord>,
}

/// Value every holding at the day's close, falling back to the last known
/// price for tickers without a same-day row.
///
/// Quoted closes refresh `last_prices`. Cash and holdings are not touched.
pub fn mark_to_market(
    state: &PortfolioState,
    group: &DateGroup,
    last_prices: &mut PriceMap,
) -> Result<MarkOutcome, BacktestError> {
    let date = group.date();
    let mut marks = PriceMap::new();
    let mut suspended = Vec::new();

    for (ticker, _) in state.holdings.iter() {
        let price = match group.get(ticker) {
            Some(row) => {
                last_prices.insert(ticker.to_string(), row.close);
                row.close
            }
            None => {
                let fallback = last_prices.get(ticker).copied().ok_or_else(|| {
                    BacktestError::NoPriceHistory {
                        date,
                        ticker: ticker.to_string(),
                    }
                })?;
                warn!(%date, ticker, price = %fallback, "no quote for held ticker; using last known price");
                suspended.push(SuspendedRecord {
                    date,
                    ticker: ticker.to_string(),
                    fallback_price: fallback,
                });
                fallback
            }
        };
        marks.insert(ticker.to_string(), price);
    }

    Ok(MarkOutcome {
        holding_value: compute_market_value(&state.holdings, &marks),
        total_asset: compute_equity(state.cash, &state.holdings, &marks),
        suspended,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InstrumentRow, Panel};
    use chrono::NaiveDate;
    use sb_portfolio::prices;

    fn group(rows: &[(&str, i64)]) -> DateGroup {
        let date = NaiveDate::from_ymd_opt(2023, 3, 2).unwrap();
        let rows = rows
            .iter()
            .map(|(t, px)| {
                InstrumentRow::new(date, *t, Money::from_units(*px), Money::from_units(*px), None, None)
            })
            .collect();
        Panel::from_rows(rows).unwrap().groups()[0].clone()
    }

    #[test]
    fn missing_quote_uses_last_price_and_is_recorded() {
        let mut pf = PortfolioState::new(Money::from_units(1_000));
        pf.holdings.add("AAA", 100);
        pf.holdings.add("BBB", 200);
        let mut last = prices([("AAA", Money::from_units(9)), ("BBB", Money::from_units(4))]);

        let out = mark_to_market(&pf, &group(&[("AAA", 10)]), &mut last).unwrap();
        assert_eq!(out.holding_value, Money::from_units(100 * 10 + 200 * 4));
        assert_eq!(out.total_asset, Money::from_units(2_800));
        assert_eq!(out.suspended.len(), 1);
        assert_eq!(out.suspended[0].ticker, "BBB");
        assert_eq!(out.suspended[0].fallback_price, Money::from_units(4));
        assert_eq!(last["AAA"], Money::from_units(10));
    }

    #[test]
    fn holding_without_any_price_is_an_error() {
        let mut pf = PortfolioState::new(Money::ZERO);
        pf.holdings.add("ZZZ", 100);
        let err = mark_to_market(&pf, &group(&[("AAA", 10)]), &mut PriceMap::new()).unwrap_err();
        assert!(matches!(err, BacktestError::NoPriceHistory { .. }));
    }
}
