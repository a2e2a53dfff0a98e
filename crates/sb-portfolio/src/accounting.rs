use crate::fees::FeeSchedule;
use crate::holdings::{Holdings, HoldingsError};
use crate::money::Money;

/// Cash realized by selling `qty` shares at `price` net of the sell fee:
/// `price * qty * (1 - sell_fee)`.
pub fn sell_proceeds(price: Money, qty: u64, fees: &FeeSchedule) -> Money {
    price.times_qty(qty).scale(fees.sell_multiplier())
}

/// Cash consumed by buying `qty` shares at `price` including the buy fee:
/// `price * qty * (1 + buy_fee)`.
pub fn buy_cost(price: Money, qty: u64, fees: &FeeSchedule) -> Money {
    price.times_qty(qty).scale(fees.buy_multiplier())
}

/// Portfolio mutation errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PortfolioError {
    Holdings(HoldingsError),
    /// A buy would take cash below zero.
    InsufficientCash {
        ticker: String,
        cost: Money,
        cash: Money,
    },
    /// Trade price must be > 0.
    NonPositivePrice { ticker: String, price: Money },
}

impl std::fmt::Display for PortfolioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortfolioError::Holdings(e) => write!(f, "holdings: {}", e),
            PortfolioError::InsufficientCash { ticker, cost, cash } => write!(
                f,
                "buying {} costs {} but only {} cash is available",
                ticker, cost, cash
            ),
            PortfolioError::NonPositivePrice { ticker, price } => {
                write!(f, "non-positive trade price for {}: {}", ticker, price)
            }
        }
    }
}

impl std::error::Error for PortfolioError {}

impl From<HoldingsError> for PortfolioError {
    fn from(e: HoldingsError) -> Self {
        PortfolioError::Holdings(e)
    }
}

/// Cash plus share counts. Created once per run with cash = starting capital.
///
/// Only the sell/buy methods below mutate it; revaluation never does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortfolioState {
    pub initial_capital: Money,
    pub cash: Money,
    pub holdings: Holdings,
}

impl PortfolioState {
    pub fn new(initial_capital: Money) -> Self {
        Self {
            initial_capital,
            cash: initial_capital,
            holdings: Holdings::new(),
        }
    }

    /// Sell `qty` shares, crediting proceeds net of the sell fee.
    ///
    /// Returns the cash credited. The holding is removed when it reaches zero.
    pub fn apply_sell(
        &mut self,
        ticker: &str,
        qty: u64,
        price: Money,
        fees: &FeeSchedule,
    ) -> Result<Money, PortfolioError> {
        if !price.is_positive() {
            return Err(PortfolioError::NonPositivePrice {
                ticker: ticker.to_string(),
                price,
            });
        }
        self.holdings.remove(ticker, qty)?;
        let proceeds = sell_proceeds(price, qty, fees);
        self.cash += proceeds;
        Ok(proceeds)
    }

    /// Buy `qty` shares, debiting cost including the buy fee.
    ///
    /// Returns the cash debited.
    pub fn apply_buy(
        &mut self,
        ticker: &str,
        qty: u64,
        price: Money,
        fees: &FeeSchedule,
    ) -> Result<Money, PortfolioError> {
        if !price.is_positive() {
            return Err(PortfolioError::NonPositivePrice {
                ticker: ticker.to_string(),
                price,
            });
        }
        let cost = buy_cost(price, qty, fees);
        if cost > self.cash {
            return Err(PortfolioError::InsufficientCash {
                ticker: ticker.to_string(),
                cost,
                cash: self.cash,
            });
        }
        self.cash -= cost;
        self.holdings.add(ticker, qty);
        Ok(cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fees() -> FeeSchedule {
        FeeSchedule::new(dec!(0.001), dec!(0.002)).unwrap()
    }

    #[test]
    fn buy_then_sell_loses_only_fees() {
        let mut pf = PortfolioState::new(Money::from_units(100_000));
        let px = Money::from_units(50);

        let cost = pf.apply_buy("AAA", 200, px, &fees()).unwrap();
        assert_eq!(cost, Money::new(dec!(10010)));
        assert_eq!(pf.holdings.qty("AAA"), 200);

        let got = pf.apply_sell("AAA", 200, px, &fees()).unwrap();
        assert_eq!(got, Money::new(dec!(9980)));
        assert!(!pf.holdings.contains("AAA"));
        assert_eq!(pf.cash, Money::new(dec!(99970)));
    }

    #[test]
    fn buy_beyond_cash_is_rejected() {
        let mut pf = PortfolioState::new(Money::from_units(1_000));
        let err = pf
            .apply_buy("AAA", 100, Money::from_units(10), &fees())
            .unwrap_err();
        assert!(matches!(err, PortfolioError::InsufficientCash { .. }));
        assert_eq!(pf.cash, Money::from_units(1_000));
        assert!(pf.holdings.is_empty());
    }

    #[test]
    fn oversell_surfaces_holdings_error() {
        let mut pf = PortfolioState::new(Money::from_units(1_000));
        let err = pf
            .apply_sell("AAA", 100, Money::from_units(10), &fees())
            .unwrap_err();
        assert!(matches!(err, PortfolioError::Holdings(_)));
        assert_eq!(pf.cash, Money::from_units(1_000));
    }

    #[test]
    fn zero_price_is_rejected() {
        let mut pf = PortfolioState::new(Money::from_units(1_000));
        assert!(matches!(
            pf.apply_buy("AAA", 100, Money::ZERO, &fees()),
            Err(PortfolioError::NonPositivePrice { .. })
        ));
    }
}
