use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fee validation errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeeError {
    /// Fee rate outside `[0, 1)`.
    OutOfRange { field: &'static str, value: Decimal },
}

impl std::fmt::Display for FeeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeeError::OutOfRange { field, value } => {
                write!(f, "{} = {} is outside [0, 1)", field, value)
            }
        }
    }
}

impl std::error::Error for FeeError {}

/// One-time proportional fees charged on each trade leg.
///
/// `0.00035` means 0.035% of traded value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub buy: Decimal,
    pub sell: Decimal,
}

impl FeeSchedule {
    pub fn new(buy: Decimal, sell: Decimal) -> Result<Self, FeeError> {
        check_rate("buy_fee", buy)?;
        check_rate("sell_fee", sell)?;
        Ok(Self { buy, sell })
    }

    pub fn zero() -> Self {
        Self {
            buy: Decimal::ZERO,
            sell: Decimal::ZERO,
        }
    }

    /// Cash multiplier on the buy leg: `1 + buy`.
    pub fn buy_multiplier(&self) -> Decimal {
        Decimal::ONE + self.buy
    }

    /// Cash multiplier on the sell leg: `1 - sell`.
    pub fn sell_multiplier(&self) -> Decimal {
        Decimal::ONE - self.sell
    }
}

fn check_rate(field: &'static str, value: Decimal) -> Result<(), FeeError> {
    if value < Decimal::ZERO || value >= Decimal::ONE {
        return Err(FeeError::OutOfRange { field, value });
    }
    Ok(())
}
