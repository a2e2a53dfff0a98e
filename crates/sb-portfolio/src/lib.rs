//! sb-portfolio
//!
//! Portfolio & accounting model for the value-screen backtester.
//! - Exact decimal money (`Money`), never binary floats for cash
//! - Lot rounding (100-share lots)
//! - Holdings map with delete-on-zero invariant
//! - Proportional buy/sell fees
//! - Equal-weight cash allocation with a swappable zero-lot policy
//! - Pure deterministic logic (no IO, no time, no logging)

mod accounting;
mod fees;
mod holdings;
mod lot;
mod money;
mod valuation;

pub mod allocator;

pub use accounting::{buy_cost, sell_proceeds, PortfolioError, PortfolioState};
pub use allocator::{
    allocate_cash, equal_weight_targets, AllocationDecision, AllocationPolicy, BuyCandidate,
    RejectedTarget, TargetSet,
};
pub use fees::{FeeError, FeeSchedule};
pub use holdings::{Holdings, HoldingsError};
pub use lot::{round_lot, round_lot_clamped, LOT_SIZE};
pub use money::Money;
pub use valuation::{compute_equity, compute_market_value};

use std::collections::BTreeMap;

/// Canonical price map type (ticker -> per-share price).
pub type PriceMap = BTreeMap<String, Money>;

/// Helper to build a PriceMap with minimal boilerplate.
pub fn prices<I, S>(items: I) -> PriceMap
where
    I: IntoIterator<Item = (S, Money)>,
    S: Into<String>,
{
    let mut m = PriceMap::new();
    for (sym, px) in items {
        m.insert(sym.into(), px);
    }
    m
}
