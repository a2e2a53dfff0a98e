//! sb-portfolio: allocator
//!
//! Equal-weight (in cash terms) allocation across a rebalance target set.
//!
//! Responsibilities (pure, no IO):
//! - Derive desired target quantities from total asset value
//!   ([`equal_weight_targets`]).
//! - Split available cash across the targets still needing shares
//!   ([`allocate_cash`]), rounding every quantity down to a whole lot.
//!
//! The zero-lot handling is isolated in [`AllocationPolicy`]: the default
//! drops targets whose cash share cannot buy one lot and leaves that share
//! in cash; `Redistribute` re-splits cash across the survivors instead.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accounting::buy_cost;
use crate::fees::FeeSchedule;
use crate::lot::{round_lot_clamped, LOT_SIZE};
use crate::money::Money;

/// Ticker -> desired share quantity for one rebalance.
pub type TargetSet = BTreeMap<String, u64>;

/// A ticker eligible for buying, with the reference price used for sizing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuyCandidate {
    pub ticker: String,
    pub price: Money,
}

impl BuyCandidate {
    pub fn new<S: Into<String>>(ticker: S, price: Money) -> Self {
        Self {
            ticker: ticker.into(),
            price,
        }
    }
}

/// What happens to a target whose cash share rounds to zero lots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationPolicy {
    /// Drop it; its cash share stays uninvested for this cycle.
    #[default]
    DropZeroLots,
    /// Drop it and re-split the cash across the remaining targets.
    Redistribute,
}

/// A target that could not be allocated a single lot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedTarget {
    pub ticker: String,
    pub price: Money,
}

/// Output of one cash allocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllocationDecision {
    /// ticker -> lot-aligned quantity to buy (always > 0).
    pub quantities: BTreeMap<String, u64>,
    pub rejected: Vec<RejectedTarget>,
}

impl AllocationDecision {
    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }
}

/// Desired quantity per selected ticker: `round_lot(total / (n * price))`.
///
/// Zero-quantity entries are kept: they still count toward the equal split
/// and a held ticker with a zero target is sold out.
pub fn equal_weight_targets(total_asset: Money, candidates: &[BuyCandidate]) -> TargetSet {
    let mut out = TargetSet::new();
    if candidates.is_empty() {
        return out;
    }
    let n = Decimal::from(candidates.len());
    for c in candidates {
        let qty = total_asset
            .raw()
            .checked_div(n * c.price.raw())
            .map(round_lot_clamped)
            .unwrap_or(0);
        out.insert(c.ticker.clone(), qty);
    }
    out
}

/// Split `cash` evenly across `candidates`:
/// `qty = floor_to_lot(cash / (n * price * (1 + buy_fee)))`.
///
/// An empty candidate list or non-positive cash yields an empty decision;
/// no division is attempted.
pub fn allocate_cash(
    cash: Money,
    candidates: &[BuyCandidate],
    fees: &FeeSchedule,
    policy: AllocationPolicy,
) -> AllocationDecision {
    let mut decision = AllocationDecision::default();
    if candidates.is_empty() {
        return decision;
    }
    if !cash.is_positive() {
        decision.rejected = candidates.iter().map(reject).collect();
        return decision;
    }

    let mut active: Vec<&BuyCandidate> = candidates.iter().collect();
    loop {
        let n = active.len();
        let sized: Vec<(&BuyCandidate, u64)> = active
            .iter()
            .map(|c| (*c, lots_for_share(cash, n, c, fees)))
            .collect();

        let (kept, dropped): (Vec<_>, Vec<_>) = sized.into_iter().partition(|(_, q)| *q > 0);
        decision
            .rejected
            .extend(dropped.iter().map(|(c, _)| reject(c)));

        let settle =
            policy == AllocationPolicy::DropZeroLots || dropped.is_empty() || kept.is_empty();
        if settle {
            for (c, q) in kept {
                decision.quantities.insert(c.ticker.clone(), q);
            }
            break;
        }
        active = kept.into_iter().map(|(c, _)| c).collect();
    }

    decision
        .rejected
        .sort_by(|a, b| a.ticker.cmp(&b.ticker));
    decision
}

/// Whole lots affordable with `cash / n` at `price * (1 + buy_fee)`.
fn lots_for_share(cash: Money, n: usize, c: &BuyCandidate, fees: &FeeSchedule) -> u64 {
    let denom = Decimal::from(n) * c.price.raw() * fees.buy_multiplier();
    let Some(raw_qty) = cash.raw().checked_div(denom) else {
        return 0;
    };
    let mut qty = round_lot_clamped(raw_qty);

    // Decimal division rounds at 28 significant digits; never let that
    // rounding push the cost above the equal share.
    let share = cash.checked_div(Decimal::from(n)).unwrap_or(Money::ZERO);
    if qty > 0 && buy_cost(c.price, qty, fees) > share {
        qty -= LOT_SIZE as u64;
    }
    qty
}

fn reject(c: &BuyCandidate) -> RejectedTarget {
    RejectedTarget {
        ticker: c.ticker.clone(),
        price: c.price,
    }
}
