//! Sell/buy reconciliation on a rebalance date.
//!
//! Order of operations:
//! 1. Targets: `round_lot(A / (n * prev_close))` per selected row, where
//!    `A = cash + Σ held * prev_close` over held tickers quoted today.
//! 2. Sells: every quoted holding whose target does not exceed it is cut to
//!    the target (zero if deselected) at `prev_close * (1 - sell_fee)` and
//!    leaves the target set. Under-target holdings stay and their target
//!    shrinks to the increment.
//! 3. Buys: remaining cash is split across the remaining targets by
//!    [`allocate_cash`] and bought at `prev_close * (1 + buy_fee)`.
//! 4. Valuation at today's close via [`mark_to_market`].
//!
//! Held tickers without a same-day row cannot trade; they are carried and
//! valued at their last known price.

use chrono::NaiveDate;
use tracing::{debug, info};

use sb_portfolio::{
    allocate_cash, equal_weight_targets, AllocationPolicy, BuyCandidate, FeeSchedule, Money,
    PortfolioState, PriceMap, RejectedTarget,
};

use crate::engine::BacktestError;
use crate::mark::mark_to_market;
use crate::types::{
    AllocationSnapshot, DateGroup, InstrumentRow, SuspendedRecord, TradeRecord, TradeSide,
};

/// Everything one rebalance produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RebalanceOutcome {
    pub total_asset: Money,
    pub allocation: AllocationSnapshot,
    pub trades: Vec<TradeRecord>,
    pub suspended: Vec<SuspendedRecord>,
    /// Targets that could not be allocated a single lot.
    pub rejected: Vec<RejectedTarget>,
}

pub fn rebalance(
    state: &mut PortfolioState,
    group: &DateGroup,
    selected: &[&InstrumentRow],
    fees: &FeeSchedule,
    policy: AllocationPolicy,
    last_prices: &mut PriceMap,
) -> Result<RebalanceOutcome, BacktestError> {
    let date = group.date();

    let quoted_held: Vec<(String, u64, Money)> = state
        .holdings
        .iter()
        .filter_map(|(t, q)| group.get(t).map(|r| (t.to_string(), q, r.prev_close)))
        .collect();
    let total_at_prev: Money = state.cash
        + quoted_held
            .iter()
            .map(|(_, q, px)| px.times_qty(*q))
            .sum::<Money>();

    let candidates: Vec<BuyCandidate> = selected
        .iter()
        .map(|r| BuyCandidate::new(r.ticker.as_str(), r.prev_close))
        .collect();
    let mut targets = equal_weight_targets(total_at_prev, &candidates);

    let mut trades = Vec::new();
    for (ticker, held, prev_close) in quoted_held {
        let desired = targets.get(&ticker).copied().unwrap_or(0);
        if desired > held {
            targets.insert(ticker, desired - held);
            continue;
        }
        targets.remove(&ticker);
        let excess = held - desired;
        if excess == 0 {
            continue;
        }
        let proceeds = state
            .apply_sell(&ticker, excess, prev_close, fees)
            .map_err(|source| BacktestError::Portfolio { date, source })?;
        debug!(%date, ticker = %ticker, qty = excess, price = %prev_close, "sell");
        trades.push(trade(
            date,
            ticker,
            TradeSide::Sell,
            excess,
            prev_close,
            proceeds,
        ));
    }

    if selected.is_empty() {
        info!(%date, "no instrument passed the screen; buy phase skipped");
    }
    let remaining: Vec<BuyCandidate> = candidates
        .into_iter()
        .filter(|c| targets.contains_key(&c.ticker))
        .collect();
    let decision = allocate_cash(state.cash, &remaining, fees, policy);
    for r in &decision.rejected {
        debug!(%date, ticker = %r.ticker, price = %r.price, "cash share below one lot; not bought");
    }

    for c in &remaining {
        let Some(&qty) = decision.quantities.get(&c.ticker) else {
            continue;
        };
        let cost = state
            .apply_buy(&c.ticker, qty, c.price, fees)
            .map_err(|source| BacktestError::Portfolio { date, source })?;
        debug!(%date, ticker = %c.ticker, qty, price = %c.price, "buy");
        trades.push(trade(
            date,
            c.ticker.clone(),
            TradeSide::Buy,
            qty,
            c.price,
            -cost,
        ));
    }

    let mark = mark_to_market(state, group, last_prices)?;
    Ok(RebalanceOutcome {
        total_asset: mark.total_asset,
        allocation: AllocationSnapshot {
            date,
            holding_value: mark.holding_value,
            cash_remaining: state.cash,
        },
        trades,
        suspended: mark.suspended,
        rejected: decision.rejected,
    })
}

fn trade(
    date: NaiveDate,
    ticker: String,
    side: TradeSide,
    qty: u64,
    price: Money,
    cash_delta: Money,
) -> TradeRecord {
    let gross = price.times_qty(qty);
    let fee = match side {
        TradeSide::Sell => gross - cash_delta,
        TradeSide::Buy => -cash_delta - gross,
    };
    TradeRecord {
        date,
        ticker,
        side,
        qty,
        price,
        fee,
        cash_delta,
    }
}
