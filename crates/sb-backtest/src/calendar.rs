//! Rebalance calendar.
//!
//! [`first_trading_dates`] produces the trigger dates; [`RebalanceCursor`]
//! consumes them against the trading-date stream. A calendar entry fires
//! at most once, and two consecutive trading dates never both rebalance.

use chrono::{Datelike, NaiveDate};

/// First calendar day of every month from the month containing `start`
/// through the month containing `end`, ascending. Empty if `start > end`.
pub fn first_trading_dates(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    if start > end {
        return out;
    }
    let (mut year, mut month) = (start.year(), start.month());
    while let Some(d) = NaiveDate::from_ymd_opt(year, month, 1) {
        if d > end {
            break;
        }
        out.push(d);
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    out
}

/// Cursor over a sorted list of rebalance trigger dates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RebalanceCursor {
    dates: Vec<NaiveDate>,
    next: usize,
    fired_last: bool,
}

impl RebalanceCursor {
    pub fn new(mut dates: Vec<NaiveDate>) -> Self {
        dates.sort();
        dates.dedup();
        Self {
            dates,
            next: 0,
            fired_last: false,
        }
    }

    /// Next calendar entry not yet consumed.
    pub fn pending(&self) -> Option<NaiveDate> {
        self.dates.get(self.next).copied()
    }

    pub fn remaining(&self) -> usize {
        self.dates.len() - self.next
    }

    pub fn is_exhausted(&self) -> bool {
        self.next >= self.dates.len()
    }

    /// Feed the next trading date. Returns the consumed calendar entry when
    /// `date` rebalances.
    ///
    /// Fires when the previous trading date did not fire, an entry is
    /// pending, and `date` is on or after it. Exactly one entry is consumed
    /// per firing, so a trading gap spanning several entries catches up one
    /// entry every other date.
    pub fn advance(&mut self, date: NaiveDate) -> Option<NaiveDate> {
        let fire = !self.fired_last && self.pending().is_some_and(|p| date >= p);
        self.fired_last = fire;
        if !fire {
            return None;
        }
        let consumed = self.dates[self.next];
        self.next += 1;
        Some(consumed)
    }
}
