//! Ticker -> share-count map.
//!
//! Invariant, enforced at every mutation: a ticker present in the map always
//! holds a strictly positive quantity. Reaching zero removes the entry; going
//! below zero is rejected. Iteration order is ticker-ascending (BTreeMap).

use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HoldingsError {
    /// Tried to remove more shares than are held.
    Oversold {
        ticker: String,
        held: u64,
        requested: u64,
    },
}

impl std::fmt::Display for HoldingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HoldingsError::Oversold {
                ticker,
                held,
                requested,
            } => write!(
                f,
                "cannot remove {} shares of {}: only {} held",
                requested, ticker, held
            ),
        }
    }
}

impl std::error::Error for HoldingsError {}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Holdings {
    positions: BTreeMap<String, u64>,
}

impl Holdings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Held quantity, zero when absent.
    pub fn qty(&self, ticker: &str) -> u64 {
        self.positions.get(ticker).copied().unwrap_or(0)
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.positions.contains_key(ticker)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// (ticker, qty) pairs in ticker order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.positions.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Add shares. Adding zero is a no-op and never creates an entry.
    pub fn add(&mut self, ticker: &str, qty: u64) {
        if qty == 0 {
            return;
        }
        *self.positions.entry(ticker.to_string()).or_insert(0) += qty;
    }

    /// Remove shares, deleting the entry when it reaches zero.
    ///
    /// Returns the quantity left after removal.
    pub fn remove(&mut self, ticker: &str, qty: u64) -> Result<u64, HoldingsError> {
        let held = self.qty(ticker);
        if qty > held {
            return Err(HoldingsError::Oversold {
                ticker: ticker.to_string(),
                held,
                requested: qty,
            });
        }
        let left = held - qty;
        if left == 0 {
            self.positions.remove(ticker);
        } else if let Some(slot) = self.positions.get_mut(ticker) {
            *slot = left;
        }
        Ok(left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_zero_does_not_create_entry() {
        let mut h = Holdings::new();
        h.add("AAA", 0);
        assert!(h.is_empty());
        assert!(!h.contains("AAA"));
    }

    #[test]
    fn remove_to_zero_deletes_entry() {
        let mut h = Holdings::new();
        h.add("AAA", 300);
        assert_eq!(h.remove("AAA", 100).unwrap(), 200);
        assert_eq!(h.qty("AAA"), 200);
        assert_eq!(h.remove("AAA", 200).unwrap(), 0);
        assert!(!h.contains("AAA"));
        assert_eq!(h.len(), 0);
    }

    #[test]
    fn oversell_is_rejected_and_state_unchanged() {
        let mut h = Holdings::new();
        h.add("AAA", 100);
        let err = h.remove("AAA", 200).unwrap_err();
        assert_eq!(
            err,
            HoldingsError::Oversold {
                ticker: "AAA".to_string(),
                held: 100,
                requested: 200
            }
        );
        assert_eq!(h.qty("AAA"), 100);
    }

    #[test]
    fn iteration_is_ticker_ordered() {
        let mut h = Holdings::new();
        h.add("CCC", 100);
        h.add("AAA", 100);
        h.add("BBB", 100);
        let order: Vec<&str> = h.iter().map(|(t, _)| t).collect();
        assert_eq!(order, vec!["AAA", "BBB", "CCC"]);
    }
}
