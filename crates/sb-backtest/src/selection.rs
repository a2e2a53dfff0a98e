use serde::{Deserialize, Serialize};

use crate::types::{DateGroup, InstrumentRow};

/// Selection bound errors.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectionError {
    NonFiniteBound { name: &'static str },
    InvertedBounds { name: &'static str, low: f64, high: f64 },
}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionError::NonFiniteBound { name } => write!(f, "{} bound is not finite", name),
            SelectionError::InvertedBounds { name, low, high } => {
                write!(f, "{} bounds inverted: low={} > high={}", name, low, high)
            }
        }
    }
}

impl std::error::Error for SelectionError {}

/// Inclusive `[low, high]` screening interval.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenBounds {
    pub low: f64,
    pub high: f64,
}

impl ScreenBounds {
    pub fn new(name: &'static str, low: f64, high: f64) -> Result<Self, SelectionError> {
        if !low.is_finite() || !high.is_finite() {
            return Err(SelectionError::NonFiniteBound { name });
        }
        if low > high {
            return Err(SelectionError::InvertedBounds { name, low, high });
        }
        Ok(Self { low, high })
    }

    /// Undefined or non-finite values never match.
    pub fn contains(&self, value: Option<f64>) -> bool {
        match value {
            Some(v) if v.is_finite() => v >= self.low && v <= self.high,
            _ => false,
        }
    }
}

/// PE and DY screens applied together.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionCriteria {
    pub pe: ScreenBounds,
    pub dy: ScreenBounds,
}

impl SelectionCriteria {
    pub fn new(pe: ScreenBounds, dy: ScreenBounds) -> Self {
        Self { pe, dy }
    }

    pub fn matches(&self, row: &InstrumentRow) -> bool {
        self.pe.contains(row.pe) && self.dy.contains(row.dy)
    }
}

/// Rows of `group` passing both screens, in the group's ticker order.
pub fn select<'a>(group: &'a DateGroup, criteria: &SelectionCriteria) -> Vec<&'a InstrumentRow> {
    group
        .rows()
        .iter()
        .filter(|r| criteria.matches(r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Panel;
    use chrono::NaiveDate;
    use sb_portfolio::Money;

    fn row(t: &str, pe: Option<f64>, dy: Option<f64>) -> InstrumentRow {
        InstrumentRow::new(
            NaiveDate::from_ymd_opt(2023, 1, 3).unwrap(),
            t,
            Money::from_units(10),
            Money::from_units(10),
            pe,
            dy,
        )
    }

    fn criteria() -> SelectionCriteria {
        SelectionCriteria::new(
            ScreenBounds::new("pe", 5.0, 10.0).unwrap(),
            ScreenBounds::new("dy", -0.1, 0.0).unwrap(),
        )
    }

    #[test]
    fn bounds_are_inclusive_and_undefined_is_excluded() {
        let panel = Panel::from_rows(vec![
            row("AAA", Some(5.0), Some(-0.1)),
            row("BBB", Some(10.0), Some(0.0)),
            row("CCC", Some(10.5), Some(-0.05)),
            row("DDD", None, Some(-0.05)),
            row("EEE", Some(f64::NAN), Some(-0.05)),
            row("FFF", Some(7.0), Some(f64::INFINITY)),
        ])
        .unwrap();
        let picked: Vec<&str> = select(&panel.groups()[0], &criteria())
            .iter()
            .map(|r| r.ticker.as_str())
            .collect();
        assert_eq!(picked, vec!["AAA", "BBB"]);
    }

    #[test]
    fn invalid_bounds_are_rejected() {
        assert!(matches!(
            ScreenBounds::new("pe", 10.0, 5.0),
            Err(SelectionError::InvertedBounds { .. })
        ));
        assert!(matches!(
            ScreenBounds::new("dy", f64::NEG_INFINITY, 0.0),
            Err(SelectionError::NonFiniteBound { name: "dy" })
        ));
    }
}
