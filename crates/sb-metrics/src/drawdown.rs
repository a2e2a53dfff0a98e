use serde::Serialize;

use crate::{check_finite, check_no_wipeout, MetricsError};

/// Maximum drawdown plus the per-period drawdown series it was taken from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Drawdown {
    /// Most negative entry of `series`, or `0.0` if the curve never dipped.
    pub max_drawdown: f64,
    /// `equity / running_peak - 1` after each period (always <= 0).
    pub series: Vec<f64>,
}

fn validate(returns: &[f64]) -> Result<(), MetricsError> {
    if returns.is_empty() {
        return Err(MetricsError::Empty);
    }
    check_finite(returns)?;
    check_no_wipeout(returns)
}

/// Compound the returns from a starting index of 1 and track the deepest
/// fall from a running peak.
pub fn maximum_drawdown(returns: &[f64]) -> Result<Drawdown, MetricsError> {
    validate(returns)?;

    let mut peak = 1.0_f64;
    let mut index = 1.0_f64;
    let mut max_drawdown = 0.0_f64;
    let mut series = Vec::with_capacity(returns.len());
    for r in returns {
        index *= 1.0 + r;
        if index > peak {
            peak = index;
        }
        let dd = index / peak - 1.0;
        series.push(dd);
        if dd < max_drawdown {
            max_drawdown = dd;
        }
    }

    Ok(Drawdown {
        max_drawdown,
        series,
    })
}

/// Longest run of consecutive periods without a new high of the compounded
/// index. Flat periods count as drawdown periods.
pub fn longest_drawdown(returns: &[f64]) -> Result<usize, MetricsError> {
    validate(returns)?;

    let mut peak = 1.0_f64;
    let mut index = 1.0_f64;
    let mut current = 0usize;
    let mut longest = 0usize;
    for r in returns {
        index *= 1.0 + r;
        if index > peak {
            peak = index;
            current = 0;
            continue;
        }
        current += 1;
        longest = longest.max(current);
    }
    Ok(longest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawdown_tracks_running_peak() {
        let d = maximum_drawdown(&[0.1, -0.5, 0.2]).unwrap();
        // index: 1.1, 0.55, 0.66 ; peak stays 1.1
        assert!((d.series[0] - 0.0).abs() < 1e-12);
        assert!((d.series[1] + 0.5).abs() < 1e-12);
        assert!((d.series[2] + 0.4).abs() < 1e-12);
        assert!((d.max_drawdown + 0.5).abs() < 1e-12);
    }

    #[test]
    fn wipeout_return_is_rejected() {
        assert!(matches!(
            maximum_drawdown(&[0.1, -1.0]),
            Err(MetricsError::Wipeout { index: 1, .. })
        ));
        assert_eq!(longest_drawdown(&[]), Err(MetricsError::Empty));
    }

    #[test]
    fn longest_drawdown_resets_on_new_high() {
        // up, down, down, up (not a new high), new high, down
        let r = [0.1, -0.1, -0.1, 0.05, 0.5, -0.01];
        assert_eq!(longest_drawdown(&r).unwrap(), 3);
    }
}
