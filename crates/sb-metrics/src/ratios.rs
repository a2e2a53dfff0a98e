use crate::{check_finite, check_no_wipeout, is_constant, mean, std_dev, MetricsError};

/// Sharpe ratio: `mean(r - rf) / std(r)` with sample std (n - 1).
///
/// `risk_free` is per period, in the same units as `returns`.
pub fn sharpe_ratio(returns: &[f64], risk_free: f64) -> Result<f64, MetricsError> {
    if returns.is_empty() {
        return Err(MetricsError::Empty);
    }
    check_finite(returns)?;
    if returns.len() < 2 {
        return Err(MetricsError::InsufficientData {
            needed: 2,
            got: returns.len(),
        });
    }

    // A constant series leaves a rounding residue in `sd`, not an exact zero.
    if is_constant(returns) {
        return Err(MetricsError::ZeroDenominator {
            metric: "sharpe_ratio",
        });
    }
    let excess: Vec<f64> = returns.iter().map(|r| r - risk_free).collect();
    Ok(mean(&excess) / std_dev(returns, 1))
}

/// Sortino ratio: `(mean(r) - rf) / sqrt(mean(min(0, r - rf)^2))`.
pub fn sortino_ratio(returns: &[f64], risk_free: f64) -> Result<f64, MetricsError> {
    if returns.is_empty() {
        return Err(MetricsError::Empty);
    }
    check_finite(returns)?;

    let downside: Vec<f64> = returns
        .iter()
        .map(|r| {
            let d = (r - risk_free).min(0.0);
            d * d
        })
        .collect();
    let downside_risk = mean(&downside).sqrt();
    if downside_risk == 0.0 {
        return Err(MetricsError::ZeroDenominator {
            metric: "sortino_ratio",
        });
    }
    Ok((mean(returns) - risk_free) / downside_risk)
}

/// Information ratio: `(mean(r) - mean(b)) / std(r - b)` with population std.
///
/// Equal means give exactly `0.0` without evaluating the tracking error.
pub fn information_ratio(returns: &[f64], benchmark: &[f64]) -> Result<f64, MetricsError> {
    if returns.is_empty() || benchmark.is_empty() {
        return Err(MetricsError::Empty);
    }
    if returns.len() != benchmark.len() {
        return Err(MetricsError::LengthMismatch {
            returns: returns.len(),
            benchmark: benchmark.len(),
        });
    }
    check_finite(returns)?;
    check_finite(benchmark)?;
    check_no_wipeout(returns)?;
    check_no_wipeout(benchmark)?;
    if returns.len() == 1 {
        return Err(MetricsError::InsufficientData { needed: 2, got: 1 });
    }

    let mean_r = mean(returns);
    let mean_b = mean(benchmark);
    if mean_r == mean_b {
        return Ok(0.0);
    }

    let active: Vec<f64> = returns
        .iter()
        .zip(benchmark)
        .map(|(r, b)| r - b)
        .collect();
    if is_constant(&active) {
        return Err(MetricsError::ZeroDenominator {
            metric: "information_ratio",
        });
    }
    Ok((mean_r - mean_b) / std_dev(&active, 0))
}
