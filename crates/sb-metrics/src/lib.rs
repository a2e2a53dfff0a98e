//! sb-metrics
//!
//! Risk/return statistics over a finished per-period return series.
//! - Sharpe (sample std, n-1) and Sortino (downside deviation)
//! - Maximum drawdown with the full drawdown series, longest drawdown
//! - Information ratio against a benchmark series
//!
//! Every function is pure. Degenerate inputs (empty series, wipeout
//! returns, zero variance) are typed errors, never NaN or infinity: a
//! silently wrong performance number is worse than a failed run.

mod drawdown;
mod ratios;

pub use drawdown::{longest_drawdown, maximum_drawdown, Drawdown};
pub use ratios::{information_ratio, sharpe_ratio, sortino_ratio};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

/// Metrics input errors.
#[derive(Clone, Debug, PartialEq)]
pub enum MetricsError {
    /// Return (or benchmark) series is empty.
    Empty,
    /// Series is too short for the statistic.
    InsufficientData { needed: usize, got: usize },
    /// Return and benchmark series differ in length.
    LengthMismatch { returns: usize, benchmark: usize },
    /// A single-period return of -100% or worse.
    Wipeout { index: usize, value: f64 },
    /// NaN or infinite value in the input.
    NonFinite { index: usize },
    /// The ratio denominator is zero (constant series, no downside, ...).
    ZeroDenominator { metric: &'static str },
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::Empty => write!(f, "return series is empty"),
            MetricsError::InsufficientData { needed, got } => {
                write!(f, "need at least {} periods, got {}", needed, got)
            }
            MetricsError::LengthMismatch { returns, benchmark } => write!(
                f,
                "not equal length: returns={} benchmark={}",
                returns, benchmark
            ),
            MetricsError::Wipeout { index, value } => {
                write!(f, "return <= -1 at period {}: {}", index, value)
            }
            MetricsError::NonFinite { index } => {
                write!(f, "non-finite return at period {}", index)
            }
            MetricsError::ZeroDenominator { metric } => {
                write!(f, "{}: denominator is zero", metric)
            }
        }
    }
}

impl std::error::Error for MetricsError {}

/// Convert an exact return series for statistics. Values that do not fit
/// an `f64` become NaN and are rejected by the metric functions.
pub fn to_f64_series(values: &[Decimal]) -> Vec<f64> {
    values
        .iter()
        .map(|v| v.to_f64().unwrap_or(f64::NAN))
        .collect()
}

/// A return series paired with its benchmark.
#[derive(Clone, Debug, PartialEq)]
pub struct PerformanceMetrics {
    returns: Vec<f64>,
    benchmark: Vec<f64>,
}

impl PerformanceMetrics {
    pub fn new(returns: Vec<f64>, benchmark: Vec<f64>) -> Self {
        Self { returns, benchmark }
    }

    pub fn from_decimals(returns: &[Decimal], benchmark: &[Decimal]) -> Self {
        Self::new(to_f64_series(returns), to_f64_series(benchmark))
    }

    pub fn sharpe_ratio(&self, risk_free: f64) -> Result<f64, MetricsError> {
        sharpe_ratio(&self.returns, risk_free)
    }

    pub fn sortino_ratio(&self, risk_free: f64) -> Result<f64, MetricsError> {
        sortino_ratio(&self.returns, risk_free)
    }

    pub fn maximum_drawdown(&self) -> Result<Drawdown, MetricsError> {
        maximum_drawdown(&self.returns)
    }

    pub fn longest_drawdown(&self) -> Result<usize, MetricsError> {
        longest_drawdown(&self.returns)
    }

    pub fn information_ratio(&self) -> Result<f64, MetricsError> {
        information_ratio(&self.returns, &self.benchmark)
    }

    /// Evaluate every metric, keeping failures as messages instead of
    /// aborting the whole summary.
    pub fn summary(&self, risk_free: f64) -> PerformanceSummary {
        let mut errors = Vec::new();
        let mut keep = |name: &str, r: Result<f64, MetricsError>| match r {
            Ok(v) => Some(v),
            Err(e) => {
                errors.push(format!("{name}: {e}"));
                None
            }
        };

        let sharpe_ratio = keep("sharpe_ratio", self.sharpe_ratio(risk_free));
        let sortino_ratio = keep("sortino_ratio", self.sortino_ratio(risk_free));
        let information_ratio = keep("information_ratio", self.information_ratio());
        let max_drawdown = keep(
            "max_drawdown",
            self.maximum_drawdown().map(|d| d.max_drawdown),
        );
        let longest_drawdown = keep(
            "longest_drawdown",
            self.longest_drawdown().map(|n| n as f64),
        )
        .map(|n| n as usize);

        PerformanceSummary {
            periods: self.returns.len(),
            risk_free,
            sharpe_ratio,
            sortino_ratio,
            information_ratio,
            max_drawdown,
            longest_drawdown,
            errors,
        }
    }
}

/// Serializable snapshot of all metrics for one run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub periods: usize,
    pub risk_free: f64,
    pub sharpe_ratio: Option<f64>,
    pub sortino_ratio: Option<f64>,
    pub information_ratio: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub longest_drawdown: Option<usize>,
    pub errors: Vec<String>,
}

pub(crate) fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Every value equals the first. Such a series has zero spread even when
/// `std_dev` reports a tiny positive residue.
pub(crate) fn is_constant(xs: &[f64]) -> bool {
    xs.iter().all(|x| *x == xs[0])
}

/// Standard deviation with `ddof` delta degrees of freedom.
pub(crate) fn std_dev(xs: &[f64], ddof: usize) -> f64 {
    let m = mean(xs);
    let ss: f64 = xs.iter().map(|x| (x - m) * (x - m)).sum();
    (ss / (xs.len() - ddof) as f64).sqrt()
}

pub(crate) fn check_finite(xs: &[f64]) -> Result<(), MetricsError> {
    match xs.iter().position(|x| !x.is_finite()) {
        Some(index) => Err(MetricsError::NonFinite { index }),
        None => Ok(()),
    }
}

pub(crate) fn check_no_wipeout(xs: &[f64]) -> Result<(), MetricsError> {
    match xs.iter().position(|x| *x <= -1.0) {
        Some(index) => Err(MetricsError::Wipeout {
            index,
            value: xs[index],
        }),
        None => Ok(()),
    }
}
