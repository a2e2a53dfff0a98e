use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use sb_metrics::{sharpe_ratio, to_f64_series, MetricsError, PerformanceMetrics};
use sb_portfolio::{AllocationPolicy, FeeSchedule, Holdings, Money};

/// One (date, ticker) observation of the input panel.
#[derive(Clone, Debug, PartialEq)]
pub struct InstrumentRow {
    pub date: NaiveDate,
    pub ticker: String,
    pub close: Money,
    /// Prior trading day's close. Both cash legs of a rebalance trade at it.
    pub prev_close: Money,
    /// Price/earnings screening ratio; `None` when undefined.
    pub pe: Option<f64>,
    /// Dividend-yield screening ratio; `None` when undefined.
    pub dy: Option<f64>,
}

impl InstrumentRow {
    pub fn new(
        date: NaiveDate,
        ticker: impl Into<String>,
        close: Money,
        prev_close: Money,
        pe: Option<f64>,
        dy: Option<f64>,
    ) -> Self {
        Self {
            date,
            ticker: ticker.into(),
            close,
            prev_close,
            pe,
            dy,
        }
    }
}

/// Cross-section of the panel for one date, ticker-ascending.
#[derive(Clone, Debug, PartialEq)]
pub struct DateGroup {
    date: NaiveDate,
    rows: Vec<InstrumentRow>,
}

impl DateGroup {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn rows(&self) -> &[InstrumentRow] {
        &self.rows
    }

    /// Same-day row for `ticker`, if quoted.
    pub fn get(&self, ticker: &str) -> Option<&InstrumentRow> {
        self.rows
            .binary_search_by(|r| r.ticker.as_str().cmp(ticker))
            .ok()
            .map(|i| &self.rows[i])
    }
}

/// Panel construction errors.
#[derive(Clone, Debug, PartialEq)]
pub enum PanelError {
    DuplicateRow {
        date: NaiveDate,
        ticker: String,
    },
    NonPositivePrice {
        date: NaiveDate,
        ticker: String,
        field: &'static str,
        value: Money,
    },
}

impl std::fmt::Display for PanelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PanelError::DuplicateRow { date, ticker } => {
                write!(f, "duplicate row for {} on {}", ticker, date)
            }
            PanelError::NonPositivePrice {
                date,
                ticker,
                field,
                value,
            } => write!(
                f,
                "non-positive {} for {} on {}: {}",
                field, ticker, date, value
            ),
        }
    }
}

impl std::error::Error for PanelError {}

/// Immutable, date-grouped input panel.
///
/// Groups are date-ascending, rows inside a group ticker-ascending, and
/// every (date, ticker) pair appears at most once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Panel {
    groups: Vec<DateGroup>,
}

impl Panel {
    pub fn from_rows(mut rows: Vec<InstrumentRow>) -> Result<Self, PanelError> {
        for r in &rows {
            for (field, value) in [("close", r.close), ("prev_close", r.prev_close)] {
                if !value.is_positive() {
                    return Err(PanelError::NonPositivePrice {
                        date: r.date,
                        ticker: r.ticker.clone(),
                        field,
                        value,
                    });
                }
            }
        }

        rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.ticker.cmp(&b.ticker)));

        let mut groups: Vec<DateGroup> = Vec::new();
        for row in rows {
            match groups.last_mut() {
                Some(g) if g.date == row.date => {
                    if g.rows.last().map(|r| r.ticker == row.ticker) == Some(true) {
                        return Err(PanelError::DuplicateRow {
                            date: row.date,
                            ticker: row.ticker,
                        });
                    }
                    g.rows.push(row);
                }
                _ => groups.push(DateGroup {
                    date: row.date,
                    rows: vec![row],
                }),
            }
        }
        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[DateGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of distinct trading dates.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.groups.iter().map(|g| g.date).collect()
    }

    /// Sub-panel with dates in `[from, to]`.
    pub fn clip(&self, from: NaiveDate, to: NaiveDate) -> Panel {
        Panel {
            groups: self
                .groups
                .iter()
                .filter(|g| g.date >= from && g.date <= to)
                .cloned()
                .collect(),
        }
    }
}

/// Static run parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: Money,
    pub fees: FeeSchedule,
    /// Zero-lot handling during cash allocation.
    pub allocation_policy: AllocationPolicy,
}

impl BacktestConfig {
    /// Vietnamese-market style defaults: 0.035% each way.
    pub fn test_defaults() -> Self {
        Self {
            initial_capital: Money::from_units(1_000_000_000),
            fees: FeeSchedule {
                buy: Decimal::new(35, 5),
                sell: Decimal::new(35, 5),
            },
            allocation_policy: AllocationPolicy::DropZeroLots,
        }
    }
}

/// Held ticker valued at a substituted price because it had no same-day row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SuspendedRecord {
    pub date: NaiveDate,
    pub ticker: String,
    pub fallback_price: Money,
}

/// Per-rebalance allocation summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AllocationSnapshot {
    pub date: NaiveDate,
    /// Market value of all holdings at the day's close after trading.
    pub holding_value: Money,
    pub cash_remaining: Money,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// One executed rebalance trade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub ticker: String,
    pub side: TradeSide,
    pub qty: u64,
    /// Reference price both cash legs use (prior close).
    pub price: Money,
    pub fee: Money,
    /// Signed change in cash: positive for sells, negative for buys.
    pub cash_delta: Money,
}

/// Result of a run.
///
/// `period_returns`, `cumulative_returns`, `assets` and `tracking_dates`
/// are parallel: one entry per processed trading date.
#[derive(Clone, Debug, PartialEq)]
pub struct BacktestReport {
    pub initial_capital: Money,
    pub period_returns: Vec<Decimal>,
    pub cumulative_returns: Vec<Decimal>,
    pub assets: Vec<Money>,
    pub tracking_dates: Vec<NaiveDate>,
    pub rebalancing_dates: Vec<NaiveDate>,
    pub allocations: Vec<AllocationSnapshot>,
    pub suspended: Vec<SuspendedRecord>,
    pub trades: Vec<TradeRecord>,
    pub final_cash: Money,
    pub final_holdings: Holdings,
}

impl BacktestReport {
    /// Final risk-adjusted score: Sharpe ratio of the period returns.
    pub fn score(&self, risk_free: f64) -> Result<f64, MetricsError> {
        sharpe_ratio(&to_f64_series(&self.period_returns), risk_free)
    }

    /// Last total asset, or the starting capital if nothing ran.
    pub fn final_asset(&self) -> Money {
        self.assets.last().copied().unwrap_or(self.initial_capital)
    }

    /// Metrics view pairing the period returns with benchmark returns.
    pub fn metrics(&self, benchmark_returns: &[Decimal]) -> PerformanceMetrics {
        PerformanceMetrics::from_decimals(&self.period_returns, benchmark_returns)
    }
}
