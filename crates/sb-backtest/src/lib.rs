//! sb-backtest
//!
//! Monthly value-screen rebalancing simulation.
//!
//! Pipeline per trading date: CALENDAR -> (SELECT -> SELL -> ALLOCATE -> BUY) | MARK -> RETURNS
//!
//! - Deterministic single pass over an immutable date-grouped panel
//! - PE/DY screen, equal cash weight, 100-share lots
//! - Both cash legs at prior close, valuation at current close
//! - Suspended holdings valued at their last known price, with an audit trail
//! - Exact decimal money via sb-portfolio; metrics via sb-metrics

mod benchmark;
mod engine;
mod mark;
mod rebalance;

pub mod calendar;
pub mod loader;
pub mod selection;
pub mod types;

pub use benchmark::{BenchmarkError, BenchmarkPoint, BenchmarkSeries};
pub use calendar::{first_trading_dates, RebalanceCursor};
pub use engine::{run, BacktestEngine, BacktestError};
pub use loader::{
    load_benchmark_file, load_panel_file, parse_benchmark_csv, parse_panel_csv, LoadError,
};
pub use mark::{mark_to_market, MarkOutcome};
pub use rebalance::{rebalance, RebalanceOutcome};
pub use selection::{select, ScreenBounds, SelectionCriteria, SelectionError};
pub use types::{
    AllocationSnapshot, BacktestConfig, BacktestReport, DateGroup, InstrumentRow, Panel,
    PanelError, SuspendedRecord, TradeRecord, TradeSide,
};

/// Per-period risk-free hurdle used for the final score.
pub const DEFAULT_RISK_FREE: f64 = 0.03;
