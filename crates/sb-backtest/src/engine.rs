use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};

use sb_portfolio::{Money, PortfolioError, PortfolioState, PriceMap};

use crate::calendar::RebalanceCursor;
use crate::mark::mark_to_market;
use crate::rebalance::rebalance;
use crate::selection::{select, SelectionCriteria};
use crate::types::{
    AllocationSnapshot, BacktestConfig, BacktestReport, Panel, SuspendedRecord, TradeRecord,
};

/// Backtest error variants.
#[derive(Clone, Debug, PartialEq)]
pub enum BacktestError {
    /// Nothing to simulate.
    EmptyPanel,
    /// Starting capital must be > 0.
    NonPositiveCapital { capital: Money },
    /// A trade was rejected by the portfolio (forwarded).
    Portfolio {
        date: NaiveDate,
        source: PortfolioError,
    },
    /// A held ticker has neither a same-day row nor any earlier price.
    NoPriceHistory { date: NaiveDate, ticker: String },
    /// Total asset hit zero; later period returns are undefined.
    ZeroAsset { date: NaiveDate },
}

impl std::fmt::Display for BacktestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BacktestError::EmptyPanel => write!(f, "panel has no trading dates"),
            BacktestError::NonPositiveCapital { capital } => {
                write!(f, "starting capital must be positive: {}", capital)
            }
            BacktestError::Portfolio { date, source } => write!(f, "{}: {}", date, source),
            BacktestError::NoPriceHistory { date, ticker } => {
                write!(f, "{}: no price ever observed for held {}", date, ticker)
            }
            BacktestError::ZeroAsset { date } => {
                write!(f, "{}: total asset is zero", date)
            }
        }
    }
}

impl std::error::Error for BacktestError {}

/// Day-by-day rebalancing simulation.
///
/// Per trading date: rebalance if the calendar cursor fires, otherwise mark
/// to market; then append period return, cumulative return and asset.
/// An engine runs once; independent runs build independent engines.
pub struct BacktestEngine {
    config: BacktestConfig,
    portfolio: PortfolioState,
    /// Last observed close per ticker, for suspended holdings.
    last_prices: PriceMap,
    period_returns: Vec<Decimal>,
    cumulative_returns: Vec<Decimal>,
    assets: Vec<Money>,
    tracking_dates: Vec<NaiveDate>,
    rebalancing_dates: Vec<NaiveDate>,
    allocations: Vec<AllocationSnapshot>,
    suspended: Vec<SuspendedRecord>,
    trades: Vec<TradeRecord>,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Self {
        let portfolio = PortfolioState::new(config.initial_capital);
        Self {
            config,
            portfolio,
            last_prices: PriceMap::new(),
            period_returns: Vec::new(),
            cumulative_returns: Vec::new(),
            assets: Vec::new(),
            tracking_dates: Vec::new(),
            rebalancing_dates: Vec::new(),
            allocations: Vec::new(),
            suspended: Vec::new(),
            trades: Vec::new(),
        }
    }

    /// Run over every date of `panel` in order.
    pub fn run(
        mut self,
        panel: &Panel,
        calendar: &[NaiveDate],
        criteria: &SelectionCriteria,
    ) -> Result<BacktestReport, BacktestError> {
        let capital = self.portfolio.initial_capital;
        if !capital.is_positive() {
            return Err(BacktestError::NonPositiveCapital { capital });
        }
        if panel.is_empty() {
            return Err(BacktestError::EmptyPanel);
        }

        let mut cursor = RebalanceCursor::new(calendar.to_vec());
        let mut prev_asset = capital;

        for group in panel.groups() {
            let date = group.date();
            let asset = match cursor.advance(date) {
                Some(entry) => {
                    let selected = select(group, criteria);
                    debug!(%date, %entry, selected = selected.len(), "rebalance");
                    let out = rebalance(
                        &mut self.portfolio,
                        group,
                        &selected,
                        &self.config.fees,
                        self.config.allocation_policy,
                        &mut self.last_prices,
                    )?;
                    self.rebalancing_dates.push(date);
                    self.allocations.push(out.allocation);
                    self.trades.extend(out.trades);
                    self.suspended.extend(out.suspended);
                    out.total_asset
                }
                None => {
                    let out = mark_to_market(&self.portfolio, group, &mut self.last_prices)?;
                    self.suspended.extend(out.suspended);
                    out.total_asset
                }
            };

            let (period, cumulative) = returns_for(date, asset, prev_asset, capital)?;
            self.period_returns.push(period);
            self.cumulative_returns.push(cumulative);
            self.assets.push(asset);
            self.tracking_dates.push(date);
            prev_asset = asset;
        }

        info!(
            dates = self.tracking_dates.len(),
            rebalances = self.rebalancing_dates.len(),
            trades = self.trades.len(),
            suspended = self.suspended.len(),
            final_asset = %prev_asset,
            "backtest complete"
        );

        Ok(BacktestReport {
            initial_capital: capital,
            period_returns: self.period_returns,
            cumulative_returns: self.cumulative_returns,
            assets: self.assets,
            tracking_dates: self.tracking_dates,
            rebalancing_dates: self.rebalancing_dates,
            allocations: self.allocations,
            suspended: self.suspended,
            trades: self.trades,
            final_cash: self.portfolio.cash,
            final_holdings: self.portfolio.holdings,
        })
    }
}

/// `(asset / prev - 1, asset / capital - 1)`.
///
/// A zero asset is rejected on the date it occurs; every later period
/// return would divide by it.
fn returns_for(
    date: NaiveDate,
    asset: Money,
    prev_asset: Money,
    capital: Money,
) -> Result<(Decimal, Decimal), BacktestError> {
    if asset.is_zero() {
        return Err(BacktestError::ZeroAsset { date });
    }
    let period = asset
        .ratio(prev_asset)
        .ok_or(BacktestError::ZeroAsset { date })?;
    let cumulative = asset
        .ratio(capital)
        .ok_or(BacktestError::ZeroAsset { date })?;
    Ok((period - Decimal::ONE, cumulative - Decimal::ONE))
}

/// One-shot run with a fresh engine.
pub fn run(
    config: BacktestConfig,
    panel: &Panel,
    calendar: &[NaiveDate],
    criteria: &SelectionCriteria,
) -> Result<BacktestReport, BacktestError> {
    BacktestEngine::new(config).run(panel, calendar, criteria)
}
