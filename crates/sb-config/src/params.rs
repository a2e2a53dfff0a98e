//! Typed backtest parameters.
//!
//! ```yaml
//! backtest:
//!   capital: "1000000000"
//!   buy_fee: "0.00035"
//!   sell_fee: "0.00035"
//!   risk_free: 0.03
//!   forward_period_days: 40
//!   allocation_policy: drop_zero_lots   # or redistribute
//! sample:
//!   in_sample:  { from: "2016-01-01", to: "2021-12-31" }
//!   out_sample: { from: "2022-01-01", to: "2023-12-31" }
//! selection:
//!   pe: [5.0, 12.0]
//!   dy: [-0.2, -0.01]
//! ```

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use sb_backtest::{
    first_trading_dates, BacktestConfig, ScreenBounds, SelectionCriteria, DEFAULT_RISK_FREE,
};
use sb_portfolio::{AllocationPolicy, FeeSchedule, Money};

/// Calendar days simulated past the last rebalance month.
pub const DEFAULT_FORWARD_PERIOD_DAYS: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    In,
    Out,
}

impl Sample {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sample::In => "in_sample",
            Sample::Out => "out_sample",
        }
    }
}

/// Inclusive backtest date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SampleWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl SampleWindow {
    /// Rebalance trigger dates: first day of each month in the window.
    pub fn calendar(&self) -> Vec<NaiveDate> {
        first_trading_dates(self.from, self.to)
    }

    /// Last panel date simulated: `to + forward_days`.
    pub fn panel_end(&self, forward_days: u32) -> NaiveDate {
        self.to + Duration::days(i64::from(forward_days))
    }
}

#[derive(Debug, Deserialize)]
struct RawBacktest {
    capital: Decimal,
    buy_fee: Decimal,
    sell_fee: Decimal,
    #[serde(default = "default_risk_free")]
    risk_free: f64,
    #[serde(default = "default_forward")]
    forward_period_days: u32,
    #[serde(default)]
    allocation_policy: AllocationPolicy,
}

#[derive(Debug, Deserialize)]
struct RawSample {
    in_sample: SampleWindow,
    #[serde(default)]
    out_sample: Option<SampleWindow>,
}

#[derive(Debug, Deserialize)]
struct RawSelection {
    pe: [f64; 2],
    dy: [f64; 2],
}

fn default_risk_free() -> f64 {
    DEFAULT_RISK_FREE
}

fn default_forward() -> u32 {
    DEFAULT_FORWARD_PERIOD_DAYS
}

/// Validated run parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestParams {
    pub capital: Money,
    pub fees: FeeSchedule,
    pub risk_free: f64,
    pub forward_period_days: u32,
    pub allocation_policy: AllocationPolicy,
    pub in_sample: SampleWindow,
    pub out_sample: Option<SampleWindow>,
    pub selection: SelectionCriteria,
}

impl BacktestParams {
    /// Read `/backtest`, `/sample` and `/selection` from a merged config.
    pub fn from_config_json(config: &Value) -> Result<Self> {
        let raw_bt: RawBacktest = section(config, "/backtest")?;
        let raw_sample: RawSample = section(config, "/sample")?;
        let raw_sel: RawSelection = section(config, "/selection")?;

        if raw_bt.capital <= Decimal::ZERO {
            bail!("CONFIG_INVALID /backtest/capital must be > 0 (got {})", raw_bt.capital);
        }
        let fees = FeeSchedule::new(raw_bt.buy_fee, raw_bt.sell_fee)
            .map_err(|e| anyhow::anyhow!("CONFIG_INVALID /backtest: {e}"))?;
        if !raw_bt.risk_free.is_finite() {
            bail!("CONFIG_INVALID /backtest/risk_free must be finite");
        }

        check_window("in_sample", &raw_sample.in_sample)?;
        if let Some(w) = &raw_sample.out_sample {
            check_window("out_sample", w)?;
        }

        let selection = selection_from(raw_sel.pe, raw_sel.dy)?;

        Ok(Self {
            capital: Money::new(raw_bt.capital),
            fees,
            risk_free: raw_bt.risk_free,
            forward_period_days: raw_bt.forward_period_days,
            allocation_policy: raw_bt.allocation_policy,
            in_sample: raw_sample.in_sample,
            out_sample: raw_sample.out_sample,
            selection,
        })
    }

    pub fn window(&self, sample: Sample) -> Result<SampleWindow> {
        match sample {
            Sample::In => Ok(self.in_sample),
            Sample::Out => self
                .out_sample
                .context("CONFIG_INVALID /sample/out_sample is not configured"),
        }
    }

    pub fn backtest_config(&self) -> BacktestConfig {
        BacktestConfig {
            initial_capital: self.capital,
            fees: self.fees,
            allocation_policy: self.allocation_policy,
        }
    }

    /// Replace the configured screen (e.g. from command-line bounds).
    pub fn with_selection(mut self, pe: [f64; 2], dy: [f64; 2]) -> Result<Self> {
        self.selection = selection_from(pe, dy)?;
        Ok(self)
    }
}

fn section<T: for<'de> Deserialize<'de>>(config: &Value, pointer: &str) -> Result<T> {
    let v = config
        .pointer(pointer)
        .with_context(|| format!("CONFIG_MISSING {pointer}"))?;
    serde_json::from_value(v.clone()).with_context(|| format!("CONFIG_INVALID {pointer}"))
}

fn check_window(name: &str, w: &SampleWindow) -> Result<()> {
    if w.from > w.to {
        bail!(
            "CONFIG_INVALID /sample/{name}: from {} is after to {}",
            w.from,
            w.to
        );
    }
    Ok(())
}

fn selection_from(pe: [f64; 2], dy: [f64; 2]) -> Result<SelectionCriteria> {
    let pe = ScreenBounds::new("pe", pe[0], pe[1])
        .map_err(|e| anyhow::anyhow!("CONFIG_INVALID /selection: {e}"))?;
    let dy = ScreenBounds::new("dy", dy[0], dy[1])
        .map_err(|e| anyhow::anyhow!("CONFIG_INVALID /selection: {e}"))?;
    Ok(SelectionCriteria::new(pe, dy))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_end_extends_past_window() {
        let w = SampleWindow {
            from: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
        };
        assert_eq!(
            w.panel_end(DEFAULT_FORWARD_PERIOD_DAYS),
            NaiveDate::from_ymd_opt(2023, 2, 9).unwrap()
        );
        assert_eq!(w.calendar().len(), 12);
    }
}
