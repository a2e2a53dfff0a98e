//! Panel and benchmark CSV loaders (deterministic).
//!
//! Panel CSV
//!
//! Required columns:
//! - `date` (`YYYY-MM-DD`)
//! - `ticker` (or `tickersymbol`)
//! - `close`
//!
//! Optional columns:
//! - `prev_close` (default: the row's own `close`)
//! - `pe`, `dy` (empty or `nan` = undefined)
//! - `eps`, `dps`: used only when `pe` / `dy` are absent;
//!   `pe = prev_close * 1000 / eps` (undefined for `eps <= 0`),
//!   `dy = -dps / (prev_close * 1000)`
//!
//! Unknown columns (e.g. a leading index column) are ignored.
//!
//! Benchmark CSV: `date`, `close`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sb_portfolio::Money;

use crate::benchmark::{BenchmarkError, BenchmarkSeries};
use crate::types::{InstrumentRow, Panel, PanelError};

/// Loader errors are small, explicit, and test-friendly.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    EmptyInput,
    MissingHeader(&'static str),
    Parse {
        line: u64,
        column: &'static str,
        value: String,
    },
    BadRow { line: u64, reason: String },
    Csv(String),
    Io(String),
    Panel(PanelError),
    Benchmark(BenchmarkError),
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e.to_string())
    }
}

impl From<csv::Error> for LoadError {
    fn from(e: csv::Error) -> Self {
        LoadError::Csv(e.to_string())
    }
}

impl From<PanelError> for LoadError {
    fn from(e: PanelError) -> Self {
        LoadError::Panel(e)
    }
}

impl From<BenchmarkError> for LoadError {
    fn from(e: BenchmarkError) -> Self {
        LoadError::Benchmark(e)
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::EmptyInput => write!(f, "empty input"),
            LoadError::MissingHeader(h) => write!(f, "missing header: {}", h),
            LoadError::Parse {
                line,
                column,
                value,
            } => write!(
                f,
                "line {}: failed to parse column {}: {:?}",
                line, column, value
            ),
            LoadError::BadRow { line, reason } => write!(f, "bad row at line {}: {}", line, reason),
            LoadError::Csv(e) => write!(f, "csv error: {}", e),
            LoadError::Io(e) => write!(f, "io error: {}", e),
            LoadError::Panel(e) => write!(f, "panel: {}", e),
            LoadError::Benchmark(e) => write!(f, "benchmark: {}", e),
        }
    }
}

impl std::error::Error for LoadError {}

pub fn load_panel_file(path: impl AsRef<Path>) -> Result<Panel, LoadError> {
    let s = fs::read_to_string(path)?;
    parse_panel_csv(&s)
}

pub fn load_benchmark_file(path: impl AsRef<Path>) -> Result<BenchmarkSeries, LoadError> {
    let s = fs::read_to_string(path)?;
    parse_benchmark_csv(&s)
}

/// Parse a panel from CSV content (pure, deterministic).
pub fn parse_panel_csv(csv: &str) -> Result<Panel, LoadError> {
    let mut rdr = reader(csv);
    let idx = header_index(&mut rdr)?;

    let col_date = find_required(&idx, &["date"], "date")?;
    let col_ticker = find_required(&idx, &["ticker", "tickersymbol"], "ticker")?;
    let col_close = find_required(&idx, &["close"], "close")?;
    let col_prev = idx.get("prev_close").copied();
    let col_pe = idx.get("pe").copied();
    let col_dy = idx.get("dy").copied();
    let col_eps = idx.get("eps").copied();
    let col_dps = idx.get("dps").copied();

    let mut rows = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let line = rec.position().map(|p| p.line()).unwrap_or(0);
        let get = |col: usize| -> Result<&str, LoadError> {
            rec.get(col).ok_or_else(|| LoadError::BadRow {
                line,
                reason: format!("missing column index {col}"),
            })
        };

        let date = parse_date(get(col_date)?, line)?;
        let ticker = get(col_ticker)?.to_string();
        if ticker.is_empty() {
            return Err(LoadError::BadRow {
                line,
                reason: "ticker is empty".to_string(),
            });
        }
        let close = parse_decimal(get(col_close)?, "close", line)?.ok_or_else(|| {
            LoadError::BadRow {
                line,
                reason: "close is empty".to_string(),
            }
        })?;
        let prev_close = match col_prev {
            Some(c) => parse_decimal(get(c)?, "prev_close", line)?.unwrap_or(close),
            None => close,
        };

        let pe = match (col_pe, col_eps) {
            (Some(c), _) => parse_ratio(get(c)?, "pe", line)?,
            (None, Some(c)) => parse_decimal(get(c)?, "eps", line)?
                .filter(|eps| *eps > Decimal::ZERO)
                .and_then(|eps| (prev_close * Decimal::ONE_THOUSAND).checked_div(eps))
                .and_then(|v| v.to_f64()),
            (None, None) => None,
        };
        let dy = match (col_dy, col_dps) {
            (Some(c), _) => parse_ratio(get(c)?, "dy", line)?,
            (None, Some(c)) => parse_decimal(get(c)?, "dps", line)?
                .and_then(|dps| (-dps).checked_div(prev_close * Decimal::ONE_THOUSAND))
                .and_then(|v| v.to_f64()),
            (None, None) => None,
        };

        rows.push(InstrumentRow::new(
            date,
            ticker,
            Money::new(close),
            Money::new(prev_close),
            pe,
            dy,
        ));
    }

    if rows.is_empty() {
        return Err(LoadError::EmptyInput);
    }
    Ok(Panel::from_rows(rows)?)
}

/// Parse benchmark closes from CSV content.
pub fn parse_benchmark_csv(csv: &str) -> Result<BenchmarkSeries, LoadError> {
    let mut rdr = reader(csv);
    let idx = header_index(&mut rdr)?;
    let col_date = find_required(&idx, &["date"], "date")?;
    let col_close = find_required(&idx, &["close"], "close")?;

    let mut closes = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let line = rec.position().map(|p| p.line()).unwrap_or(0);
        let (Some(d), Some(c)) = (rec.get(col_date), rec.get(col_close)) else {
            return Err(LoadError::BadRow {
                line,
                reason: "short row".to_string(),
            });
        };
        let close = parse_decimal(c, "close", line)?.ok_or_else(|| LoadError::BadRow {
            line,
            reason: "close is empty".to_string(),
        })?;
        closes.push((parse_date(d, line)?, close));
    }

    if closes.is_empty() {
        return Err(LoadError::EmptyInput);
    }
    Ok(BenchmarkSeries::from_closes(closes)?)
}

fn reader(csv: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(csv.trim_start_matches('\u{feff}').as_bytes())
}

fn header_index(rdr: &mut csv::Reader<&[u8]>) -> Result<BTreeMap<String, usize>, LoadError> {
    let headers = rdr.headers()?;
    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::EmptyInput);
    }
    Ok(headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_string(), i))
        .collect())
}

fn find_required(
    idx: &BTreeMap<String, usize>,
    names: &[&str],
    canonical: &'static str,
) -> Result<usize, LoadError> {
    names
        .iter()
        .find_map(|n| idx.get(*n).copied())
        .ok_or(LoadError::MissingHeader(canonical))
}

fn parse_date(s: &str, line: u64) -> Result<NaiveDate, LoadError> {
    // Accept a trailing time component ("2023-01-03 00:00:00").
    let day = s.split([' ', 'T']).next().unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| LoadError::Parse {
        line,
        column: "date",
        value: s.to_string(),
    })
}

/// Empty cell = `None`.
fn parse_decimal(s: &str, column: &'static str, line: u64) -> Result<Option<Decimal>, LoadError> {
    if s.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map(Some)
        .map_err(|_| LoadError::Parse {
            line,
            column,
            value: s.to_string(),
        })
}

/// Empty, `nan` and infinite cells are undefined ratios.
fn parse_ratio(s: &str, column: &'static str, line: u64) -> Result<Option<f64>, LoadError> {
    if s.is_empty() {
        return Ok(None);
    }
    let v = s.parse::<f64>().map_err(|_| LoadError::Parse {
        line,
        column,
        value: s.to_string(),
    })?;
    Ok(v.is_finite().then_some(v))
}
