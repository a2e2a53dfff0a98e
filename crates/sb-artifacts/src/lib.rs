use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use sb_backtest::BacktestReport;
use sb_metrics::PerformanceSummary;

pub const SCHEMA_VERSION: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: i32,
    pub run_id: Uuid,
    /// `in_sample` / `out_sample`.
    pub sample: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub config_hash: String,
    pub created_at_utc: DateTime<Utc>,
    pub artifacts: ArtifactList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactList {
    pub manifest_json: String,
    pub returns_csv: String,
    pub allocations_csv: String,
    pub suspended_csv: String,
    pub trades_csv: String,
    pub metrics_json: String,
}

impl Default for ArtifactList {
    fn default() -> Self {
        Self {
            manifest_json: "manifest.json".to_string(),
            returns_csv: "returns.csv".to_string(),
            allocations_csv: "allocations.csv".to_string(),
            suspended_csv: "suspended.csv".to_string(),
            trades_csv: "trades.csv".to_string(),
            metrics_json: "metrics.json".to_string(),
        }
    }
}

pub struct WriteRunArtifactsArgs<'a> {
    pub exports_root: &'a Path, // e.g. ./exports
    pub run_id: Uuid,
    pub sample: &'a str,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub config_hash: &'a str,
    pub report: &'a BacktestReport,
    /// Benchmark returns aligned with `report.tracking_dates`, if available.
    pub benchmark_returns: Option<&'a [Decimal]>,
    pub metrics: &'a PerformanceSummary,
}

pub struct WriteRunArtifactsResult {
    pub run_dir: PathBuf,
    pub manifest_path: PathBuf,
}

const RETURNS_HEADER: &[&str] = &[
    "date",
    "period_return",
    "cumulative_return",
    "asset",
    "benchmark_return",
    "rebalanced",
];

#[derive(Serialize)]
struct ReturnRow {
    date: NaiveDate,
    period_return: Decimal,
    cumulative_return: Decimal,
    asset: Decimal,
    benchmark_return: Option<Decimal>,
    rebalanced: bool,
}

/// Write `exports/<run_id>/` with the manifest, per-date series, audit logs
/// and metrics. Existing files for the same run id are overwritten.
pub fn write_run_artifacts(args: WriteRunArtifactsArgs<'_>) -> Result<WriteRunArtifactsResult> {
    let report = args.report;
    if let Some(b) = args.benchmark_returns {
        if b.len() != report.tracking_dates.len() {
            bail!(
                "benchmark returns ({}) not aligned with tracking dates ({})",
                b.len(),
                report.tracking_dates.len()
            );
        }
    }

    let run_dir = args.exports_root.join(args.run_id.to_string());
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("create exports dir failed: {}", run_dir.display()))?;
    let files = ArtifactList::default();

    let mut rebalanced = report.rebalancing_dates.iter().peekable();
    let returns = (0..report.tracking_dates.len()).map(|i| {
        let date = report.tracking_dates[i];
        let hit = rebalanced.next_if(|d| **d == date).is_some();
        ReturnRow {
            date,
            period_return: report.period_returns[i],
            cumulative_return: report.cumulative_returns[i],
            asset: report.assets[i].raw(),
            benchmark_return: args.benchmark_returns.map(|b| b[i]),
            rebalanced: hit,
        }
    });
    write_csv(&run_dir.join(&files.returns_csv), RETURNS_HEADER, returns)?;
    write_csv(
        &run_dir.join(&files.allocations_csv),
        &["date", "holding_value", "cash_remaining"],
        report.allocations.iter(),
    )?;
    write_csv(
        &run_dir.join(&files.suspended_csv),
        &["date", "ticker", "fallback_price"],
        report.suspended.iter(),
    )?;
    write_csv(
        &run_dir.join(&files.trades_csv),
        &["date", "ticker", "side", "qty", "price", "fee", "cash_delta"],
        report.trades.iter(),
    )?;

    let metrics_path = run_dir.join(&files.metrics_json);
    let json = serde_json::to_string_pretty(args.metrics).context("serialize metrics failed")?;
    fs::write(&metrics_path, format!("{json}\n"))
        .with_context(|| format!("write metrics failed: {}", metrics_path.display()))?;

    let manifest = RunManifest {
        schema_version: SCHEMA_VERSION,
        run_id: args.run_id,
        sample: args.sample.to_string(),
        from: args.from,
        to: args.to,
        config_hash: args.config_hash.to_string(),
        created_at_utc: Utc::now(),
        artifacts: files,
    };
    let manifest_path = run_dir.join(&manifest.artifacts.manifest_json);
    let json = serde_json::to_string_pretty(&manifest).context("serialize manifest failed")?;
    fs::write(&manifest_path, format!("{json}\n"))
        .with_context(|| format!("write manifest failed: {}", manifest_path.display()))?;

    Ok(WriteRunArtifactsResult {
        run_dir,
        manifest_path,
    })
}

/// `header` is written only when there are no rows; otherwise it comes
/// from the serialized field names.
fn write_csv<T, I>(path: &Path, header: &[&str], rows: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("create csv failed: {}", path.display()))?;
    let mut wrote_any = false;
    for row in rows {
        w.serialize(row)
            .with_context(|| format!("write csv row failed: {}", path.display()))?;
        wrote_any = true;
    }
    if !wrote_any {
        w.write_record(header)?;
    }
    w.flush()
        .with_context(|| format!("flush csv failed: {}", path.display()))?;
    Ok(())
}
