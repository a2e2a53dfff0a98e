//! `sb backtest`: config -> panel -> engine -> metrics -> (artifacts).

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

use sb_config::{BacktestParams, UnusedKeyPolicy};
use sb_portfolio::AllocationPolicy;

use super::parse_sample;

pub struct BacktestArgs {
    pub config_paths: Vec<String>,
    pub panel: String,
    pub benchmark: Option<String>,
    pub sample: String,
    pub pe: Option<[f64; 2]>,
    pub dy: Option<[f64; 2]>,
    pub redistribute: bool,
    pub out: Option<String>,
    pub strict_config: bool,
}

pub fn run_backtest(args: BacktestArgs) -> Result<()> {
    let path_refs: Vec<&str> = args.config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = sb_config::load_layered_yaml(&path_refs)?;

    let policy = if args.strict_config {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let unused = sb_config::report_unused_keys(&loaded.config_json, policy)?;
    for p in &unused.unused_leaf_pointers {
        warn!(pointer = %p, "config key is not read by the backtest");
    }

    let mut params = BacktestParams::from_config_json(&loaded.config_json)?;
    if args.pe.is_some() || args.dy.is_some() {
        let pe = args.pe.unwrap_or([params.selection.pe.low, params.selection.pe.high]);
        let dy = args.dy.unwrap_or([params.selection.dy.low, params.selection.dy.high]);
        params = params.with_selection(pe, dy)?;
    }
    if args.redistribute {
        params.allocation_policy = AllocationPolicy::Redistribute;
    }

    let sample = parse_sample(&args.sample)?;
    let window = params.window(sample)?;
    let panel_end = window.panel_end(params.forward_period_days);

    let panel = sb_backtest::load_panel_file(&args.panel)
        .with_context(|| format!("load panel csv failed: {}", args.panel))?
        .clip(window.from, panel_end);
    if panel.is_empty() {
        anyhow::bail!(
            "panel has no rows in {} .. {} ({})",
            window.from,
            panel_end,
            sample.as_str()
        );
    }

    let calendar = window.calendar();
    info!(
        sample = sample.as_str(),
        from = %window.from,
        to = %panel_end,
        dates = panel.len(),
        rebalance_slots = calendar.len(),
        "starting backtest"
    );

    let report = sb_backtest::run(
        params.backtest_config(),
        &panel,
        &calendar,
        &params.selection,
    )
    .context("backtest run failed")?;

    let benchmark_returns = match args.benchmark.as_deref() {
        Some(path) => {
            let series = sb_backtest::load_benchmark_file(path)
                .with_context(|| format!("load benchmark csv failed: {}", path))?;
            Some(
                series
                    .aligned_returns(&report.tracking_dates)
                    .context("benchmark does not cover the simulated dates")?,
            )
        }
        None => None,
    };

    let summary = report
        .metrics(benchmark_returns.as_deref().unwrap_or(&[]))
        .summary(params.risk_free);
    for e in &summary.errors {
        warn!(metric_error = %e, "metric unavailable");
    }

    println!("backtest_ok=true");
    println!("sample={}", sample.as_str());
    println!("from={}", window.from);
    println!("to={}", panel_end);
    println!("config_hash={}", loaded.config_hash);
    println!("dates={}", report.tracking_dates.len());
    println!("sharpe={}", opt(summary.sharpe_ratio));
    println!("information_ratio={}", opt(summary.information_ratio));
    println!("sortino={}", opt(summary.sortino_ratio));
    println!("max_drawdown={}", opt(summary.max_drawdown));
    println!("longest_drawdown={}", opt(summary.longest_drawdown));
    println!("final_asset={}", report.final_asset());
    println!("rebalances={}", report.rebalancing_dates.len());
    println!("suspended={}", report.suspended.len());

    if let Some(dir) = args.out.as_deref() {
        let run_id = Uuid::new_v4();
        let res = sb_artifacts::write_run_artifacts(sb_artifacts::WriteRunArtifactsArgs {
            exports_root: Path::new(dir),
            run_id,
            sample: sample.as_str(),
            from: window.from,
            to: panel_end,
            config_hash: &loaded.config_hash,
            report: &report,
            benchmark_returns: benchmark_returns.as_deref(),
            metrics: &summary,
        })
        .with_context(|| format!("write run artifacts failed: {}", dir))?;
        println!("run_id={}", run_id);
        println!("artifacts_written=true run_dir={}", res.run_dir.display());
    } else {
        println!("artifacts_written=false");
    }

    Ok(())
}

/// `NA` for metrics that could not be computed.
fn opt<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| "NA".to_string())
}
