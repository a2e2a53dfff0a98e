use chrono::NaiveDate;
use sb_artifacts::{write_run_artifacts, RunManifest, WriteRunArtifactsArgs};
use sb_backtest::{
    run, BacktestConfig, BacktestReport, InstrumentRow, Panel, ScreenBounds, SelectionCriteria,
    DEFAULT_RISK_FREE,
};
use sb_portfolio::Money;
use uuid::Uuid;

fn d(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, m, day).unwrap()
}

fn row(date: NaiveDate, t: &str, prev: i64, close: i64) -> InstrumentRow {
    InstrumentRow::new(
        date,
        t,
        Money::from_units(close),
        Money::from_units(prev),
        Some(8.0),
        Some(-0.03),
    )
}

fn small_report() -> BacktestReport {
    let panel = Panel::from_rows(vec![
        row(d(1, 3), "AAA", 100, 101),
        row(d(1, 3), "BBB", 50, 49),
        row(d(1, 4), "AAA", 101, 103),
        row(d(1, 4), "BBB", 49, 50),
        row(d(1, 5), "AAA", 103, 102),
        row(d(1, 5), "BBB", 50, 51),
    ])
    .unwrap();
    let criteria = SelectionCriteria::new(
        ScreenBounds::new("pe", 0.0, 10.0).unwrap(),
        ScreenBounds::new("dy", -1.0, 0.0).unwrap(),
    );
    run(BacktestConfig::test_defaults(), &panel, &[d(1, 1)], &criteria).unwrap()
}

#[test]
fn all_artifacts_are_written_and_manifest_names_config() {
    let tmp = tempfile::tempdir().unwrap();
    let report = small_report();
    let bench = report.period_returns.clone();
    let summary = report.metrics(&bench).summary(DEFAULT_RISK_FREE);
    let run_id = Uuid::new_v4();

    let res = write_run_artifacts(WriteRunArtifactsArgs {
        exports_root: tmp.path(),
        run_id,
        sample: "in_sample",
        from: d(1, 1),
        to: d(1, 31),
        config_hash: "abc123",
        report: &report,
        benchmark_returns: Some(bench.as_slice()),
        metrics: &summary,
    })
    .unwrap();

    assert_eq!(res.run_dir, tmp.path().join(run_id.to_string()));
    for f in [
        "manifest.json",
        "returns.csv",
        "allocations.csv",
        "suspended.csv",
        "trades.csv",
        "metrics.json",
    ] {
        assert!(res.run_dir.join(f).is_file(), "missing {f}");
    }

    let manifest: RunManifest =
        serde_json::from_str(&std::fs::read_to_string(&res.manifest_path).unwrap()).unwrap();
    assert_eq!(manifest.run_id, run_id);
    assert_eq!(manifest.config_hash, "abc123");
    assert_eq!(manifest.sample, "in_sample");

    let returns = std::fs::read_to_string(res.run_dir.join("returns.csv")).unwrap();
    let lines: Vec<&str> = returns.lines().collect();
    assert_eq!(
        lines[0],
        "date,period_return,cumulative_return,asset,benchmark_return,rebalanced"
    );
    assert_eq!(lines.len(), 1 + report.tracking_dates.len());
    assert!(lines[1].starts_with("2023-01-03,"));
    assert!(lines[1].ends_with(",true"));
    assert!(lines[2].ends_with(",false"));

    // Nothing suspended: header only.
    let suspended = std::fs::read_to_string(res.run_dir.join("suspended.csv")).unwrap();
    assert_eq!(suspended.trim_end(), "date,ticker,fallback_price");

    let trades = std::fs::read_to_string(res.run_dir.join("trades.csv")).unwrap();
    assert!(trades.lines().count() >= 3);
    assert!(trades.contains(",BUY,"));

    let metrics: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(res.run_dir.join("metrics.json")).unwrap())
            .unwrap();
    assert_eq!(metrics["periods"], 3);
}

#[test]
fn misaligned_benchmark_is_rejected_before_writing() {
    let tmp = tempfile::tempdir().unwrap();
    let report = small_report();
    let bench = vec![rust_decimal::Decimal::ZERO];
    let summary = report.metrics(&report.period_returns).summary(DEFAULT_RISK_FREE);
    let run_id = Uuid::new_v4();

    let err = write_run_artifacts(WriteRunArtifactsArgs {
        exports_root: tmp.path(),
        run_id,
        sample: "in_sample",
        from: d(1, 1),
        to: d(1, 31),
        config_hash: "abc123",
        report: &report,
        benchmark_returns: Some(bench.as_slice()),
        metrics: &summary,
    })
    .err()
    .expect("length mismatch");

    assert!(err.to_string().contains("not aligned"));
    assert!(!tmp.path().join(run_id.to_string()).exists());
}
