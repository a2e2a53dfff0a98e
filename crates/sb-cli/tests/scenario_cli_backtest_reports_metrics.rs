use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command;

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
        .to_string_lossy()
        .to_string()
}

fn sb() -> Command {
    let mut cmd = Command::cargo_bin("sb").expect("sb binary");
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn backtest_prints_key_value_summary() {
    sb().args([
        "backtest",
        "--config",
        &fixture("base.yaml"),
        "--panel",
        &fixture("panel_small.csv"),
        "--benchmark",
        &fixture("benchmark_small.csv"),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("backtest_ok=true"))
    .stdout(predicate::str::contains("sample=in_sample"))
    .stdout(predicate::str::contains("dates=5"))
    .stdout(predicate::str::contains("rebalances=2"))
    .stdout(predicate::str::contains("suspended=1"))
    .stdout(predicate::str::contains("information_ratio="))
    .stdout(predicate::str::contains("information_ratio=NA").not())
    .stdout(predicate::str::contains("artifacts_written=false"));
}

#[test]
fn backtest_without_benchmark_reports_na_information_ratio() {
    sb().args([
        "backtest",
        "--config",
        &fixture("base.yaml"),
        "--panel",
        &fixture("panel_small.csv"),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("information_ratio=NA"))
    .stdout(predicate::str::contains("sharpe="));
}

#[test]
fn backtest_writes_artifacts_when_out_is_given() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().to_string_lossy().to_string();

    let output = sb()
        .args([
            "backtest",
            "--config",
            &fixture("base.yaml"),
            "--panel",
            &fixture("panel_small.csv"),
            "--benchmark",
            &fixture("benchmark_small.csv"),
            "--out",
            &out,
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("artifacts_written=true"));
    let run_id = stdout
        .lines()
        .find_map(|l| l.strip_prefix("run_id="))
        .expect("run_id line");

    let run_dir = tmp.path().join(run_id);
    assert!(run_dir.join("manifest.json").is_file());
    assert!(run_dir.join("returns.csv").is_file());
    assert!(run_dir.join("suspended.csv").is_file());
    assert!(run_dir.join("metrics.json").is_file());
}

#[test]
fn screen_override_can_empty_the_selection() {
    // No fixture row has pe in [100, 200]: cash stays idle, no error.
    sb().args([
        "backtest",
        "--config",
        &fixture("base.yaml"),
        "--panel",
        &fixture("panel_small.csv"),
        "--pe-low",
        "100",
        "--pe-high",
        "200",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("final_asset=1000000"))
    .stdout(predicate::str::contains("suspended=0"));
}

#[test]
fn unconfigured_out_sample_is_rejected() {
    sb().args([
        "backtest",
        "--config",
        &fixture("base.yaml"),
        "--panel",
        &fixture("panel_small.csv"),
        "--sample",
        "out",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("out_sample is not configured"));
}

#[test]
fn strict_config_fails_on_unread_keys() {
    sb().args([
        "backtest",
        "--config",
        &fixture("base.yaml"),
        "--config",
        &fixture("extra_key.yaml"),
        "--panel",
        &fixture("panel_small.csv"),
        "--strict-config",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("CONFIG_UNUSED_KEYS"));
}
