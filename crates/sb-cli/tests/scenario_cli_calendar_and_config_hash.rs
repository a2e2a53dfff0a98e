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

#[test]
fn calendar_lists_first_of_each_month_including_start_month() {
    Command::cargo_bin("sb")
        .unwrap()
        .args(["calendar", "--from", "2023-01-15", "--to", "2023-04-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rebalance_dates=4"))
        .stdout(predicate::str::contains("2023-01-01"))
        .stdout(predicate::str::contains("2023-04-01"))
        .stdout(predicate::str::contains("2023-05-01").not());
}

#[test]
fn calendar_rejects_inverted_range() {
    Command::cargo_bin("sb")
        .unwrap()
        .args(["calendar", "--from", "2023-05-01", "--to", "2023-04-01"])
        .assert()
        .failure();
}

#[test]
fn config_hash_is_stable_across_invocations() {
    let run = || {
        let out = Command::cargo_bin("sb")
            .unwrap()
            .args(["config-hash", &fixture("base.yaml")])
            .output()
            .unwrap();
        assert!(out.status.success());
        String::from_utf8(out.stdout).unwrap()
    };
    let a = run();
    assert!(a.starts_with("config_hash="));
    assert_eq!(a, run());
}
