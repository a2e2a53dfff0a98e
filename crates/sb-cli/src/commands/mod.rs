//! Command handler modules for the `sb` binary.
//!
//! Shared argument parsing lives here; command logic lives in the submodules.

pub mod backtest;
pub mod calendar;
pub mod config;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sb_config::Sample;

/// Parse a CLI `--sample` string.
pub fn parse_sample(s: &str) -> Result<Sample> {
    match s.trim().to_ascii_lowercase().as_str() {
        "in" | "in_sample" => Ok(Sample::In),
        "out" | "out_sample" => Ok(Sample::Out),
        other => anyhow::bail!("invalid --sample '{}'. expected one of: in | out", other),
    }
}

pub fn parse_date(flag: &str, s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid --{flag} date: {s}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_aliases() {
        assert_eq!(parse_sample("IN").unwrap(), Sample::In);
        assert_eq!(parse_sample("out_sample").unwrap(), Sample::Out);
        assert!(parse_sample("both").is_err());
    }

    #[test]
    fn dates_are_iso() {
        assert!(parse_date("from", "2023-01-01").is_ok());
        assert!(parse_date("from", "01/01/2023").is_err());
    }
}
