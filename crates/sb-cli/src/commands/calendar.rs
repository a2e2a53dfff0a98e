use anyhow::Result;

use super::parse_date;

/// `sb calendar`: one rebalance trigger date per line.
pub fn print_calendar(from: &str, to: &str) -> Result<()> {
    let from = parse_date("from", from)?;
    let to = parse_date("to", to)?;
    if to < from {
        anyhow::bail!("--to must be >= --from");
    }
    let dates = sb_backtest::first_trading_dates(from, to);
    println!("rebalance_dates={}", dates.len());
    for d in dates {
        println!("{d}");
    }
    Ok(())
}
