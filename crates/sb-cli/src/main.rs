use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sb")]
#[command(about = "Value-screen rebalancing backtester", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monthly rebalancing backtest over a panel CSV
    Backtest {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Panel CSV (date, ticker, close, prev_close, pe, dy)
        #[arg(long)]
        panel: String,

        /// Benchmark CSV (date, close); enables the information ratio
        #[arg(long)]
        benchmark: Option<String>,

        /// Sample window (in | out)
        #[arg(long, default_value = "in")]
        sample: String,

        /// Override the configured PE screen (both bounds required)
        #[arg(long, requires = "pe_high", allow_hyphen_values = true)]
        pe_low: Option<f64>,
        #[arg(long, requires = "pe_low", allow_hyphen_values = true)]
        pe_high: Option<f64>,

        /// Override the configured DY screen (both bounds required)
        #[arg(long, requires = "dy_high", allow_hyphen_values = true)]
        dy_low: Option<f64>,
        #[arg(long, requires = "dy_low", allow_hyphen_values = true)]
        dy_high: Option<f64>,

        /// Re-split cash of zero-lot targets across the rest
        #[arg(long, default_value_t = false)]
        redistribute: bool,

        /// Write run artifacts under <out>/<run_id>/
        #[arg(long)]
        out: Option<String>,

        /// Fail instead of warn on config keys the backtest does not read
        #[arg(long, default_value_t = false)]
        strict_config: bool,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> overrides...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print the rebalance trigger dates for a window
    Calendar {
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        to: String,
    },
}

fn main() -> Result<()> {
    // Missing .env is fine.
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Backtest {
            config_paths,
            panel,
            benchmark,
            sample,
            pe_low,
            pe_high,
            dy_low,
            dy_high,
            redistribute,
            out,
            strict_config,
        } => commands::backtest::run_backtest(commands::backtest::BacktestArgs {
            config_paths,
            panel,
            benchmark,
            sample,
            pe: pe_low.zip(pe_high).map(|(l, h)| [l, h]),
            dy: dy_low.zip(dy_high).map(|(l, h)| [l, h]),
            redistribute,
            out,
            strict_config,
        })?,

        Commands::ConfigHash { paths } => commands::config::config_hash(&paths)?,

        Commands::Calendar { from, to } => commands::calendar::print_calendar(&from, &to)?,
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
