//! svlab CLI: evaluation, simulation and market store commands.
//!
//! Commands:
//! - `run`: backtest the real series and an ensemble of SV paths, print the summary
//! - `simulate`: calibrate and emit SV paths without backtesting
//! - `list`: registered strategies, indicators and periods
//! - `store`: ingest bars into SQLite, attach or remove features, show rows

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use svlab_core::data::{closes, CachedFeed, CsvFeed, Period, PriceFeed, YahooFeed};
use svlab_core::factory::{available_indicators, available_strategies};
use svlab_core::rng::RngHierarchy;
use svlab_core::sv::{denormalize, path_length_for, simulate_stock_paths};
use svlab_runner::{
    load_config, run_evaluation, ArtifactSink, ConfigOverrides, MarketStore, MultiSink,
    SqliteMarketStore, TextReportSink,
};

#[derive(Parser)]
#[command(
    name = "svlab",
    about = "svlab: backtest strategies on real and stochastic-volatility price paths"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where bars come from.
#[derive(Args, Debug, Clone)]
struct FeedArgs {
    /// Read bars from a CSV file, or a directory of `{TICKER}.csv` files,
    /// instead of Yahoo Finance.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Parquet cache directory for downloaded bars.
    #[arg(long, default_value = "data")]
    cache_dir: PathBuf,

    /// Always download, bypassing the cache.
    #[arg(long, default_value_t = false)]
    no_cache: bool,
}

/// Command-line overrides on top of the config file.
#[derive(Args, Debug, Clone, Default)]
struct OverrideArgs {
    #[arg(long)]
    capital: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    transaction_fee: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    custody_fee: Option<String>,
    /// Ticks between custody charges.
    #[arg(long)]
    custody_interval: Option<usize>,
    #[arg(long)]
    strategy: Option<String>,
    /// Comma-separated indicator names to precompute.
    #[arg(long)]
    precompute: Option<String>,
    #[arg(long)]
    ticker: Option<String>,
    /// Period of the real backtest: 1d, 1y, 5y or 10y.
    #[arg(long)]
    real_period: Option<String>,
    /// Calibration period and simulation horizon: 1y, 5y or 10y.
    #[arg(long)]
    sim_period: Option<String>,
    #[arg(long)]
    num_paths: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// Skip the calibration histogram and normalized paths.
    #[arg(long, default_value_t = false)]
    no_diagnostics: bool,
}

impl From<OverrideArgs> for ConfigOverrides {
    fn from(a: OverrideArgs) -> Self {
        ConfigOverrides {
            capital: a.capital,
            transaction_fee: a.transaction_fee,
            custody_fee: a.custody_fee,
            custody_interval: a.custody_interval,
            strategy: a.strategy,
            precompute: a.precompute,
            ticker: a.ticker,
            real_period: a.real_period,
            sim_period: a.sim_period,
            num_paths: a.num_paths,
            seed: a.seed,
            no_diagnostics: a.no_diagnostics,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest the real series and every simulated path, then summarize.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: OverrideArgs,

        #[command(flatten)]
        feed: FeedArgs,

        /// Also save CSV/JSON artifacts under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Calibrate the SV model and emit price paths, without backtesting.
    Simulate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: OverrideArgs,

        #[command(flatten)]
        feed: FeedArgs,

        /// Write the denormalized paths as CSV (one column per path).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List registered strategies, indicators and periods.
    List,
    /// SQLite market store commands.
    Store {
        /// Database file.
        #[arg(long, default_value = "svlab.db")]
        db: PathBuf,

        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Fetch bars and upsert them into `market_data`.
    Ingest {
        ticker: String,

        #[arg(long, default_value = "10y")]
        period: String,

        #[command(flatten)]
        feed: FeedArgs,
    },
    /// Compute a registry indicator over stored closes and merge it into features.
    AddFeature { ticker: String, indicator: String },
    /// Delete a feature key from every row.
    RemoveFeature { name: String },
    /// Print stored rows for a ticker within a date range.
    Show {
        ticker: String,
        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: String,
        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("svlab=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            overrides,
            feed,
            output_dir,
        } => run_cmd(config.as_deref(), overrides, &feed, output_dir),
        Commands::Simulate {
            config,
            overrides,
            feed,
            out,
        } => simulate_cmd(config.as_deref(), overrides, &feed, out.as_deref()),
        Commands::List => {
            list_cmd();
            Ok(())
        }
        Commands::Store { db, action } => store_cmd(&db, action),
    }
}

fn build_feed(args: &FeedArgs) -> Result<Box<dyn PriceFeed>> {
    if let Some(path) = &args.csv {
        if !path.exists() {
            bail!("CSV source does not exist: {}", path.display());
        }
        let feed = if path.is_dir() {
            CsvFeed::from_dir(path)
        } else {
            CsvFeed::from_file(path)
        };
        return Ok(Box::new(feed));
    }
    let yahoo = YahooFeed::new().context("failed to build Yahoo client")?;
    if args.no_cache {
        Ok(Box::new(yahoo))
    } else {
        Ok(Box::new(CachedFeed::new(yahoo, &args.cache_dir)))
    }
}

fn run_cmd(
    config: Option<&Path>,
    overrides: OverrideArgs,
    feed_args: &FeedArgs,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config, overrides.into())?;
    let feed = build_feed(feed_args)?;

    let mut text = TextReportSink::stdout();
    match output_dir {
        Some(dir) => {
            let mut artifacts = ArtifactSink::new(dir);
            let mut sinks = MultiSink::new().push(&mut text).push(&mut artifacts);
            run_evaluation(&config, feed.as_ref(), &mut sinks)?;
            if let Some(path) = artifacts.last_dir() {
                println!("Artifacts saved to: {}", path.display());
            }
        }
        None => {
            run_evaluation(&config, feed.as_ref(), &mut text)?;
        }
    }
    Ok(())
}

fn simulate_cmd(
    config: Option<&Path>,
    overrides: OverrideArgs,
    feed_args: &FeedArgs,
    out: Option<&Path>,
) -> Result<()> {
    let config = load_config(config, overrides.into())?;
    let feed = build_feed(feed_args)?;
    let ticker = &config.market.ticker;
    let period = config.market.sim_period;
    let horizon = period
        .horizon_days()
        .with_context(|| format!("period {period} has no simulation horizon"))?;
    let n = path_length_for(horizon, config.simulation.num_paths);

    let bars = feed.fetch(ticker, period)?;
    let rng = RngHierarchy::from_optional(config.simulation.seed);
    let output = simulate_stock_paths(
        &closes(&bars),
        config.simulation.num_paths,
        n,
        &config.calibration_config(),
        &rng,
    )?;
    let spot = feed
        .fetch(ticker, Period::OneDay)?
        .last()
        .map(|b| b.close)
        .with_context(|| format!("no latest close for {ticker}"))?;
    let paths = denormalize(&output.paths, spot);

    let c = &output.calibration;
    println!("{ticker} | calibrated on {} closes ({period})", bars.len());
    println!("seed:        {}", rng.master_seed());
    println!("selected:    {} ({} votes, W1 {:.6})", c.params, c.votes, c.best_distance);
    println!(
        "constants:   mu={:.4} v0={:.4} theta={:.4}",
        c.constants.mu, c.constants.v0, c.constants.theta
    );
    for (rank, r) in c.ranking.iter().enumerate() {
        println!("  #{:<2} {} ({} votes)", rank + 1, r.params, r.votes);
    }
    println!("paths:       {} x {} (spot {:.2})", paths.len(), n - 1, spot);

    if let Some(out) = out {
        write_paths_csv(out, &paths)?;
        println!("Paths written to: {}", out.display());
    }
    Ok(())
}

fn write_paths_csv(out: &Path, paths: &[Vec<f64>]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(out)
        .with_context(|| format!("failed to create {}", out.display()))?;
    let mut header = vec!["tick".to_string()];
    header.extend((0..paths.len()).map(|k| format!("path_{k}")));
    wtr.write_record(&header)?;
    let len = paths.iter().map(Vec::len).max().unwrap_or(0);
    for t in 0..len {
        let mut record = vec![t.to_string()];
        record.extend(
            paths
                .iter()
                .map(|p| p.get(t).map(|v| format!("{v:.6}")).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn list_cmd() {
    println!("Strategies:");
    for name in available_strategies() {
        println!("  {name}");
    }
    println!();
    println!("Indicators:");
    for name in available_indicators() {
        println!("  {name}");
    }
    println!();
    println!("Periods:");
    for p in Period::ALL {
        match p.horizon_days() {
            Some(days) => println!("  {:<4} simulation horizon {days} trading days", p.as_str()),
            None => println!("  {:<4} latest close only", p.as_str()),
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

fn store_cmd(db: &Path, action: StoreAction) -> Result<()> {
    let store = SqliteMarketStore::open(db)?;
    match action {
        StoreAction::Ingest {
            ticker,
            period,
            feed,
        } => {
            let period: Period = period.parse()?;
            let feed = build_feed(&feed)?;
            let bars = feed.fetch(&ticker, period)?;
            let n = store.upsert_bars(&ticker, &bars)?;
            info!(ticker = %ticker, bars = n, "ingested");
            println!("Stored {n} bars for {ticker} in {}", db.display());
        }
        StoreAction::AddFeature { ticker, indicator } => {
            let n = store.attach_indicator(&ticker, &indicator)?;
            println!("Attached {indicator} to {n} rows of {ticker}");
        }
        StoreAction::RemoveFeature { name } => {
            let n = store.remove_feature(&name)?;
            println!("Removed {name} from {n} rows");
        }
        StoreAction::Show { ticker, start, end } => {
            let rows = store.fetch_market_data(&ticker, parse_date(&start)?, parse_date(&end)?)?;
            if rows.is_empty() {
                println!("No rows for {ticker} between {start} and {end}");
            }
            for row in rows {
                println!(
                    "{} {:>10.2} {:>12} {}",
                    row.timestamp,
                    row.close,
                    row.volume,
                    serde_json::Value::Object(row.features)
                );
            }
        }
    }
    Ok(())
}
