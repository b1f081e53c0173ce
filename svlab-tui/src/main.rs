//! svlab TUI: run one evaluation in the background and browse the report.
//!
//! Keys: q/Esc quit, Tab switches between the report and SV diagnostics,
//! Left/Right step the highlighted simulated path.

use std::fs::File;
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use svlab_core::data::{CachedFeed, CsvFeed, PriceFeed, YahooFeed};
use svlab_runner::{load_config, ConfigOverrides};
use svlab_tui::{input, spawn_worker, ui, App};

#[derive(Parser, Debug)]
#[command(name = "svlab-tui", version, about = "Interactive svlab evaluation report")]
struct Args {
    /// TOML run configuration.
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[arg(long)]
    ticker: Option<String>,
    #[arg(long)]
    strategy: Option<String>,
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

    /// Read bars from a CSV file or a directory of `{TICKER}.csv` files.
    #[arg(long)]
    csv: Option<PathBuf>,
    #[arg(long, default_value = "data")]
    cache_dir: PathBuf,
    #[arg(long, default_value_t = false)]
    no_cache: bool,

    /// Log file. The terminal belongs to the UI, so logs never go to stderr.
    #[arg(long, default_value = "svlab-tui.log")]
    log_file: PathBuf,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            ticker: self.ticker.clone(),
            strategy: self.strategy.clone(),
            real_period: self.real_period.clone(),
            sim_period: self.sim_period.clone(),
            num_paths: self.num_paths,
            seed: self.seed,
            ..ConfigOverrides::default()
        }
    }

    fn feed(&self) -> Result<Box<dyn PriceFeed>> {
        if let Some(path) = &self.csv {
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
        if self.no_cache {
            Ok(Box::new(yahoo))
        } else {
            Ok(Box::new(CachedFeed::new(yahoo, &self.cache_dir)))
        }
    }
}

fn init_tracing(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("svlab=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_file)?;

    // Config and feed errors are reported before the terminal is taken over.
    let config = load_config(args.config.as_deref(), args.overrides())?;
    let feed = args.feed()?;

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let mut app = App::new(config.market.ticker.clone());
    let (tx, rx) = mpsc::channel();
    info!(ticker = %config.market.ticker, "starting evaluation");
    let worker = spawn_worker(config, feed, tx).context("failed to spawn worker")?;

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app, &rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // A finished worker is joined; a running one is abandoned with the process.
    if worker.is_finished() {
        let _ = worker.join();
    }
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: &mpsc::Receiver<svlab_tui::WorkerResponse>,
) -> Result<()> {
    while app.running {
        terminal.draw(|f| ui::draw(f, app))?;

        while let Ok(resp) = rx.try_recv() {
            app.apply(resp);
        }

        // ~20 FPS
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }
    }
    Ok(())
}
