mod app;
mod term;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lindworm::GameSession;

use crate::app::App;
use crate::term::TermManager;

#[derive(Debug, Parser)]
#[command(name = "lindworm", version, about = "Snake, in the terminal")]
struct Args {
    /// Cap the playfield width, border included (defaults to the terminal width)
    #[arg(long)]
    cols: Option<u16>,

    /// Cap the playfield height, border included (defaults to the terminal height)
    #[arg(long)]
    rows: Option<u16>,

    /// Seed for food placement and starting heading
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs here; filter with RUST_LOG
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let mut term = TermManager::new().context("reading terminal size")?;
    let grid = app::playfield(term.size(), args.cols, args.rows);
    let session = match args.seed {
        Some(seed) => GameSession::with_seed(grid, seed),
        None => GameSession::new(grid),
    };
    tracing::info!(cols = grid.cols(), rows = grid.rows(), seed = ?args.seed, "lindworm starting");

    term.setup().context("preparing terminal")?;
    let mut app = App::new(term, session);

    // The terminal goes back to normal even when the game loop failed
    let res = app.run();
    let restored = app.shutdown();
    res?;
    restored
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
