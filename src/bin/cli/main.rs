mod app;
mod commands;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use recall_lib::deck::{FilterMode, SortStrategy};

#[derive(Parser)]
#[command(name = "recall-cli", about = "Recall scheduler for study decks", version)]
struct Cli {
    /// Config file (default: <config dir>/recall/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog JSON file
    #[arg(long, global = true, default_value = "catalog.json")]
    catalog: PathBuf,

    /// Metadata JSON file (default: <data dir>/recall/metadata.json)
    #[arg(long, global = true)]
    metadata: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum StrategyArg {
    Recall,
    Hardest,
    Easiest,
    ViewDate,
    Random,
    Alphabetic,
}

#[derive(clap::Args)]
struct DeckArgs {
    /// Sort strategy
    #[arg(long, default_value = "recall")]
    strategy: StrategyArg,

    /// Active group (repeatable); none means the whole catalog
    #[arg(long = "group")]
    groups: Vec<String>,

    /// Study only the reinforcement pool
    #[arg(long, conflicts_with = "groups")]
    frequency: bool,

    /// With --strategy view-date, leave out never-viewed items
    #[arg(long)]
    skip_new: bool,

    /// With --strategy view-date, leave out reviewed items
    #[arg(long)]
    skip_reviewed: bool,

    /// Seed for the random strategy
    #[arg(long)]
    seed: Option<u64>,
}

impl DeckArgs {
    fn strategy(&self) -> SortStrategy {
        match self.strategy {
            StrategyArg::Recall => SortStrategy::Recall,
            StrategyArg::Hardest => SortStrategy::Difficulty { descending: true },
            StrategyArg::Easiest => SortStrategy::Difficulty { descending: false },
            StrategyArg::ViewDate => SortStrategy::ViewDate {
                include_new: !self.skip_new,
                include_reviewed: !self.skip_reviewed,
            },
            StrategyArg::Random => SortStrategy::Random,
            StrategyArg::Alphabetic => SortStrategy::Alphabetic,
        }
    }

    fn filter(&self) -> FilterMode {
        if self.frequency {
            FilterMode::Frequency
        } else {
            FilterMode::Groups {
                active: self.groups.clone(),
            }
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Build and print a study deck
    Deck(DeckArgs),

    /// Show the recall state of one item, or of every item
    Classify {
        /// Item id
        id: Option<String>,
    },

    /// Summarize recall states across the catalog
    Stats,

    /// Advance through a deck on a timer
    Practice(DeckArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = app::load_config(cli.config.as_deref())?;

    // RUST_LOG overrides the configured severity
    env_logger::Builder::new()
        .filter_level(config.log_severity.level_filter())
        .parse_default_env()
        .init();

    let use_color = !cli.no_color && atty_check();
    let app = app::App::new(config, &cli.catalog, cli.metadata.clone())?;

    match &cli.command {
        Command::Deck(args) => {
            commands::deck::run(
                &app,
                args.strategy(),
                &args.filter(),
                args.seed,
                &cli.format,
                use_color,
            )?;
        }
        Command::Classify { id } => {
            commands::classify::run(&app, id.as_deref(), &cli.format, use_color)?;
        }
        Command::Stats => {
            commands::stats::run(&app, &cli.format, use_color)?;
        }
        Command::Practice(args) => {
            let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
            runtime.block_on(commands::practice::run(
                &app,
                args.strategy(),
                &args.filter(),
                args.seed,
            ))?;
        }
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    unsafe { libc_isatty(1) != 0 }
}

extern "C" {
    #[link_name = "isatty"]
    fn libc_isatty(fd: i32) -> i32;
}
