//! Scoutline command-line shell
//!
//! Thin shell that loads configuration, wires the browser session, the HTTP
//! client and the catalog database into the scrape orchestrator, and
//! dispatches subcommands. Scraping logic lives in the `crates/` directory.

mod commands;
mod error;
mod state;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

pub use error::exit_code;
pub use state::AppState;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "scoutline", version, about = "Football catalog scraper")]
pub struct Cli {
    /// Config file to load instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Grow the country catalog, resuming from what is already stored
    Discover {
        /// Number of countries the catalog should hold (0 = all listed)
        #[arg(long, default_value_t = 0)]
        target: usize,
    },
    /// Look up a competition missing from the catalog through site search
    Reconcile {
        /// Competition ID, e.g. GB1
        id: String,
        /// Competition display name
        name: String,
        /// Competition link, if known
        #[arg(long, default_value = "")]
        link: String,
    },
    /// Scrape the clubs of a competition
    Clubs {
        /// Competition ID
        competition: String,
    },
    /// Scrape the squad of a club, with market-value histories
    Players {
        /// Club ID
        club: String,
    },
    /// Harvest a player's season, competition and match statistics
    Harvest {
        /// Player ID
        player: String,
        /// Season ID, or "all"
        #[arg(long, default_value = "all")]
        season: String,
        /// Re-scrape seasons already marked scraped
        #[arg(long)]
        force: bool,
    },
    /// Summarize what the catalog holds
    Status,
}

/// Initialize tracing subscriber for logging
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = if verbose { "debug" } else { "info,scoutline=debug" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Run one subcommand to completion.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("Starting Scoutline v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::open(cli.config.as_deref()).await?;
    let result = commands::dispatch(&state, cli.command).await;
    state.shutdown().await;

    let summary = result?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
