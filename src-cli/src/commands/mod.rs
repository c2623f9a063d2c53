//! Subcommand handlers.
//!
//! Each handler runs one unit of work against the orchestrator and returns a
//! serializable summary that `run` prints as JSON.

pub mod catalog;
pub mod discover;
pub mod harvest;

use crate::state::AppState;
use crate::Command;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Printable outcome of one subcommand.
#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Summary {
    Discover(discover::DiscoverSummary),
    Reconcile(catalog::ReconcileSummary),
    Clubs(catalog::ClubsSummary),
    Players(catalog::PlayersSummary),
    Harvest(harvest::HarvestSummary),
    Status(catalog::StatusSummary),
}

/// Run `command`, cancelling in-flight scraping on Ctrl-C.
pub async fn dispatch(state: &AppState, command: Command) -> anyhow::Result<Summary> {
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping after the current request");
                cancel.cancel();
            }
        }
    });

    let result = execute(state, command, &cancel).await;
    watcher.abort();
    result
}

async fn execute(
    state: &AppState,
    command: Command,
    cancel: &CancellationToken,
) -> anyhow::Result<Summary> {
    // The browser is only launched by commands that scrape
    let orchestrator = || state.orchestrator(cancel.clone());

    let summary = match command {
        Command::Discover { target } => {
            Summary::Discover(discover::run(&orchestrator().await?, target).await?)
        }
        Command::Reconcile { id, name, link } => Summary::Reconcile(
            catalog::reconcile(&orchestrator().await?, &id, &name, &link).await?,
        ),
        Command::Clubs { competition } => {
            Summary::Clubs(catalog::clubs(&orchestrator().await?, &competition).await?)
        }
        Command::Players { club } => {
            Summary::Players(catalog::players(&orchestrator().await?, &club).await?)
        }
        Command::Harvest {
            player,
            season,
            force,
        } => Summary::Harvest(harvest::run(&orchestrator().await?, &player, &season, force).await?),
        Command::Status => Summary::Status(catalog::status(&state.db).await?),
    };
    Ok(summary)
}
