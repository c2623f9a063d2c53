use scoutline_core::{HarvestState, PlayerId, PlayerStat};
use scoutline_scraper::{ScrapeOrchestrator, SeasonSelector};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HarvestSummary {
    pub player_id: String,
    pub scraped: usize,
    pub unscraped: usize,
    pub seasons: Vec<SeasonLine>,
}

#[derive(Debug, Serialize)]
pub struct SeasonLine {
    pub season_id: String,
    pub name: String,
    pub state: HarvestState,
    pub competitions: usize,
    pub matches: usize,
    pub appearances: u32,
    pub goals: u32,
}

pub async fn run(
    orchestrator: &ScrapeOrchestrator,
    player: &str,
    season: &str,
    force: bool,
) -> anyhow::Result<HarvestSummary> {
    let player_id = PlayerId::new(player)?;
    let selector: SeasonSelector = season.parse()?;
    let stat = orchestrator
        .harvest_player_stats(&player_id, &selector, force)
        .await?;

    let summary = summarize(&stat);
    if summary.unscraped > 0 {
        tracing::warn!(
            player = %player_id,
            "{} season(s) left unscraped, rerun to retry them",
            summary.unscraped
        );
    }
    Ok(summary)
}

fn summarize(stat: &PlayerStat) -> HarvestSummary {
    let seasons: Vec<SeasonLine> = stat
        .seasons
        .iter()
        .map(|season| SeasonLine {
            season_id: season.season_id.to_string(),
            name: season.name.clone(),
            state: season.state(),
            competitions: season.competitions.len(),
            matches: season.competitions.iter().map(|c| c.matches.len()).sum(),
            appearances: season.totals.appearances,
            goals: season.totals.goals,
        })
        .collect();
    let scraped = seasons
        .iter()
        .filter(|line| line.state == HarvestState::Scraped)
        .count();

    HarvestSummary {
        player_id: stat.player_id.to_string(),
        scraped,
        unscraped: seasons.len() - scraped,
        seasons,
    }
}
