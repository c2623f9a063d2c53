//! Reconciliation, roster and catalog-status commands.

use scoutline_core::{Club, ClubId, Competition, CompetitionId, Country, CupKind, Player, Position};
use scoutline_db::{countries, Database};
use scoutline_scraper::ScrapeOrchestrator;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ReconcileSummary {
    pub country_id: String,
    pub country_name: String,
    pub competition: Competition,
}

#[derive(Debug, Serialize)]
pub struct ClubsSummary {
    pub competition_id: String,
    pub clubs: Vec<ClubLine>,
}

#[derive(Debug, Serialize)]
pub struct ClubLine {
    pub id: String,
    pub name: String,
    pub squad_size: u32,
    pub total_market_value: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct PlayersSummary {
    pub club_id: String,
    pub players: Vec<PlayerLine>,
}

#[derive(Debug, Serialize)]
pub struct PlayerLine {
    pub id: String,
    pub name: String,
    pub position: Position,
    pub market_value: Option<u64>,
    pub history_points: usize,
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub schema_version: i64,
    pub countries: usize,
    pub competitions: usize,
    pub partial_competitions: usize,
    pub international_competitions: usize,
}

pub async fn reconcile(
    orchestrator: &ScrapeOrchestrator,
    id: &str,
    name: &str,
    link: &str,
) -> anyhow::Result<ReconcileSummary> {
    let id = CompetitionId::new(id)?;
    let (country, competition) = orchestrator.reconcile_competition(&id, name, link).await?;
    Ok(ReconcileSummary {
        country_id: country.id.to_string(),
        country_name: country.name,
        competition,
    })
}

pub async fn clubs(orchestrator: &ScrapeOrchestrator, competition: &str) -> anyhow::Result<ClubsSummary> {
    let competition_id = CompetitionId::new(competition)?;
    let clubs = orchestrator.scrape_clubs(&competition_id).await?;
    Ok(ClubsSummary {
        competition_id: competition_id.to_string(),
        clubs: clubs.iter().map(club_line).collect(),
    })
}

pub async fn players(orchestrator: &ScrapeOrchestrator, club: &str) -> anyhow::Result<PlayersSummary> {
    let club_id = ClubId::new(club)?;
    let squad = orchestrator.scrape_players(&club_id).await?;
    Ok(PlayersSummary {
        club_id: club_id.to_string(),
        players: squad.iter().map(player_line).collect(),
    })
}

pub async fn status(db: &Database) -> anyhow::Result<StatusSummary> {
    let pool = db.pool();
    let catalog = countries::get_all_countries(pool).await?;
    let mut summary = summarize_catalog(&catalog);
    summary.schema_version = db.get_schema_version().await?;
    summary.countries = countries::count_countries(pool).await?;
    Ok(summary)
}

fn club_line(club: &Club) -> ClubLine {
    ClubLine {
        id: club.id.to_string(),
        name: club.name.clone(),
        squad_size: club.squad_size,
        total_market_value: club.total_market_value,
    }
}

fn player_line(player: &Player) -> PlayerLine {
    PlayerLine {
        id: player.id.to_string(),
        name: player.name.clone(),
        position: player.position,
        market_value: player.market_value,
        history_points: player.market_value_history.len(),
    }
}

fn summarize_catalog(catalog: &[Country]) -> StatusSummary {
    let competitions = catalog.iter().flat_map(|country| &country.competitions);
    StatusSummary {
        schema_version: 0,
        countries: catalog.iter().filter(|c| !c.id.is_international()).count(),
        competitions: competitions.clone().count(),
        partial_competitions: competitions.clone().filter(|c| c.is_partial()).count(),
        international_competitions: competitions
            .filter(|c| c.cup == CupKind::International)
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoutline_core::{CountryId, PlayerId};

    #[tokio::test]
    async fn test_status_of_empty_catalog() {
        let db = Database::new(":memory:").await.expect("open");
        db.run_migrations().await.expect("migrate");

        let summary = status(&db).await.expect("status");
        assert_eq!(summary.countries, 0);
        assert_eq!(summary.competitions, 0);
        assert!(summary.schema_version > 0);
    }

    #[tokio::test]
    async fn test_status_counts_partial_and_international() {
        let db = Database::new(":memory:").await.expect("open");
        db.run_migrations().await.expect("migrate");

        let mut england = Country {
            id: CountryId::new("189").unwrap(),
            name: "England".to_string(),
            flag_url: None,
            competitions: Vec::new(),
        };
        england.add_competition(Competition::partial(
            CompetitionId::new("GB1").unwrap(),
            "Premier League",
            "/x/startseite/wettbewerb/GB1",
        ));
        let mut champions_league =
            Competition::partial(CompetitionId::new("CL").unwrap(), "UEFA Champions League", "");
        champions_league.cup = CupKind::International;
        champions_league.club_count = 32;
        let mut international = Country::international();
        international.add_competition(champions_league);
        countries::upsert_countries(db.pool(), &[england, international])
            .await
            .expect("seed");

        let summary = status(&db).await.expect("status");
        assert_eq!(summary.countries, 1);
        assert_eq!(summary.competitions, 2);
        assert_eq!(summary.partial_competitions, 1);
        assert_eq!(summary.international_competitions, 1);
    }

    #[test]
    fn test_player_line_counts_history() {
        let mut player = Player::new(PlayerId::new("418560").unwrap(), "Erling Haaland", "");
        player.market_value = Some(180_000_000);
        player.market_value_history = vec![scoutline_core::MarketValuePoint {
            date: None,
            value: 180_000_000,
            club_name: None,
        }];

        let line = player_line(&player);
        assert_eq!(line.id, "418560");
        assert_eq!(line.history_points, 1);
    }
}
