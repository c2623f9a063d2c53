mod support;

use scoutline_core::{ClubId, Competition, CompetitionId, Country, CountryId, PlayerId};
use scoutline_db::{clubs, competitions, countries, players, Database};
use scoutline_scraper::{ScrapeError, SiteUrls};
use support::{memory_db, orchestrator, test_config, urls, FakeSite};

const COMPETITION_PAGE: &str = r#"
    <table class="items"><tbody>
      <tr>
        <td><img src="https://cdn/wappen/281.png"/></td>
        <td><a href="/manchester-city/startseite/verein/281">Manchester City</a></td>
        <td>26</td><td>27.4</td><td>19</td><td>€48.87m</td><td>€1.27bn</td>
      </tr>
      <tr>
        <td><img src="https://cdn/wappen/985.png"/></td>
        <td><a href="/manchester-united/startseite/verein/985">Manchester United</a></td>
        <td>30</td><td>26.1</td><td>21</td><td>€24.00m</td><td>€720.00m</td>
      </tr>
    </tbody></table>"#;

fn squad_row(id: &str, name: &str, position: &str) -> String {
    format!(
        r#"<tr>
            <td>1</td>
            <td><table class="inline-table">
              <tr><td class="hauptlink"><a href="/p/profil/spieler/{id}">{name}</a></td></tr>
              <tr><td>{position}</td></tr>
            </table></td>
            <td>Jan 1, 2000 (24)</td>
            <td><img src="https://cdn/flagge/1.png" title="Norway"/></td>
            <td>-</td>
        </tr>"#
    )
}

fn squad_page() -> String {
    format!(
        r#"<table class="items"><tbody>{}{}{}</tbody></table>"#,
        squad_row("1", "Keeper One", "Goalkeeper"),
        squad_row("2", "Back Two", "Centre-Back"),
        squad_row("3", "Striker Three", "Centre-Forward"),
    )
}

const HISTORY: &str = r#"{"list": [
    {"y": 1000000, "datum_mw": "Jul 1, 2021", "verein": "Man City"},
    {"y": 5000000, "datum_mw": "Jul 1, 2022", "verein": "Man City"}
]}"#;

async fn seed_competition(db: &Database) {
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
    countries::upsert_countries(db.pool(), &[england]).await.unwrap();
}

#[tokio::test]
async fn test_clubs_recorded_on_competition() {
    let config = test_config();
    let site = FakeSite::new();
    let gb1 = CompetitionId::new("GB1").unwrap();
    site.page(urls(&config).competition_url(&gb1), COMPETITION_PAGE);
    let db = memory_db().await;
    seed_competition(&db).await;

    let scraped = orchestrator(&config, &site, &db)
        .scrape_clubs(&gb1)
        .await
        .expect("clubs");
    assert_eq!(scraped.len(), 2);

    let competition = competitions::get_competition(db.pool(), &gb1)
        .await
        .unwrap()
        .expect("competition");
    let ids: Vec<&str> = competition.club_ids.iter().map(ClubId::as_str).collect();
    assert_eq!(ids, vec!["281", "985"]);
    assert_eq!(competition.club_count, 2);

    let stored = clubs::get_clubs_for_competition(db.pool(), &gb1).await.unwrap();
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn test_squad_with_degraded_lookups() {
    let config = test_config();
    let site = FakeSite::new();
    let city = ClubId::new("281").unwrap();
    site.page(urls(&config).club_squad_url(&city), squad_page());
    site.http(SiteUrls::market_value_path(&PlayerId::new("1").unwrap()), 200, HISTORY);
    site.http(SiteUrls::market_value_path(&PlayerId::new("2").unwrap()), 500, "");
    site.http(SiteUrls::market_value_path(&PlayerId::new("3").unwrap()), 200, "<html>");
    let db = memory_db().await;

    let squad = orchestrator(&config, &site, &db)
        .scrape_players(&city)
        .await
        .expect("squad scraped despite failed lookups");
    assert_eq!(squad.len(), 3);

    let keeper = squad.iter().find(|p| p.id.as_str() == "1").unwrap();
    assert_eq!(keeper.market_value_history.len(), 2);
    assert_eq!(keeper.market_value, Some(5_000_000));
    for id in ["2", "3"] {
        let player = squad.iter().find(|p| p.id.as_str() == id).unwrap();
        assert!(player.market_value_history.is_empty());
        assert_eq!(player.market_value, None);
    }

    // The 500 was retried up to the bound, the bad body was not
    let calls = site.http_calls.lock().unwrap().clone();
    let count = |id: &str| {
        let path = SiteUrls::market_value_path(&PlayerId::new(id).unwrap());
        calls.iter().filter(|c| **c == path).count()
    };
    assert_eq!(count("1"), 1);
    assert_eq!(count("2"), 2);
    assert_eq!(count("3"), 1);

    let stored = players::get_players_for_club(db.pool(), &city).await.unwrap();
    assert_eq!(stored.len(), 3);
}

#[tokio::test]
async fn test_failed_lookup_keeps_stored_history() {
    let config = test_config();
    let site = FakeSite::new();
    let city = ClubId::new("281").unwrap();
    let keeper = PlayerId::new("1").unwrap();
    site.page(urls(&config).club_squad_url(&city), squad_page());
    site.http(SiteUrls::market_value_path(&keeper), 200, HISTORY);
    let db = memory_db().await;
    let orchestrator = orchestrator(&config, &site, &db);

    orchestrator.scrape_players(&city).await.expect("first scrape");
    site.http(SiteUrls::market_value_path(&keeper), 503, "");
    orchestrator.scrape_players(&city).await.expect("second scrape");

    let stored = players::get_player(db.pool(), &keeper)
        .await
        .unwrap()
        .expect("stored");
    assert_eq!(stored.market_value_history.len(), 2);
}

#[tokio::test]
async fn test_squad_recorded_on_known_club() {
    let config = test_config();
    let site = FakeSite::new();
    let gb1 = CompetitionId::new("GB1").unwrap();
    let city = ClubId::new("281").unwrap();
    let urls = urls(&config);
    site.page(urls.competition_url(&gb1), COMPETITION_PAGE);
    site.page(urls.club_squad_url(&city), squad_page());
    let db = memory_db().await;
    seed_competition(&db).await;
    let orchestrator = orchestrator(&config, &site, &db);

    orchestrator.scrape_clubs(&gb1).await.expect("clubs");
    orchestrator.scrape_players(&city).await.expect("squad");

    let club = clubs::get_club(db.pool(), &city).await.unwrap().expect("club");
    assert_eq!(club.player_ids.len(), 3);
    assert_eq!(club.squad_size, 26);
    assert!(club.competition_ids.contains(&gb1));
}

#[tokio::test]
async fn test_missing_competition_page_is_fatal() {
    let config = test_config();
    let site = FakeSite::new();
    let db = memory_db().await;

    let err = orchestrator(&config, &site, &db)
        .scrape_clubs(&CompetitionId::new("GB1").unwrap())
        .await
        .expect_err("404");
    assert!(matches!(err, ScrapeError::Navigation { attempts: 2, .. }));
    assert_eq!(site.navigation_count(), 2);
}
