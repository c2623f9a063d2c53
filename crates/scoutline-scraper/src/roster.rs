//! Clubs of a competition, squads of a club, and single player profiles.

use crate::cells::{count_or_zero, parse_date, parse_decimal, parse_market_value};
use crate::error::{Result, ScrapeError};
use crate::market_value::parse_market_value_history;
use crate::navigator::Navigator;
use crate::parser::{body_rows, cells, document, id_after, select_attr, select_text, selector, text_of};
use crate::url_builder::SiteUrls;
use futures::stream::{FuturesUnordered, StreamExt};
use scoutline_core::{Club, ClubId, CompetitionId, Player, PlayerId, Position};
use scoutline_db::{clubs, competitions, players, Database};
use scraper::ElementRef;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Clubs listed in a competition's overview table.
#[must_use]
pub fn parse_club_rows(html: &str, competition_id: &CompetitionId, urls: &SiteUrls) -> Vec<Club> {
    let doc = document(html);
    let Some(table) = doc.select(&selector("table.items")).next() else {
        return Vec::new();
    };
    let club_anchor = selector("a[href*='/verein/']");
    let img = selector("img");

    body_rows(table)
        .into_iter()
        .filter_map(|row| {
            let anchor = row
                .select(&club_anchor)
                .find(|a| !text_of(*a).is_empty())?;
            let href = anchor.value().attr("href")?;
            let Some(id) = id_after(href, "verein").and_then(|id| ClubId::new(id).ok()) else {
                tracing::warn!(href, "Skipping club row without a club ID");
                return None;
            };

            let tds = cells(row);
            let cell_text = |index: usize| tds.get(index).map(|td| text_of(*td)).unwrap_or_default();
            let name = anchor
                .value()
                .attr("title")
                .map(str::to_string)
                .filter(|title| !title.trim().is_empty())
                .unwrap_or_else(|| text_of(anchor));

            Some(Club {
                id,
                name,
                link: urls.absolute(href),
                logo_url: tds.first().and_then(|td| select_attr(*td, &img, "src")),
                competition_ids: BTreeSet::from([competition_id.clone()]),
                squad_size: count_or_zero(&cell_text(2)),
                mean_age: parse_decimal(&cell_text(3)),
                foreigners: count_or_zero(&cell_text(4)),
                total_market_value: tds.last().and_then(|td| parse_market_value(&text_of(*td))),
                player_ids: BTreeSet::new(),
            })
        })
        .collect()
}

/// Players listed on a club's squad page.
#[must_use]
pub fn parse_squad_rows(html: &str, club_id: &ClubId, urls: &SiteUrls) -> Vec<Player> {
    let doc = document(html);
    let Some(table) = doc.select(&selector("table.items")).next() else {
        return Vec::new();
    };
    let player_anchor = selector("a[href*='/spieler/']");
    let position_cell = selector("table.inline-table tr:last-child td");
    let img = selector("img");

    body_rows(table)
        .into_iter()
        .filter_map(|row| {
            let anchor = row
                .select(&player_anchor)
                .find(|a| !text_of(*a).is_empty())?;
            let href = anchor.value().attr("href")?;
            let Some(id) = id_after(href, "spieler").and_then(|id| PlayerId::new(id).ok()) else {
                tracing::warn!(href, "Skipping squad row without a player ID");
                return None;
            };

            let tds = cells(row);
            let mut player = Player::new(id, text_of(anchor), urls.absolute(href));
            player.club_id = Some(club_id.clone());
            player.position = tds
                .get(1)
                .and_then(|td| select_text(*td, &position_cell))
                .map_or(Position::Unknown, |label| Position::from_label(&label));
            player.date_of_birth = tds.get(2).and_then(|td| parse_date(&text_of(*td)));
            player.nationality = tds.get(3).and_then(|td| select_attr(*td, &img, "title"));
            player.market_value = tds
                .last()
                .filter(|_| tds.len() > 4)
                .and_then(|td| parse_market_value(&text_of(*td)));
            Some(player)
        })
        .collect()
}

/// A player's profile header.
pub fn parse_profile(html: &str, player_id: &PlayerId, url: &str) -> Result<Player> {
    let doc = document(html);
    let root = doc.root_element();

    let name = select_text(root, &selector("h1"))
        .map(|heading| strip_shirt_number(&heading))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ScrapeError::extraction(url, "h1", "player name missing"))?;

    let mut player = Player::new(player_id.clone(), name, url);
    player.date_of_birth = select_text(root, &selector("span[itemprop='birthDate']"))
        .and_then(|text| parse_date(&text));
    player.nationality = select_text(root, &selector("span[itemprop='nationality']"));
    player.position = profile_position(root);
    player.club_id = select_attr(root, &selector("span.data-header__club a"), "href")
        .and_then(|href| id_after(&href, "verein").and_then(|id| ClubId::new(id).ok()));
    player.market_value = select_text(root, &selector("a.data-header__market-value-wrapper"))
        .and_then(|text| {
            let value = text.split("Last").next().unwrap_or_default();
            parse_market_value(value)
        });
    Ok(player)
}

fn profile_position(root: ElementRef<'_>) -> Position {
    let content = selector("span.data-header__content");
    root.select(&selector("li.data-header__label"))
        .find(|label| text_of(*label).starts_with("Position"))
        .and_then(|label| select_text(label, &content))
        .map_or(Position::Unknown, |text| Position::from_label(&text))
}

fn strip_shirt_number(heading: &str) -> String {
    let trimmed = heading.trim();
    match trimmed.strip_prefix('#') {
        Some(rest) => rest
            .trim_start_matches(|c: char| c.is_ascii_digit())
            .trim()
            .to_string(),
        None => trimmed.to_string(),
    }
}

/// Scrapes clubs and players and files them in the catalog.
pub struct RosterScraper {
    navigator: Navigator,
    db: Arc<Database>,
    urls: SiteUrls,
    max_concurrent_lookups: usize,
}

impl RosterScraper {
    #[must_use]
    pub fn new(navigator: Navigator, db: Arc<Database>, urls: SiteUrls) -> Self {
        Self {
            navigator,
            db,
            urls,
            max_concurrent_lookups: 4,
        }
    }

    #[must_use]
    pub fn with_max_concurrent_lookups(mut self, limit: usize) -> Self {
        self.max_concurrent_lookups = limit.max(1);
        self
    }

    /// Scrape a competition's clubs and record them on the competition.
    pub async fn scrape_clubs(&self, competition_id: &CompetitionId) -> Result<Vec<Club>> {
        let url = self.urls.competition_url(competition_id);
        let page = self.navigator.fetch_page(&url).await?;
        let clubs = parse_club_rows(&page.content, competition_id, &self.urls);
        if clubs.is_empty() {
            tracing::warn!(url = %url, "Competition page lists no clubs");
        }

        let pool = self.db.pool();
        clubs::upsert_clubs(pool, &clubs).await?;

        match competitions::get_competition(pool, competition_id).await? {
            Some(mut competition) => {
                competition.club_ids.extend(clubs.iter().map(|club| club.id.clone()));
                if competition.club_count == 0 {
                    competition.club_count = u32::try_from(clubs.len()).unwrap_or(u32::MAX);
                }
                match competition.country_id.clone() {
                    Some(country_id) => {
                        competitions::update_competitions_for_country(
                            pool,
                            &country_id,
                            std::slice::from_ref(&competition),
                        )
                        .await?;
                    }
                    None => tracing::warn!(competition = %competition_id, "Competition has no country"),
                }
            }
            None => tracing::warn!(
                competition = %competition_id,
                "Competition not in catalog, club references not recorded"
            ),
        }

        tracing::info!(competition = %competition_id, "Scraped {} clubs", clubs.len());
        Ok(clubs)
    }

    /// Scrape a club's squad, with market-value histories.
    pub async fn scrape_players(&self, club_id: &ClubId) -> Result<Vec<Player>> {
        let url = self.urls.club_squad_url(club_id);
        let page = self.navigator.fetch_page(&url).await?;
        let mut squad = parse_squad_rows(&page.content, club_id, &self.urls);
        if squad.is_empty() {
            tracing::warn!(url = %url, "Squad page lists no players");
        }

        self.attach_market_values(&mut squad).await?;

        let pool = self.db.pool();
        players::upsert_players(pool, &squad).await?;

        match clubs::get_club(pool, club_id).await? {
            Some(mut club) => {
                club.player_ids = squad.iter().map(|player| player.id.clone()).collect();
                if club.squad_size == 0 {
                    club.squad_size = u32::try_from(squad.len()).unwrap_or(u32::MAX);
                }
                clubs::upsert_clubs(pool, std::slice::from_ref(&club)).await?;
            }
            None => tracing::warn!(club = %club_id, "Club not in catalog, squad stored without it"),
        }

        tracing::info!(club = %club_id, "Scraped {} players", squad.len());
        Ok(squad)
    }

    /// Scrape and store a single player's profile.
    pub async fn scrape_player_profile(&self, player_id: &PlayerId) -> Result<Player> {
        let url = self.urls.player_profile_url(player_id);
        let page = self.navigator.fetch_page(&url).await?;
        let mut player = parse_profile(&page.content, player_id, &url)?;

        self.attach_market_values(std::slice::from_mut(&mut player))
            .await?;
        players::upsert_players(self.db.pool(), std::slice::from_ref(&player)).await?;

        tracing::info!(player = %player_id, name = %player.name, "Scraped player profile");
        Ok(player)
    }

    /// Fetch market-value histories, at most `max_concurrent_lookups` at a
    /// time. A failed lookup leaves that player's history empty.
    async fn attach_market_values(&self, squad: &mut [Player]) -> Result<()> {
        let mut lookups = FuturesUnordered::new();
        let mut histories = Vec::with_capacity(squad.len());

        for (index, player) in squad.iter().enumerate() {
            let path = SiteUrls::market_value_path(&player.id);
            lookups.push(async move {
                let history = self
                    .navigator
                    .fetch_http_or_default(&path, parse_market_value_history)
                    .await;
                (index, history)
            });

            // Respect concurrency limit
            while lookups.len() >= self.max_concurrent_lookups {
                if let Some((index, history)) = lookups.next().await {
                    histories.push((index, history?));
                }
            }
        }

        while let Some((index, history)) = lookups.next().await {
            histories.push((index, history?));
        }

        for (index, history) in histories {
            let player = &mut squad[index];
            if player.market_value.is_none() {
                player.market_value = history.last().map(|point| point.value);
            }
            player.market_value_history = history;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use scoutline_core::SiteConfig;

    fn urls() -> SiteUrls {
        SiteUrls::new(&SiteConfig::default())
    }

    #[test]
    fn test_parse_club_rows() {
        let html = r#"
            <table class="items"><tbody>
              <tr>
                <td><a href="/manchester-city/startseite/verein/281"><img src="https://cdn/wappen/281.png"/></a></td>
                <td><a href="/manchester-city/startseite/verein/281" title="Manchester City">Man City</a></td>
                <td>26</td><td>27.4</td><td>19</td><td>€48.87m</td><td>€1.27bn</td>
              </tr>
              <tr><td><a href="/broken/startseite/verein/">Broken</a></td></tr>
            </tbody></table>"#;
        let gb1 = CompetitionId::new("GB1").unwrap();
        let clubs = parse_club_rows(html, &gb1, &urls());

        assert_eq!(clubs.len(), 1);
        let club = &clubs[0];
        assert_eq!(club.id.as_str(), "281");
        assert_eq!(club.name, "Manchester City");
        assert_eq!(club.logo_url.as_deref(), Some("https://cdn/wappen/281.png"));
        assert_eq!(club.squad_size, 26);
        assert_eq!(club.mean_age, Some(27.4));
        assert_eq!(club.foreigners, 19);
        assert_eq!(club.total_market_value, Some(1_270_000_000));
        assert!(club.competition_ids.contains(&gb1));
    }

    #[test]
    fn test_parse_squad_rows() {
        let html = r#"
            <table class="items"><tbody>
              <tr>
                <td>9</td>
                <td><table class="inline-table">
                  <tr><td class="hauptlink"><a href="/erling-haaland/profil/spieler/418560">Erling Haaland</a></td></tr>
                  <tr><td>Centre-Forward</td></tr>
                </table></td>
                <td>Jul 21, 2000 (23)</td>
                <td><img src="https://cdn/flagge/125.png" title="Norway"/></td>
                <td>€180.00m</td>
              </tr>
            </tbody></table>"#;
        let club = ClubId::new("281").unwrap();
        let squad = parse_squad_rows(html, &club, &urls());

        assert_eq!(squad.len(), 1);
        let player = &squad[0];
        assert_eq!(player.id.as_str(), "418560");
        assert_eq!(player.name, "Erling Haaland");
        assert_eq!(player.position, Position::CentreForward);
        assert_eq!(player.club_id.as_ref(), Some(&club));
        assert_eq!(player.date_of_birth, NaiveDate::from_ymd_opt(2000, 7, 21));
        assert_eq!(player.nationality.as_deref(), Some("Norway"));
        assert_eq!(player.market_value, Some(180_000_000));
    }

    #[test]
    fn test_parse_profile() {
        let html = r#"
            <h1>#9 Erling Haaland</h1>
            <span class="data-header__club"><a href="/manchester-city/startseite/verein/281">Man City</a></span>
            <ul>
              <li class="data-header__label">Date of birth: <span itemprop="birthDate">Jul 21, 2000 (23)</span></li>
              <li class="data-header__label">Citizenship: <span itemprop="nationality">Norway</span></li>
              <li class="data-header__label">Position: <span class="data-header__content">Centre-Forward</span></li>
            </ul>
            <a class="data-header__market-value-wrapper">€180.00m Last update: Dec 19, 2023</a>"#;
        let id = PlayerId::new("418560").unwrap();
        let player = parse_profile(html, &id, "https://example.com/p").expect("profile");

        assert_eq!(player.name, "Erling Haaland");
        assert_eq!(player.club_id.as_ref().map(ClubId::as_str), Some("281"));
        assert_eq!(player.position, Position::CentreForward);
        assert_eq!(player.nationality.as_deref(), Some("Norway"));
        assert_eq!(player.market_value, Some(180_000_000));
    }

    #[test]
    fn test_profile_without_name_is_rejected() {
        let id = PlayerId::new("1").unwrap();
        let err = parse_profile("<div></div>", &id, "https://example.com/p").expect_err("no h1");
        assert!(matches!(err, ScrapeError::Extraction { .. }));
    }
}
