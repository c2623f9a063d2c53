//! Per-player season statistics harvest.
//!
//! Each season of a player's stat document moves `Unscraped -> Scraping ->
//! Scraped`. Scraped seasons are skipped unless a re-scrape is forced, so a
//! repeated harvest of a complete player performs no navigation at all. A
//! season whose page references a competition that cannot be reconciled is
//! left `Unscraped` and picked up again by the next run.

use crate::cells::{count_or_zero, parse_date, parse_footer_pairs};
use crate::columns::{match_columns, ColumnLayout, StatField, TableKind};
use crate::error::{Result, ScrapeError};
use crate::navigator::Navigator;
use crate::parser::{
    body_rows, cells, document, id_after, is_empty_cell, parse_selector, select_attr, select_text,
    selector, text_of,
};
use crate::reconciliation::ReconciliationSearch;
use crate::roster::RosterScraper;
use crate::url_builder::SiteUrls;
use scoutline_core::{
    AbsenceReason, ClubId, ClubRef, CompetitionId, HarvestState, MatchOutcome, MatchResult,
    Participation, Player, PlayerId, PlayerSeasonCompetitionMatchStat,
    PlayerSeasonCompetitionStat, PlayerSeasonStat, PlayerStat, Position, PositionCategory,
    SeasonId, SelectorConfig, StatId, StatTotals,
};
use scoutline_db::{player_stats, players, Database};
use scraper::ElementRef;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Season value of the "all seasons" aggregate option.
const ALL_SEASONS_OPTION: &str = "ges";

/// Placeholder cells spanning at least this many columns mark an absence.
const ABSENCE_COLSPAN: usize = 5;

/// Which seasons a harvest covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeasonSelector {
    All,
    Season(SeasonId),
}

impl FromStr for SeasonSelector {
    type Err = scoutline_core::CoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            SeasonId::new(s.trim()).map(Self::Season)
        }
    }
}

impl fmt::Display for SeasonSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Season(id) => write!(f, "{id}"),
        }
    }
}

/// One competition block of a season page.
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitionSection {
    pub competition_id: CompetitionId,
    pub name: String,
    pub link: String,
    pub logo_url: Option<String>,
    pub totals: StatTotals,
    pub participation: Participation,
    pub matches: Vec<PlayerSeasonCompetitionMatchStat>,
}

/// Everything a season stats page yields before reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonPage {
    pub totals: StatTotals,
    pub competitions: Vec<CompetitionSection>,
}

/// Competition ID from a league or cup link.
fn competition_id_from_link(link: &str) -> Option<CompetitionId> {
    id_after(link, "wettbewerb")
        .or_else(|| id_after(link, "pokalwettbewerb"))
        .and_then(|id| CompetitionId::new(id).ok())
}

/// Season options of a player's stats page, in listed order.
pub fn parse_season_options(
    html: &str,
    option_selector: &str,
    player_id: &PlayerId,
) -> std::result::Result<Vec<PlayerSeasonStat>, String> {
    let options = parse_selector(option_selector)?;
    let doc = document(html);
    let mut seen = HashSet::new();

    Ok(doc
        .select(&options)
        .filter_map(|option| {
            let value = option.value().attr("value")?.trim();
            if value.is_empty() || value == ALL_SEASONS_OPTION {
                return None;
            }
            let season_id = SeasonId::new(value).ok()?;
            if !seen.insert(season_id.clone()) {
                return None;
            }
            Some(PlayerSeasonStat::unscraped(
                player_id,
                season_id,
                text_of(option),
            ))
        })
        .collect())
}

/// Parse a season stats page: the summary table with its footer totals, and
/// the per-competition boxes with participation footers and match tables.
pub fn parse_season_page(
    html: &str,
    url: &str,
    player_id: &PlayerId,
    category: PositionCategory,
    urls: &SiteUrls,
) -> Result<SeasonPage> {
    let doc = document(html);
    let summary = doc
        .select(&selector("table.items"))
        .find(|table| table.select(&selector("tfoot")).next().is_some())
        .ok_or_else(|| ScrapeError::extraction(url, "table.items", "season summary table missing"))?;

    let footer_cells: Vec<String> = summary
        .select(&selector("tfoot tr"))
        .next()
        .map(|row| cells(row).into_iter().map(text_of).collect())
        .unwrap_or_default();
    let totals = ColumnLayout::select(TableKind::SeasonFooter, category).read_totals(&footer_cells);

    let boxes = competition_boxes(&doc);
    let row_layout = ColumnLayout::select(TableKind::CompetitionRow, category);
    let match_layout = ColumnLayout::select(TableKind::MatchRow, category);
    let anchor_sel = selector("a[href*='wettbewerb']");
    let img = selector("img");

    let mut competitions = Vec::new();
    for row in body_rows(summary) {
        let Some(anchor) = row.select(&anchor_sel).find(|a| !text_of(*a).is_empty()) else {
            continue;
        };
        let href = anchor.value().attr("href").unwrap_or_default();
        let Some(competition_id) = competition_id_from_link(href) else {
            tracing::warn!(url, href, "Skipping competition row without an ID");
            continue;
        };

        let tds = cells(row);
        let texts: Vec<String> = tds.iter().map(|td| text_of(*td)).collect();
        let name = anchor
            .value()
            .attr("title")
            .map(str::to_string)
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| text_of(anchor));

        let (participation, matches) = match boxes.get(competition_id.as_str()) {
            Some(section) => (
                select_text(*section, &selector("div.table-footer"))
                    .map(|footer| parse_participation(&footer))
                    .unwrap_or_default(),
                parse_match_table(*section, url, player_id, match_layout, urls),
            ),
            None => {
                tracing::debug!(url, competition = %competition_id, "No match table for competition");
                (Participation::default(), Vec::new())
            }
        };

        competitions.push(CompetitionSection {
            name,
            link: urls.absolute(href),
            logo_url: tds.first().and_then(|td| select_attr(*td, &img, "src")),
            totals: row_layout.read_totals(&texts),
            participation,
            matches,
            competition_id,
        });
    }

    Ok(SeasonPage {
        totals,
        competitions,
    })
}

/// Boxes whose header links a competition, keyed by competition ID.
fn competition_boxes(doc: &scraper::Html) -> HashMap<String, ElementRef<'_>> {
    let header_anchor = selector("div.table-header a[href*='wettbewerb']");
    doc.select(&selector("div.box"))
        .filter_map(|section| {
            let href = section.select(&header_anchor).next()?.value().attr("href")?;
            let id = competition_id_from_link(href)?;
            Some((id.as_str().to_string(), section))
        })
        .collect()
}

fn parse_participation(footer: &str) -> Participation {
    let mut participation = Participation::default();
    for (key, value) in parse_footer_pairs(footer) {
        match key.as_str() {
            "squad" | "in squad" => participation.squad = value,
            "starting eleven" | "starting xi" => participation.starting_eleven = value,
            "substituted in" | "subbed on" => participation.substituted_in = value,
            "substituted off" | "subbed off" => participation.substituted_off = value,
            "on the bench" | "bench" => participation.on_the_bench = value,
            "suspended" | "suspension" => participation.suspended = value,
            "injured" | "injury" => participation.injured = value,
            other => tracing::debug!("Ignoring participation entry '{}'", other),
        }
    }
    participation
}

fn parse_match_table(
    section: ElementRef<'_>,
    url: &str,
    player_id: &PlayerId,
    layout: ColumnLayout,
    urls: &SiteUrls,
) -> Vec<PlayerSeasonCompetitionMatchStat> {
    section
        .select(&selector("table"))
        .flat_map(body_rows)
        .filter_map(|row| match parse_match_row(row, player_id, layout, urls) {
            Ok(stat) => stat,
            Err(reason) => {
                tracing::warn!(url, "Skipping match row: {}", reason);
                None
            }
        })
        .collect()
}

/// Parse one match row. `Ok(None)` for rows that are not match lines.
fn parse_match_row(
    row: ElementRef<'_>,
    player_id: &PlayerId,
    layout: ColumnLayout,
    urls: &SiteUrls,
) -> std::result::Result<Option<PlayerSeasonCompetitionMatchStat>, String> {
    use match_columns::{AWAY, AWAY_LOGO, DATE, HOME, HOME_LOGO, MATCHDAY, POSITION, RESULT};

    let tds = cells(row);
    if tds.len() <= RESULT {
        return Ok(None);
    }
    let texts: Vec<String> = tds.iter().map(|td| text_of(*td)).collect();

    let date = parse_date(&texts[DATE]).ok_or_else(|| format!("unparseable date '{}'", texts[DATE]))?;
    let home = club_ref(tds[HOME_LOGO], tds[HOME], urls).ok_or("home club ID missing")?;
    let away = club_ref(tds[AWAY_LOGO], tds[AWAY], urls).ok_or("away club ID missing")?;

    let mut stat = PlayerSeasonCompetitionMatchStat {
        id: StatId::match_line(player_id, &home.id, &away.id, date),
        matchday: Some(texts[MATCHDAY].clone()).filter(|day| !day.is_empty()),
        date,
        home,
        away,
        result: match_result(tds[RESULT]),
        absence: None,
        position: None,
        is_captain: false,
        goals: 0,
        assists: 0,
        own_goals: 0,
        yellow_card_minute: None,
        second_yellow_card_minute: None,
        red_card_minute: None,
        substituted_on_minute: None,
        substituted_off_minute: None,
        goals_conceded: 0,
        clean_sheet: false,
        minutes_played: 0,
    };

    let placeholder = tds.iter().skip(RESULT + 1).find(|td| {
        td.value()
            .attr("colspan")
            .and_then(|span| span.trim().parse::<usize>().ok())
            .is_some_and(|span| span >= ABSENCE_COLSPAN)
    });
    if let Some(placeholder) = placeholder {
        stat.absence = Some(AbsenceReason::from_placeholder(&text_of(*placeholder)));
        return Ok(Some(stat));
    }

    if let Some(cell) = tds.get(POSITION) {
        let label = select_attr(*cell, &selector("a"), "title")
            .unwrap_or_else(|| texts[POSITION].clone());
        let position = Position::from_label(&label);
        stat.position = (position != Position::Unknown).then_some(position);
        stat.is_captain = cell
            .select(&selector("span.kapitaenicon-table"))
            .next()
            .is_some();
    }

    stat.goals = layout.count(&texts, StatField::Goals);
    stat.assists = layout.count(&texts, StatField::Assists);
    stat.own_goals = layout.count(&texts, StatField::OwnGoals);
    stat.yellow_card_minute = layout.minute(&texts, StatField::YellowCards);
    stat.second_yellow_card_minute = layout.minute(&texts, StatField::SecondYellowCards);
    stat.red_card_minute = layout.minute(&texts, StatField::RedCards);
    stat.substituted_on_minute = layout.minute(&texts, StatField::SubstitutedOn);
    stat.substituted_off_minute = layout.minute(&texts, StatField::SubstitutedOff);
    stat.goals_conceded = layout.count(&texts, StatField::GoalsConceded);
    stat.clean_sheet = layout
        .column(StatField::CleanSheets)
        .and_then(|index| tds.get(index))
        .is_some_and(|cell| is_clean_sheet(*cell));
    stat.minutes_played = layout.count(&texts, StatField::MinutesPlayed);

    Ok(Some(stat))
}

/// A clean sheet is shown as an icon or a non-zero mark.
fn is_clean_sheet(cell: ElementRef<'_>) -> bool {
    if is_empty_cell(cell) {
        return false;
    }
    let text = text_of(cell);
    if text.is_empty() {
        return cell.select(&selector("span, img, i")).next().is_some();
    }
    text != "-" && count_or_zero(&text) > 0
}

fn club_ref(logo_cell: ElementRef<'_>, link_cell: ElementRef<'_>, urls: &SiteUrls) -> Option<ClubRef> {
    let anchor = link_cell
        .select(&selector("a[href*='/verein/']"))
        .next()?;
    let href = anchor.value().attr("href")?;
    let id = ClubId::new(id_after(href, "verein")?).ok()?;
    let name = anchor
        .value()
        .attr("title")
        .map(str::to_string)
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| text_of(anchor));

    Some(ClubRef {
        id,
        name,
        link: urls.absolute(href),
        logo_url: select_attr(logo_cell, &selector("img"), "src"),
    })
}

fn match_result(cell: ElementRef<'_>) -> MatchResult {
    let outcome = if cell.select(&selector("span.greentext")).next().is_some() {
        MatchOutcome::Win
    } else if cell.select(&selector("span.redtext")).next().is_some() {
        MatchOutcome::Loss
    } else {
        MatchOutcome::Draw
    };

    let annotation = select_text(cell, &selector("span.ergebnis-zusatz")).unwrap_or_default();
    let full = text_of(cell).to_lowercase();
    let after_extra_time = full.contains("aet") || full.contains("n.v.");
    let on_penalties = full.contains("pen") || full.contains("i.e.");

    let score = select_text(cell, &selector("a"))
        .or_else(|| select_text(cell, &selector("span.greentext, span.redtext")))
        .unwrap_or_else(|| text_of(cell));
    let score = if annotation.is_empty() {
        score
    } else {
        score.replace(&annotation, "")
    };

    MatchResult {
        score: score.trim().to_string(),
        outcome,
        after_extra_time,
        on_penalties,
    }
}

/// Harvests season statistics into a player's stat document.
pub struct StatHarvester {
    navigator: Navigator,
    db: Arc<Database>,
    urls: SiteUrls,
    reconciler: ReconciliationSearch,
    roster: RosterScraper,
    season_options: String,
}

impl StatHarvester {
    #[must_use]
    pub fn new(
        navigator: Navigator,
        db: Arc<Database>,
        urls: SiteUrls,
        reconciler: ReconciliationSearch,
        roster: RosterScraper,
        selectors: &SelectorConfig,
    ) -> Self {
        Self {
            navigator,
            db,
            urls,
            reconciler,
            roster,
            season_options: selectors.season_options.clone(),
        }
    }

    /// Harvest the selected seasons of a player and persist the whole stat
    /// document in one write.
    ///
    /// # Errors
    /// [`ScrapeError::SeasonNotFound`] if a named season is not listed for
    /// the player. Cancellation and database failures propagate; any other
    /// failure leaves the affected season `Unscraped`.
    pub async fn harvest(
        &self,
        player_id: &PlayerId,
        seasons: &SeasonSelector,
        force: bool,
    ) -> Result<PlayerStat> {
        let pool = self.db.pool();
        let player = match players::get_player(pool, player_id).await? {
            Some(player) => player,
            None => {
                tracing::info!(player = %player_id, "Player not in catalog, scraping profile");
                self.roster.scrape_player_profile(player_id).await?
            }
        };

        let mut stat = player_stats::get_player_stat(pool, player_id)
            .await?
            .unwrap_or_else(|| PlayerStat::new(player_id.clone()));

        if stat.seasons.is_empty() {
            stat.seasons = self.discover_seasons(player_id).await?;
            tracing::info!(player = %player_id, "Discovered {} seasons", stat.seasons.len());
            player_stats::upsert_player_stat(pool, &stat).await?;
        }

        let targets: Vec<SeasonId> = match seasons {
            SeasonSelector::All => stat
                .seasons
                .iter()
                .filter(|season| force || !season.is_scraped)
                .map(|season| season.season_id.clone())
                .collect(),
            SeasonSelector::Season(season_id) => {
                let season = stat.season(season_id).ok_or_else(|| ScrapeError::SeasonNotFound {
                    player_id: player_id.clone(),
                    season_id: season_id.clone(),
                })?;
                if force || !season.is_scraped {
                    vec![season_id.clone()]
                } else {
                    Vec::new()
                }
            }
        };

        if targets.is_empty() {
            tracing::debug!(player = %player_id, selector = %seasons, "Nothing to harvest");
            return Ok(stat);
        }

        for season_id in targets {
            let Some(current) = stat.season(&season_id).cloned() else {
                continue;
            };
            tracing::debug!(
                player = %player_id,
                season = %season_id,
                "{:?} -> {:?}",
                current.state(),
                HarvestState::Scraping
            );

            match self.harvest_season(&player, current).await {
                Ok(harvested) => {
                    tracing::info!(
                        player = %player_id,
                        season = %season_id,
                        competitions = harvested.competitions.len(),
                        "Season harvested ({:?})",
                        harvested.state()
                    );
                    stat.replace_season(harvested);
                }
                Err(e @ (ScrapeError::Cancelled { .. } | ScrapeError::Database(_))) => {
                    return Err(e);
                }
                Err(e) => {
                    tracing::error!(
                        player = %player_id,
                        season = %season_id,
                        "Season harvest failed, left unscraped: {}",
                        e
                    );
                }
            }
        }

        player_stats::upsert_player_stat(pool, &stat).await?;
        Ok(stat)
    }

    async fn discover_seasons(&self, player_id: &PlayerId) -> Result<Vec<PlayerSeasonStat>> {
        let url = self.urls.player_stats_url(player_id);
        let page = self.navigator.fetch_page(&url).await?;
        let seasons = parse_season_options(&page.content, &self.season_options, player_id)
            .map_err(|reason| ScrapeError::extraction(&url, &self.season_options, reason))?;
        if seasons.is_empty() {
            tracing::warn!(url = %url, "Stats page lists no seasons");
        }
        Ok(seasons)
    }

    async fn harvest_season(
        &self,
        player: &Player,
        season: PlayerSeasonStat,
    ) -> Result<PlayerSeasonStat> {
        let url = self.urls.season_stats_url(&player.id, &season.season_id);
        let page = self.navigator.fetch_page(&url).await?;
        let parsed = parse_season_page(
            &page.content,
            &url,
            &player.id,
            player.position.category(),
            &self.urls,
        )?;

        let mut harvested = PlayerSeasonStat {
            is_scraped: false,
            totals: parsed.totals,
            competitions: Vec::with_capacity(parsed.competitions.len()),
            ..season
        };
        let mut complete = true;

        for section in parsed.competitions {
            match self
                .reconciler
                .reconcile(&section.competition_id, &section.name, &section.link)
                .await
            {
                Ok(_) => {}
                Err(e @ ScrapeError::ReconciliationNotFound { .. }) => {
                    tracing::warn!(url = %url, "Skipping competition: {}", e);
                    complete = false;
                    continue;
                }
                Err(e) => return Err(e),
            }

            harvested.competitions.push(PlayerSeasonCompetitionStat {
                id: StatId::competition(&player.id, &harvested.season_id, &section.competition_id),
                competition_id: section.competition_id,
                name: section.name,
                link: section.link,
                logo_url: section.logo_url,
                totals: section.totals,
                participation: section.participation,
                matches: section.matches,
            });
        }

        harvested.is_scraped = complete;
        Ok(harvested)
    }
}
