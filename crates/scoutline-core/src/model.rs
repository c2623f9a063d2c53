//! Catalog entities: countries, competitions, clubs, players and the
//! season/competition/match statistics hierarchy.

use crate::types::{ClubId, CompetitionId, CountryId, PlayerId, SeasonId, StatId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A country and the competitions it organises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
    pub flag_url: Option<String>,
    pub competitions: Vec<Competition>,
}

impl Country {
    /// The sentinel country that owns international competitions.
    #[must_use]
    pub fn international() -> Self {
        Self {
            id: CountryId::international(),
            name: "International".to_string(),
            flag_url: None,
            competitions: Vec::new(),
        }
    }

    /// Insert a competition, enriching the existing entry with the same ID.
    ///
    /// Returns `true` if the competition was not listed before.
    pub fn add_competition(&mut self, competition: Competition) -> bool {
        match self
            .competitions
            .iter_mut()
            .find(|existing| existing.id == competition.id)
        {
            Some(existing) => {
                existing.enrich(competition);
                false
            }
            None => {
                self.competitions.push(competition);
                true
            }
        }
    }
}

/// Classification of a competition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "tier")]
pub enum CupKind {
    /// Domestic league, with the tier label as shown on the site ("First Tier").
    League(String),
    /// Domestic cup or super cup.
    DomesticCup,
    /// Continental or worldwide competition.
    International,
    #[default]
    Unknown,
}

impl CupKind {
    /// Classify from the site's classification cell text.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        let lower = trimmed.to_lowercase();
        if lower.is_empty() {
            Self::Unknown
        } else if lower.contains("international") {
            Self::International
        } else if lower.contains("cup") {
            Self::DomesticCup
        } else if lower.contains("tier") || lower.contains("league") {
            Self::League(trimmed.to_string())
        } else {
            Self::Unknown
        }
    }
}

/// A league or cup competition.
///
/// Created partially from a quick-select capture (id, name, link) and enriched
/// later by reconciliation search or roster discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competition {
    pub id: CompetitionId,
    pub name: String,
    pub link: String,
    pub logo_url: Option<String>,
    pub country_id: Option<CountryId>,
    pub cup: CupKind,
    pub club_count: u32,
    pub player_count: u32,
    pub total_market_value: Option<u64>,
    pub mean_market_value: Option<u64>,
    pub club_ids: BTreeSet<ClubId>,
}

impl Competition {
    /// A competition known only by its identity, as captured from a quick select.
    #[must_use]
    pub fn partial(id: CompetitionId, name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            link: link.into(),
            logo_url: None,
            country_id: None,
            cup: CupKind::Unknown,
            club_count: 0,
            player_count: 0,
            total_market_value: None,
            mean_market_value: None,
            club_ids: BTreeSet::new(),
        }
    }

    /// Whether only the quick-select identity fields are known.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.cup == CupKind::Unknown
            && self.club_count == 0
            && self.player_count == 0
            && self.total_market_value.is_none()
    }

    /// Merge a newer record of the same competition into this one.
    ///
    /// Identity fields take the newer values; aggregates only move forward, so a
    /// partial capture never wipes out data a full record already provided.
    pub fn enrich(&mut self, newer: Competition) {
        debug_assert_eq!(self.id, newer.id);
        if !newer.name.is_empty() {
            self.name = newer.name;
        }
        if !newer.link.is_empty() {
            self.link = newer.link;
        }
        if newer.logo_url.is_some() {
            self.logo_url = newer.logo_url;
        }
        if newer.country_id.is_some() {
            self.country_id = newer.country_id;
        }
        if newer.cup != CupKind::Unknown {
            self.cup = newer.cup;
        }
        if newer.club_count > 0 {
            self.club_count = newer.club_count;
        }
        if newer.player_count > 0 {
            self.player_count = newer.player_count;
        }
        if newer.total_market_value.is_some() {
            self.total_market_value = newer.total_market_value;
        }
        if newer.mean_market_value.is_some() {
            self.mean_market_value = newer.mean_market_value;
        }
        self.club_ids.extend(newer.club_ids);
    }
}

/// A club and its squad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: ClubId,
    pub name: String,
    pub link: String,
    pub logo_url: Option<String>,
    pub competition_ids: BTreeSet<CompetitionId>,
    pub squad_size: u32,
    pub mean_age: Option<f32>,
    pub foreigners: u32,
    pub total_market_value: Option<u64>,
    pub player_ids: BTreeSet<PlayerId>,
}

/// Playing position as listed on the player's profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Goalkeeper,
    CentreBack,
    LeftBack,
    RightBack,
    DefensiveMidfield,
    CentralMidfield,
    AttackingMidfield,
    LeftMidfield,
    RightMidfield,
    LeftWinger,
    RightWinger,
    SecondStriker,
    CentreForward,
    #[default]
    Unknown,
}

/// Which column layout a player's stat tables use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionCategory {
    Goalkeeper,
    Outfield,
}

impl Position {
    /// Parse a position from its long label ("Centre-Forward") or its
    /// abbreviation ("CF").
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let normalized: String = label
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();
        match normalized.as_str() {
            "goalkeeper" | "gk" | "tw" => Self::Goalkeeper,
            "centreback" | "centerback" | "cb" | "iv" => Self::CentreBack,
            "leftback" | "lb" => Self::LeftBack,
            "rightback" | "rb" => Self::RightBack,
            "defensivemidfield" | "dm" => Self::DefensiveMidfield,
            "centralmidfield" | "cm" => Self::CentralMidfield,
            "attackingmidfield" | "am" => Self::AttackingMidfield,
            "leftmidfield" | "lm" => Self::LeftMidfield,
            "rightmidfield" | "rm" => Self::RightMidfield,
            "leftwinger" | "lw" => Self::LeftWinger,
            "rightwinger" | "rw" => Self::RightWinger,
            "secondstriker" | "ss" => Self::SecondStriker,
            "centreforward" | "centerforward" | "cf" | "st" => Self::CentreForward,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn category(self) -> PositionCategory {
        match self {
            Self::Goalkeeper => PositionCategory::Goalkeeper,
            _ => PositionCategory::Outfield,
        }
    }
}

/// One point of a player's market-value history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketValuePoint {
    pub date: Option<NaiveDate>,
    pub value: u64,
    pub club_name: Option<String>,
}

/// A player as listed in a club's squad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub link: String,
    pub position: Position,
    pub club_id: Option<ClubId>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub market_value: Option<u64>,
    pub market_value_history: Vec<MarketValuePoint>,
    /// Pre-linked ID of the player's stat document.
    pub stat_id: StatId,
}

impl Player {
    /// Create a player with only its identity and position known.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>, link: impl Into<String>) -> Self {
        let stat_id = StatId::player_stat(&id);
        Self {
            id,
            name: name.into(),
            link: link.into(),
            position: Position::Unknown,
            club_id: None,
            date_of_birth: None,
            nationality: None,
            market_value: None,
            market_value_history: Vec::new(),
            stat_id,
        }
    }
}

/// Completion state of one season of a player's statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarvestState {
    Unscraped,
    Scraping,
    Scraped,
}

/// All statistics recorded for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStat {
    pub id: StatId,
    pub player_id: PlayerId,
    pub seasons: Vec<PlayerSeasonStat>,
}

impl PlayerStat {
    #[must_use]
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            id: StatId::player_stat(&player_id),
            player_id,
            seasons: Vec::new(),
        }
    }

    #[must_use]
    pub fn season(&self, season_id: &SeasonId) -> Option<&PlayerSeasonStat> {
        self.seasons.iter().find(|s| &s.season_id == season_id)
    }

    /// Replace a season in place, keeping the document's season order.
    pub fn replace_season(&mut self, season: PlayerSeasonStat) {
        match self
            .seasons
            .iter_mut()
            .find(|existing| existing.season_id == season.season_id)
        {
            Some(existing) => *existing = season,
            None => self.seasons.push(season),
        }
    }
}

/// Aggregate totals of a season or of one competition within a season.
///
/// Goalkeepers have `goals_conceded`/`clean_sheets` filled; outfield players have
/// `assists`/`penalty_goals`/`minutes_per_goal` filled. The other group stays zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatTotals {
    pub appearances: u32,
    pub goals: u32,
    pub assists: u32,
    pub own_goals: u32,
    pub substituted_on: u32,
    pub substituted_off: u32,
    pub yellow_cards: u32,
    pub second_yellow_cards: u32,
    pub red_cards: u32,
    pub penalty_goals: u32,
    pub minutes_per_goal: u32,
    pub goals_conceded: u32,
    pub clean_sheets: u32,
    pub minutes_played: u32,
}

/// One season of a player's statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeasonStat {
    pub id: StatId,
    pub season_id: SeasonId,
    /// Display label of the season ("22/23").
    pub name: String,
    pub is_scraped: bool,
    pub totals: StatTotals,
    pub competitions: Vec<PlayerSeasonCompetitionStat>,
}

impl PlayerSeasonStat {
    /// A season discovered from the season selector, not yet harvested.
    #[must_use]
    pub fn unscraped(player: &PlayerId, season_id: SeasonId, name: impl Into<String>) -> Self {
        Self {
            id: StatId::season(player, &season_id),
            season_id,
            name: name.into(),
            is_scraped: false,
            totals: StatTotals::default(),
            competitions: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> HarvestState {
        if self.is_scraped {
            HarvestState::Scraped
        } else {
            HarvestState::Unscraped
        }
    }
}

/// Participation counts from a competition's footer summary block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    pub squad: u32,
    pub starting_eleven: u32,
    pub substituted_in: u32,
    pub substituted_off: u32,
    pub on_the_bench: u32,
    pub suspended: u32,
    pub injured: u32,
}

/// A player's line for one competition within a season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeasonCompetitionStat {
    pub id: StatId,
    pub competition_id: CompetitionId,
    pub name: String,
    pub link: String,
    pub logo_url: Option<String>,
    pub totals: StatTotals,
    pub participation: Participation,
    pub matches: Vec<PlayerSeasonCompetitionMatchStat>,
}

/// A club as referenced from a match row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubRef {
    pub id: ClubId,
    pub name: String,
    pub link: String,
    pub logo_url: Option<String>,
}

/// Outcome of a match from the perspective of the player's club.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    Win,
    Loss,
    #[default]
    Draw,
}

/// Score cell of a match row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub score: String,
    pub outcome: MatchOutcome,
    pub after_extra_time: bool,
    pub on_penalties: bool,
}

/// Why a player did not appear in a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "code", content = "detail")]
pub enum AbsenceReason {
    NotInSquad,
    OnTheBench,
    Injured,
    Suspended,
    Ill,
    NotEligible,
    /// Placeholder text that matched no known code.
    Other(String),
}

impl AbsenceReason {
    /// Code the placeholder text of a "did not play" row.
    #[must_use]
    pub fn from_placeholder(text: &str) -> Self {
        let lower = text.trim().to_lowercase();
        if lower.contains("bench") {
            Self::OnTheBench
        } else if lower.contains("not in squad") || lower.contains("not in the squad") {
            Self::NotInSquad
        } else if lower.contains("suspen") || lower.contains("red card") || lower.contains("ban")
        {
            Self::Suspended
        } else if lower.contains("injur") || lower.contains("knock") {
            Self::Injured
        } else if lower.contains("ill") || lower.contains("virus") || lower.contains("flu") {
            Self::Ill
        } else if lower.contains("eligible") {
            Self::NotEligible
        } else {
            Self::Other(text.trim().to_string())
        }
    }
}

/// A player's stat line for one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeasonCompetitionMatchStat {
    pub id: StatId,
    pub matchday: Option<String>,
    pub date: NaiveDate,
    pub home: ClubRef,
    pub away: ClubRef,
    pub result: MatchResult,
    pub absence: Option<AbsenceReason>,
    pub position: Option<Position>,
    pub is_captain: bool,
    pub goals: u32,
    pub assists: u32,
    pub own_goals: u32,
    pub yellow_card_minute: Option<u32>,
    pub second_yellow_card_minute: Option<u32>,
    pub red_card_minute: Option<u32>,
    pub substituted_on_minute: Option<u32>,
    pub substituted_off_minute: Option<u32>,
    pub goals_conceded: u32,
    pub clean_sheet: bool,
    pub minutes_played: u32,
}
