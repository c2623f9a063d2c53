//! Column layouts of the stats tables.
//!
//! Goalkeepers and outfield players get different tables: goalkeepers have
//! goals-conceded and clean-sheet columns where outfield players have
//! assists, penalty goals and minutes per goal. Each field is read from the
//! index the layout assigns to it, never from a fixed position.

use crate::cells::{count_or_zero, parse_minute};
use scoutline_core::{PositionCategory, StatTotals};

/// Which stats table a row comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Season summary footer: a label cell, then the totals
    SeasonFooter,
    /// Per-competition summary row: logo and name cells, then the totals
    CompetitionRow,
    /// One match of a competition
    MatchRow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatField {
    Appearances,
    Goals,
    Assists,
    OwnGoals,
    SubstitutedOn,
    SubstitutedOff,
    YellowCards,
    SecondYellowCards,
    RedCards,
    PenaltyGoals,
    MinutesPerGoal,
    GoalsConceded,
    CleanSheets,
    MinutesPlayed,
}

/// Fixed leading columns of a match row.
pub mod match_columns {
    pub const MATCHDAY: usize = 0;
    pub const DATE: usize = 1;
    pub const HOME_LOGO: usize = 2;
    pub const HOME: usize = 3;
    pub const AWAY_LOGO: usize = 4;
    pub const AWAY: usize = 5;
    pub const RESULT: usize = 6;
    pub const POSITION: usize = 7;
}

use StatField::{
    Appearances, Assists, CleanSheets, Goals, GoalsConceded, MinutesPerGoal, MinutesPlayed,
    OwnGoals, PenaltyGoals, RedCards, SecondYellowCards, SubstitutedOff, SubstitutedOn,
    YellowCards,
};

const OUTFIELD_TOTALS: &[(StatField, usize)] = &[
    (Appearances, 1),
    (Goals, 2),
    (Assists, 3),
    (OwnGoals, 4),
    (SubstitutedOn, 5),
    (SubstitutedOff, 6),
    (YellowCards, 7),
    (SecondYellowCards, 8),
    (RedCards, 9),
    (PenaltyGoals, 10),
    (MinutesPerGoal, 11),
    (MinutesPlayed, 12),
];

const GOALKEEPER_TOTALS: &[(StatField, usize)] = &[
    (Appearances, 1),
    (Goals, 2),
    (OwnGoals, 3),
    (SubstitutedOn, 4),
    (SubstitutedOff, 5),
    (YellowCards, 6),
    (SecondYellowCards, 7),
    (RedCards, 8),
    (GoalsConceded, 9),
    (CleanSheets, 10),
    (MinutesPlayed, 11),
];

const OUTFIELD_MATCH: &[(StatField, usize)] = &[
    (Goals, 8),
    (Assists, 9),
    (OwnGoals, 10),
    (YellowCards, 11),
    (SecondYellowCards, 12),
    (RedCards, 13),
    (SubstitutedOn, 14),
    (SubstitutedOff, 15),
    (MinutesPlayed, 16),
];

const GOALKEEPER_MATCH: &[(StatField, usize)] = &[
    (Goals, 8),
    (OwnGoals, 9),
    (YellowCards, 10),
    (SecondYellowCards, 11),
    (RedCards, 12),
    (SubstitutedOn, 13),
    (SubstitutedOff, 14),
    (GoalsConceded, 15),
    (CleanSheets, 16),
    (MinutesPlayed, 17),
];

/// Field-to-column mapping for one table kind and position category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    kind: TableKind,
    category: PositionCategory,
    columns: &'static [(StatField, usize)],
    offset: usize,
}

impl ColumnLayout {
    #[must_use]
    pub fn select(kind: TableKind, category: PositionCategory) -> Self {
        let (columns, offset) = match (kind, category) {
            (TableKind::SeasonFooter, PositionCategory::Outfield) => (OUTFIELD_TOTALS, 0),
            (TableKind::SeasonFooter, PositionCategory::Goalkeeper) => (GOALKEEPER_TOTALS, 0),
            (TableKind::CompetitionRow, PositionCategory::Outfield) => (OUTFIELD_TOTALS, 1),
            (TableKind::CompetitionRow, PositionCategory::Goalkeeper) => (GOALKEEPER_TOTALS, 1),
            (TableKind::MatchRow, PositionCategory::Outfield) => (OUTFIELD_MATCH, 0),
            (TableKind::MatchRow, PositionCategory::Goalkeeper) => (GOALKEEPER_MATCH, 0),
        };
        Self {
            kind,
            category,
            columns,
            offset,
        }
    }

    #[must_use]
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    #[must_use]
    pub fn category(&self) -> PositionCategory {
        self.category
    }

    /// Cell index of `field`, or `None` if this table has no such column.
    #[must_use]
    pub fn column(&self, field: StatField) -> Option<usize> {
        self.columns
            .iter()
            .find(|(candidate, _)| *candidate == field)
            .map(|(_, index)| index + self.offset)
    }

    /// Every mapped field with its cell index.
    pub fn fields(&self) -> impl Iterator<Item = (StatField, usize)> + '_ {
        self.columns
            .iter()
            .map(move |(field, index)| (*field, index + self.offset))
    }

    /// Cell text for `field`, if the layout maps it and the row has it.
    #[must_use]
    pub fn text<'a>(&self, cells: &'a [String], field: StatField) -> Option<&'a str> {
        self.column(field)
            .and_then(|index| cells.get(index))
            .map(String::as_str)
    }

    /// Read a totals row. Unmapped fields stay zero.
    #[must_use]
    pub fn read_totals(&self, cells: &[String]) -> StatTotals {
        let mut totals = StatTotals::default();
        for (field, index) in self.fields() {
            let value = cells.get(index).map_or(0, |text| count_or_zero(text));
            *totals_field(&mut totals, field) = value;
        }
        totals
    }

    /// Count-valued cell of a match row; placeholders read as zero.
    #[must_use]
    pub fn count(&self, cells: &[String], field: StatField) -> u32 {
        self.text(cells, field).map_or(0, count_or_zero)
    }

    /// Minute-valued cell of a match row (cards, substitutions).
    #[must_use]
    pub fn minute(&self, cells: &[String], field: StatField) -> Option<u32> {
        self.text(cells, field).and_then(parse_minute)
    }
}

fn totals_field(totals: &mut StatTotals, field: StatField) -> &mut u32 {
    match field {
        Appearances => &mut totals.appearances,
        Goals => &mut totals.goals,
        Assists => &mut totals.assists,
        OwnGoals => &mut totals.own_goals,
        SubstitutedOn => &mut totals.substituted_on,
        SubstitutedOff => &mut totals.substituted_off,
        YellowCards => &mut totals.yellow_cards,
        SecondYellowCards => &mut totals.second_yellow_cards,
        RedCards => &mut totals.red_cards,
        PenaltyGoals => &mut totals.penalty_goals,
        MinutesPerGoal => &mut totals.minutes_per_goal,
        GoalsConceded => &mut totals.goals_conceded,
        CleanSheets => &mut totals.clean_sheets,
        MinutesPlayed => &mut totals.minutes_played,
    }
}
