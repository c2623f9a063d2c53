//! Identifier types shared across the Scoutline workspace.
//!
//! Every catalog entity is keyed by the opaque identifier the source site assigns
//! to it (its natural ID). Nested statistic records have no site identity of their
//! own, so they are keyed by a composite hash of their parent keys instead.

use crate::error::CoreError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::OnceLock;

fn site_id_regex() -> &'static Regex {
    static SITE_ID_REGEX: OnceLock<Regex> = OnceLock::new();
    SITE_ID_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid regex"))
}

macro_rules! site_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a validated identifier.
            ///
            /// # Errors
            /// Returns [`CoreError::Validation`] if the value is empty, longer than 64
            /// characters, or contains anything but ASCII alphanumerics, `-` and `_`.
            pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
                let id = id.into();
                if site_id_regex().is_match(&id) {
                    Ok(Self(id))
                } else {
                    Err(CoreError::Validation(format!(
                        concat!("invalid ", $kind, " ID: '{}'"),
                        id
                    )))
                }
            }

            /// Get the inner string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

site_id!(
    /// Site identifier of a country (e.g. `189`).
    CountryId,
    "country"
);
site_id!(
    /// Site identifier of a competition (e.g. `GB1`, `CL`).
    CompetitionId,
    "competition"
);
site_id!(
    /// Site identifier of a club (e.g. `281`).
    ClubId,
    "club"
);
site_id!(
    /// Site identifier of a player (e.g. `418560`).
    PlayerId,
    "player"
);
site_id!(
    /// Site identifier of a season, the year the season starts in (e.g. `2022`).
    SeasonId,
    "season"
);

/// ID of the sentinel country that owns international competitions.
pub const INTERNATIONAL_COUNTRY_ID: &str = "international";

impl CountryId {
    /// The sentinel "International" country.
    #[must_use]
    pub fn international() -> Self {
        Self(INTERNATIONAL_COUNTRY_ID.to_string())
    }

    /// Whether this is the sentinel "International" country.
    #[must_use]
    pub fn is_international(&self) -> bool {
        self.0 == INTERNATIONAL_COUNTRY_ID
    }
}

/// Hash key parts into a stable hex identifier.
///
/// Parts are joined with `|` before hashing, so `["a", "b|c"]` and `["a|b", "c"]`
/// collide; site IDs never contain `|`.
#[must_use]
pub fn composite_hash(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(parts.join("|").as_bytes());
    hex::encode(hasher.finalize())
}

/// Deterministic identifier of a nested statistic record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatId(String);

impl StatId {
    /// ID of a player's stat document: `hash(playerID|stat)`.
    #[must_use]
    pub fn player_stat(player: &PlayerId) -> Self {
        Self(composite_hash(&[player.as_str(), "stat"]))
    }

    /// ID of one season of a player's stats: `hash(playerID|seasonID)`.
    #[must_use]
    pub fn season(player: &PlayerId, season: &SeasonId) -> Self {
        Self(composite_hash(&[player.as_str(), season.as_str()]))
    }

    /// ID of a player's competition line within a season.
    #[must_use]
    pub fn competition(player: &PlayerId, season: &SeasonId, competition: &CompetitionId) -> Self {
        Self(composite_hash(&[
            player.as_str(),
            season.as_str(),
            competition.as_str(),
        ]))
    }

    /// ID of a single match line: one per player, opponent pair and day.
    #[must_use]
    pub fn match_line(
        player: &PlayerId,
        home: &ClubId,
        away: &ClubId,
        date: chrono::NaiveDate,
    ) -> Self {
        let date = date.format("%Y-%m-%d").to_string();
        Self(composite_hash(&[
            player.as_str(),
            home.as_str(),
            away.as_str(),
            &date,
        ]))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_site_id_validation() {
        assert!(CompetitionId::new("GB1").is_ok());
        assert!(ClubId::new("281").is_ok());
        assert!(CountryId::new("").is_err());
        assert!(PlayerId::new("12 34").is_err());
        assert!(CompetitionId::new("../etc").is_err());
    }

    #[test]
    fn test_site_id_serde_is_transparent() {
        let id = CompetitionId::new("CL").expect("valid id");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"CL\"");
    }

    #[test]
    fn test_international_sentinel() {
        assert!(CountryId::international().is_international());
        assert!(!CountryId::new("189").expect("valid id").is_international());
    }

    #[test]
    fn test_composite_hash_is_stable() {
        let player = PlayerId::new("418560").expect("valid id");
        let season = SeasonId::new("2022").expect("valid id");
        let competition = CompetitionId::new("GB1").expect("valid id");

        let first = StatId::competition(&player, &season, &competition);
        let second = StatId::competition(&player, &season, &competition);
        assert_eq!(first, second);
        assert_eq!(first.as_str(), composite_hash(&["418560", "2022", "GB1"]));
        assert_eq!(first.as_str().len(), 64);
    }

    #[test]
    fn test_composite_hash_depends_on_every_part() {
        let player = PlayerId::new("1").expect("valid id");
        let a = StatId::season(&player, &SeasonId::new("2021").expect("valid id"));
        let b = StatId::season(&player, &SeasonId::new("2022").expect("valid id"));
        assert_ne!(a, b);
        assert_ne!(StatId::player_stat(&player), a);
    }

    #[test]
    fn test_match_line_id_uses_iso_date() {
        let player = PlayerId::new("1").expect("valid id");
        let home = ClubId::new("281").expect("valid id");
        let away = ClubId::new("379").expect("valid id");
        let date = NaiveDate::from_ymd_opt(2022, 8, 7).expect("valid date");

        let id = StatId::match_line(&player, &home, &away, date);
        assert_eq!(id.as_str(), composite_hash(&["1", "281", "379", "2022-08-07"]));
    }
}
