//! Scoutline Core - Foundation crate for the Scoutline catalog scraper.
//!
//! This crate provides shared identifier types, the catalog data model,
//! error handling and configuration management that all other Scoutline
//! crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Site ID newtypes and composite hash IDs
//! - [`model`] - Countries, competitions, clubs, players and their statistics
//!
//! # Example
//!
//! ```rust
//! use scoutline_core::{PlayerId, SeasonId, StatId};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let player = PlayerId::new("418560")?;
//! let season = SeasonId::new("2022")?;
//!
//! // Nested stat records are keyed by a hash of their parents.
//! let id = StatId::season(&player, &season);
//! assert_eq!(id, StatId::season(&player, &season));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
#[allow(missing_docs)]
pub mod model;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserConfig, DatabaseConfig, ScrapingConfig, SelectorConfig, SiteConfig,
};
pub use error::{ConfigError, ConfigResult, CoreError, Result};
pub use model::{
    AbsenceReason, Club, ClubRef, Competition, Country, CupKind, HarvestState, MarketValuePoint,
    MatchOutcome, MatchResult, Participation, Player, PlayerSeasonCompetitionMatchStat,
    PlayerSeasonCompetitionStat, PlayerSeasonStat, PlayerStat, Position, PositionCategory,
    StatTotals,
};
pub use types::{
    composite_hash, ClubId, CompetitionId, CountryId, PlayerId, SeasonId, StatId,
    INTERNATIONAL_COUNTRY_ID,
};
