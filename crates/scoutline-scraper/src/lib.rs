//! Scoutline Scraper - Catalog scraping orchestration.
//!
//! This crate walks the site's catalog through a browser session and a plain
//! HTTP client and files what it finds in the catalog database:
//!
//! - Resumable, batched discovery of countries via the quick-select widget,
//!   pairing each click with the background request it triggers
//! - Paginated reconciliation search for competitions never discovered
//! - Club, squad and player profile scraping with bounded concurrent
//!   market-value lookups
//! - Per-season stat harvesting with position-aware table layouts
//!
//! Every fetch goes through a [`Navigator`], which retries transient failures
//! with exponential backoff and honours a cancellation token.
//!
//! # Example
//!
//! ```rust,ignore
//! use scoutline_scraper::{HttpClient, ScrapeOrchestrator, SeasonSelector};
//! use std::sync::Arc;
//!
//! let browser = Arc::new(BrowserEngine::launch(&config.browser).await?);
//! let http = Arc::new(HttpClient::new(&config.site.base_url, &config.scraping)?);
//! let orchestrator = ScrapeOrchestrator::new(&config, browser.clone(), browser, http, db);
//!
//! let countries = orchestrator.discover_countries(25).await?;
//! let stat = orchestrator
//!     .harvest_player_stats(&player_id, &SeasonSelector::All, false)
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod cells;
#[allow(missing_docs)]
pub mod columns;
pub mod correlator;
#[allow(missing_docs)]
pub mod discovery;
#[allow(missing_docs)]
pub mod error;
#[allow(missing_docs)]
pub mod harvest;
#[allow(missing_docs)]
pub mod market_value;
#[allow(missing_docs)]
pub mod navigator;
#[allow(missing_docs)]
pub mod orchestrator;
#[allow(missing_docs)]
pub mod parser;
#[allow(missing_docs)]
pub mod reconciliation;
#[allow(missing_docs)]
pub mod roster;
#[allow(missing_docs)]
pub mod url_builder;

// Re-export commonly used types
pub use columns::{ColumnLayout, StatField, TableKind};
pub use correlator::{pair_by_index, Correlator};
pub use discovery::{CountryCapture, DiscoveryOrchestrator};
pub use error::{Result, ScrapeError};
pub use harvest::{SeasonSelector, StatHarvester};
pub use navigator::{HttpClient, HttpFetch, HttpResponse, Navigator, RetryPolicy};
pub use orchestrator::ScrapeOrchestrator;
pub use reconciliation::{ReconciliationSearch, SearchCursor};
pub use roster::RosterScraper;
pub use url_builder::SiteUrls;
