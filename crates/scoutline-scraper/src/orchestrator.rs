//! Entry point that wires the scrapers to one browser session, HTTP client
//! and catalog database.

use crate::discovery::DiscoveryOrchestrator;
use crate::error::Result;
use crate::harvest::{SeasonSelector, StatHarvester};
use crate::navigator::{HttpFetch, Navigator, RetryPolicy};
use crate::reconciliation::ReconciliationSearch;
use crate::roster::RosterScraper;
use crate::url_builder::SiteUrls;
use scoutline_browser::{BrowserActions, RequestInterceptor};
use scoutline_core::{
    AppConfig, Club, ClubId, Competition, CompetitionId, Country, Player, PlayerId, PlayerStat,
    ScrapingConfig, SelectorConfig,
};
use scoutline_db::Database;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Coordinates discovery, reconciliation, roster and stat harvesting.
///
/// All scrapers share the orchestrator's navigator, so they share its retry
/// policy and cancellation token.
pub struct ScrapeOrchestrator {
    navigator: Navigator,
    interceptor: Arc<dyn RequestInterceptor>,
    db: Arc<Database>,
    urls: SiteUrls,
    selectors: SelectorConfig,
    scraping: ScrapingConfig,
}

impl ScrapeOrchestrator {
    #[must_use]
    pub fn new(
        config: &AppConfig,
        browser: Arc<dyn BrowserActions>,
        interceptor: Arc<dyn RequestInterceptor>,
        http: Arc<dyn HttpFetch>,
        db: Arc<Database>,
    ) -> Self {
        let policy = RetryPolicy::from_config(&config.scraping);
        Self {
            navigator: Navigator::new(browser, http, policy),
            interceptor,
            db,
            urls: SiteUrls::new(&config.site),
            selectors: config.selectors.clone(),
            scraping: config.scraping.clone(),
        }
    }

    /// Stop every scraper at its next suspension point once `token` fires.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.navigator = self.navigator.with_cancellation(token);
        self
    }

    #[must_use]
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    #[must_use]
    pub fn discovery(&self) -> DiscoveryOrchestrator {
        DiscoveryOrchestrator::new(
            self.navigator.clone(),
            self.interceptor.clone(),
            self.db.clone(),
            self.urls.clone(),
            self.selectors.clone(),
        )
        .with_batch_size(self.scraping.discovery_batch_size)
        .with_capture_timeout(self.scraping.capture_timeout())
    }

    #[must_use]
    pub fn reconciliation(&self) -> ReconciliationSearch {
        ReconciliationSearch::new(self.navigator.clone(), self.db.clone(), self.urls.clone())
    }

    #[must_use]
    pub fn roster(&self) -> RosterScraper {
        RosterScraper::new(self.navigator.clone(), self.db.clone(), self.urls.clone())
            .with_max_concurrent_lookups(self.scraping.max_concurrent_lookups)
    }

    #[must_use]
    pub fn harvester(&self) -> StatHarvester {
        StatHarvester::new(
            self.navigator.clone(),
            self.db.clone(),
            self.urls.clone(),
            self.reconciliation(),
            self.roster(),
            &self.selectors,
        )
    }

    /// Grow the country catalog to `target` countries (`0` = all).
    pub async fn discover_countries(&self, target: usize) -> Result<Vec<Country>> {
        self.discovery().discover_countries(target).await
    }

    /// Resolve a competition missing from the catalog.
    pub async fn reconcile_competition(
        &self,
        id: &CompetitionId,
        name: &str,
        link: &str,
    ) -> Result<(Country, Competition)> {
        self.reconciliation().reconcile(id, name, link).await
    }

    pub async fn scrape_clubs(&self, competition_id: &CompetitionId) -> Result<Vec<Club>> {
        self.roster().scrape_clubs(competition_id).await
    }

    pub async fn scrape_players(&self, club_id: &ClubId) -> Result<Vec<Player>> {
        self.roster().scrape_players(club_id).await
    }

    pub async fn harvest_player_stats(
        &self,
        player_id: &PlayerId,
        seasons: &SeasonSelector,
        force: bool,
    ) -> Result<PlayerStat> {
        self.harvester().harvest(player_id, seasons, force).await
    }
}
