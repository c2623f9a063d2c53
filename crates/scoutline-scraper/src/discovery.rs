//! Resumable batch discovery of countries and their competitions.
//!
//! The number of persisted countries is the resume offset: each run skips
//! that many entries of the country quick select and scrapes the rest in
//! fixed-size batches, persisting after every batch.

use crate::correlator::{pair_by_index, Correlator};
use crate::error::{Result, ScrapeError};
use crate::navigator::Navigator;
use crate::parser::trailing_segment;
use crate::url_builder::SiteUrls;
use scoutline_browser::{InterceptedResponse, RequestInterceptor};
use scoutline_core::{Competition, CompetitionId, Country, CountryId, SelectorConfig};
use scoutline_db::{countries, Database};
use serde::Deserialize;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

/// How long to wait for the opened quick select to list its items.
const SELECTOR_OPEN_TIMEOUT_MS: u64 = 5_000;

/// Competitions listed for one country by the quick-select endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryCapture {
    pub country_id: CountryId,
    pub competitions: Vec<Competition>,
}

#[derive(Debug, Deserialize)]
struct QuickSelectEntry {
    id: String,
    name: String,
    #[serde(default)]
    link: String,
}

/// Parse a quick-select payload; the request URL ends in the country ID.
#[must_use]
pub fn parse_country_capture(response: &InterceptedResponse) -> Option<CountryCapture> {
    let country_id = CountryId::new(trailing_segment(&response.url)?).ok()?;
    let entries: Vec<QuickSelectEntry> = serde_json::from_slice(&response.body).ok()?;

    let competitions = entries
        .into_iter()
        .filter_map(|entry| match CompetitionId::new(&entry.id) {
            Ok(id) => Some(Competition::partial(id, entry.name, entry.link)),
            Err(e) => {
                tracing::warn!(url = %response.url, "Skipping quick-select entry: {}", e);
                None
            }
        })
        .collect();

    Some(CountryCapture {
        country_id,
        competitions,
    })
}

/// Grows the persisted country catalog toward a target size.
pub struct DiscoveryOrchestrator {
    navigator: Navigator,
    interceptor: Arc<dyn RequestInterceptor>,
    db: Arc<Database>,
    urls: SiteUrls,
    selectors: SelectorConfig,
    batch_size: usize,
    capture_timeout: Duration,
}

impl DiscoveryOrchestrator {
    #[must_use]
    pub fn new(
        navigator: Navigator,
        interceptor: Arc<dyn RequestInterceptor>,
        db: Arc<Database>,
        urls: SiteUrls,
        selectors: SelectorConfig,
    ) -> Self {
        Self {
            navigator,
            interceptor,
            db,
            urls,
            selectors,
            batch_size: 10,
            capture_timeout: Duration::from_secs(10),
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[must_use]
    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout = timeout;
        self
    }

    /// Discover countries until `target` are persisted (`0` = every listed
    /// country) and return the whole catalog sorted by name.
    pub async fn discover_countries(&self, target: usize) -> Result<Vec<Country>> {
        let pool = self.db.pool();
        let mut persisted = countries::count_countries(pool).await?;

        if target > 0 && persisted >= target {
            tracing::info!(persisted, target, "Country catalog already complete");
            return Ok(countries::get_all_countries(pool).await?);
        }

        let entry_url = self.urls.entry_url();
        let mut correlator = Correlator::install(
            self.interceptor.as_ref(),
            &self.selectors.country_capture_pattern,
            parse_country_capture,
            self.capture_timeout,
        )
        .await?;

        loop {
            self.navigator.check_cancelled(&entry_url)?;
            self.navigator.fetch_page(&entry_url).await?;
            self.open_selector().await?;

            let available = self
                .navigator
                .browser()
                .count(&self.selectors.country_items)
                .await?;
            let goal = if target == 0 {
                available
            } else {
                target.min(available)
            };
            if available == 0 {
                tracing::warn!(url = %entry_url, "Country quick select lists no items");
            }
            if persisted >= goal {
                break;
            }

            let batch_end = (persisted + self.batch_size).min(goal);
            tracing::info!(
                "Discovering countries {}..{} of {}",
                persisted,
                batch_end,
                goal
            );

            let batch = self
                .scrape_batch(&mut correlator, &entry_url, persisted..batch_end)
                .await?;
            countries::upsert_countries(pool, &batch).await?;
            persisted += batch.len();

            tracing::info!(persisted, goal, "Country batch persisted");
        }

        Ok(countries::get_all_countries(pool).await?)
    }

    async fn scrape_batch(
        &self,
        correlator: &mut Correlator<CountryCapture>,
        url: &str,
        indices: Range<usize>,
    ) -> Result<Vec<Country>> {
        let browser = self.navigator.browser();
        let items = &self.selectors.country_items;
        let mut labels = Vec::with_capacity(indices.len());
        let mut captures = Vec::with_capacity(indices.len());
        let last = indices.end.saturating_sub(1);

        for index in indices {
            self.navigator.check_cancelled(url)?;

            let label = browser
                .inner_text(items, index)
                .await?
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .ok_or_else(|| {
                    ScrapeError::extraction(url, format!("{items} [{index}]"), "country label missing")
                })?;

            let capture = correlator
                .correlate_click(browser.as_ref(), items, index)
                .await?;
            tracing::debug!(index, country = %label, captured = capture.is_some(), "Country selected");
            labels.push(label);
            captures.push(capture);

            // Selecting an item closes the quick select
            if index < last {
                self.open_selector().await?;
            }
        }

        let paired = pair_by_index(url, labels, captures)?;
        Ok(paired
            .into_iter()
            .map(|(name, capture)| {
                let id = capture.country_id;
                let competitions = capture
                    .competitions
                    .into_iter()
                    .map(|mut competition| {
                        competition.country_id = Some(id.clone());
                        competition
                    })
                    .collect();
                Country {
                    flag_url: Some(SiteUrls::flag_url(&id)),
                    id,
                    name,
                    competitions,
                }
            })
            .collect())
    }

    async fn open_selector(&self) -> Result<()> {
        let browser = self.navigator.browser();
        browser.click(&self.selectors.country_opener, 0).await?;
        browser
            .wait_for_selector(&self.selectors.country_items, SELECTOR_OPEN_TIMEOUT_MS)
            .await?;
        Ok(())
    }
}
