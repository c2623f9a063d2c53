//! Paginated search for competitions missing from the catalog.
//!
//! A competition referenced by a stats page but never discovered through a
//! country is looked up by name in the site's search results, matched by ID,
//! and filed under its country (or the International sentinel).

use crate::cells::{count_or_zero, parse_count, parse_market_value, strip_parentheticals};
use crate::error::{Result, ScrapeError};
use crate::navigator::Navigator;
use crate::parser::{
    cells, document, file_stem, is_empty_cell, select_attr, selector, text_of, trailing_segment,
};
use crate::url_builder::SiteUrls;
use scoutline_core::{Competition, CompetitionId, Country, CountryId, CupKind};
use scoutline_db::{competitions, countries, Database, DatabaseError};
use scraper::ElementRef;
use std::sync::Arc;

/// Position in a paginated result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchCursor {
    /// 1-based page to fetch next
    pub page: u32,
    /// Rows seen so far
    pub scanned: usize,
    /// Result count announced by the header
    pub total: usize,
}

impl SearchCursor {
    #[must_use]
    pub fn start() -> Self {
        Self {
            page: 1,
            scanned: 0,
            total: 0,
        }
    }

    /// Account for a page of `rows`. A page without a header count is the
    /// whole result.
    pub fn advance(&mut self, rows: usize, announced: Option<usize>) {
        self.scanned += rows;
        self.total = announced.unwrap_or(self.scanned);
        self.page += 1;
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.scanned >= self.total
    }
}

/// What one results page yielded for the competition being searched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub total: Option<usize>,
    pub rows: usize,
    pub found: Option<(Country, Competition)>,
}

/// Parse one search results page, extracting the full row only on an ID match.
#[must_use]
pub fn parse_search_page(html: &str, target: &CompetitionId, urls: &SiteUrls) -> SearchPage {
    let doc = document(html);
    let box_sel = selector("div.box");
    let table_sel = selector("table.items");
    let header_sel = selector("div.table-header, h2");
    let row_sel = selector("table.items > tbody > tr");

    // Only the competitions box counts; club rows also link to their league
    let results = doc
        .select(&box_sel)
        .filter(|b| b.select(&table_sel).next().is_some())
        .find(|b| {
            b.select(&header_sel)
                .next()
                .map(text_of)
                .is_some_and(|header| {
                    let lower = header.to_lowercase();
                    lower.contains("competition") || lower.contains("wettbewerb")
                })
        });

    let Some(results) = results else {
        return SearchPage {
            total: Some(0),
            rows: 0,
            found: None,
        };
    };

    let total = results
        .select(&header_sel)
        .next()
        .map(text_of)
        .and_then(|header| first_number(&header));

    let rows: Vec<ElementRef<'_>> = results.select(&row_sel).collect();
    let found = rows
        .iter()
        .find(|row| row_competition_id(**row).as_deref() == Some(target.as_str()))
        .map(|row| extract_row(*row, target, urls));

    SearchPage {
        total,
        rows: rows.len(),
        found,
    }
}

fn first_number(text: &str) -> Option<usize> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    parse_count(&digits).and_then(|n| usize::try_from(n).ok())
}

fn competition_anchor(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let anchor_sel = selector("a[href*='wettbewerb']");
    row.select(&anchor_sel).next()
}

fn row_competition_id(row: ElementRef<'_>) -> Option<String> {
    let href = competition_anchor(row)?.value().attr("href")?;
    trailing_segment(href).map(str::to_string)
}

fn extract_row(row: ElementRef<'_>, id: &CompetitionId, urls: &SiteUrls) -> (Country, Competition) {
    let img = selector("img");
    let tds = cells(row);
    let cell_text = |index: usize| tds.get(index).map(|td| text_of(*td)).unwrap_or_default();

    let anchor = competition_anchor(row);
    let name = anchor
        .and_then(|a| a.value().attr("title").map(str::to_string))
        .filter(|title| !title.trim().is_empty())
        .or_else(|| anchor.map(text_of))
        .unwrap_or_default();
    let link = anchor
        .and_then(|a| a.value().attr("href"))
        .map(|href| urls.absolute(href))
        .unwrap_or_default();

    let mut competition = Competition::partial(id.clone(), name, link);
    competition.logo_url = tds.first().and_then(|td| select_attr(*td, &img, "src"));
    competition.club_count = count_or_zero(&cell_text(2));
    competition.player_count = count_or_zero(&cell_text(3));
    competition.total_market_value = parse_market_value(&cell_text(4));
    competition.mean_market_value = parse_market_value(&cell_text(5));
    competition.cup = CupKind::from_label(&cell_text(6));

    let country = tds
        .get(1)
        .filter(|td| !is_empty_cell(**td))
        .filter(|_| competition.cup != CupKind::International)
        .and_then(|td| flag_country(*td))
        .unwrap_or_else(Country::international);
    competition.country_id = Some(country.id.clone());

    (country, competition)
}

fn flag_country(cell: ElementRef<'_>) -> Option<Country> {
    let img = selector("img");
    let src = select_attr(cell, &img, "src")?;
    let id = CountryId::new(file_stem(&src)?).ok()?;
    let name = select_attr(cell, &img, "title")
        .or_else(|| select_attr(cell, &img, "alt"))
        .unwrap_or_else(|| id.to_string());
    Some(Country {
        flag_url: Some(src),
        id,
        name,
        competitions: Vec::new(),
    })
}

/// Resolves competitions by ID through the site's search.
pub struct ReconciliationSearch {
    navigator: Navigator,
    db: Arc<Database>,
    urls: SiteUrls,
}

impl ReconciliationSearch {
    #[must_use]
    pub fn new(navigator: Navigator, db: Arc<Database>, urls: SiteUrls) -> Self {
        Self { navigator, db, urls }
    }

    /// Resolve a competition and its owning country, persisting both.
    ///
    /// Competitions already in the catalog are returned without any request.
    pub async fn reconcile(
        &self,
        id: &CompetitionId,
        name: &str,
        link: &str,
    ) -> Result<(Country, Competition)> {
        let pool = self.db.pool();

        if let Some(existing) = competitions::get_competition(pool, id).await? {
            let country = match existing.country_id.as_ref() {
                Some(country_id) => countries::get_country(pool, country_id).await?,
                None => None,
            };
            let country = country.ok_or_else(|| {
                DatabaseError::NotFoundWithMessage(format!("Country of competition '{id}' not found"))
            })?;
            return Ok((country, existing));
        }

        let query = strip_parentheticals(name);
        let mut cursor = SearchCursor::start();
        tracing::info!(competition = %id, query = %query, "Searching for unknown competition");

        loop {
            let path = self.urls.search_path(&query, cursor.page);
            let response = self.navigator.fetch_http(&path).await?;
            let page = parse_search_page(&response.text(), id, &self.urls);

            if let Some((country, mut competition)) = page.found {
                if competition.link.is_empty() {
                    competition.link = self.urls.absolute(link);
                }
                tracing::info!(
                    competition = %id,
                    country = %country.id,
                    page = cursor.page,
                    "Competition found by search"
                );
                return self.persist(country, competition).await;
            }

            cursor.advance(page.rows, page.total);
            tracing::debug!(
                competition = %id,
                "Search page {} had no match ({}/{} scanned)",
                cursor.page - 1,
                cursor.scanned,
                cursor.total
            );

            if page.rows == 0 || cursor.is_exhausted() {
                return Err(ScrapeError::ReconciliationNotFound {
                    competition_id: id.clone(),
                    name: name.to_string(),
                    scanned: cursor.scanned,
                    total: cursor.total,
                });
            }
        }
    }

    async fn persist(
        &self,
        country: Country,
        competition: Competition,
    ) -> Result<(Country, Competition)> {
        let pool = self.db.pool();

        let stored = match countries::get_country(pool, &country.id).await? {
            Some(mut existing) => {
                competitions::update_competitions_for_country(
                    pool,
                    &existing.id,
                    std::slice::from_ref(&competition),
                )
                .await?;
                existing.add_competition(competition.clone());
                existing
            }
            None => {
                let mut created = country;
                created.competitions = vec![competition.clone()];
                countries::upsert_countries(pool, std::slice::from_ref(&created)).await?;
                created
            }
        };

        let competition = competitions::get_competition(pool, &competition.id)
            .await?
            .unwrap_or(competition);
        Ok((stored, competition))
    }
}
