//! In-memory stand-in for the site: serves registered pages and HTTP bodies,
//! evaluates selectors against the current page, and fires scripted captures
//! on clicks. Every request is recorded so tests can assert on traffic.

#![allow(dead_code)]

use scoutline_browser::{
    BrowserActions, BrowserError, InterceptStream, InterceptedResponse, PageResponse,
    RequestInterceptor,
};
use scoutline_core::AppConfig;
use scoutline_db::Database;
use scoutline_scraper::{HttpFetch, HttpResponse, ScrapeOrchestrator, SiteUrls};
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Default)]
pub struct FakeSite {
    pages: Mutex<HashMap<String, String>>,
    http: Mutex<HashMap<String, (u16, String)>>,
    captures: Mutex<HashMap<(String, usize), InterceptedResponse>>,
    current: Mutex<String>,
    sender: Mutex<Option<mpsc::UnboundedSender<InterceptedResponse>>>,
    pub navigations: Mutex<Vec<String>>,
    pub http_calls: Mutex<Vec<String>>,
    pub clicks: Mutex<Vec<(String, usize)>>,
}

impl FakeSite {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn page(&self, url: impl Into<String>, html: impl Into<String>) {
        self.pages.lock().unwrap().insert(url.into(), html.into());
    }

    pub fn http(&self, path: impl Into<String>, status: u16, body: impl Into<String>) {
        self.http
            .lock()
            .unwrap()
            .insert(path.into(), (status, body.into()));
    }

    /// Clicking the `index`-th match of `selector` fires `response`.
    pub fn capture_on_click(&self, selector: &str, index: usize, response: InterceptedResponse) {
        self.captures
            .lock()
            .unwrap()
            .insert((selector.to_string(), index), response);
    }

    pub fn clear_captures(&self) {
        self.captures.lock().unwrap().clear();
    }

    pub fn navigation_count(&self) -> usize {
        self.navigations.lock().unwrap().len()
    }

    pub fn http_count(&self) -> usize {
        self.http_calls.lock().unwrap().len()
    }

    /// Indices clicked on `selector`, in order.
    pub fn clicked(&self, selector: &str) -> Vec<usize> {
        self.clicks
            .lock()
            .unwrap()
            .iter()
            .filter(|(clicked, _)| clicked == selector)
            .map(|(_, index)| *index)
            .collect()
    }

    pub fn reset_traffic(&self) {
        self.navigations.lock().unwrap().clear();
        self.http_calls.lock().unwrap().clear();
        self.clicks.lock().unwrap().clear();
    }

    fn query<T>(
        &self,
        css: &str,
        read: impl FnOnce(Vec<scraper::ElementRef<'_>>) -> T,
    ) -> scoutline_browser::Result<T> {
        let selector = Selector::parse(css)
            .map_err(|e| BrowserError::ChromiumError(format!("bad selector '{css}': {e}")))?;
        let html = Html::parse_document(&self.current.lock().unwrap());
        let matches = html.select(&selector).collect();
        Ok(read(matches))
    }
}

#[async_trait::async_trait]
impl BrowserActions for FakeSite {
    async fn navigate(&self, url: &str) -> scoutline_browser::Result<PageResponse> {
        self.navigations.lock().unwrap().push(url.to_string());
        let page = self.pages.lock().unwrap().get(url).cloned();
        let (status, content) = match page {
            Some(html) => (200, html),
            None => (404, String::new()),
        };
        *self.current.lock().unwrap() = content.clone();
        Ok(PageResponse {
            url: url.to_string(),
            status,
            content,
        })
    }

    async fn content(&self) -> scoutline_browser::Result<String> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn count(&self, selector: &str) -> scoutline_browser::Result<usize> {
        self.query(selector, |matches| matches.len())
    }

    async fn inner_text(
        &self,
        selector: &str,
        index: usize,
    ) -> scoutline_browser::Result<Option<String>> {
        self.query(selector, |matches| {
            matches
                .get(index)
                .map(|el| el.text().collect::<String>().trim().to_string())
        })
    }

    async fn attribute(
        &self,
        selector: &str,
        index: usize,
        name: &str,
    ) -> scoutline_browser::Result<Option<String>> {
        self.query(selector, |matches| {
            matches
                .get(index)
                .and_then(|el| el.value().attr(name))
                .map(str::to_string)
        })
    }

    async fn click(&self, selector: &str, index: usize) -> scoutline_browser::Result<()> {
        let exists = self.query(selector, |matches| matches.len() > index)?;
        if !exists {
            return Err(BrowserError::SelectorNotFound {
                selector: selector.to_string(),
                index,
            });
        }
        self.clicks
            .lock()
            .unwrap()
            .push((selector.to_string(), index));

        let capture = self
            .captures
            .lock()
            .unwrap()
            .get(&(selector.to_string(), index))
            .cloned();
        if let (Some(response), Some(tx)) = (capture, self.sender.lock().unwrap().as_ref()) {
            let _ = tx.send(response);
        }
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> scoutline_browser::Result<()> {
        if self.query(selector, |matches| !matches.is_empty())? {
            Ok(())
        } else {
            Err(BrowserError::Timeout(format!(
                "selector '{selector}' after {timeout_ms}ms"
            )))
        }
    }
}

#[async_trait::async_trait]
impl RequestInterceptor for FakeSite {
    async fn intercept(&self, _url_pattern: &str) -> scoutline_browser::Result<InterceptStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.sender.lock().unwrap() = Some(tx);
        Ok(rx)
    }
}

#[async_trait::async_trait]
impl HttpFetch for FakeSite {
    async fn get(&self, path: &str) -> scoutline_scraper::Result<HttpResponse> {
        self.http_calls.lock().unwrap().push(path.to_string());
        let response = self.http.lock().unwrap().get(path).cloned();
        Ok(match response {
            Some((status, body)) => HttpResponse {
                status,
                body: body.into_bytes(),
            },
            None => HttpResponse {
                status: 404,
                body: Vec::new(),
            },
        })
    }
}

/// Config with fast retries and short capture waits.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.scraping.max_retries = 2;
    config.scraping.base_backoff_ms = 1;
    config.scraping.max_backoff_ms = 2;
    config.scraping.capture_timeout_ms = 50;
    config.scraping.discovery_batch_size = 10;
    config
}

pub fn urls(config: &AppConfig) -> SiteUrls {
    SiteUrls::new(&config.site)
}

pub async fn memory_db() -> Arc<Database> {
    let db = Database::new(":memory:").await.expect("open database");
    db.run_migrations().await.expect("run migrations");
    Arc::new(db)
}

pub fn orchestrator(config: &AppConfig, site: &Arc<FakeSite>, db: &Arc<Database>) -> ScrapeOrchestrator {
    ScrapeOrchestrator::new(config, site.clone(), site.clone(), site.clone(), db.clone())
}

pub fn capture(url: &str, body: &str) -> InterceptedResponse {
    InterceptedResponse {
        url: url.to_string(),
        status: 200,
        body: body.as_bytes().to_vec(),
    }
}
