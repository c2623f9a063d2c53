//! Bounded-retry page navigation and HTTP fetches.
//!
//! Every call retries transient failures (timeouts, non-2xx statuses) with
//! exponential backoff. What exhaustion means is up to the call site: a page
//! the walk depends on fails with [`ScrapeError::Navigation`], a per-item
//! lookup degrades to a default through [`Navigator::fetch_http_or_default`].

use crate::error::{Result, ScrapeError};
use scoutline_browser::{BrowserActions, PageResponse};
use scoutline_core::ScrapingConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Retry bound and backoff curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &ScrapingConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            base_delay: config.base_backoff(),
            max_delay: config.max_backoff(),
        }
    }

    /// Delay after attempt `attempt` (zero-based): `base_delay * 2^attempt`, capped.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ScrapingConfig::default())
    }
}

/// Body and status of a plain HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Plain HTTP GET relative to the site's base address.
#[async_trait::async_trait]
pub trait HttpFetch: Send + Sync {
    /// Fetch `path` once. Transport failures map to [`ScrapeError::Transient`].
    async fn get(&self, path: &str) -> Result<HttpResponse>;
}

/// `reqwest` client bound to a base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: &str, config: &ScrapingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| ScrapeError::Transient {
                url: base_url.to_string(),
                reason: format!("HTTP client setup failed: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }
}

#[async_trait::async_trait]
impl HttpFetch for HttpClient {
    async fn get(&self, path: &str) -> Result<HttpResponse> {
        let url = self.url_for(path);
        let transient = |e: reqwest::Error| ScrapeError::Transient {
            url: url.clone(),
            reason: e.to_string(),
        };

        let response = self.client.get(&url).send().await.map_err(transient)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transient)?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Resilient access to the browser session and the HTTP client.
#[derive(Clone)]
pub struct Navigator {
    browser: Arc<dyn BrowserActions>,
    http: Arc<dyn HttpFetch>,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl Navigator {
    #[must_use]
    pub fn new(
        browser: Arc<dyn BrowserActions>,
        http: Arc<dyn HttpFetch>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            browser,
            http,
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort in-flight and future calls when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    #[must_use]
    pub fn browser(&self) -> &Arc<dyn BrowserActions> {
        &self.browser
    }

    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fail with [`ScrapeError::Cancelled`] if the run has been cancelled.
    pub fn check_cancelled(&self, url: &str) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(ScrapeError::Cancelled {
                url: url.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Navigate the browser to a page the rest of the walk depends on.
    pub async fn fetch_page(&self, url: &str) -> Result<PageResponse> {
        self.with_retry(url, move || async move {
            let response = self.browser.navigate(url).await?;
            if response.is_success() {
                Ok(response)
            } else {
                Err(ScrapeError::Transient {
                    url: url.to_string(),
                    reason: format!("HTTP {}", response.status),
                })
            }
        })
        .await
    }

    /// Fetch a path over plain HTTP.
    pub async fn fetch_http(&self, path: &str) -> Result<HttpResponse> {
        self.with_retry(path, move || async move {
            let response = self.http.get(path).await?;
            if response.is_success() {
                Ok(response)
            } else {
                Err(ScrapeError::Transient {
                    url: path.to_string(),
                    reason: format!("HTTP {}", response.status),
                })
            }
        })
        .await
    }

    /// Fetch and parse a per-item lookup, degrading to `T::default()`.
    ///
    /// Exhausted retries and unparseable bodies are logged and swallowed;
    /// only cancellation propagates.
    pub async fn fetch_http_or_default<T, F>(&self, path: &str, parse: F) -> Result<T>
    where
        T: Default,
        F: FnOnce(&[u8]) -> Option<T>,
    {
        match self.fetch_http(path).await {
            Ok(response) => Ok(parse(&response.body).unwrap_or_else(|| {
                tracing::warn!(url = %path, "Lookup response could not be parsed, using default");
                T::default()
            })),
            Err(e @ ScrapeError::Cancelled { .. }) => Err(e),
            Err(e) => {
                tracing::warn!(url = %path, "Lookup failed, using default: {}", e);
                Ok(T::default())
            }
        }
    }

    async fn with_retry<T, F, Fut>(&self, url: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_reason = String::new();

        for attempt in 0..max_attempts {
            self.check_cancelled(url)?;

            let outcome = tokio::select! {
                () = self.cancel.cancelled() => {
                    return Err(ScrapeError::Cancelled { url: url.to_string() });
                }
                outcome = op() => outcome,
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => last_reason = e.to_string(),
                Err(e) => return Err(e),
            }

            if attempt + 1 < max_attempts {
                let delay = self.policy.delay_for(attempt);
                tracing::warn!(
                    url = %url,
                    "Fetch failed (attempt {}/{}), retrying in {:?}: {}",
                    attempt + 1,
                    max_attempts,
                    delay,
                    last_reason
                );
                tokio::select! {
                    () = self.cancel.cancelled() => {
                        return Err(ScrapeError::Cancelled { url: url.to_string() });
                    }
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }

        Err(ScrapeError::Navigation {
            url: url.to_string(),
            attempts: max_attempts,
            reason: last_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoutline_browser::BrowserError;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Serves a scripted sequence of statuses, then 200s.
    struct Flaky {
        statuses: Vec<u16>,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(statuses: Vec<u16>) -> Arc<Self> {
            Arc::new(Self {
                statuses,
                calls: AtomicU32::new(0),
            })
        }

        fn next_status(&self) -> u16 {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            self.statuses.get(call).copied().unwrap_or(200)
        }
    }

    #[async_trait::async_trait]
    impl BrowserActions for Flaky {
        async fn navigate(&self, url: &str) -> scoutline_browser::Result<PageResponse> {
            let status = self.next_status();
            if status == 0 {
                return Err(BrowserError::Timeout(url.to_string()));
            }
            Ok(PageResponse {
                url: url.to_string(),
                status,
                content: "<html></html>".to_string(),
            })
        }
        async fn content(&self) -> scoutline_browser::Result<String> {
            Ok(String::new())
        }
        async fn count(&self, _: &str) -> scoutline_browser::Result<usize> {
            Ok(0)
        }
        async fn inner_text(&self, _: &str, _: usize) -> scoutline_browser::Result<Option<String>> {
            Ok(None)
        }
        async fn attribute(
            &self,
            _: &str,
            _: usize,
            _: &str,
        ) -> scoutline_browser::Result<Option<String>> {
            Ok(None)
        }
        async fn click(&self, _: &str, _: usize) -> scoutline_browser::Result<()> {
            Ok(())
        }
        async fn wait_for_selector(&self, _: &str, _: u64) -> scoutline_browser::Result<()> {
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl HttpFetch for Flaky {
        async fn get(&self, _path: &str) -> Result<HttpResponse> {
            Ok(HttpResponse {
                status: self.next_status(),
                body: b"[1,2,3]".to_vec(),
            })
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    fn navigator(site: &Arc<Flaky>, max_attempts: u32) -> Navigator {
        Navigator::new(site.clone(), site.clone(), fast_policy(max_attempts))
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        };
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(5));
        assert_eq!(policy.delay_for(40), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_page_retries_transient_statuses() {
        let site = Flaky::new(vec![503, 0]);
        let page = navigator(&site, 3)
            .fetch_page("https://example.com/a")
            .await
            .expect("third attempt succeeds");
        assert_eq!(page.status, 200);
        assert_eq!(site.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_page_exhaustion_is_fatal() {
        let site = Flaky::new(vec![500, 500, 500]);
        let err = navigator(&site, 3)
            .fetch_page("https://example.com/roster")
            .await
            .expect_err("retries exhausted");
        match err {
            ScrapeError::Navigation { url, attempts, reason } => {
                assert_eq!(url, "https://example.com/roster");
                assert_eq!(attempts, 3);
                assert!(reason.contains("HTTP 500"));
            }
            other => panic!("Expected Navigation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_lookup_degrades_to_default() {
        let site = Flaky::new(vec![502, 502]);
        let values: Vec<u32> = navigator(&site, 2)
            .fetch_http_or_default("/lookup/1", |body| serde_json::from_slice(body).ok())
            .await
            .expect("degrades instead of failing");
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_parses_success() {
        let site = Flaky::new(vec![]);
        let values: Vec<u32> = navigator(&site, 2)
            .fetch_http_or_default("/lookup/1", |body| serde_json::from_slice(body).ok())
            .await
            .expect("lookup");
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_cancelled_before_fetch() {
        let site = Flaky::new(vec![]);
        let token = CancellationToken::new();
        let navigator = navigator(&site, 3).with_cancellation(token.clone());
        token.cancel();

        let err = navigator
            .fetch_page("https://example.com/a")
            .await
            .expect_err("cancelled");
        assert!(matches!(err, ScrapeError::Cancelled { .. }));
        assert_eq!(site.calls.load(Ordering::SeqCst), 0);

        // Cancellation is not swallowed by the degrade-to-default path
        let lookup: Result<Vec<u32>> = navigator
            .fetch_http_or_default("/lookup/1", |body| serde_json::from_slice(body).ok())
            .await;
        assert!(matches!(lookup, Err(ScrapeError::Cancelled { .. })));
    }
}
