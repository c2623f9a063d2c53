use crate::actions::{extract_domain, BrowserActions, PageResponse};
use crate::error::{BrowserError, Result};
use crate::intercept::{pattern_matches, InterceptStream, InterceptedResponse, RequestInterceptor};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    DisableParams, EnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::ErrorReason;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use rand::Rng;
use scoutline_core::BrowserConfig as BrowserSettings;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};

/// Poll interval while waiting for a selector to appear.
const SELECTOR_POLL_MS: u64 = 100;

const DESKTOP_USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// User agent for a new session: the configured one, else a random desktop agent.
fn session_user_agent(settings: &BrowserSettings) -> String {
    settings
        .user_agent
        .as_deref()
        .map(str::trim)
        .filter(|agent| !agent.is_empty())
        .map_or_else(
            || {
                let idx = rand::thread_rng().gen_range(0..DESKTOP_USER_AGENTS.len());
                DESKTOP_USER_AGENTS[idx].to_string()
            },
            str::to_string,
        )
}

/// Listener counts per active `Fetch.enable` URL pattern.
#[derive(Debug, Default)]
struct PatternSet {
    listeners: BTreeMap<String, usize>,
}

impl PatternSet {
    /// Add a listener for `pattern`. Returns true when the pattern is new.
    fn acquire(&mut self, pattern: &str) -> bool {
        let count = self.listeners.entry(pattern.to_string()).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Drop a listener for `pattern`. Returns true when it was the last one.
    fn release(&mut self, pattern: &str) -> bool {
        match self.listeners.get_mut(pattern) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                self.listeners.remove(pattern);
                true
            }
            None => false,
        }
    }

    fn patterns(&self) -> Vec<String> {
        self.listeners.keys().cloned().collect()
    }
}

/// Per-domain politeness delay between navigations.
#[derive(Debug)]
struct Throttle {
    last_access: HashMap<String, Instant>,
    min_delay: Duration,
}

impl Throttle {
    fn new(min_delay: Duration) -> Self {
        Self {
            last_access: HashMap::new(),
            min_delay,
        }
    }

    /// Reserve the next slot for `domain` and return how long to wait for it.
    fn reserve(&mut self, domain: &str) -> Duration {
        let now = Instant::now();
        let wait = self
            .last_access
            .get(domain)
            .map(|last| {
                let next_allowed = *last + self.min_delay;
                next_allowed.saturating_duration_since(now)
            })
            .unwrap_or_default();
        self.last_access.insert(domain.to_string(), now + wait);
        wait
    }
}

/// Headless browser session.
///
/// Holds exactly one page; every navigation and DOM query locks it, so the
/// session is strictly serialized no matter how many tasks share the engine.
pub struct BrowserEngine {
    browser: Browser,
    page: Mutex<Page>,
    http: reqwest::Client,
    throttle: Mutex<Throttle>,
    intercept_patterns: Arc<Mutex<PatternSet>>,
    navigation_timeout: Duration,
    user_agent: String,
}

impl BrowserEngine {
    /// Launch a browser with default settings
    pub async fn new() -> Result<Self> {
        Self::launch(&BrowserSettings::default()).await
    }

    /// Launch a browser configured from the `[browser]` config section
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let user_agent = session_user_agent(settings);

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(settings.window_width, settings.window_height)
            .arg(format!("--user-agent={user_agent}"));
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        // Spawn browser handler
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        let navigation_timeout = Duration::from_secs(settings.navigation_timeout_secs);
        let http = reqwest::Client::builder()
            .user_agent(user_agent.clone())
            .timeout(navigation_timeout)
            .build()
            .map_err(|e| BrowserError::ChromiumError(format!("HTTP client: {e}")))?;

        tracing::info!(
            headless = settings.headless,
            width = settings.window_width,
            height = settings.window_height,
            "Browser session started"
        );

        Ok(Self {
            browser,
            page: Mutex::new(page),
            http,
            throttle: Mutex::new(Throttle::new(Duration::from_millis(
                settings.min_navigation_delay_ms,
            ))),
            intercept_patterns: Arc::new(Mutex::new(PatternSet::default())),
            navigation_timeout,
            user_agent,
        })
    }

    /// User agent the session presents to the site.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Close the browser and wait for the process to exit.
    pub async fn close(mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        let _ = self.browser.wait().await;
        tracing::info!("Browser session closed");
        Ok(())
    }

    async fn nth_element(page: &Page, selector: &str, index: usize) -> Result<Option<Element>> {
        let elements = page
            .find_elements(selector)
            .await
            .map_err(|e| BrowserError::ChromiumError(format!("query '{selector}': {e}")))?;
        Ok(elements.into_iter().nth(index))
    }
}

#[async_trait::async_trait]
impl BrowserActions for BrowserEngine {
    async fn navigate(&self, url: &str) -> Result<PageResponse> {
        let wait = self.throttle.lock().await.reserve(&extract_domain(url)?);
        if !wait.is_zero() {
            tracing::debug!("Throttling navigation to {} for {:?}", url, wait);
            tokio::time::sleep(wait).await;
        }

        let page = self.page.lock().await;
        let navigation = async {
            page.goto(url).await?;
            page.wait_for_navigation_response().await
        };
        let request = tokio::time::timeout(self.navigation_timeout, navigation)
            .await
            .map_err(|_| BrowserError::Timeout(format!("navigation to {url}")))?
            .map_err(|e: CdpError| BrowserError::NavigationError {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = request
            .as_ref()
            .and_then(|req| req.response.as_ref())
            .map_or(200, |response| u16::try_from(response.status).unwrap_or(0));

        let content = page.content().await.map_err(|e| BrowserError::NavigationError {
            url: url.to_string(),
            reason: format!("reading content: {e}"),
        })?;

        Ok(PageResponse {
            url: url.to_string(),
            status,
            content,
        })
    }

    async fn content(&self) -> Result<String> {
        let page = self.page.lock().await;
        page.content()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        let page = self.page.lock().await;
        let elements = page
            .find_elements(selector)
            .await
            .map_err(|e| BrowserError::ChromiumError(format!("query '{selector}': {e}")))?;
        Ok(elements.len())
    }

    async fn inner_text(&self, selector: &str, index: usize) -> Result<Option<String>> {
        let page = self.page.lock().await;
        let Some(element) = Self::nth_element(&page, selector, index).await? else {
            return Ok(None);
        };
        element
            .inner_text()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }

    async fn attribute(
        &self,
        selector: &str,
        index: usize,
        name: &str,
    ) -> Result<Option<String>> {
        let page = self.page.lock().await;
        let Some(element) = Self::nth_element(&page, selector, index).await? else {
            return Ok(None);
        };
        element
            .attribute(name)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
    }

    async fn click(&self, selector: &str, index: usize) -> Result<()> {
        let page = self.page.lock().await;
        let element = Self::nth_element(&page, selector, index)
            .await?
            .ok_or_else(|| BrowserError::SelectorNotFound {
                selector: selector.to_string(),
                index,
            })?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::ChromiumError(format!("click '{selector}': {e}")))?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            {
                let page = self.page.lock().await;
                if page.find_element(selector).await.is_ok() {
                    return Ok(());
                }
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!(
                    "selector '{selector}' after {timeout_ms}ms"
                )));
            }
            tokio::time::sleep(Duration::from_millis(SELECTOR_POLL_MS)).await;
        }
    }
}

#[async_trait::async_trait]
impl RequestInterceptor for BrowserEngine {
    async fn intercept(&self, url_pattern: &str) -> Result<InterceptStream> {
        let page = self.page.lock().await.clone();
        let setup_error = |e: CdpError| BrowserError::InterceptionError {
            pattern: url_pattern.to_string(),
            reason: e.to_string(),
        };

        let mut events = page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(setup_error)?;

        // Fetch.enable replaces the active pattern set, so re-send all of them
        let patterns = {
            let mut set = self.intercept_patterns.lock().await;
            set.acquire(url_pattern).then(|| set.patterns())
        };
        if let Some(patterns) = patterns {
            if let Err(e) = apply_patterns(&page, &patterns).await {
                self.intercept_patterns.lock().await.release(url_pattern);
                return Err(setup_error(e));
            }
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let http = self.http.clone();
        let registry = Arc::clone(&self.intercept_patterns);
        let pattern = url_pattern.to_string();

        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    () = tx.closed() => break,
                    event = events.next() => match event {
                        Some(event) => event,
                        None => break,
                    },
                };
                let url = event.request.url.clone();
                if !pattern_matches(&pattern, &url) {
                    continue;
                }

                let receiver_gone = tx.is_closed();
                if !receiver_gone {
                    match fetch_out_of_band(&http, &url).await {
                        Ok(response) => {
                            if tx.send(response).is_err() {
                                tracing::debug!("Interception receiver dropped for {}", pattern);
                            }
                        }
                        Err(reason) => {
                            tracing::warn!(url = %url, "Intercepted request could not be fetched: {}", reason);
                        }
                    }
                }

                let abort = FailRequestParams::new(event.request_id.clone(), ErrorReason::Aborted);
                if let Err(e) = page.execute(abort).await {
                    tracing::debug!(url = %url, "Failed to abort intercepted request: {}", e);
                }
                if receiver_gone {
                    break;
                }
            }

            let remaining = {
                let mut set = registry.lock().await;
                set.release(&pattern).then(|| set.patterns())
            };
            if let Some(remaining) = remaining {
                if let Err(e) = apply_patterns(&page, &remaining).await {
                    tracing::debug!("Failed to narrow interception after {}: {}", pattern, e);
                }
            }
            tracing::debug!("Route interception released for {}", pattern);
        });

        tracing::debug!("Route interception installed for {}", url_pattern);
        Ok(rx)
    }
}

/// Point `Fetch` at exactly `patterns`, disabling it when none are left.
async fn apply_patterns(page: &Page, patterns: &[String]) -> std::result::Result<(), CdpError> {
    if patterns.is_empty() {
        page.execute(DisableParams::default()).await?;
        return Ok(());
    }
    let mut enable = EnableParams::builder();
    for pattern in patterns {
        enable = enable.pattern(RequestPattern::builder().url_pattern(pattern.clone()).build());
    }
    page.execute(enable.build()).await?;
    Ok(())
}

async fn fetch_out_of_band(
    http: &reqwest::Client,
    url: &str,
) -> std::result::Result<InterceptedResponse, String> {
    let response = http.get(url).send().await.map_err(|e| e.to_string())?;
    let status = response.status().as_u16();
    let body = response.bytes().await.map_err(|e| e.to_string())?;
    Ok(InterceptedResponse {
        url: url.to_string(),
        status,
        body: body.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_first_access_is_free() {
        let mut throttle = Throttle::new(Duration::from_millis(100));
        assert!(throttle.reserve("example.com").is_zero());
    }

    #[test]
    fn test_throttle_delays_repeat_access() {
        let mut throttle = Throttle::new(Duration::from_millis(100));
        throttle.reserve("example.com");

        let wait = throttle.reserve("example.com");
        assert!(wait > Duration::ZERO);
        assert!(wait <= Duration::from_millis(100));

        // A third immediate access queues behind the second
        let third = throttle.reserve("example.com");
        assert!(third > wait);
    }

    #[test]
    fn test_throttle_different_domains() {
        let mut throttle = Throttle::new(Duration::from_millis(100));

        // Different domains should not interfere
        assert!(throttle.reserve("example.com").is_zero());
        assert!(throttle.reserve("other.com").is_zero());
    }

    #[test]
    fn test_pattern_registered_once_per_listener_set() {
        let mut set = PatternSet::default();
        assert!(set.acquire("*/quickselect/competitions/*"));
        assert!(!set.acquire("*/quickselect/competitions/*"));
        assert!(set.acquire("*/marktwertverlauf/*"));
        assert_eq!(set.patterns().len(), 2);

        // The pattern stays active until its last listener goes away
        assert!(!set.release("*/quickselect/competitions/*"));
        assert_eq!(set.patterns().len(), 2);
        assert!(set.release("*/quickselect/competitions/*"));
        assert_eq!(set.patterns(), vec!["*/marktwertverlauf/*".to_string()]);

        assert!(!set.release("*/quickselect/competitions/*"));
        assert!(set.release("*/marktwertverlauf/*"));
        assert!(set.patterns().is_empty());
    }

    #[test]
    fn test_configured_user_agent_wins() {
        let settings = BrowserSettings {
            user_agent: Some("scoutline-test/1.0".to_string()),
            ..BrowserSettings::default()
        };
        assert_eq!(session_user_agent(&settings), "scoutline-test/1.0");
    }

    #[test]
    fn test_default_user_agent_is_desktop() {
        let blank = BrowserSettings {
            user_agent: Some("  ".to_string()),
            ..BrowserSettings::default()
        };
        for settings in [BrowserSettings::default(), blank] {
            let agent = session_user_agent(&settings);
            assert!(DESKTOP_USER_AGENTS.contains(&agent.as_str()));
        }
    }

    #[tokio::test]
    async fn test_throttle_slot_expires() {
        let mut throttle = Throttle::new(Duration::from_millis(50));
        throttle.reserve("example.com");
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(throttle.reserve("example.com").is_zero());
    }
}
