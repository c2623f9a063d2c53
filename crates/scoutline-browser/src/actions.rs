use crate::error::{BrowserError, Result};

/// Status and rendered HTML of a completed navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub url: String,
    pub status: u16,
    pub content: String,
}

impl PageResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Browser actions against the single active page.
///
/// Element queries are scoped CSS selectors; "descending" into a list is
/// expressed by addressing the `index`-th match of a selector.
#[async_trait::async_trait]
pub trait BrowserActions: Send + Sync {
    /// Navigate to a URL and return the response status and rendered content
    async fn navigate(&self, url: &str) -> Result<PageResponse>;

    /// Rendered HTML of the current page
    async fn content(&self) -> Result<String>;

    /// Number of elements matching a selector
    async fn count(&self, selector: &str) -> Result<usize>;

    /// Inner text of the `index`-th element matching a selector
    async fn inner_text(&self, selector: &str, index: usize) -> Result<Option<String>>;

    /// Attribute of the `index`-th element matching a selector
    async fn attribute(&self, selector: &str, index: usize, name: &str)
        -> Result<Option<String>>;

    /// Click the `index`-th element matching a selector
    async fn click(&self, selector: &str, index: usize) -> Result<()>;

    /// Wait for a selector to appear
    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()>;
}

/// Helper to extract domain from URL
pub fn extract_domain(url: &str) -> Result<String> {
    let url = url::Url::parse(url).map_err(|e| BrowserError::InvalidUrl(format!("{url}: {e}")))?;

    url.host_str()
        .ok_or_else(|| BrowserError::InvalidUrl("no host in URL".to_string()))
        .map(|s| s.to_string())
}
