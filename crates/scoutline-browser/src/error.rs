use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("chromium error: {0}")]
    ChromiumError(String),

    #[error("navigation to {url} failed: {reason}")]
    NavigationError { url: String, reason: String },

    #[error("selector not found: {selector} (index {index})")]
    SelectorNotFound { selector: String, index: usize },

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("interception setup failed for pattern {pattern}: {reason}")]
    InterceptionError { pattern: String, reason: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl BrowserError {
    /// Whether retrying the same operation may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NavigationError { .. } | Self::Timeout(_))
    }
}
