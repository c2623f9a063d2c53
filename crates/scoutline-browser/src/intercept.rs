//! Route interception for background requests fired by UI controls.
//!
//! Matching requests are paused in the browser, fetched out-of-band so the
//! scraper can read the payload, and then aborted so the page never renders
//! them.

use crate::error::Result;
use tokio::sync::mpsc;

/// Payload of an intercepted request, fetched on the browser's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedResponse {
    /// URL of the original (aborted) request
    pub url: String,
    /// HTTP status of the out-of-band fetch
    pub status: u16,
    /// Raw response body
    pub body: Vec<u8>,
}

/// Ordered stream of intercepted responses, one per matching request.
///
/// A request whose out-of-band fetch fails produces no item.
pub type InterceptStream = mpsc::UnboundedReceiver<InterceptedResponse>;

/// Installs route interception on the active browser session.
#[async_trait::async_trait]
pub trait RequestInterceptor: Send + Sync {
    /// Intercept every request whose URL matches `url_pattern`.
    ///
    /// The pattern uses the CDP wildcard syntax (`*` matches any run of
    /// characters). Responses arrive in the order the requests were issued.
    async fn intercept(&self, url_pattern: &str) -> Result<InterceptStream>;
}

/// Match a URL against a CDP-style wildcard pattern.
#[must_use]
pub fn pattern_matches(pattern: &str, url: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == url;
    }

    let mut rest = url;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(stripped) => rest = stripped,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_matches() {
        let pattern = "*/quickselect/competitions/*";
        assert!(pattern_matches(
            pattern,
            "https://www.transfermarkt.com/quickselect/competitions/189"
        ));
        assert!(!pattern_matches(
            pattern,
            "https://www.transfermarkt.com/quickselect/clubs/GB1"
        ));
    }

    #[test]
    fn test_pattern_without_wildcards_is_exact() {
        assert!(pattern_matches("https://a.b/c", "https://a.b/c"));
        assert!(!pattern_matches("https://a.b/c", "https://a.b/cd"));
    }

    #[test]
    fn test_pattern_anchors_prefix_and_suffix() {
        assert!(pattern_matches("https://*.json", "https://x.y/z.json"));
        assert!(!pattern_matches("https://*.json", "http://x.y/z.json"));
        assert!(!pattern_matches("https://*.json", "https://x.y/z.json?v=1"));
    }
}
