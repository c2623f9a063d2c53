//! Pairs UI clicks with the background responses they trigger.
//!
//! Captures arrive on an ordered channel. One click is in flight at a time:
//! leftovers from an earlier click are drained before the next one, and each
//! click waits a bounded time for exactly one capture. A capture that never
//! arrives leaves an empty slot, which [`pair_by_index`] turns into a
//! correlation failure for the whole batch.

use crate::error::{Result, ScrapeError};
use scoutline_browser::{BrowserActions, InterceptStream, InterceptedResponse, RequestInterceptor};
use std::time::Duration;

/// Parses an intercepted response into a structured record.
pub type CaptureParser<T> = fn(&InterceptedResponse) -> Option<T>;

/// Ordered consumer of intercepted responses for one URL pattern.
pub struct Correlator<T> {
    captures: InterceptStream,
    parse: CaptureParser<T>,
    capture_timeout: Duration,
}

impl<T> Correlator<T> {
    /// Install interception for `url_pattern` on the active session.
    pub async fn install(
        interceptor: &dyn RequestInterceptor,
        url_pattern: &str,
        parse: CaptureParser<T>,
        capture_timeout: Duration,
    ) -> Result<Self> {
        let captures = interceptor.intercept(url_pattern).await?;
        tracing::debug!("Correlator installed for {}", url_pattern);
        Ok(Self {
            captures,
            parse,
            capture_timeout,
        })
    }

    /// Click the `index`-th match of `selector` and await its capture.
    ///
    /// Returns `Ok(None)` when no parseable capture arrives in time.
    pub async fn correlate_click(
        &mut self,
        browser: &dyn BrowserActions,
        selector: &str,
        index: usize,
    ) -> Result<Option<T>> {
        let stale = self.drain_stale();
        if stale > 0 {
            tracing::debug!("Discarded {} late captures before click {}", stale, index);
        }

        browser.click(selector, index).await?;

        match tokio::time::timeout(self.capture_timeout, self.captures.recv()).await {
            Ok(Some(response)) => {
                let parsed = if (200..300).contains(&response.status) {
                    (self.parse)(&response)
                } else {
                    None
                };
                if parsed.is_none() {
                    tracing::warn!(
                        url = %response.url,
                        status = response.status,
                        "Capture for click {} could not be parsed",
                        index
                    );
                }
                Ok(parsed)
            }
            Ok(None) => {
                tracing::warn!(selector, "Interception stream closed before click {} resolved", index);
                Ok(None)
            }
            Err(_) => {
                tracing::warn!(
                    selector,
                    "No capture for click {} within {:?}",
                    index,
                    self.capture_timeout
                );
                Ok(None)
            }
        }
    }

    fn drain_stale(&mut self) -> usize {
        let mut drained = 0;
        while self.captures.try_recv().is_ok() {
            drained += 1;
        }
        drained
    }
}

/// Pair placeholders with captures slot by slot.
///
/// # Errors
/// Returns [`ScrapeError::CorrelationFailure`] unless every placeholder has
/// exactly one capture.
pub fn pair_by_index<P, T>(
    url: &str,
    placeholders: Vec<P>,
    captures: Vec<Option<T>>,
) -> Result<Vec<(P, T)>> {
    let expected = placeholders.len();
    let captured = captures.iter().filter(|slot| slot.is_some()).count();
    if captures.len() != expected || captured != expected {
        return Err(ScrapeError::CorrelationFailure {
            url: url.to_string(),
            expected,
            captured,
        });
    }

    Ok(placeholders
        .into_iter()
        .zip(captures.into_iter().flatten())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoutline_browser::PageResponse;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Each click on item `i` fires a background request for `/item/{i}`,
    /// except for the indices in `silent`.
    struct ClickSite {
        sender: Mutex<Option<mpsc::UnboundedSender<InterceptedResponse>>>,
        silent: HashSet<usize>,
    }

    impl ClickSite {
        fn new(silent: &[usize]) -> Self {
            Self {
                sender: Mutex::new(None),
                silent: silent.iter().copied().collect(),
            }
        }
    }

    #[async_trait::async_trait]
    impl RequestInterceptor for ClickSite {
        async fn intercept(&self, _url_pattern: &str) -> scoutline_browser::Result<InterceptStream> {
            let (tx, rx) = mpsc::unbounded_channel();
            *self.sender.lock().expect("lock") = Some(tx);
            Ok(rx)
        }
    }

    #[async_trait::async_trait]
    impl BrowserActions for ClickSite {
        async fn navigate(&self, url: &str) -> scoutline_browser::Result<PageResponse> {
            Ok(PageResponse {
                url: url.to_string(),
                status: 200,
                content: String::new(),
            })
        }
        async fn content(&self) -> scoutline_browser::Result<String> {
            Ok(String::new())
        }
        async fn count(&self, _: &str) -> scoutline_browser::Result<usize> {
            Ok(8)
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
        async fn click(&self, _: &str, index: usize) -> scoutline_browser::Result<()> {
            if self.silent.contains(&index) {
                return Ok(());
            }
            if let Some(tx) = self.sender.lock().expect("lock").as_ref() {
                let _ = tx.send(InterceptedResponse {
                    url: format!("https://example.com/item/{index}"),
                    status: 200,
                    body: index.to_string().into_bytes(),
                });
            }
            Ok(())
        }
        async fn wait_for_selector(&self, _: &str, _: u64) -> scoutline_browser::Result<()> {
            Ok(())
        }
    }

    fn parse_index(response: &InterceptedResponse) -> Option<usize> {
        std::str::from_utf8(&response.body).ok()?.parse().ok()
    }

    async fn click_all(site: &ClickSite) -> Vec<Option<usize>> {
        let mut correlator =
            Correlator::install(site, "*/item/*", parse_index, Duration::from_millis(50))
                .await
                .expect("install");
        let mut captures = Vec::new();
        for index in 0..8 {
            captures.push(
                correlator
                    .correlate_click(site, "li", index)
                    .await
                    .expect("click"),
            );
        }
        captures
    }

    #[tokio::test]
    async fn test_eight_clicks_eight_ordered_captures() {
        let site = ClickSite::new(&[]);
        let captures = click_all(&site).await;

        let placeholders: Vec<usize> = (0..8).collect();
        let paired = pair_by_index("https://example.com", placeholders, captures)
            .expect("all captures present");
        assert_eq!(paired.len(), 8);
        for (placeholder, capture) in paired {
            assert_eq!(placeholder, capture);
        }
    }

    #[tokio::test]
    async fn test_missing_fifth_capture_is_detected() {
        let site = ClickSite::new(&[4]);
        let captures = click_all(&site).await;
        assert!(captures[4].is_none());

        let placeholders: Vec<usize> = (0..8).collect();
        let err = pair_by_index("https://example.com", placeholders, captures)
            .expect_err("count mismatch");
        match err {
            ScrapeError::CorrelationFailure {
                expected, captured, ..
            } => {
                assert_eq!(expected, 8);
                assert_eq!(captured, 7);
            }
            other => panic!("Expected CorrelationFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_late_capture_does_not_shift_slots() {
        let site = ClickSite::new(&[]);
        let mut correlator =
            Correlator::install(&site, "*/item/*", parse_index, Duration::from_millis(50))
                .await
                .expect("install");

        // A capture nobody waited for is sitting in the channel
        site.sender
            .lock()
            .expect("lock")
            .as_ref()
            .expect("installed")
            .send(InterceptedResponse {
                url: "https://example.com/item/99".to_string(),
                status: 200,
                body: b"99".to_vec(),
            })
            .expect("send");

        let capture = correlator
            .correlate_click(&site, "li", 3)
            .await
            .expect("click");
        assert_eq!(capture, Some(3));
    }

    #[test]
    fn test_pairing_rejects_short_capture_list() {
        let result = pair_by_index("https://example.com", vec!["a", "b"], vec![Some(1)]);
        assert!(matches!(
            result,
            Err(ScrapeError::CorrelationFailure {
                expected: 2,
                captured: 1,
                ..
            })
        ));
    }
}
