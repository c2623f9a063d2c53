//! Process exit codes for failed runs.

use scoutline_core::ConfigError;
use scoutline_scraper::ScrapeError;

/// Generic failure
pub const EXIT_FAILURE: u8 = 1;
/// Configuration could not be loaded or is invalid
pub const EXIT_CONFIG: u8 = 2;
/// The site could not be reached or did not answer as expected
pub const EXIT_SITE: u8 = 3;
/// A reconciliation search exhausted its results
pub const EXIT_NOT_FOUND: u8 = 4;
/// Interrupted by the user
pub const EXIT_CANCELLED: u8 = 130;

/// Map an error chain to an exit code, so scripts can tell a missing
/// competition from an unreachable site.
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(scrape) = err.downcast_ref::<ScrapeError>() {
        return match scrape {
            ScrapeError::Cancelled { .. } => EXIT_CANCELLED,
            ScrapeError::ReconciliationNotFound { .. } | ScrapeError::SeasonNotFound { .. } => {
                EXIT_NOT_FOUND
            }
            ScrapeError::Navigation { .. }
            | ScrapeError::Transient { .. }
            | ScrapeError::CorrelationFailure { .. }
            | ScrapeError::Extraction { .. }
            | ScrapeError::Browser(_) => EXIT_SITE,
            _ => EXIT_FAILURE,
        };
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return EXIT_CONFIG;
    }
    EXIT_FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_errors_map_to_codes() {
        let cancelled = anyhow::Error::from(ScrapeError::Cancelled {
            url: "https://example.com".to_string(),
        });
        assert_eq!(exit_code(&cancelled), EXIT_CANCELLED);

        let navigation = anyhow::Error::from(ScrapeError::Navigation {
            url: "https://example.com".to_string(),
            attempts: 3,
            reason: "HTTP 503".to_string(),
        });
        assert_eq!(exit_code(&navigation), EXIT_SITE);
    }

    #[test]
    fn test_context_does_not_hide_the_cause() {
        let err = anyhow::Error::from(ScrapeError::Cancelled {
            url: "https://example.com".to_string(),
        })
        .context("harvest failed");
        assert_eq!(exit_code(&err), EXIT_CANCELLED);
    }

    #[test]
    fn test_config_and_other_errors() {
        let config = anyhow::Error::from(ConfigError::NoConfigDir);
        assert_eq!(exit_code(&config), EXIT_CONFIG);
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), EXIT_FAILURE);
    }
}
