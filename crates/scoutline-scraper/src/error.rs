use scoutline_browser::BrowserError;
use scoutline_core::{CompetitionId, CoreError, PlayerId, SeasonId};
use scoutline_db::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Transient network error at {url}: {reason}")]
    Transient { url: String, reason: String },

    #[error("Navigation to {url} failed after {attempts} attempts: {reason}")]
    Navigation {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("Extraction failed at {url} ({context}): {reason}")]
    Extraction {
        url: String,
        context: String,
        reason: String,
    },

    #[error("Interceptor correlation failure at {url}: expected {expected} captures, got {captured}")]
    CorrelationFailure {
        url: String,
        expected: usize,
        captured: usize,
    },

    #[error("Competition {competition_id} ('{name}') not found after scanning {scanned} of {total} search results")]
    ReconciliationNotFound {
        competition_id: CompetitionId,
        name: String,
        scanned: usize,
        total: usize,
    },

    #[error("Season {season_id} not found for player {player_id}")]
    SeasonNotFound {
        player_id: PlayerId,
        season_id: SeasonId,
    },

    #[error("Cancelled while fetching {url}")]
    Cancelled { url: String },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Invalid identifier: {0}")]
    Core(#[from] CoreError),
}

impl ScrapeError {
    /// Structurally required data was missing or malformed.
    pub fn extraction(
        url: impl Into<String>,
        context: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Extraction {
            url: url.into(),
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Whether the navigator should retry the call that produced this error.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient { .. } => true,
            Self::Browser(e) => e.is_transient(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let transient = ScrapeError::Transient {
            url: "https://example.com".to_string(),
            reason: "HTTP 503".to_string(),
        };
        assert!(transient.is_transient());
        assert!(ScrapeError::Browser(BrowserError::Timeout("goto".to_string())).is_transient());
        assert!(!ScrapeError::Browser(BrowserError::InvalidUrl("x".to_string())).is_transient());
        assert!(!ScrapeError::Cancelled {
            url: "https://example.com".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_fatal_errors_carry_url_and_context() {
        let err = ScrapeError::extraction(
            "https://example.com/stats",
            "table.items > tfoot > tr",
            "footer row missing",
        );
        let message = err.to_string();
        assert!(message.contains("https://example.com/stats"));
        assert!(message.contains("table.items > tfoot > tr"));
    }
}
