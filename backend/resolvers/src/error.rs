use linktitle_security::TransportError;
use thiserror::Error;

/// Why a strategy (or the manager's skip-by-name path) produced no result.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no resolver found for {0}")]
    NoResolver(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("no title found")]
    NoTitle,

    #[error("{service} returned status {status}")]
    UnexpectedStatus { service: &'static str, status: u16 },

    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("could not extract video id from {0}")]
    MissingVideoId(String),

    #[error("redirect loop detected at {0}")]
    RedirectLoop(String),

    #[error("gave up after {limit} redirects starting at {url}")]
    HopLimitExceeded { url: String, limit: usize },

    #[error("duplicate resolver name: {0}")]
    DuplicateResolver(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("http error: {0}")]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for ResolveError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs can carry API keys.
        ResolveError::Http(err.without_url())
    }
}

impl ResolveError {
    /// Errors after which no other strategy should try the same URL, because
    /// the destination the URL points at was never determined.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ResolveError::RedirectLoop(_) | ResolveError::HopLimitExceeded { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_redirect_failures_are_terminal() {
        assert!(ResolveError::RedirectLoop("https://a".into()).is_terminal());
        assert!(ResolveError::HopLimitExceeded {
            url: "https://a".into(),
            limit: 5
        }
        .is_terminal());
        assert!(!ResolveError::NoTitle.is_terminal());
        assert!(!ResolveError::NotFound("x".into()).is_terminal());
        assert!(!ResolveError::UnexpectedStatus {
            service: "github",
            status: 500
        }
        .is_terminal());
    }
}
