use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("access denied by {url} (HTTP {status})")]
    AccessDenied { url: String, status: u16 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("content did not settle within {timeout_ms}ms")]
    SettleTimeout { timeout_ms: u64 },

    #[error("rendered content still changing after {attempts} attempts")]
    DomNotStable { attempts: u32 },

    #[error("no page loaded in the render session")]
    NoPage,

    #[error("invalid item pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl ScraperError {
    /// Returns `true` for failures that must not be retried within a cycle.
    ///
    /// Only [`ScraperError::AccessDenied`] qualifies: hammering a site that has
    /// just blocked the session makes the block worse. Every other variant is
    /// a soft failure that consumes one sampling attempt.
    #[must_use]
    pub fn is_hard_failure(&self) -> bool {
        matches!(self, ScraperError::AccessDenied { .. })
    }
}
