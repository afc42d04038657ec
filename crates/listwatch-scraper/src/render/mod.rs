//! Page renderer capability.
//!
//! The change-detection pipeline only needs four things from a renderer:
//! load a URL, wait until the page stops changing, read the page as text,
//! and run a warm-up step before the real navigation. Anything that can do
//! those (a headless browser driver, a plain HTTP fetcher) plugs in here.

mod http;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScraperError;

pub use http::HttpRenderer;

/// Factory for render sessions. One session is opened per poll cycle.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Opens a fresh session with no state carried over from earlier cycles.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] if the session cannot be created.
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, ScraperError>;
}

/// A single exclusive rendering session.
#[async_trait]
pub trait RenderSession: Send {
    /// Pre-navigation settling sequence (landing page visit, scrolling, ...).
    /// Callers only care that it did not fail.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] if the warm-up navigation fails.
    async fn warm_up(&mut self, target_url: &str) -> Result<(), ScraperError>;

    /// Loads `url` and returns the HTTP status of the main document.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::AccessDenied`] for block responses (403).
    /// - [`ScraperError::UnexpectedStatus`] for any other non-2xx status.
    /// - [`ScraperError::Http`] for network failures and timeouts.
    async fn navigate(&mut self, url: &str) -> Result<u16, ScraperError>;

    /// Waits for the renderer's own "content settled" signal.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::SettleTimeout`] when the signal did not arrive
    /// in time. Callers treat that as non-fatal.
    async fn wait_until_settled(&mut self, timeout: Duration) -> Result<(), ScraperError>;

    /// Reads the full rendered content of the current page.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::NoPage`] if nothing has been loaded yet.
    async fn capture(&mut self) -> Result<String, ScraperError>;

    /// Releases the session.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] if teardown fails; the session is unusable either way.
    async fn close(&mut self) -> Result<(), ScraperError>;
}
