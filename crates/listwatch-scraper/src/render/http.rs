//! Plain HTTP renderer.
//!
//! Fetches the document with `reqwest` and exposes the response body as the
//! rendered content. Static documents do not mutate after load, so the
//! settle signal fires as soon as a page is present.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::{RenderSession, Renderer};
use crate::error::ScraperError;

/// Builds one `reqwest::Client` per session so no connection or header state
/// leaks between cycles.
pub struct HttpRenderer {
    timeout: Duration,
    user_agent: String,
}

impl HttpRenderer {
    #[must_use]
    pub fn new(timeout_secs: u64, user_agent: &str) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            user_agent: user_agent.to_owned(),
        }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, ScraperError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&self.user_agent)
            .build()?;
        Ok(Box::new(HttpSession {
            client,
            referer: None,
            page: None,
        }))
    }
}

struct HttpSession {
    client: Client,
    referer: Option<String>,
    page: Option<String>,
}

impl HttpSession {
    async fn get(&self, url: &str) -> Result<(StatusCode, String), ScraperError> {
        let mut request = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "ja,en-US;q=0.9,en;q=0.8")
            .header(reqwest::header::CACHE_CONTROL, "no-cache");

        if let Some(referer) = &self.referer {
            request = request.header(reqwest::header::REFERER, referer);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::FORBIDDEN {
            return Err(ScraperError::AccessDenied {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response.text().await?;
        Ok((status, body))
    }
}

/// Scheme + host of `url`, used as the warm-up landing page.
fn origin_of(url: &str) -> String {
    let (scheme, rest) = url.split_once("://").unwrap_or(("https", url));
    let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    format!("{scheme}://{host}/")
}

#[async_trait]
impl RenderSession for HttpSession {
    async fn warm_up(&mut self, target_url: &str) -> Result<(), ScraperError> {
        let origin = origin_of(target_url);
        self.get(&origin).await?;
        tracing::debug!(origin = %origin, "warm-up page loaded");
        self.referer = Some(origin);
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<u16, ScraperError> {
        self.page = None;
        let (status, body) = self.get(url).await?;
        self.page = Some(body);
        self.referer = Some(url.to_owned());
        Ok(status.as_u16())
    }

    async fn wait_until_settled(&mut self, timeout: Duration) -> Result<(), ScraperError> {
        if self.page.is_some() {
            return Ok(());
        }
        Err(ScraperError::SettleTimeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }

    async fn capture(&mut self) -> Result<String, ScraperError> {
        self.page.clone().ok_or(ScraperError::NoPage)
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        self.page = None;
        self.referer = None;
        Ok(())
    }
}
