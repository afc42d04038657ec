//! Chat-channel notifier speaking the Discord bot REST API.
//!
//! Each alert becomes one message in the target's channel:
//! `POST {api_base}/channels/{channel_id}/messages` with a bot token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::alert::{format_price, Alert};
use crate::error::NotifyError;
use crate::rate_limit::retry_with_backoff;
use crate::Notifier;

const EMBED_COLOR: u32 = 0x002E_CC71;

#[derive(Debug, Serialize)]
struct MessagePayload {
    content: String,
    embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
struct Embed {
    title: String,
    url: String,
    description: String,
    color: u32,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<Footer>,
}

#[derive(Debug, Serialize)]
struct Footer {
    text: String,
}

pub struct ChatNotifier {
    client: Client,
    api_base: String,
    token: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl ChatNotifier {
    /// Creates a notifier for the chat API at `api_base`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the HTTP client cannot be constructed.
    pub fn new(
        api_base: &str,
        token: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("listwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_owned(),
            token: token.to_owned(),
            max_retries,
            backoff_base_secs,
        })
    }

    fn messages_url(&self, channel_id: &str) -> String {
        format!("{}/channels/{channel_id}/messages", self.api_base)
    }

    fn payload(alert: &Alert) -> MessagePayload {
        let top = &alert.records[0];
        MessagePayload {
            content: alert.title(),
            embeds: vec![Embed {
                title: format!("{} — ¥{}", top.name, format_price(top.price)),
                url: alert.url.clone(),
                description: alert.body(),
                color: EMBED_COLOR,
                timestamp: chrono::Utc::now().to_rfc3339(),
                footer: (alert.overflow > 0).then(|| Footer {
                    text: format!("{} more not shown", alert.overflow),
                }),
            }],
        }
    }
}

#[async_trait]
impl Notifier for ChatNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        if alert.records.is_empty() {
            return Err(NotifyError::EmptyAlert);
        }
        let url = self.messages_url(&alert.channel_id);
        let payload = Self::payload(alert);

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            let payload = &payload;
            async move {
                let response = self
                    .client
                    .post(&url)
                    .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
                    .json(payload)
                    .send()
                    .await?;
                let status = response.status();

                if status == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<f64>().ok())
                        .map_or(5, |secs| {
                            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                            let ceil = secs.max(0.0).ceil() as u64;
                            ceil
                        });
                    return Err(NotifyError::RateLimited { retry_after_secs });
                }

                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(NotifyError::UnexpectedStatus {
                        status: status.as_u16(),
                        body,
                    });
                }

                Ok(())
            }
        })
        .await?;

        tracing::info!(
            channel = %alert.channel_id,
            records = alert.records.len(),
            "alert delivered"
        );
        Ok(())
    }
}
