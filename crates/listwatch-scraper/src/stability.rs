//! Waits for rendered content to stop mutating before it is trusted.
//!
//! Each round waits for the renderer's settle signal (a timeout there is not
//! fatal), pauses a random 2-3 s so a capture does not land mid-render, and
//! then captures the whole page. Two consecutive rounds that capture exactly
//! the same bytes as their predecessor mean the page has converged.

use std::time::Duration;

use crate::error::ScraperError;
use crate::pacing::DelayRange;
use crate::render::RenderSession;

/// Consecutive identical captures required before content is considered stable.
const REQUIRED_STABLE_ROUNDS: u32 = 2;

#[derive(Debug, Clone)]
pub struct StabilityConfig {
    pub max_attempts: u32,
    pub settle_timeout: Duration,
    pub pre_capture_delay: DelayRange,
    pub post_round_delay: DelayRange,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            settle_timeout: Duration::from_millis(15_000),
            pre_capture_delay: DelayRange::new(2_000, 3_000),
            post_round_delay: DelayRange::new(1_000, 2_000),
        }
    }
}

/// Captures the session's current page until it stops changing.
///
/// Returns early as soon as the stable-round threshold is reached.
///
/// # Errors
///
/// - [`ScraperError::DomNotStable`] if `max_attempts` rounds pass without
///   convergence.
/// - Any error from [`RenderSession::capture`], and hard failures from the
///   settle wait, are propagated unchanged.
pub async fn wait_for_stable_content(
    session: &mut dyn RenderSession,
    config: &StabilityConfig,
) -> Result<String, ScraperError> {
    let mut previous: Option<String> = None;
    let mut stable_count = 0u32;

    for attempt in 1..=config.max_attempts {
        match tokio::time::timeout(
            config.settle_timeout,
            session.wait_until_settled(config.settle_timeout),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(err)) if err.is_hard_failure() => return Err(err),
            Ok(Err(err)) => {
                tracing::debug!(attempt, error = %err, "settle wait failed; capturing anyway");
            }
            Err(_) => {
                tracing::debug!(attempt, "settle wait timed out; capturing anyway");
            }
        }

        config.pre_capture_delay.sleep().await;
        let content = session.capture().await?;

        if previous.as_deref() == Some(content.as_str()) {
            stable_count += 1;
            if stable_count >= REQUIRED_STABLE_ROUNDS {
                tracing::debug!(attempt, bytes = content.len(), "content stable");
                return Ok(content);
            }
        } else {
            stable_count = 0;
        }
        previous = Some(content);

        config.post_round_delay.sleep().await;
    }

    Err(ScraperError::DomNotStable {
        attempts: config.max_attempts,
    })
}
