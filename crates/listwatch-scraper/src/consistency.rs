//! Requires two consecutive extraction passes to agree before a sample is
//! trusted.
//!
//! A single read can catch a transient reordering or a half-rendered list.
//! Alerts cannot be recalled once sent, so the verifier trades latency for
//! precision: it keeps sampling until the top record of one sample matches
//! the top record of the sample before it, or the attempt budget runs out.

use listwatch_core::{fingerprint, Record};

use crate::error::ScraperError;
use crate::extract::Extractor;
use crate::pacing::DelayRange;
use crate::render::RenderSession;
use crate::stability::{wait_for_stable_content, StabilityConfig};

#[derive(Debug, Clone)]
pub struct ConsistencyConfig {
    /// Total sampling attempts, including the first.
    pub retries: u32,
    /// Pause after an attempt that produced no usable sample.
    pub failed_attempt_backoff: DelayRange,
    pub stability: StabilityConfig,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            failed_attempt_backoff: DelayRange::new(3_000, 5_000),
            stability: StabilityConfig::default(),
        }
    }
}

/// Samples `url` until two consecutive samples agree on their top record.
///
/// Returns `Ok(Some(sample))` with the later of the two agreeing samples, or
/// `Ok(None)` when the attempts are exhausted without agreement. Unverified
/// data is never returned.
///
/// Empty samples and soft failures (unstable content, non-403 statuses,
/// network errors) consume one attempt and back off. They are not samples,
/// so they do not break the chain: agreement is checked between consecutive
/// non-empty samples.
///
/// # Errors
///
/// Hard failures ([`ScraperError::is_hard_failure`]) abort the loop at once.
pub async fn verified_sample(
    session: &mut dyn RenderSession,
    url: &str,
    extractor: &dyn Extractor,
    config: &ConsistencyConfig,
) -> Result<Option<Vec<Record>>, ScraperError> {
    let mut previous_top: Option<String> = None;

    for attempt in 1..=config.retries {
        let sample = match sample_once(session, url, extractor, &config.stability).await {
            Ok(sample) => sample,
            Err(err) if err.is_hard_failure() => return Err(err),
            Err(err) => {
                tracing::warn!(url, attempt, error = %err, "sampling attempt failed");
                config.failed_attempt_backoff.sleep().await;
                continue;
            }
        };

        let Some(top) = sample.first() else {
            tracing::warn!(url, attempt, "extraction yielded no records");
            config.failed_attempt_backoff.sleep().await;
            continue;
        };

        let top_fp = fingerprint(top);
        if previous_top.as_deref() == Some(top_fp.as_str()) {
            tracing::debug!(url, attempt, fingerprint = %top_fp, records = sample.len(), "sample verified");
            return Ok(Some(sample));
        }

        if let Some(prev) = &previous_top {
            tracing::debug!(url, attempt, previous = %prev, current = %top_fp, "samples disagree");
        }
        previous_top = Some(top_fp);
    }

    tracing::warn!(
        url,
        retries = config.retries,
        "no two consecutive samples agreed; skipping"
    );
    Ok(None)
}

async fn sample_once(
    session: &mut dyn RenderSession,
    url: &str,
    extractor: &dyn Extractor,
    stability: &StabilityConfig,
) -> Result<Vec<Record>, ScraperError> {
    session.navigate(url).await?;
    let content = wait_for_stable_content(session, stability).await?;
    Ok(extractor.parse(&content))
}
