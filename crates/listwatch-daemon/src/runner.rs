//! One poll cycle across all configured targets.
//!
//! Targets are processed strictly in configuration order through a single
//! render session that lives for exactly one cycle. Every per-target failure
//! is contained here; only failing to open the session aborts a cycle.

use std::sync::Arc;

use listwatch_core::Target;
use listwatch_notify::{Alert, Notifier};
use listwatch_scraper::{
    verified_sample, ConsistencyConfig, DelayRange, Extractor, RenderSession, Renderer,
    ScraperError,
};
use listwatch_store::SnapshotStore;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("failed to open render session: {0}")]
    Session(#[source] ScraperError),
}

/// What happened to one target during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOutcome {
    /// Verified; top record unchanged or stored as first baseline.
    Quiet,
    /// Verified; a new top record was detected.
    Changed { new_items: usize, notified: bool },
    /// Samples never agreed; nothing was stored or sent.
    Unverified,
    /// A failure skipped the target for this cycle.
    Skipped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub new_items: u64,
    pub quiet: usize,
    pub changed: usize,
    pub unverified: usize,
    pub skipped: usize,
    pub notify_failures: usize,
    /// Shutdown was requested before every target was processed.
    pub interrupted: bool,
}

impl CycleReport {
    fn record(&mut self, outcome: TargetOutcome) {
        match outcome {
            TargetOutcome::Quiet => self.quiet += 1,
            TargetOutcome::Changed { new_items, notified } => {
                self.changed += 1;
                self.new_items = self.new_items.saturating_add(new_items as u64);
                if !notified {
                    self.notify_failures += 1;
                }
            }
            TargetOutcome::Unverified => self.unverified += 1,
            TargetOutcome::Skipped => self.skipped += 1,
        }
    }
}

pub struct CycleRunner {
    renderer: Arc<dyn Renderer>,
    extractor: Arc<dyn Extractor>,
    notifier: Arc<dyn Notifier>,
    snapshots: SnapshotStore,
    consistency: ConsistencyConfig,
    inter_target_delay: DelayRange,
}

impl CycleRunner {
    #[must_use]
    pub fn new(
        renderer: Arc<dyn Renderer>,
        extractor: Arc<dyn Extractor>,
        notifier: Arc<dyn Notifier>,
        snapshots: SnapshotStore,
        consistency: ConsistencyConfig,
        inter_target_delay: DelayRange,
    ) -> Self {
        Self {
            renderer,
            extractor,
            notifier,
            snapshots,
            consistency,
            inter_target_delay,
        }
    }

    #[must_use]
    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Runs every target once. Shutdown is honoured between targets.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::Session`] if no render session could be opened.
    pub async fn run_cycle(
        &mut self,
        targets: &[Target],
        shutdown: &watch::Receiver<bool>,
    ) -> Result<CycleReport, CycleError> {
        let mut session = self
            .renderer
            .open_session()
            .await
            .map_err(CycleError::Session)?;
        let mut report = CycleReport::default();

        for (i, target) in targets.iter().enumerate() {
            if *shutdown.borrow() {
                tracing::info!(
                    remaining = targets.len() - i,
                    "shutdown requested; ending cycle early"
                );
                report.interrupted = true;
                break;
            }
            if i > 0 {
                self.inter_target_delay.sleep().await;
            }

            let outcome = self.process_target(session.as_mut(), target).await;
            report.record(outcome);
        }

        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "failed to close render session");
        }
        Ok(report)
    }

    async fn process_target(
        &mut self,
        session: &mut dyn RenderSession,
        target: &Target,
    ) -> TargetOutcome {
        let key = target.key();

        if let Err(e) = session.warm_up(&target.url).await {
            if e.is_hard_failure() {
                tracing::warn!(target_key = %key, error = %e, "blocked during warm-up; skipping target");
                return TargetOutcome::Skipped;
            }
            tracing::warn!(target_key = %key, error = %e, "warm-up failed; continuing");
        }

        let sample = match verified_sample(
            session,
            &target.url,
            self.extractor.as_ref(),
            &self.consistency,
        )
        .await
        {
            Ok(Some(sample)) => sample,
            Ok(None) => {
                tracing::warn!(target_key = %key, "sample not verified; skipping target this cycle");
                return TargetOutcome::Unverified;
            }
            Err(e) => {
                tracing::warn!(target_key = %key, error = %e, "target skipped this cycle");
                return TargetOutcome::Skipped;
            }
        };

        let changes = self.snapshots.detect_change(&key, &sample);
        if changes.is_empty() {
            tracing::info!(target_key = %key, records = sample.len(), "no new top record");
            return TargetOutcome::Quiet;
        }

        let notified = match Alert::new(target, &sample) {
            Ok(alert) => match self.notifier.notify(&alert).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!(target_key = %key, error = %e, "failed to deliver alert");
                    false
                }
            },
            Err(e) => {
                tracing::error!(target_key = %key, error = %e, "failed to build alert");
                false
            }
        };

        tracing::info!(
            target_key = %key,
            name = %changes[0].name,
            price = changes[0].price,
            notified,
            "new top record"
        );
        TargetOutcome::Changed {
            new_items: changes.len(),
            notified,
        }
    }
}
