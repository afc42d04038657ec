//! Long-running poll loop.
//!
//! One cycle at a time: run every target, fold the result into the stats,
//! ask the scheduler for the next delay, wait. Shutdown is observed between
//! cycles and during every wait; nothing else ends the loop.

use std::time::Duration;

use chrono::Local;
use listwatch_core::{AppConfig, Target};
use tokio::sync::watch;

use crate::runner::{CycleReport, CycleRunner};
use crate::scheduler::{AdaptiveScheduler, Decision};

/// Cycles between stats summaries in the log.
const STATS_SUMMARY_EVERY: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTimings {
    /// Cadence for re-checking the clock inside the sleep window.
    pub wake_check: Duration,
    /// Pause after a cycle that failed outright.
    pub error_cooldown: Duration,
}

impl LoopTimings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            wake_check: Duration::from_secs(config.wake_check_secs),
            error_cooldown: Duration::from_secs(config.error_cooldown_secs),
        }
    }
}

pub struct Service {
    runner: CycleRunner,
    scheduler: AdaptiveScheduler,
    targets: Vec<Target>,
    timings: LoopTimings,
    cycles: u64,
}

/// Result of one cycle as seen by the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleStatus {
    Completed(CycleReport),
    Failed,
}

impl Service {
    #[must_use]
    pub fn new(
        runner: CycleRunner,
        scheduler: AdaptiveScheduler,
        targets: Vec<Target>,
        timings: LoopTimings,
    ) -> Self {
        Self {
            runner,
            scheduler,
            targets,
            timings,
            cycles: 0,
        }
    }

    /// Runs a single cycle and updates the stats exactly once.
    pub async fn run_cycle(&mut self, shutdown: &watch::Receiver<bool>) -> CycleStatus {
        self.cycles += 1;
        let cycle = self.cycles;
        tracing::info!(cycle, targets = self.targets.len(), "cycle started");

        let status = match self.runner.run_cycle(&self.targets, shutdown).await {
            Ok(report) => {
                self.scheduler.update(report.new_items);
                tracing::info!(
                    cycle,
                    new_items = report.new_items,
                    quiet = report.quiet,
                    changed = report.changed,
                    unverified = report.unverified,
                    skipped = report.skipped,
                    notify_failures = report.notify_failures,
                    interrupted = report.interrupted,
                    "cycle finished"
                );
                CycleStatus::Completed(report)
            }
            Err(e) => {
                tracing::error!(cycle, error = %e, "cycle failed");
                self.scheduler.record_error();
                self.scheduler.update(0);
                CycleStatus::Failed
            }
        };

        if cycle % STATS_SUMMARY_EVERY == 0 {
            self.log_stats_summary();
        }
        status
    }

    /// Polls until `shutdown` flips to `true`.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            if self.scheduler.is_sleeping_now() {
                tracing::info!(
                    wake_check_secs = self.timings.wake_check.as_secs(),
                    "inside sleep window; waiting"
                );
                if wait_or_shutdown(self.timings.wake_check, &mut shutdown).await {
                    break;
                }
                continue;
            }

            let delay = match self.run_cycle(&shutdown).await {
                CycleStatus::Failed => {
                    tracing::info!(
                        cooldown_secs = self.timings.error_cooldown.as_secs(),
                        "cooling down after failed cycle"
                    );
                    self.timings.error_cooldown
                }
                CycleStatus::Completed(_) => match self.scheduler.decide() {
                    Decision::Sleep => continue,
                    Decision::Poll {
                        interval,
                        tier,
                        nearby,
                        minutes_since_last,
                    } => {
                        let next = Local::now()
                            + chrono::Duration::from_std(interval).unwrap_or_else(|_| chrono::Duration::zero());
                        tracing::info!(
                            reason = tier.reason(),
                            nearby,
                            minutes_since_last,
                            interval_secs = interval.as_secs(),
                            next_poll = %next.format("%H:%M:%S"),
                            "next poll scheduled"
                        );
                        interval
                    }
                },
            };

            if wait_or_shutdown(delay, &mut shutdown).await {
                break;
            }
        }

        tracing::info!(cycles = self.cycles, "poll loop stopped");
    }

    fn log_stats_summary(&self) {
        let stats = self.scheduler.stats();
        let busiest = stats
            .busiest_hours(3)
            .iter()
            .map(|(hour, count)| format!("{hour:02}h={count}"))
            .collect::<Vec<_>>()
            .join(", ");
        tracing::info!(
            total_checks = stats.total_checks,
            total_new_items = stats.total_new_items,
            error_count = stats.error_count,
            last_new_item_at = ?stats.last_new_item_at,
            busiest_hours = %busiest,
            tracked_targets = self.runner.snapshots().len(),
            "stats summary"
        );
    }
}

/// Sleeps for `duration` unless shutdown is requested first. Returns `true` on shutdown.
pub async fn wait_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return true;
    }
    tokio::select! {
        () = tokio::time::sleep(duration) => *shutdown.borrow(),
        changed = shutdown.changed() => match changed {
            Ok(()) => *shutdown.borrow(),
            // Sender gone without a signal: nobody can request shutdown any more.
            Err(_) => {
                tokio::time::sleep(duration).await;
                false
            }
        },
    }
}
