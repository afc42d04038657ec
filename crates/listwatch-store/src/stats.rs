//! Long-run activity statistics that drive the adaptive poll interval.
//!
//! The hourly histogram is cumulative across all days and never decays.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blob::BlobStore;
use crate::error::StoreError;

pub const HOURS_PER_DAY: usize = 24;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsState {
    /// New items seen per hour of day (local wall clock), all days combined.
    pub hourly_new_item_counts: [u64; HOURS_PER_DAY],
    pub total_checks: u64,
    pub total_new_items: u64,
    pub last_new_item_at: Option<DateTime<Utc>>,
    pub error_count: u64,
    pub last_error_at: Option<DateTime<Utc>>,
}

impl StatsState {
    /// Bucket count for `hour`, wrapping modulo 24.
    #[must_use]
    pub fn count_at(&self, hour: i64) -> u64 {
        let idx = usize::try_from(hour.rem_euclid(24)).unwrap_or(0);
        self.hourly_new_item_counts[idx]
    }

    /// Up to `n` hours with the most new items, busiest first. Empty hours are skipped.
    #[must_use]
    pub fn busiest_hours(&self, n: usize) -> Vec<(usize, u64)> {
        let mut hours: Vec<(usize, u64)> = self
            .hourly_new_item_counts
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, count)| *count > 0)
            .collect();
        hours.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        hours.truncate(n);
        hours
    }
}

pub struct StatsStore {
    blob: Box<dyn BlobStore>,
    state: StatsState,
}

impl StatsStore {
    /// Loads persisted stats. Missing, unreadable, or corrupt data starts
    /// from zeroed stats instead of failing.
    #[must_use]
    pub fn load(blob: Box<dyn BlobStore>) -> Self {
        let state = match blob.load() {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "stats store is corrupt; starting from zero");
                StatsState::default()
            }),
            Ok(None) => StatsState::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stats store; starting from zero");
                StatsState::default()
            }
        };
        Self { blob, state }
    }

    #[must_use]
    pub fn state(&self) -> &StatsState {
        &self.state
    }

    /// Records one completed poll cycle that found `new_items` new records.
    ///
    /// `hour` is the local hour of day the cycle completed in.
    pub fn record_cycle(&mut self, new_items: u64, hour: u32, now: DateTime<Utc>) -> &StatsState {
        let idx = usize::try_from(hour).unwrap_or(0) % HOURS_PER_DAY;
        self.state.hourly_new_item_counts[idx] =
            self.state.hourly_new_item_counts[idx].saturating_add(new_items);
        self.state.total_checks = self.state.total_checks.saturating_add(1);
        self.state.total_new_items = self.state.total_new_items.saturating_add(new_items);
        if new_items > 0 {
            self.state.last_new_item_at = Some(now);
        }
        self.persist_logged();
        &self.state
    }

    /// Records one cycle-level failure.
    pub fn record_error(&mut self, now: DateTime<Utc>) -> &StatsState {
        self.state.error_count = self.state.error_count.saturating_add(1);
        self.state.last_error_at = Some(now);
        self.persist_logged();
        &self.state
    }

    fn persist_logged(&self) {
        if let Err(e) = self.persist() {
            tracing::error!(error = %e, "failed to persist stats store");
        }
    }

    fn persist(&self) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&self.state)?;
        self.blob.save(&bytes)
    }
}
