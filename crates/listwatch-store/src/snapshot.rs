//! Last-known top record per target, and change detection against it.
//!
//! Every mutation is written through to the backing [`BlobStore`] before
//! [`SnapshotStore::detect_change`] returns, so a crash right after an alert
//! never replays that alert on restart.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use listwatch_core::{fingerprint, Record};
use serde::{Deserialize, Serialize};

use crate::blob::BlobStore;
use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub fingerprint: String,
    pub record_name: String,
    pub record_price: u64,
    pub last_observed_at: DateTime<Utc>,
}

impl SnapshotEntry {
    fn from_record(record: &Record, now: DateTime<Utc>) -> Self {
        Self {
            fingerprint: fingerprint(record),
            record_name: record.name.clone(),
            record_price: record.price,
            last_observed_at: now,
        }
    }
}

pub struct SnapshotStore {
    blob: Box<dyn BlobStore>,
    entries: BTreeMap<String, SnapshotEntry>,
}

impl SnapshotStore {
    /// Loads existing snapshots. Missing, unreadable, or corrupt data starts
    /// the store empty instead of failing.
    #[must_use]
    pub fn load(blob: Box<dyn BlobStore>) -> Self {
        let entries = match blob.load() {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(error = %e, "snapshot store is corrupt; starting empty");
                    BTreeMap::new()
                }
            },
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read snapshot store; starting empty");
                BTreeMap::new()
            }
        };
        tracing::debug!(targets = entries.len(), "snapshot store loaded");
        Self { blob, entries }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SnapshotEntry> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compares the top record of `sample` with the stored snapshot for `key`.
    ///
    /// Returns `[sample[0]]` when the top record differs from the stored one,
    /// and an empty list otherwise: on an empty sample, on the first
    /// observation of a target (stored as baseline), and when unchanged.
    pub fn detect_change(&mut self, key: &str, sample: &[Record]) -> Vec<Record> {
        self.detect_change_at(key, sample, Utc::now())
    }

    /// [`SnapshotStore::detect_change`] with an explicit observation time.
    pub fn detect_change_at(
        &mut self,
        key: &str,
        sample: &[Record],
        now: DateTime<Utc>,
    ) -> Vec<Record> {
        let Some(top) = sample.first() else {
            tracing::warn!(target_key = key, "empty sample passed to change detection; ignoring");
            return Vec::new();
        };

        let fresh = SnapshotEntry::from_record(top, now);
        let changes = match self.entries.get_mut(key) {
            None => {
                tracing::info!(
                    target_key = key,
                    fingerprint = %fresh.fingerprint,
                    name = %fresh.record_name,
                    "baseline stored"
                );
                self.entries.insert(key.to_owned(), fresh);
                Vec::new()
            }
            Some(entry) if entry.fingerprint == fresh.fingerprint => {
                entry.last_observed_at = now;
                tracing::debug!(target_key = key, fingerprint = %entry.fingerprint, "top record unchanged");
                Vec::new()
            }
            Some(entry) => {
                tracing::info!(
                    target_key = key,
                    previous = %entry.fingerprint,
                    current = %fresh.fingerprint,
                    name = %fresh.record_name,
                    price = fresh.record_price,
                    "new top record detected"
                );
                *entry = fresh;
                vec![top.clone()]
            }
        };

        if let Err(e) = self.persist() {
            tracing::error!(target_key = key, error = %e, "failed to persist snapshot store");
        }
        changes
    }

    fn persist(&self) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&self.entries)?;
        self.blob.save(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::blob::MemoryBlobStore;

    fn record(name: &str, price: u64) -> Record {
        Record {
            name: name.to_string(),
            price,
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    fn store() -> (SnapshotStore, MemoryBlobStore) {
        let blob = MemoryBlobStore::new();
        (SnapshotStore::load(Box::new(blob.clone())), blob)
    }

    #[test]
    fn first_observation_is_baseline_without_change() {
        let (mut store, blob) = store();
        let sample = vec![record("Canon EOS R6", 150_000), record("Nikon Z6", 98_000)];

        assert!(store.detect_change_at("Cameras_mirrorless", &sample, at(9)).is_empty());
        assert!(store.detect_change_at("Cameras_mirrorless", &sample, at(10)).is_empty());

        let entry = store.get("Cameras_mirrorless").unwrap();
        assert_eq!(entry.record_name, "Canon EOS R6");
        assert_eq!(entry.last_observed_at, at(10));
        assert!(blob.contents().unwrap().contains("Canon EOS R6"));
    }

    #[test]
    fn new_top_record_is_reported_once() {
        let (mut store, _) = store();
        let r6 = vec![record("Canon EOS R6", 150_000)];
        let r5 = vec![record("Canon EOS R5", 200_000), record("Canon EOS R6", 150_000)];

        store.detect_change_at("k", &r6, at(9));
        let changes = store.detect_change_at("k", &r5, at(10));
        assert_eq!(changes, vec![record("Canon EOS R5", 200_000)]);
        assert!(store.detect_change_at("k", &r5, at(11)).is_empty());
        assert_eq!(
            store.get("k").unwrap().fingerprint,
            fingerprint(&record("Canon EOS R5", 200_000))
        );
    }

    #[test]
    fn price_change_alone_counts_as_change() {
        let (mut store, _) = store();
        store.detect_change_at("k", &[record("Canon EOS R6", 150_000)], at(9));
        let changes = store.detect_change_at("k", &[record("Canon EOS R6", 140_000)], at(10));
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn empty_sample_is_a_no_op() {
        let (mut store, blob) = store();
        assert!(store.detect_change_at("k", &[], at(9)).is_empty());
        assert!(store.is_empty());
        assert!(blob.contents().is_none(), "nothing to persist");
    }

    #[test]
    fn targets_are_tracked_independently() {
        let (mut store, _) = store();
        store.detect_change_at("a", &[record("Canon EOS R6", 150_000)], at(9));
        assert!(store
            .detect_change_at("b", &[record("Canon EOS R5", 200_000)], at(9))
            .is_empty());
        assert!(store
            .detect_change_at("a", &[record("Canon EOS R6", 150_000)], at(10))
            .is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn state_survives_reload() {
        let blob = MemoryBlobStore::new();
        {
            let mut first = SnapshotStore::load(Box::new(blob.clone()));
            first.detect_change_at("k", &[record("Canon EOS R6", 150_000)], at(9));
        }
        let mut reloaded = SnapshotStore::load(Box::new(blob));
        assert!(reloaded
            .detect_change_at("k", &[record("Canon EOS R6", 150_000)], at(10))
            .is_empty());
        assert_eq!(
            reloaded
                .detect_change_at("k", &[record("Canon EOS R5", 200_000)], at(11))
                .len(),
            1
        );
    }

    #[test]
    fn corrupt_blob_starts_empty() {
        let blob = MemoryBlobStore::with_contents(b"{not json");
        let mut store = SnapshotStore::load(Box::new(blob.clone()));
        assert!(store.is_empty());
        store.detect_change_at("k", &[record("Canon EOS R6", 150_000)], at(9));
        assert!(blob.contents().unwrap().contains("\"k\""));
    }

    #[test]
    fn persisted_format_is_keyed_by_target() {
        let (mut store, blob) = store();
        store.detect_change_at("Cameras_mirrorless", &[record("Canon EOS R6", 150_000)], at(9));
        let json: serde_json::Value = serde_json::from_str(&blob.contents().unwrap()).unwrap();
        let entry = &json["Cameras_mirrorless"];
        assert_eq!(entry["record_name"], "Canon EOS R6");
        assert_eq!(entry["record_price"], 150_000);
        assert_eq!(entry["fingerprint"].as_str().unwrap().len(), 8);
    }

    #[test]
    fn failed_write_keeps_change_in_memory() {
        let mut store = SnapshotStore::load(Box::new(crate::blob::FailingBlobStore));
        let r6 = vec![record("Canon EOS R6", 150_000)];
        let r5 = vec![record("Canon EOS R5", 200_000), record("Canon EOS R6", 150_000)];

        assert!(store.detect_change_at("k", &r6, at(9)).is_empty());
        let changes = store.detect_change_at("k", &r5, at(10));

        assert_eq!(changes, vec![record("Canon EOS R5", 200_000)]);
        assert_eq!(store.len(), 1);
        let entry = store.get("k").unwrap();
        assert_eq!(entry.record_name, "Canon EOS R5");
        assert_eq!(entry.last_observed_at, at(10));
    }
}
