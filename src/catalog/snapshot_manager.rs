/*!
Versioned metadata lookup and commit publication (spec.md §4.1 "Snapshot &
Schema Registry", §4.9 "Commit Coordinator").

This is the one external trait with real logic behind its default-provided
methods: the CAS-based `try_commit` and the snapshot-log lookup
`filter_and_commit` needs are mechanical enough to ship a correct in-memory
implementation alongside the trait.
*/
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{CoreError, Result};
use crate::model::manifest::{self, ManifestEntry};
use crate::model::snapshot::Snapshot;

/// Versioned snapshot storage and lookup (spec.md §4.1).
#[async_trait]
pub trait SnapshotManager: Send + Sync {
    /// Look up a snapshot by id.
    ///
    /// Returns `Ok(None)` only when `id` cannot be resolved because no
    /// snapshot has ever existed yet (an empty table); otherwise a missing
    /// id in-range is a [`CoreError::SnapshotGone`] and an out-of-range id
    /// is a [`CoreError::SnapshotOutOfRange`] (spec.md §4.1).
    async fn try_get(&self, id: i64) -> Result<Option<Snapshot>>;
    /// The oldest snapshot id still retained, if any.
    async fn earliest_id(&self) -> Result<Option<i64>>;
    /// The newest published snapshot id, if any.
    async fn latest_id(&self) -> Result<Option<i64>>;
    /// The newest published snapshot, if any.
    async fn latest(&self) -> Result<Option<Snapshot>> {
        match self.latest_id().await? {
            Some(id) => self.try_get(id).await,
            None => Ok(None),
        }
    }
    /// All retained snapshot ids, oldest first.
    async fn iter_snapshots(&self) -> Result<Vec<i64>>;
    /// Find a previously published snapshot by its writer-provided commit
    /// identifier and user, for idempotent retry (spec.md §4.9).
    async fn find_by_commit(&self, commit_identifier: i64, commit_user: &str) -> Result<Option<Snapshot>>;
    /// Publish `snapshot` if it is still based on the current `latest`
    /// snapshot id (compare-and-swap), storing `entries` as the manifest
    /// listing for this new snapshot; otherwise fail with
    /// [`CoreError::CommitConflict`] so the caller can retry against a
    /// fresh base (spec.md §5, "single writer ... serialized by optimistic
    /// identifier-conflict detection"). Callers are responsible for folding
    /// the base snapshot's surviving entries into `entries` themselves
    /// (spec.md §4.8 step 3) — this trait only persists what it is given.
    async fn try_commit(&self, expected_base: Option<i64>, snapshot: Snapshot, entries: Vec<ManifestEntry>) -> Result<()>;
    /// The manifest entries listed by a snapshot's base and delta manifest
    /// lists, used by the expire controller to enumerate live partitions
    /// and by the planner to build sections (spec.md §4.8 step 3).
    async fn list_entries(&self, snapshot_id: i64) -> Result<Vec<ManifestEntry>>;
}

/// An in-memory [`SnapshotManager`] for tests and single-process
/// deployments, storing snapshots and their manifest entries by id.
#[derive(Default)]
pub struct InMemorySnapshotManager {
    state: Mutex<InMemoryState>,
}

#[derive(Default)]
struct InMemoryState {
    snapshots: HashMap<i64, Snapshot>,
    entries: HashMap<i64, Vec<u8>>,
    order: Vec<i64>,
}

impl InMemorySnapshotManager {
    /// An empty manager with no snapshots.
    pub fn new() -> Self {
        InMemorySnapshotManager::default()
    }

    /// Publish a snapshot unconditionally with its manifest entries,
    /// bypassing the CAS check. Used to seed test fixtures.
    pub fn seed(&self, snapshot: Snapshot, entries: Vec<ManifestEntry>) {
        let mut state = self.state.lock().unwrap();
        let encoded = manifest::write_entries(&entries).unwrap_or_default();
        state.order.push(snapshot.id);
        state.entries.insert(snapshot.id, encoded);
        state.snapshots.insert(snapshot.id, snapshot);
    }
}

#[async_trait]
impl SnapshotManager for InMemorySnapshotManager {
    async fn try_get(&self, id: i64) -> Result<Option<Snapshot>> {
        let state = self.state.lock().unwrap();
        if state.order.is_empty() {
            return Ok(None);
        }
        if let Some(snapshot) = state.snapshots.get(&id) {
            return Ok(Some(snapshot.clone()));
        }
        let earliest = *state.order.first().unwrap();
        let latest = *state.order.last().unwrap();
        if id < earliest || id > latest {
            Err(CoreError::SnapshotOutOfRange {
                id,
                earliest,
                latest,
            })
        } else {
            Err(CoreError::SnapshotGone {
                id,
                earliest,
                latest,
            })
        }
    }

    async fn earliest_id(&self) -> Result<Option<i64>> {
        Ok(self.state.lock().unwrap().order.first().copied())
    }

    async fn latest_id(&self) -> Result<Option<i64>> {
        Ok(self.state.lock().unwrap().order.last().copied())
    }

    async fn iter_snapshots(&self) -> Result<Vec<i64>> {
        Ok(self.state.lock().unwrap().order.clone())
    }

    async fn find_by_commit(&self, commit_identifier: i64, commit_user: &str) -> Result<Option<Snapshot>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.snapshots.get(id))
            .find(|s| s.commit_identifier == commit_identifier && s.commit_user == commit_user)
            .cloned())
    }

    async fn try_commit(&self, expected_base: Option<i64>, snapshot: Snapshot, entries: Vec<ManifestEntry>) -> Result<()> {
        let encoded = manifest::write_entries(&entries)?;
        let mut state = self.state.lock().unwrap();
        let current = state.order.last().copied();
        if current != expected_base {
            return Err(CoreError::CommitConflict { attempts: 1 });
        }
        state.order.push(snapshot.id);
        state.entries.insert(snapshot.id, encoded);
        state.snapshots.insert(snapshot.id, snapshot);
        Ok(())
    }

    async fn list_entries(&self, snapshot_id: i64) -> Result<Vec<ManifestEntry>> {
        let bytes = self.state.lock().unwrap().entries.get(&snapshot_id).cloned();
        match bytes {
            Some(bytes) if !bytes.is_empty() => Ok(manifest::read_entries(&bytes[..])?),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::snapshot::CommitKind;

    fn snapshot(id: i64, commit_identifier: i64) -> Snapshot {
        Snapshot {
            id,
            commit_kind: CommitKind::Append,
            schema_id: 0,
            base_manifest_list: format!("base-{id}"),
            delta_manifest_list: format!("delta-{id}"),
            changelog_manifest_list: None,
            commit_identifier,
            commit_user: "writer".to_string(),
            timestamp_ms: 0,
        }
    }

    #[tokio::test]
    async fn test_empty_manager_returns_none() {
        let manager = InMemorySnapshotManager::new();
        assert_eq!(manager.latest().await.unwrap(), None);
        assert_eq!(manager.try_get(0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_commit_cas_and_conflict() {
        let manager = InMemorySnapshotManager::new();
        manager.try_commit(None, snapshot(1, 0), vec![]).await.unwrap();
        assert_eq!(manager.latest_id().await.unwrap(), Some(1));

        let conflict = manager.try_commit(None, snapshot(2, 1), vec![]).await;
        assert!(matches!(conflict, Err(CoreError::CommitConflict { .. })));

        manager.try_commit(Some(1), snapshot(2, 1), vec![]).await.unwrap();
        assert_eq!(manager.latest_id().await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_out_of_range_and_gone() {
        let manager = InMemorySnapshotManager::new();
        manager.try_commit(None, snapshot(5, 0), vec![]).await.unwrap();
        manager.try_commit(Some(5), snapshot(6, 1), vec![]).await.unwrap();

        let result = manager.try_get(10).await;
        assert!(matches!(result, Err(CoreError::SnapshotOutOfRange { .. })));
    }

    #[tokio::test]
    async fn test_find_by_commit_is_idempotent_lookup() {
        let manager = InMemorySnapshotManager::new();
        manager.try_commit(None, snapshot(1, 42), vec![]).await.unwrap();
        let found = manager.find_by_commit(42, "writer").await.unwrap();
        assert_eq!(found.map(|s| s.id), Some(1));
        assert_eq!(manager.find_by_commit(42, "someone-else").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_committed_entries_round_trip_through_the_manifest_codec() {
        use crate::model::data_file::{DataFileMeta, FieldStats};
        use crate::model::manifest::Status;
        use crate::model::value::{GenericRow, Value};

        let manager = InMemorySnapshotManager::new();
        let entries = vec![ManifestEntry {
            status: Status::Added,
            partition: vec![],
            bucket: 0,
            file: DataFileMeta {
                file_path: "f".to_string(),
                level: 0,
                min_key: GenericRow(vec![Value::Int(1)]),
                max_key: GenericRow(vec![Value::Int(1)]),
                key_count: 1,
                value_stats: FieldStats::default(),
                min_sequence_number: 0,
                max_sequence_number: 0,
                file_size: 1,
            },
        }];
        manager.try_commit(None, snapshot(0, 0), entries.clone()).await.unwrap();
        assert_eq!(manager.list_entries(0).await.unwrap(), entries);
        assert_eq!(manager.list_entries(1).await.unwrap(), Vec::new());
    }
}
