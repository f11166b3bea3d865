//! End-to-end reproductions of the partition-expiration timeline and
//! idempotent-commit-replay behaviors, exercised through the public
//! `Table`/`CommitCoordinator`/`PartitionExpireController` surface.
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use tablecore::catalog::{PartitionHandler, PartitionStatistics};
use tablecore::commit::{CommitCoordinator, PreparedCommit};
use tablecore::config::CoreOptions;
use tablecore::catalog::snapshot_manager::InMemorySnapshotManager;
use tablecore::catalog::schema_manager::StaticSchemaManager;
use tablecore::error::Result;
use tablecore::model::data_file::{DataFileMeta, FieldStats};
use tablecore::model::manifest::{ManifestEntry, Status};
use tablecore::model::partition::Partition;
use tablecore::model::schema::TableSchema;
use tablecore::model::snapshot::{CommitKind, Snapshot};
use tablecore::model::value::{DataField, GenericRow, PrimitiveType, RowType, Value};
use tablecore::table::Table;
use tablecore::catalog::file_io::ObjectStoreFileIO;
use object_store::memory::InMemory;

#[derive(Default)]
struct RecordingHandler {
    dropped: Mutex<Vec<Partition>>,
}

#[async_trait]
impl PartitionHandler for RecordingHandler {
    async fn create_partitions(&self, _partitions: &[Partition]) -> Result<()> {
        Ok(())
    }
    async fn drop_partitions(&self, partitions: &[Partition]) -> Result<()> {
        self.dropped.lock().unwrap().extend(partitions.iter().cloned());
        Ok(())
    }
    async fn alter_partitions(&self, _statistics: &[PartitionStatistics]) -> Result<()> {
        Ok(())
    }
    async fn mark_done_partitions(&self, _partitions: &[Partition]) -> Result<()> {
        Ok(())
    }
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

fn schema() -> TableSchema {
    TableSchema {
        schema_id: 0,
        fields: RowType {
            fields: vec![
                DataField {
                    id: 1,
                    name: "f0".into(),
                    field_type: PrimitiveType::String,
                    nullable: false,
                },
                DataField {
                    id: 2,
                    name: "id".into(),
                    field_type: PrimitiveType::Int,
                    nullable: false,
                },
            ],
        },
        primary_key: vec!["id".into()],
        partition_keys: vec!["f0".into()],
    }
}

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

fn entry(partition_value: &str, seq: usize) -> ManifestEntry {
    ManifestEntry {
        status: Status::Added,
        partition: vec![("f0".to_string(), partition_value.to_string())],
        bucket: 0,
        file: DataFileMeta {
            file_path: format!("{partition_value}/{seq}"),
            level: 0,
            min_key: GenericRow(vec![Value::Int(0)]),
            max_key: GenericRow(vec![Value::Int(0)]),
            key_count: 1,
            value_stats: FieldStats::default(),
            min_sequence_number: 0,
            max_sequence_number: 0,
            file_size: 1,
        },
    }
}

async fn live_partitions(manager: &InMemorySnapshotManager, latest_id: i64) -> HashSet<String> {
    manager
        .list_entries(latest_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.status != Status::Deleted)
        .map(|e| Partition::new(e.partition).display())
        .collect()
}

/// Basic expire timeline: two-day expiration, one-day check interval,
/// partitions `20230101`/`20230103`/`20230105`, four calls at increasing
/// timestamps removing partitions exactly as they cross the retention
/// window, with a skipped no-op call in between.
#[tokio::test]
async fn test_basic_expire_timeline() {
    let manager = InMemorySnapshotManager::new();
    manager.seed(
        Snapshot {
            id: 0,
            commit_kind: CommitKind::Append,
            schema_id: 0,
            base_manifest_list: String::new(),
            delta_manifest_list: "delta-0".to_string(),
            changelog_manifest_list: None,
            commit_identifier: 0,
            commit_user: "writer".to_string(),
            timestamp_ms: 0,
        },
        vec![
            entry("20230101", 0),
            entry("20230101", 1),
            entry("20230103", 0),
            entry("20230103", 1),
            entry("20230105", 0),
        ],
    );

    let handler = RecordingHandler::default();
    let mut options = CoreOptions::default();
    options.partition_keys = vec!["f0".to_string()];
    options.partition_expiration_time = Some(Duration::from_secs(2 * 86400));
    options.partition_expiration_check_interval = Some(Duration::from_secs(86400));
    let schema_manager = StaticSchemaManager::new(schema());
    let table = Table::new(
        &ObjectStoreFileIO::new(InMemory::new()),
        &schema_manager,
        &manager,
        &handler,
        options,
    );
    let controller = table.expire_controller("expire").await.unwrap().unwrap();

    assert!(controller.expire(at(2023, 1, 3), 1).await.unwrap());
    assert_eq!(handler.dropped.lock().unwrap().len(), 0);

    assert!(controller.expire(at(2023, 1, 5), 2).await.unwrap());
    {
        let dropped = handler.dropped.lock().unwrap();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].get("f0"), Some("20230101"));
    }
    let latest = manager.latest_id().await.unwrap().unwrap();
    assert_eq!(
        live_partitions(&manager, latest).await,
        HashSet::from(["f0=20230103".to_string(), "f0=20230105".to_string()])
    );

    assert!(!controller.expire(at(2023, 1, 6), 3).await.unwrap());
    assert_eq!(handler.dropped.lock().unwrap().len(), 1);

    assert!(controller.expire(at(2023, 1, 8), 4).await.unwrap());
    let dropped: HashSet<String> = handler
        .dropped
        .lock()
        .unwrap()
        .iter()
        .map(|p| p.display())
        .collect();
    assert_eq!(
        dropped,
        HashSet::from([
            "f0=20230101".to_string(),
            "f0=20230103".to_string(),
            "f0=20230105".to_string(),
        ])
    );
    let final_latest = manager.latest_id().await.unwrap().unwrap();
    assert!(live_partitions(&manager, final_latest).await.is_empty());
}

/// A writer prepares more commits than it has so far published; replaying
/// the full set through `filter_and_commit` does not raise and leaves the
/// latest snapshot at the last message's commit identifier.
#[tokio::test]
async fn test_replaying_full_commit_set_after_partial_publish_is_idempotent() {
    let manager = InMemorySnapshotManager::new();
    let coordinator = CommitCoordinator::new(&manager);
    let empty = HashSet::new();

    let prepared: Vec<PreparedCommit> = (0..20)
        .map(|i| PreparedCommit {
            commit_identifier: i,
            commit_user: "writer".to_string(),
            commit_kind: CommitKind::Append,
            schema_id: 0,
            messages: vec![],
            dropped_partitions: vec![],
            changelog_manifest_list: None,
        })
        .collect();

    coordinator
        .filter_and_commit(prepared[..5].to_vec(), &empty, 0)
        .await
        .unwrap();

    let all = coordinator
        .filter_and_commit(prepared.clone(), &empty, 1)
        .await
        .unwrap();

    assert_eq!(all.len(), 20);
    assert_eq!(all.last().unwrap().commit_identifier, 19);
    assert_eq!(manager.latest().await.unwrap().unwrap().commit_identifier, 19);
    assert_eq!(manager.iter_snapshots().await.unwrap().len(), 20);
}
