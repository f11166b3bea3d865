/*!
Partition Expire Controller (spec.md §4.8): a periodic scan that finds
expired partitions, drops them in bounded batches, and notifies the
external catalog.
*/
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::catalog::{PartitionHandler, SnapshotManager};
use crate::commit::{CommitCoordinator, PreparedCommit};
use crate::config::CoreOptions;
use crate::error::{CoreError, Result};
use crate::model::manifest::Status;
use crate::model::partition::{Partition, PartitionCodec, PartitionSchema};
use crate::model::snapshot::CommitKind;

/// Periodic expiration pass over a table's live partitions (spec.md §4.8).
///
/// Boundary convention: a partition is expired when `derived_timestamp +
/// expiration_time` is *strictly* before `now`, and a check is skipped when
/// the elapsed time since the last check is *at most* `check_interval`. Both
/// choices favor inclusive "not yet due", picked to match the worked
/// expiration timeline in scenario S1.
pub struct PartitionExpireController<'a> {
    snapshot_manager: &'a dyn SnapshotManager,
    partition_handler: &'a dyn PartitionHandler,
    partition_schema: PartitionSchema,
    schema_id: i32,
    commit_user: String,
    check_interval: Duration,
    expiration_time: Duration,
    timestamp_formatter: String,
    timestamp_pattern: Option<String>,
    batch_size: Option<usize>,
    max_expires: Option<usize>,
    last_check_time: Mutex<Option<NaiveDateTime>>,
}

impl<'a> PartitionExpireController<'a> {
    /// Build a controller from table options, or `None` if
    /// `partition.expiration-time` is not configured (expiration disabled).
    pub fn from_options(
        options: &CoreOptions,
        partition_schema: PartitionSchema,
        schema_id: i32,
        commit_user: impl Into<String>,
        snapshot_manager: &'a dyn SnapshotManager,
        partition_handler: &'a dyn PartitionHandler,
    ) -> Option<Self> {
        let expiration_time = options.partition_expiration_time?;
        Some(PartitionExpireController {
            snapshot_manager,
            partition_handler,
            partition_schema,
            schema_id,
            commit_user: commit_user.into(),
            check_interval: options.check_interval(),
            expiration_time,
            timestamp_formatter: options.timestamp_formatter().to_string(),
            timestamp_pattern: options.partition_timestamp_pattern.clone(),
            batch_size: options.partition_expiration_batch_size,
            max_expires: options.partition_expiration_max_num,
            last_check_time: Mutex::new(None),
        })
    }

    /// Run one expiration pass at wall-clock time `now`, publishing any
    /// drop commits under `commit_identifier` (spec.md §4.8).
    pub async fn expire(&self, now: NaiveDateTime, commit_identifier: i64) -> Result<bool> {
        {
            let mut last = self.last_check_time.lock().unwrap();
            if let Some(prev) = *last {
                let interval = chrono::Duration::from_std(self.check_interval)
                    .map_err(|e| CoreError::Message(e.to_string()))?;
                if now.signed_duration_since(prev) <= interval {
                    debug!("expire pass skipped, check interval not elapsed");
                    return Ok(false);
                }
            }
            *last = Some(now);
        }

        let mut expired = self.expired_as_of(now).await?;
        if let Some(max) = self.max_expires {
            expired.truncate(max);
        }

        let batch_size = self.batch_size.unwrap_or(expired.len().max(1)).max(1);
        let coordinator = CommitCoordinator::new(self.snapshot_manager);
        let no_expired_guard = HashSet::new();
        let timestamp_ms = now.timestamp_millis();

        for chunk in expired.chunks(batch_size) {
            let partitions: Vec<Partition> = chunk.iter().map(|(_, p)| p.clone()).collect();
            info!(count = partitions.len(), "expiring partition chunk");
            let prepared = PreparedCommit {
                commit_identifier,
                commit_user: self.commit_user.clone(),
                commit_kind: CommitKind::Overwrite,
                schema_id: self.schema_id,
                messages: vec![],
                dropped_partitions: partitions.clone(),
                changelog_manifest_list: None,
            };
            coordinator.commit(prepared, &no_expired_guard, timestamp_ms).await?;
            self.partition_handler.drop_partitions(&partitions).await?;
        }

        Ok(true)
    }

    /// Partitions that would be expired as of `now`, with no check-interval
    /// gate, batching, or side effects — the set a writer should consult
    /// before [`crate::commit::CommitCoordinator::commit`] (spec.md §4.8,
    /// "Write guard"). Entries are [`Partition::display`] strings, matching
    /// the shape `commit`'s `expired_partitions` parameter expects.
    pub async fn currently_expired(&self, now: NaiveDateTime) -> Result<HashSet<String>> {
        Ok(self
            .expired_as_of(now)
            .await?
            .into_iter()
            .map(|(_, partition)| partition.display())
            .collect())
    }

    async fn expired_as_of(&self, now: NaiveDateTime) -> Result<Vec<(NaiveDateTime, Partition)>> {
        let Some(latest_id) = self.snapshot_manager.latest_id().await? else {
            info!("expire scan found no snapshots, nothing to do");
            return Ok(Vec::new());
        };
        let entries = self.snapshot_manager.list_entries(latest_id).await?;

        let mut seen = HashSet::new();
        let mut live_partitions = Vec::new();
        for entry in &entries {
            if entry.status == Status::Deleted {
                continue;
            }
            if seen.insert(entry.partition.clone()) {
                live_partitions.push(entry.partition.clone());
            }
        }

        let expiration_time = chrono::Duration::from_std(self.expiration_time)
            .map_err(|e| CoreError::Message(e.to_string()))?;
        let mut expired: Vec<(NaiveDateTime, Partition)> = Vec::new();
        for raw in live_partitions {
            let partition = Partition::new(raw);
            match PartitionCodec::extract_timestamp(
                &self.partition_schema,
                &partition,
                self.timestamp_pattern.as_deref(),
                &self.timestamp_formatter,
            ) {
                Ok(ts) => {
                    if ts + expiration_time < now {
                        expired.push((ts, partition));
                    }
                }
                Err(CoreError::Unparseable(reason)) => {
                    debug!(partition = partition.display(), reason, "partition timestamp unparseable, preserving");
                }
                Err(other) => return Err(other),
            }
        }

        expired.sort_by_key(|(ts, _)| *ts);
        Ok(expired)
    }
}
