/*!
Commit Coordinator — narrow surface (spec.md §4.9): publishes OVERWRITE/
APPEND/COMPACT snapshots under optimistic identifier-conflict retry, and
replays idempotently from the snapshot log.
*/
use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, warn};

use crate::catalog::SnapshotManager;
use crate::error::{CoreError, Result};
use crate::model::commit_message::CommitMessage;
use crate::model::manifest::{ManifestEntry, Status};
use crate::model::partition::Partition;
use crate::model::snapshot::{CommitKind, Snapshot};

/// Bounded exponential backoff applied between `Conflicted → Preparing`
/// retries (spec.md §5, "Timeouts"; SPEC_FULL.md §3).
#[derive(Debug, Clone, Copy)]
pub struct BackoffConfig {
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_attempts: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        BackoffConfig {
            base_delay: Duration::from_millis(50),
            multiplier: 2.0,
            max_attempts: 5,
        }
    }
}

impl BackoffConfig {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.mul_f64(self.multiplier.powi(attempt as i32))
    }
}

/// A writer's already-prepared change, ready to publish as a snapshot.
#[derive(Debug, Clone)]
pub struct PreparedCommit {
    /// Writer-provided monotonic tag correlating this prepared commit with
    /// the snapshot that eventually publishes it.
    pub commit_identifier: i64,
    /// Identity of the writer preparing this commit.
    pub commit_user: String,
    /// APPEND, COMPACT, or OVERWRITE (partition drops are always OVERWRITE).
    pub commit_kind: CommitKind,
    /// Schema this commit was prepared under.
    pub schema_id: i32,
    /// Per-(partition, bucket) file changes this commit publishes (spec.md
    /// §6, "Persisted state layout"). The partitions named here are checked
    /// against the expired set before publication (spec.md §4.8, "Write
    /// guard").
    pub messages: Vec<CommitMessage>,
    /// Whole partitions retired by this commit with no replacement files —
    /// the expire controller's drop commits use this instead of a
    /// `CommitMessage` (spec.md §4.8).
    pub dropped_partitions: Vec<Partition>,
    /// Changelog manifest list, if changelog production is enabled.
    pub changelog_manifest_list: Option<String>,
}

/// Fold the base snapshot's `previous` entries with this commit's
/// `messages`/`dropped_partitions` into the new snapshot's full entry list
/// (spec.md §4.8 step 3, §6 "Persisted state layout"). Survivors are
/// re-tagged [`Status::Existing`]; entries whose partition is dropped, or
/// whose file was consumed by a message's `compacted_before`/
/// `compact_increment.compacted_files`, are tagged [`Status::Deleted`];
/// each message's `new_files`/`compacted_after`/`compact_increment.compacted_after`
/// become freshly [`Status::Added`] entries.
fn fold_entries(previous: Vec<ManifestEntry>, messages: &[CommitMessage], dropped_partitions: &[Partition]) -> Vec<ManifestEntry> {
    let mut consumed: HashSet<String> = HashSet::new();
    for message in messages {
        for file in message
            .data_increment
            .compacted_before
            .iter()
            .chain(&message.compact_increment.compacted_files)
        {
            consumed.insert(file.file_path.clone());
        }
    }

    let mut out: Vec<ManifestEntry> = previous
        .into_iter()
        .map(|mut entry| {
            if dropped_partitions.contains(&entry.partition()) || consumed.contains(&entry.file.file_path) {
                entry.status = Status::Deleted;
            } else {
                entry.status = Status::Existing;
            }
            entry
        })
        .collect();

    for message in messages {
        let new_files = message
            .data_increment
            .new_files
            .iter()
            .chain(&message.data_increment.compacted_after)
            .chain(&message.compact_increment.compacted_after);
        for file in new_files {
            out.push(ManifestEntry {
                status: Status::Added,
                partition: message.partition.clone(),
                bucket: message.bucket,
                file: file.clone(),
            });
        }
    }

    out
}

/// Publishes snapshots for prepared commits (spec.md §4.9).
pub struct CommitCoordinator<'a> {
    snapshot_manager: &'a dyn SnapshotManager,
    backoff: BackoffConfig,
}

impl<'a> CommitCoordinator<'a> {
    /// Build a coordinator with the default backoff.
    pub fn new(snapshot_manager: &'a dyn SnapshotManager) -> Self {
        CommitCoordinator {
            snapshot_manager,
            backoff: BackoffConfig::default(),
        }
    }

    /// Override the retry backoff.
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Publish one prepared commit, retrying on identifier conflict up to
    /// `backoff.max_attempts` times. Rejects (terminal, no retry) if any
    /// message's partition is in `expired_partitions` (spec.md §4.8, "Write
    /// guard"). `expired_partitions` entries are [`Partition::display`]
    /// strings. The published snapshot's manifest entries are folded from
    /// the base snapshot's surviving entries plus this commit's own changes
    /// (see [`fold_entries`]), so `list_entries` on the result is always
    /// correct without further action by the caller.
    pub async fn commit(
        &self,
        prepared: PreparedCommit,
        expired_partitions: &HashSet<String>,
        timestamp_ms: i64,
    ) -> Result<Snapshot> {
        let target_partitions: Vec<Partition> = prepared
            .messages
            .iter()
            .map(|m| Partition::new(m.partition.clone()))
            .collect();
        let offending: Vec<String> = target_partitions
            .iter()
            .map(Partition::display)
            .filter(|p| expired_partitions.contains(p))
            .collect();
        if !offending.is_empty() {
            warn!(partitions = ?offending, "rejecting commit targeting expired partition(s)");
            return Err(CoreError::writing_to_expired(offending));
        }

        let mut attempt = 0;
        loop {
            let base = self.snapshot_manager.latest_id().await?;
            let id = base.map(|b| b + 1).unwrap_or(0);
            let previous_entries = match base {
                Some(base_id) => self.snapshot_manager.list_entries(base_id).await?,
                None => Vec::new(),
            };
            let entries = fold_entries(previous_entries, &prepared.messages, &prepared.dropped_partitions);
            let snapshot = Snapshot {
                id,
                commit_kind: prepared.commit_kind,
                schema_id: prepared.schema_id,
                base_manifest_list: base
                    .map(|b| format!("manifest-list-{b}"))
                    .unwrap_or_default(),
                delta_manifest_list: format!("delta-{id}"),
                changelog_manifest_list: prepared.changelog_manifest_list.clone(),
                commit_identifier: prepared.commit_identifier,
                commit_user: prepared.commit_user.clone(),
                timestamp_ms,
            };

            match self.snapshot_manager.try_commit(base, snapshot.clone(), entries).await {
                Ok(()) => {
                    debug!(snapshot_id = id, attempt, "commit succeeded");
                    return Ok(snapshot);
                }
                Err(CoreError::CommitConflict { .. }) => {
                    attempt += 1;
                    if attempt >= self.backoff.max_attempts {
                        return Err(CoreError::CommitConflict { attempts: attempt });
                    }
                    let delay = self.backoff.delay_for_attempt(attempt - 1);
                    debug!(attempt, ?delay, "commit conflicted, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// Replay a batch of prepared commits idempotently (spec.md §4.9,
    /// `filter_and_commit`). A message whose `(commit_identifier,
    /// commit_user)` already has a published snapshot is treated as already
    /// succeeded and is not re-applied — so this never raises for messages
    /// whose target partitions were expired *after* they were originally
    /// committed, only for genuinely new commits against an expired target.
    pub async fn filter_and_commit(
        &self,
        messages: Vec<PreparedCommit>,
        expired_partitions: &HashSet<String>,
        timestamp_ms: i64,
    ) -> Result<Vec<Snapshot>> {
        let mut out = Vec::with_capacity(messages.len());
        for message in messages {
            if let Some(existing) = self
                .snapshot_manager
                .find_by_commit(message.commit_identifier, &message.commit_user)
                .await?
            {
                debug!(
                    commit_identifier = message.commit_identifier,
                    "commit already published, skipping"
                );
                out.push(existing);
                continue;
            }
            out.push(self.commit(message, expired_partitions, timestamp_ms).await?);
        }
        Ok(out)
    }
}
