/*!
Starting and follow-up scanners (spec.md §9, "Cooperative lookup across
startup modes"; SPEC_FULL.md §3).

The repository this crate is distilled from exposes several
starting-scanner strategies for where a read begins, plus a second
capability for advancing through subsequent snapshots once a read is
already running. Both are specified here as thin capabilities over the
Snapshot & Schema Registry rather than folded into the Split Read Façade,
since they decide *which* snapshot to read, not how to read it.
*/
use async_trait::async_trait;

use crate::catalog::SnapshotManager;
use crate::error::{CoreError, Result};

/// Whether a scan should read the full table state at a snapshot, or only
/// the changelog delta a later snapshot carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Read the complete table contents as of the resolved snapshot.
    Full,
    /// Read only the changelog entries the resolved snapshot carries.
    Incremental,
}

/// Chooses which snapshot a read starts from (spec.md §9).
#[derive(Debug, Clone, Copy)]
pub enum StartingScanner {
    /// Start at a specific, already-known snapshot id.
    FromSnapshot(i64),
    /// Start at the earliest snapshot committed at or after `timestamp_ms`.
    FromTimestamp(i64),
    /// Start at the table's current latest snapshot.
    Latest,
}

impl StartingScanner {
    /// Resolve this strategy against `snapshot_manager` into a concrete
    /// `(snapshot_id, scan_mode)` pair.
    pub async fn resolve(&self, snapshot_manager: &dyn SnapshotManager) -> Result<(i64, ScanMode)> {
        match self {
            StartingScanner::FromSnapshot(id) => {
                snapshot_manager.try_get(*id).await?;
                Ok((*id, ScanMode::Full))
            }
            StartingScanner::FromTimestamp(timestamp_ms) => {
                for id in snapshot_manager.iter_snapshots().await? {
                    if let Some(snapshot) = snapshot_manager.try_get(id).await? {
                        if snapshot.timestamp_ms >= *timestamp_ms {
                            return Ok((id, ScanMode::Full));
                        }
                    }
                }
                let latest = snapshot_manager
                    .latest_id()
                    .await?
                    .ok_or_else(|| CoreError::Message("no snapshot at or after timestamp".to_string()))?;
                Ok((latest, ScanMode::Full))
            }
            StartingScanner::Latest => {
                let latest = snapshot_manager
                    .latest_id()
                    .await?
                    .ok_or_else(|| CoreError::Message("table has no snapshots yet".to_string()))?;
                Ok((latest, ScanMode::Full))
            }
        }
    }
}

/// Advances a running read through subsequent snapshots once it has
/// started (spec.md §9).
#[async_trait]
pub trait FollowUpScanner: Send + Sync {
    /// The next snapshot after `current`, if any, and whether it carries a
    /// changelog the caller should read incrementally.
    async fn next(&self, current: i64) -> Result<Option<(i64, ScanMode)>>;
}

/// A [`FollowUpScanner`] over a [`SnapshotManager`]'s id sequence.
pub struct SnapshotFollowUpScanner<'a> {
    snapshot_manager: &'a dyn SnapshotManager,
}

impl<'a> SnapshotFollowUpScanner<'a> {
    /// Build a follow-up scanner over `snapshot_manager`.
    pub fn new(snapshot_manager: &'a dyn SnapshotManager) -> Self {
        SnapshotFollowUpScanner { snapshot_manager }
    }
}

#[async_trait]
impl<'a> FollowUpScanner for SnapshotFollowUpScanner<'a> {
    async fn next(&self, current: i64) -> Result<Option<(i64, ScanMode)>> {
        let candidate = current + 1;
        match self.snapshot_manager.try_get(candidate).await {
            Ok(Some(snapshot)) => {
                let mode = if snapshot.changelog_manifest_list.is_some() {
                    ScanMode::Incremental
                } else {
                    ScanMode::Full
                };
                Ok(Some((candidate, mode)))
            }
            Ok(None) => Ok(None),
            Err(CoreError::SnapshotOutOfRange { .. }) | Err(CoreError::SnapshotGone { .. }) => Ok(None),
            Err(other) => Err(other),
        }
    }
}
