/*!
Catalog-side partition notification, called by the core (spec.md §6,
"PartitionHandler").
*/
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::partition::Partition;

/// Observed statistics for a partition, passed to `alter_partitions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionStatistics {
    /// The partition these statistics describe.
    pub partition: Vec<(String, String)>,
    /// Total number of files across all buckets in the partition.
    pub file_count: i64,
    /// Total size in bytes across all buckets in the partition.
    pub file_size_in_bytes: i64,
    /// Total number of rows across all buckets in the partition.
    pub row_count: i64,
}

/// Notifies an external catalog of partition lifecycle events. Implemented
/// by the catalog, called by the core (spec.md §6) — most notably by the
/// expire controller after each `OVERWRITE` drop commit (spec.md §4.8 step 7b).
#[async_trait]
pub trait PartitionHandler: Send + Sync {
    /// Register newly observed partitions with the catalog.
    async fn create_partitions(&self, partitions: &[Partition]) -> Result<()>;
    /// Remove partitions from the catalog after they have been dropped from
    /// the table.
    async fn drop_partitions(&self, partitions: &[Partition]) -> Result<()>;
    /// Update catalog-held statistics for partitions.
    async fn alter_partitions(&self, statistics: &[PartitionStatistics]) -> Result<()>;
    /// Mark partitions as complete (no further writes expected), for
    /// catalogs that track partition readiness.
    async fn mark_done_partitions(&self, partitions: &[Partition]) -> Result<()>;
    /// Release any resources held by this handler.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;
    use std::sync::Mutex;

    /// An in-memory [`PartitionHandler`] recording every call it receives,
    /// for scenario tests that assert on drop notifications (spec.md §8,
    /// S1 "Dropped-partition notifications").
    #[derive(Default)]
    pub struct RecordingPartitionHandler {
        pub dropped: Mutex<Vec<Partition>>,
    }

    #[async_trait]
    impl PartitionHandler for RecordingPartitionHandler {
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
}

#[cfg(test)]
mod tests {
    use super::tests_support::RecordingPartitionHandler;
    use super::*;

    #[tokio::test]
    async fn test_recording_handler_tracks_drops() {
        let handler = RecordingPartitionHandler::default();
        let partition = Partition::new(vec![("f0".to_string(), "20230101".to_string())]);
        handler.drop_partitions(&[partition.clone()]).await.unwrap();
        assert_eq!(handler.dropped.lock().unwrap().len(), 1);
    }
}
