/*!
The persisted shape of a writer's prepared commit (spec.md §6, "Persisted
state layout").
*/
use serde::{Deserialize, Serialize};

use crate::model::data_file::DataFileMeta;

/// Files added and replaced by a regular write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataIncrement {
    /// Newly written files.
    pub new_files: Vec<DataFileMeta>,
    /// Files this increment's compaction (if any) consumed.
    pub compacted_before: Vec<DataFileMeta>,
    /// Files this increment's compaction (if any) produced.
    pub compacted_after: Vec<DataFileMeta>,
}

/// Files added and replaced by a background compaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompactIncrement {
    /// Files consumed by the compaction.
    pub compacted_files: Vec<DataFileMeta>,
    /// Files present before the compaction, kept for audit/rollback.
    pub compacted_before: Vec<DataFileMeta>,
    /// Files produced by the compaction.
    pub compacted_after: Vec<DataFileMeta>,
}

/// One writer's prepared change to a single (partition, bucket), ready to
/// be folded into a snapshot by the commit coordinator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitMessage {
    /// Partition this message writes to.
    pub partition: Vec<(String, String)>,
    /// Bucket within the partition.
    pub bucket: i32,
    /// Total number of buckets configured for the partition at write time.
    pub total_buckets: i32,
    /// Regular write changes.
    pub data_increment: DataIncrement,
    /// Compaction changes, if compaction ran as part of this commit.
    pub compact_increment: CompactIncrement,
}

impl CommitMessage {
    /// Whether this message carries no file changes at all.
    pub fn is_empty(&self) -> bool {
        self.data_increment.new_files.is_empty()
            && self.data_increment.compacted_before.is_empty()
            && self.data_increment.compacted_after.is_empty()
            && self.compact_increment.compacted_files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_message() {
        let message = CommitMessage::default();
        assert!(message.is_empty());
    }
}
