/*!
A unit of read work (spec.md §3, "DataSplit").
*/
use serde::{Deserialize, Serialize};

use crate::model::data_file::DataFileMeta;
use crate::model::deletion::DeletionFile;
use crate::model::partition::Partition;

/// A bucket value signalling that bucket assignment is deferred to a later
/// stage of the pipeline (spec.md §3, §4.7).
pub const POSTPONE_BUCKET: i32 = -1;

/// A unit of read work: a partition/bucket pair, its data files, and
/// whatever deletion files and changelog state apply to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSplit {
    /// The partition this split reads from.
    pub partition: Vec<(String, String)>,
    /// The bucket within the partition, or [`POSTPONE_BUCKET`].
    pub bucket: i32,
    /// The data files to read.
    pub data_files: Vec<DataFileMeta>,
    /// Deletion files applying to `data_files`, if any.
    pub deletion_files: Option<Vec<DeletionFile>>,
    /// Files superseded by `data_files`, present only for changelog/streaming
    /// reads. Non-empty `before_files` are rejected by the merge path
    /// (spec.md §4.7).
    pub before_files: Vec<DataFileMeta>,
    /// Whether this split is part of a streaming (continuous) read.
    pub is_streaming: bool,
}

impl DataSplit {
    /// The partition this split belongs to.
    pub fn partition(&self) -> Partition {
        Partition::new(self.partition.clone())
    }

    /// Whether this split must take the no-merge path (spec.md §4.7):
    /// streaming reads and postponed-bucket reads never merge.
    pub fn is_no_merge(&self) -> bool {
        self.is_streaming || self.bucket == POSTPONE_BUCKET
    }
}
