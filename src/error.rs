/*!
 * defines the [CoreError] and [Result] types used across the crate.
*/

use thiserror::Error;

/// Errors raised by the partition-expiration and merge-read subsystems.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A split's shape can't be served by the reader it was handed to, e.g.
    /// `before_files` given to the merge path.
    #[error("invalid split: {0}")]
    InvalidSplit(String),

    /// A snapshot id lies within `[earliest, latest]` but is missing.
    #[error("snapshot {id} is gone (available range [{earliest}, {latest}])")]
    SnapshotGone {
        /// The id that was looked up.
        id: i64,
        /// Earliest snapshot id still tracked.
        earliest: i64,
        /// Latest snapshot id still tracked.
        latest: i64,
    },

    /// A snapshot id lies outside `[earliest, latest]`.
    #[error("snapshot {id} is out of range (available range [{earliest}, {latest}])")]
    SnapshotOutOfRange {
        /// The id that was looked up.
        id: i64,
        /// Earliest snapshot id still tracked.
        earliest: i64,
        /// Latest snapshot id still tracked.
        latest: i64,
    },

    /// A partition timestamp could not be parsed with the configured formatter.
    #[error("could not parse partition timestamp: {0}")]
    Unparseable(String),

    /// A commit targeted a partition that has already been expired.
    #[error("writing to expired partition(s): {}", .partitions.join(", "))]
    WritingToExpiredPartition {
        /// The offending partitions, formatted as `name=value,...`.
        partitions: Vec<String>,
    },

    /// Optimistic-concurrency retry budget was exhausted.
    #[error("commit conflicted after {attempts} attempt(s)")]
    CommitConflict {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// An option is invalid or incompatible with the table's configuration.
    #[error("invalid configuration: {0}")]
    ConfigError(String),

    /// A file-system level failure from the injected `FileIO`.
    #[error("io error: {0}")]
    IoError(#[from] object_store::Error),

    /// Fallback for internal glue (serde, avro) that doesn't need its own variant.
    #[error("{0}")]
    Message(String),
}

impl CoreError {
    /// Build a [`CoreError::WritingToExpiredPartition`] from formatted partition strings.
    pub fn writing_to_expired(partitions: Vec<String>) -> Self {
        CoreError::WritingToExpiredPartition { partitions }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Message(err.to_string())
    }
}

impl From<apache_avro::Error> for CoreError {
    fn from(err: apache_avro::Error) -> Self {
        CoreError::Message(err.to_string())
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        CoreError::Message(err.to_string())
    }
}

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, CoreError>;
