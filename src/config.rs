/*!
[`CoreOptions`] collects the table-level configuration keys this crate reads
(spec.md §6, "Configuration options"). Resources (`FileIO`, `IOManager`) and
per-call state are passed separately; this struct carries only values.
*/
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::util::parse_duration;

/// Direction records are ordered in within a key, either by the sequence
/// number or by a user-defined sequence field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smaller values/sequence numbers sort first.
    Ascending,
    /// Larger values/sequence numbers sort first.
    Descending,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Ascending
    }
}

/// Table-level configuration recognised by the partition-expiration and
/// merge-read subsystems.
#[derive(Debug, Clone, Default)]
pub struct CoreOptions {
    /// `partition.expiration-time`. Enables expiration when set.
    pub partition_expiration_time: Option<Duration>,
    /// `partition.expiration-check-interval`, default `1 h`.
    pub partition_expiration_check_interval: Option<Duration>,
    /// `partition.timestamp-formatter`, default `yyyyMMdd`.
    pub partition_timestamp_formatter: Option<String>,
    /// `partition.timestamp-pattern`. Absent means "use the first partition column".
    pub partition_timestamp_pattern: Option<String>,
    /// `partition.expiration-batch-size`, default unbounded.
    pub partition_expiration_batch_size: Option<usize>,
    /// `partition.expiration-max-num`, default unbounded.
    pub partition_expiration_max_num: Option<usize>,
    /// `metastore.partitioned-table`.
    pub metastore_partitioned_table: bool,
    /// `write-only`. Disables compaction and snapshot expiration on the writer.
    pub write_only: bool,
    /// `sequence.field`, comma-separated field names.
    pub sequence_field: Vec<String>,
    /// `sequence.field.sort-order`.
    pub sequence_field_sort_order: SortDirection,
    /// Names of the partition-key columns. Used only to validate
    /// `partition.expiration-time` against a non-partitioned table.
    pub partition_keys: Vec<String>,
}

impl CoreOptions {
    /// The check interval, defaulting to one hour.
    pub fn check_interval(&self) -> Duration {
        self.partition_expiration_check_interval
            .unwrap_or(Duration::from_secs(3600))
    }

    /// The timestamp formatter pattern, defaulting to `yyyyMMdd`.
    pub fn timestamp_formatter(&self) -> &str {
        self.partition_timestamp_formatter
            .as_deref()
            .unwrap_or("yyyyMMdd")
    }

    /// Validate this configuration against the table shape it is attached
    /// to. Mirrors spec.md §6: expiration requires at least one partition
    /// column.
    pub fn validate(&self) -> Result<()> {
        if self.partition_expiration_time.is_some() && self.partition_keys.is_empty() {
            return Err(CoreError::ConfigError(
                "Can not set 'partition.expiration-time' for non-partitioned table".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a `(key, value)` pair from a table-properties map, using the
    /// string keys from spec.md §6. Unknown keys are ignored (forward
    /// compatible with options this engine doesn't read).
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "partition.expiration-time" => {
                self.partition_expiration_time = Some(parse_duration(value)?)
            }
            "partition.expiration-check-interval" => {
                self.partition_expiration_check_interval = Some(parse_duration(value)?)
            }
            "partition.timestamp-formatter" => {
                self.partition_timestamp_formatter = Some(value.to_string())
            }
            "partition.timestamp-pattern" => {
                self.partition_timestamp_pattern = Some(value.to_string())
            }
            "partition.expiration-batch-size" => {
                self.partition_expiration_batch_size = Some(
                    value
                        .parse()
                        .map_err(|_| CoreError::ConfigError(format!("invalid batch size: {value}")))?,
                )
            }
            "partition.expiration-max-num" => {
                self.partition_expiration_max_num = Some(
                    value
                        .parse()
                        .map_err(|_| CoreError::ConfigError(format!("invalid max-num: {value}")))?,
                )
            }
            "metastore.partitioned-table" => {
                self.metastore_partitioned_table = value.parse().unwrap_or(false)
            }
            "write-only" => self.write_only = value.parse().unwrap_or(false),
            "sequence.field" => {
                self.sequence_field = value.split(',').map(|s| s.trim().to_string()).collect()
            }
            "sequence.field.sort-order" => {
                self.sequence_field_sort_order = match value {
                    "descending" => SortDirection::Descending,
                    _ => SortDirection::Ascending,
                }
            }
            _ => {}
        }
        Ok(())
    }
}
