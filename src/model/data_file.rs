/*!
Describes a sealed, on-disk data file (spec.md §3, "DataFileMeta").

Column-level statistics (`null_value_counts`, `lower_bounds`, ...) are kept
in a per-field-id-map shape; columnar-format-specific fields like physical
column sizes or split offsets are out of scope here — they describe a
file-format layer this crate treats as an external collaborator.
*/
use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::value::GenericRow;

/// Per-column statistics kept alongside a data file, keyed by field id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    /// Number of null values per field id.
    pub null_value_counts: HashMap<i32, i64>,
    /// Lower bound per field id, serialized the way the field's comparator expects.
    pub lower_bounds: HashMap<i32, Vec<u8>>,
    /// Upper bound per field id.
    pub upper_bounds: HashMap<i32, Vec<u8>>,
}

/// Metadata describing one sealed data file.
///
/// Files at `level == 0` may overlap in key range with one another. Files
/// at `level >= 1` within the same level are non-overlapping (spec.md §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFileMeta {
    /// Path to the file, relative to the table/partition root.
    pub file_path: String,
    /// LSM level the file belongs to.
    pub level: i32,
    /// Smallest key present in the file.
    pub min_key: GenericRow,
    /// Largest key present in the file.
    pub max_key: GenericRow,
    /// Number of keys (rows) in the file.
    pub key_count: i64,
    /// Column-level value statistics.
    pub value_stats: FieldStats,
    /// Smallest sequence number written to the file.
    pub min_sequence_number: i64,
    /// Largest sequence number written to the file.
    pub max_sequence_number: i64,
    /// File size in bytes.
    pub file_size: i64,
}

impl DataFileMeta {
    /// Whether this file's key range `[min_key, max_key]` overlaps `other`'s
    /// under the given comparator.
    pub fn overlaps(&self, other: &DataFileMeta, cmp: impl Fn(&GenericRow, &GenericRow) -> Ordering) -> bool {
        cmp(&self.min_key, &other.max_key) != Ordering::Greater
            && cmp(&other.min_key, &self.max_key) != Ordering::Greater
    }
}
