/*!
Merge Engine (spec.md §4.6): sort-merge reader across sorted runs within a
section, parameterized by a key comparator, an optional user-defined
sequence comparator (UDS), and a merge function.
*/
use std::cmp::Ordering;

use crate::config::SortDirection;
use crate::model::value::{compare_rows, GenericRow, KeyValue, RowKind, Value};
use crate::planner::Section;

/// Folds every record sharing a key into a single output record. Records
/// are handed to `reduce` already ordered per spec.md §4.6 (UDS-or-sequence
/// within the key, configured direction, append-order tiebreak).
pub trait Reducer: Send + Sync {
    /// Reduce an ordered, same-key group into one output record.
    fn reduce(&self, ordered: &[KeyValue]) -> KeyValue;
}

/// Keeps only the last record in the ordered group — "last write wins".
pub struct DeduplicateReducer;

impl Reducer for DeduplicateReducer {
    fn reduce(&self, ordered: &[KeyValue]) -> KeyValue {
        ordered.last().expect("reduce called on empty group").clone()
    }
}

/// Folds the group left-to-right, keeping the latest non-null value in
/// each column and the row_kind/seq_number of the last record applied.
pub struct PartialUpdateReducer;

impl Reducer for PartialUpdateReducer {
    fn reduce(&self, ordered: &[KeyValue]) -> KeyValue {
        let mut merged = ordered[0].value.clone();
        for record in &ordered[1..] {
            for (slot, incoming) in merged.0.iter_mut().zip(record.value.0.iter()) {
                if !matches!(incoming, Value::Null) {
                    *slot = incoming.clone();
                }
            }
        }
        let last = ordered.last().unwrap();
        KeyValue::new(last.key.clone(), merged, last.seq_number, last.row_kind)
    }
}

/// A user-defined sequence comparator: orders two same-key records by
/// something other than `seq_number` (spec.md §4.6, "UDS").
pub type UdsComparator = fn(&KeyValue, &KeyValue) -> Ordering;

/// Parameters controlling how one section is merged.
pub struct MergeEngine<'a> {
    pub reducer: &'a dyn Reducer,
    pub uds: Option<UdsComparator>,
    pub sort_order: SortDirection,
    /// Whether DELETE-kind reduced records are kept in the output
    /// (spec.md §4.6, "Delete handling"; forced on by
    /// `Table::force_keep_delete`, spec.md §4.7).
    pub keep_delete: bool,
}

impl<'a> MergeEngine<'a> {
    /// Merge a section's already-decoded file records into one ordered
    /// stream of reduced KeyValues.
    ///
    /// `records_for` resolves a file path to its decoded records (opened
    /// separately via [`crate::reader::FileReaderFactory`]); each run's
    /// files are assumed individually key-sorted and, combined, still
    /// sorted, so a single stable sort over the concatenation realizes the
    /// same grouping a k-way merge over the runs would produce.
    pub fn merge_section(
        &self,
        section: &Section,
        mut records_for: impl FnMut(&str) -> Vec<KeyValue>,
    ) -> Vec<KeyValue> {
        let mut all = Vec::new();
        for run in &section.runs {
            for file in &run.files {
                all.extend(records_for(&file.file_path));
            }
        }
        all.sort_by(|a, b| compare_rows(&a.key, &b.key));

        let mut out = Vec::new();
        let mut group_start = 0;
        while group_start < all.len() {
            let mut group_end = group_start + 1;
            while group_end < all.len()
                && compare_rows(&all[group_start].key, &all[group_end].key) == Ordering::Equal
            {
                group_end += 1;
            }
            let mut group: Vec<KeyValue> = all[group_start..group_end].to_vec();
            self.order_group(&mut group);
            let reduced = self.reducer.reduce(&group);
            if !(reduced.row_kind == RowKind::Delete && !self.keep_delete) {
                out.push(reduced);
            }
            group_start = group_end;
        }
        out
    }

    fn order_group(&self, group: &mut [KeyValue]) {
        group.sort_by(|a, b| {
            let ordering = match self.uds {
                Some(uds) => uds(a, b),
                None => a.seq_number.cmp(&b.seq_number),
            };
            let ordering = match self.sort_order {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            ordering.then_with(|| a.seq_number.cmp(&b.seq_number))
        });
    }
}

/// Whether two rows carry the same key — convenience used by reducers and
/// tests that need to assert group boundaries explicitly.
pub fn same_key(a: &GenericRow, b: &GenericRow) -> bool {
    compare_rows(a, b) == Ordering::Equal
}
