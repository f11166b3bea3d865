/*!
Split Read Façade (spec.md §4.7): dispatches to the merge or no-merge path
and manages projection so pushdown and outer projection preserve
merge-function correctness.
*/
use crate::catalog::file_reader_factory::KeyValueFileReaderFactory;
use crate::catalog::FileIO;
use crate::dv::DeletionVectorFactory;
use crate::error::{CoreError, Result};
use crate::filter::{split_by_columns, Predicate};
use crate::merge::{MergeEngine, Reducer, UdsComparator};
use crate::model::split::DataSplit;
use crate::model::value::{GenericRow, KeyValue, RowType};
use crate::planner::plan_sections;
use crate::reader::FileReaderFactory;

/// No-op placeholder for the merge sorter's spill manager (spec.md §5,
/// `IOManager`). Spilling to disk is a resource-management concern of the
/// caller's execution environment; this crate's in-memory merge never
/// needs to spill, so the configuration surface is kept without a real
/// implementation behind it.
pub trait IoManager: Send + Sync {}

/// An [`IoManager`] that never spills.
pub struct NoSpillIoManager;
impl IoManager for NoSpillIoManager {}

/// Builds a reader for one [`DataSplit`] (spec.md §4.7).
pub struct SplitReadFacade {
    full_key_type: RowType,
    read_type: RowType,
    read_key_type: RowType,
    full_value_type: RowType,
    filter: Option<Predicate>,
    keep_delete: bool,
    sequence_fields: Vec<String>,
}

impl SplitReadFacade {
    /// Start building a façade over a table whose primary-key columns are
    /// `full_key_type` and whose full value columns are `full_value_type`.
    /// Defaults to reading every column with no filter.
    pub fn new(full_key_type: RowType, full_value_type: RowType) -> Self {
        SplitReadFacade {
            read_type: full_value_type.clone(),
            read_key_type: full_key_type.clone(),
            full_key_type,
            full_value_type,
            filter: None,
            keep_delete: false,
            sequence_fields: Vec::new(),
        }
    }

    /// The value columns the caller wants in the output.
    pub fn with_read_type(mut self, read_type: RowType) -> Self {
        self.read_type = read_type;
        self
    }

    /// The key columns the caller wants in the output (spec.md §4.6, "Key
    /// projection is applied after merging"). Internally, files are always
    /// decoded against the full key type — this only narrows what's
    /// projected into the final result.
    pub fn with_read_key_type(mut self, read_key_type: RowType) -> Self {
        self.read_key_type = read_key_type;
        self
    }

    /// A predicate to push down on a best-effort basis.
    pub fn with_filter(mut self, filter: Predicate) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Fields the merge engine's UDS depends on; included in the pushdown
    /// projection even if `read_type` omits them, then trimmed from the
    /// final output (spec.md §4.6, "Sequence-field completion").
    pub fn with_sequence_fields(mut self, fields: Vec<String>) -> Self {
        self.sequence_fields = fields;
        self
    }

    /// Keep DELETE-kind reduced records in the output instead of dropping
    /// them (spec.md §4.6).
    pub fn force_keep_delete(mut self) -> Self {
        self.keep_delete = true;
        self
    }

    /// Accept a spill manager for the merge sorter. No-op in this
    /// implementation (see [`IoManager`]).
    pub fn with_io_manager(self, _io_manager: &dyn IoManager) -> Self {
        self
    }

    fn pushdown_value_type(&self) -> RowType {
        let mut names = self.read_type.field_names();
        for field in &self.sequence_fields {
            if !names.contains(field) {
                names.push(field.clone());
            }
        }
        self.full_value_type.project(&names)
    }

    /// Build the reader for `split` and return its fully merged/concatenated
    /// records, honoring the dispatch rules of spec.md §4.7.
    pub async fn create_reader(
        &self,
        split: &DataSplit,
        io: &dyn FileIO,
        file_reader_factory: &dyn KeyValueFileReaderFactory,
        reducer: &dyn Reducer,
        uds: Option<UdsComparator>,
        sort_order: crate::config::SortDirection,
    ) -> Result<Vec<KeyValue>> {
        if !split.before_files.is_empty() {
            return Err(CoreError::InvalidSplit(
                "merge path does not accept before-files".to_string(),
            ));
        }

        let dv_factory = DeletionVectorFactory::new(io, split.deletion_files.clone().unwrap_or_default());
        let pushdown_value_type = self.pushdown_value_type();
        let project_keys_only = pushdown_value_type.fields.is_empty();

        let merged = if split.is_no_merge() {
            let reader = FileReaderFactory::build(
                file_reader_factory,
                &dv_factory,
                self.full_key_type.clone(),
                pushdown_value_type.clone(),
                self.filter.clone(),
                project_keys_only,
            );
            let mut out = Vec::new();
            for file in &split.data_files {
                out.extend(reader.open(file).await?);
            }
            out
        } else {
            let key_columns = self.full_key_type.field_names();
            let split_filter = self
                .filter
                .as_ref()
                .map(|f| split_by_columns(f, &key_columns));

            let sections = plan_sections(split.data_files.clone(), crate::model::value::compare_rows);
            let mut merged = Vec::new();
            let engine = MergeEngine {
                reducer,
                uds,
                sort_order,
                keep_delete: self.keep_delete,
            };
            for section in &sections {
                let pushdown_filter = if section.is_overlapping() {
                    split_filter.as_ref().and_then(|s| s.key_filter.clone())
                } else {
                    self.filter.clone()
                };
                let reader = FileReaderFactory::build(
                    file_reader_factory,
                    &dv_factory,
                    self.full_key_type.clone(),
                    pushdown_value_type.clone(),
                    pushdown_filter,
                    project_keys_only,
                );
                let mut per_file = std::collections::HashMap::new();
                for run in &section.runs {
                    for file in &run.files {
                        per_file.insert(file.file_path.clone(), reader.open(file).await?);
                    }
                }
                merged.extend(engine.merge_section(section, |path| {
                    per_file.get(path).cloned().unwrap_or_default()
                }));
            }
            merged
        };

        Ok(merged
            .into_iter()
            .map(|record| KeyValue::new(
                project_value(&record.key, &self.full_key_type, &self.read_key_type),
                project_value(&record.value, &pushdown_value_type, &self.read_type),
                record.seq_number,
                record.row_kind,
            ))
            .collect())
    }
}

fn project_value(value: &GenericRow, from: &RowType, to: &RowType) -> GenericRow {
    value.project(from, to)
}
