/*!
The file-format layer, consumed by the core (spec.md §1: "a
`KeyValueFileReaderFactory` for opening data files"; §4.4 "File Reader
Factory").

This crate treats columnar decoding as an external collaborator — it never
parses a data file's bytes itself. What it owns is the contract a file
reader must honor (key-only projection, best-effort predicate pushdown with
an "unpushed" escape hatch, deletion-vector suppression already applied on
emission) and the logic in [`crate::reader`] that wires a decoded stream to
that contract.
*/
use async_trait::async_trait;

use crate::error::Result;
use crate::filter::Predicate;
use crate::model::data_file::DataFileMeta;
use crate::model::value::{KeyValue, RowType};

/// Decodes one data file into [`KeyValue`] records. Implemented by the
/// file-format layer (spec.md §1); this crate loads a file's full contents
/// eagerly rather than modeling a lazily-pulled stream, since the merge
/// engine needs to peek across runs anyway (spec.md §4.6).
#[async_trait]
pub trait KeyValueFileReaderFactory: Send + Sync {
    /// Open `file` and decode it into records shaped by `project_type`.
    ///
    /// `filter`, if given, is pushed down on a best-effort basis; any
    /// sub-predicate the layer cannot evaluate itself must be echoed back
    /// in the returned `unpushed` list so the caller applies it instead
    /// (spec.md §4.4).
    async fn open(
        &self,
        file: &DataFileMeta,
        project_type: &RowType,
        filter: Option<&Predicate>,
    ) -> Result<OpenedFile>;
}

/// The result of opening a data file: its decoded records plus whichever
/// part of the requested filter the file-format layer could not evaluate.
pub struct OpenedFile {
    /// Decoded records, in file order.
    pub records: Vec<KeyValue>,
    /// Sub-predicates the reader must still apply itself.
    pub unpushed: Option<Predicate>,
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// An in-memory [`KeyValueFileReaderFactory`] backed by a fixed table of
    /// file path to records, for tests. Always reports the whole filter as
    /// unpushed, matching a conservative file-format layer.
    #[derive(Default)]
    pub struct FakeFileReaderFactory {
        files: Mutex<HashMap<String, Vec<KeyValue>>>,
        last_project_type: Mutex<Option<RowType>>,
    }

    impl FakeFileReaderFactory {
        pub fn new() -> Self {
            FakeFileReaderFactory::default()
        }

        pub fn insert(&self, path: &str, records: Vec<KeyValue>) {
            self.files.lock().unwrap().insert(path.to_string(), records);
        }

        /// The `project_type` passed to the most recent [`Self::open`] call.
        pub fn last_project_type(&self) -> Option<RowType> {
            self.last_project_type.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl KeyValueFileReaderFactory for FakeFileReaderFactory {
        async fn open(
            &self,
            file: &DataFileMeta,
            project_type: &RowType,
            filter: Option<&Predicate>,
        ) -> Result<OpenedFile> {
            let records = self
                .files
                .lock()
                .unwrap()
                .get(&file.file_path)
                .cloned()
                .unwrap_or_default();
            *self.last_project_type.lock().unwrap() = Some(project_type.clone());
            Ok(OpenedFile {
                records,
                unpushed: filter.cloned(),
            })
        }
    }
}
