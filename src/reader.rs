/*!
File Reader Factory (spec.md §4.4): opens a data file with a projected
value type and optional filter, applying the deletion vector on the fly.
*/
use crate::catalog::file_reader_factory::KeyValueFileReaderFactory;
use crate::dv::DeletionVectorFactory;
use crate::error::{CoreError, Result};
use crate::filter::Predicate;
use crate::model::data_file::DataFileMeta;
use crate::model::value::{KeyValue, RowType};

/// Builds per-file readers honoring the contract in spec.md §4.4: key-only
/// projection when requested, best-effort filter pushdown with a
/// post-decode fallback for the unpushed remainder, and deletion-vector
/// suppression applied before the records are handed to the caller.
pub struct FileReaderFactory<'a> {
    inner: &'a dyn KeyValueFileReaderFactory,
    dv_factory: &'a DeletionVectorFactory<'a>,
    key_type: RowType,
    value_type: RowType,
    filter: Option<Predicate>,
    project_keys_only: bool,
}

impl<'a> FileReaderFactory<'a> {
    /// Build a factory. `key_type` is always materialized, per the "key
    /// fields plus required internal fields" contract. When
    /// `project_keys_only` is set, the file is opened against an empty
    /// value projection regardless of what `value_type` contains — the
    /// caller (Split Read Façade) sets this when its pushdown value type
    /// ends up empty, e.g. a filter-only or key-only read (spec.md §4.4,
    /// §4.7).
    pub fn build(
        inner: &'a dyn KeyValueFileReaderFactory,
        dv_factory: &'a DeletionVectorFactory<'a>,
        key_type: RowType,
        value_type: RowType,
        filter: Option<Predicate>,
        project_keys_only: bool,
    ) -> Self {
        FileReaderFactory {
            inner,
            dv_factory,
            key_type,
            value_type,
            filter,
            project_keys_only,
        }
    }

    /// Open `file`, returning its records in file order with deletions
    /// already suppressed and any unpushed filter remainder applied.
    pub async fn open(&self, file: &DataFileMeta) -> Result<Vec<KeyValue>> {
        let effective_value_type = if self.project_keys_only {
            RowType::default()
        } else {
            self.value_type.clone()
        };
        let opened = self
            .inner
            .open(file, &effective_value_type, self.filter.as_ref())
            .await?;
        let dv = self.dv_factory.get(&file.file_path).await?;

        let mut out = Vec::with_capacity(opened.records.len());
        for (position, record) in opened.records.into_iter().enumerate() {
            if dv.contains(position as u32) {
                continue;
            }
            if let Some(unpushed) = &opened.unpushed {
                let matches = unpushed.evaluate(&|name| {
                    record
                        .key
                        .field(&self.key_type, name)
                        .or_else(|| record.value.field(&effective_value_type, name))
                });
                if !matches {
                    continue;
                }
            }
            out.push(record);
        }
        Ok(out)
    }
}

/// Returns [`CoreError::InvalidSplit`] if `project_type` has no fields at
/// all — an empty projection can never be satisfied (defensive guard used
/// by [`crate::split_reader`]).
pub fn require_non_empty_projection(project_type: &RowType) -> Result<()> {
    if project_type.fields.is_empty() {
        Err(CoreError::InvalidSplit("projection has no fields".to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::file_io::ObjectStoreFileIO;
    use crate::catalog::file_reader_factory::tests_support::FakeFileReaderFactory;
    use crate::filter::CompareOp;
    use crate::model::value::{DataField, GenericRow, PrimitiveType, RowKind, Value};
    use object_store::memory::InMemory;

    fn key_row_type() -> RowType {
        RowType {
            fields: vec![DataField {
                id: 1,
                name: "id".into(),
                field_type: PrimitiveType::Int,
                nullable: false,
            }],
        }
    }

    fn value_row_type() -> RowType {
        RowType {
            fields: vec![DataField {
                id: 2,
                name: "value".into(),
                field_type: PrimitiveType::Int,
                nullable: true,
            }],
        }
    }

    fn kv(id: i32, value: i32) -> KeyValue {
        KeyValue::new(
            GenericRow(vec![Value::Int(id)]),
            GenericRow(vec![Value::Int(value)]),
            0,
            RowKind::Insert,
        )
    }

    fn file(path: &str) -> DataFileMeta {
        DataFileMeta {
            file_path: path.to_string(),
            level: 0,
            min_key: GenericRow(vec![Value::Int(0)]),
            max_key: GenericRow(vec![Value::Int(10)]),
            key_count: 3,
            value_stats: Default::default(),
            min_sequence_number: 0,
            max_sequence_number: 2,
            file_size: 10,
        }
    }

    #[tokio::test]
    async fn test_applies_unpushed_filter_post_decode() {
        let store = ObjectStoreFileIO::new(InMemory::new());
        let dv_factory = DeletionVectorFactory::empty(&store);
        let backing = FakeFileReaderFactory::new();
        backing.insert("f", vec![kv(1, 5), kv(2, 50), kv(3, 500)]);

        let filter = Predicate::Compare {
            field: "value".to_string(),
            op: CompareOp::GtEq,
            value: Value::Int(100),
        };
        let factory = FileReaderFactory::build(
            &backing,
            &dv_factory,
            key_row_type(),
            value_row_type(),
            Some(filter),
            false,
        );
        let records = factory.open(&file("f")).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, GenericRow(vec![Value::Int(500)]));
    }

    #[tokio::test]
    async fn test_project_keys_only_opens_with_an_empty_value_type() {
        let store = ObjectStoreFileIO::new(InMemory::new());
        let dv_factory = DeletionVectorFactory::empty(&store);
        let backing = FakeFileReaderFactory::new();
        backing.insert("f", vec![kv(1, 5)]);

        let factory = FileReaderFactory::build(&backing, &dv_factory, key_row_type(), value_row_type(), None, true);
        let records = factory.open(&file("f")).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, GenericRow(vec![Value::Int(1)]));
        assert_eq!(backing.last_project_type(), Some(RowType::default()));
    }
}
