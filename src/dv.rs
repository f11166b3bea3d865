/*!
Deletion-Vector Factory (spec.md §4.3): produces per-file bitmaps of
tombstoned row positions, caching them for the lifetime of a read.

Grounded on the delete-file-index pattern used by comparable Rust
lakehouse readers — a mutable builder populated once, then frozen into an
immutable lookup shared across the read — adapted here to a simple
interior-mutable cache since this factory is scoped to a single read rather
than shared across an open-ended session.
*/
use std::collections::HashMap;
use std::sync::Mutex;

use crate::catalog::FileIO;
use crate::error::Result;
use crate::model::deletion::{DeletionFile, DeletionVector};

/// Builds and caches [`DeletionVector`]s for the data files of one split
/// (spec.md §4.3). Vectors must be applied after format-level row decoding
/// but before predicate application on the merge path, and before emission
/// on the no-merge path — callers in [`crate::reader`] and
/// [`crate::split_reader`] enforce that ordering.
pub struct DeletionVectorFactory<'a> {
    io: &'a dyn FileIO,
    deletion_files: HashMap<String, DeletionFile>,
    cache: Mutex<HashMap<String, DeletionVector>>,
}

impl<'a> DeletionVectorFactory<'a> {
    /// Build a factory over `deletion_files`, keyed by the data file path
    /// each applies to.
    pub fn new(io: &'a dyn FileIO, deletion_files: Vec<DeletionFile>) -> Self {
        let deletion_files = deletion_files
            .into_iter()
            .map(|df| (df.data_file_path.clone(), df))
            .collect();
        DeletionVectorFactory {
            io,
            deletion_files,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// A factory over no deletion files at all: every vector is empty.
    pub fn empty(io: &'a dyn FileIO) -> Self {
        DeletionVectorFactory::new(io, Vec::new())
    }

    /// The deletion vector for `data_file_path`, loading and caching it on
    /// first access.
    pub async fn get(&self, data_file_path: &str) -> Result<DeletionVector> {
        if let Some(cached) = self.cache.lock().unwrap().get(data_file_path) {
            return Ok(cached.clone());
        }
        let vector = match self.deletion_files.get(data_file_path) {
            Some(deletion_file) => {
                let bytes = self.io.open_input(&deletion_file.path).await?;
                let slice = &bytes[deletion_file.offset as usize
                    ..(deletion_file.offset + deletion_file.length) as usize];
                DeletionVector::deserialize(slice).map_err(|e| {
                    crate::error::CoreError::Message(format!(
                        "corrupt deletion vector for {data_file_path}: {e}"
                    ))
                })?
            }
            None => DeletionVector::empty(),
        };
        self.cache
            .lock()
            .unwrap()
            .insert(data_file_path.to_string(), vector.clone());
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::file_io::ObjectStoreFileIO;
    use bytes::Bytes;
    use object_store::memory::InMemory;

    #[tokio::test]
    async fn test_empty_factory_keeps_everything() {
        let store = ObjectStoreFileIO::new(InMemory::new());
        let factory = DeletionVectorFactory::empty(&store);
        let dv = factory.get("some/file").await.unwrap();
        assert!(!dv.contains(0));
    }

    #[tokio::test]
    async fn test_loads_and_caches_vector() {
        let store = ObjectStoreFileIO::new(InMemory::new());
        let dv = DeletionVector::from_positions([1, 2, 3]);
        let bytes = dv.serialize().unwrap();
        store
            .open_output("dv/file-1.bin", Bytes::from(bytes.clone()))
            .await
            .unwrap();

        let deletion_file = DeletionFile {
            data_file_path: "data/file-1".to_string(),
            path: "dv/file-1.bin".to_string(),
            offset: 0,
            length: bytes.len() as i64,
        };
        let factory = DeletionVectorFactory::new(&store, vec![deletion_file]);
        let loaded = factory.get("data/file-1").await.unwrap();
        assert!(loaded.contains(2));

        let loaded_again = factory.get("data/file-1").await.unwrap();
        assert_eq!(loaded.len(), loaded_again.len());
    }
}
