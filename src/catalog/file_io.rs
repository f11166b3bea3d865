/*!
Byte-level I/O, consumed by the core (spec.md §6, "FileIO").

Built on `object_store` as the storage abstraction: this trait is the
narrow slice of `ObjectStore`'s surface the merge/expire/commit paths
actually call, named after what each call does rather than after
`object_store`'s own method names.
*/
use async_trait::async_trait;
use bytes::Bytes;
use object_store::path::Path;
use object_store::ObjectStore;

use crate::error::Result;

/// Byte-level file I/O the core reads and writes through.
#[async_trait]
pub trait FileIO: Send + Sync {
    /// Open a file for reading, returning its full contents.
    async fn open_input(&self, path: &str) -> Result<Bytes>;
    /// Write `bytes` to `path`, overwriting any existing contents.
    async fn open_output(&self, path: &str, bytes: Bytes) -> Result<()>;
    /// List file paths directly under `dir`.
    async fn list(&self, dir: &str) -> Result<Vec<String>>;
    /// Delete a file. Not an error if the file does not exist.
    async fn delete(&self, path: &str) -> Result<()>;
    /// Whether a file exists.
    async fn exists(&self, path: &str) -> Result<bool>;
}

/// A [`FileIO`] backed directly by an [`ObjectStore`] implementation,
/// driving table I/O straight off `object_store` rather than through an
/// intermediate buffering layer.
pub struct ObjectStoreFileIO<O: ObjectStore> {
    store: O,
}

impl<O: ObjectStore> ObjectStoreFileIO<O> {
    /// Wrap an [`ObjectStore`] as a [`FileIO`].
    pub fn new(store: O) -> Self {
        ObjectStoreFileIO { store }
    }
}

#[async_trait]
impl<O: ObjectStore> FileIO for ObjectStoreFileIO<O> {
    async fn open_input(&self, path: &str) -> Result<Bytes> {
        let result = self.store.get(&Path::from(path)).await?;
        Ok(result.bytes().await?)
    }

    async fn open_output(&self, path: &str, bytes: Bytes) -> Result<()> {
        self.store.put(&Path::from(path), bytes.into()).await?;
        Ok(())
    }

    async fn list(&self, dir: &str) -> Result<Vec<String>> {
        use futures::TryStreamExt;
        let entries: Vec<_> = self
            .store
            .list(Some(&Path::from(dir)))
            .map_ok(|meta| meta.location.to_string())
            .try_collect()
            .await?;
        Ok(entries)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        match self.store.delete(&Path::from(path)).await {
            Ok(()) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        match self.store.head(&Path::from(path)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    #[tokio::test]
    async fn test_roundtrip() {
        let io = ObjectStoreFileIO::new(InMemory::new());
        io.open_output("a/b.txt", Bytes::from_static(b"hello"))
            .await
            .unwrap();
        assert!(io.exists("a/b.txt").await.unwrap());
        let bytes = io.open_input("a/b.txt").await.unwrap();
        assert_eq!(&bytes[..], b"hello");
        let listed = io.list("a").await.unwrap();
        assert_eq!(listed, vec!["a/b.txt".to_string()]);
        io.delete("a/b.txt").await.unwrap();
        assert!(!io.exists("a/b.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_an_error() {
        let io = ObjectStoreFileIO::new(InMemory::new());
        io.delete("missing").await.unwrap();
    }
}
