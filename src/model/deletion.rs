/*!
Deletion vectors: a bitmap of row positions to suppress at read time
(spec.md §3, "DeletionFile / DeletionVector").
*/
use serde::{Deserialize, Serialize};

/// Reference to a deletion file on disk, associating it with the data file
/// it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionFile {
    /// The data file this deletion file suppresses rows for.
    pub data_file_path: String,
    /// Path to the deletion file itself.
    pub path: String,
    /// Byte offset of this file's bitmap within `path`, if the deletion
    /// file packs multiple data files' vectors together.
    pub offset: i64,
    /// Length in bytes of this file's bitmap within `path`.
    pub length: i64,
}

/// An immutable bitmap of row positions to suppress within one data file.
///
/// Positions outside `[0, row_count)` are ignored by [`DeletionVector::contains`]
/// — the vector only has meaning relative to the file it was built for.
#[derive(Debug, Clone, Default)]
pub struct DeletionVector {
    bitmap: roaring::RoaringBitmap,
}

impl DeletionVector {
    /// An empty deletion vector — every position is kept.
    pub fn empty() -> Self {
        DeletionVector::default()
    }

    /// Build a deletion vector from a set of deleted row positions.
    pub fn from_positions(positions: impl IntoIterator<Item = u32>) -> Self {
        DeletionVector {
            bitmap: positions.into_iter().collect(),
        }
    }

    /// Whether row `position` within its file is suppressed.
    pub fn contains(&self, position: u32) -> bool {
        self.bitmap.contains(position)
    }

    /// Number of suppressed positions.
    pub fn len(&self) -> u64 {
        self.bitmap.len()
    }

    /// Whether this vector suppresses nothing.
    pub fn is_empty(&self) -> bool {
        self.bitmap.is_empty()
    }

    /// Serialize to the roaring-bitmap wire format.
    pub fn serialize(&self) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.bitmap.serialize_into(&mut buf)?;
        Ok(buf)
    }

    /// Deserialize from the roaring-bitmap wire format.
    pub fn deserialize(bytes: &[u8]) -> std::io::Result<Self> {
        Ok(DeletionVector {
            bitmap: roaring::RoaringBitmap::deserialize_from(bytes)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_keeps_everything() {
        let dv = DeletionVector::empty();
        assert!(!dv.contains(0));
        assert!(!dv.contains(1000));
    }

    #[test]
    fn test_suppresses_positions() {
        let dv = DeletionVector::from_positions([1, 3, 5]);
        assert!(dv.contains(1));
        assert!(!dv.contains(2));
        assert_eq!(dv.len(), 3);
    }

    #[test]
    fn test_roundtrip() {
        let dv = DeletionVector::from_positions([2, 4, 8]);
        let bytes = dv.serialize().unwrap();
        let back = DeletionVector::deserialize(&bytes).unwrap();
        assert!(back.contains(4));
        assert!(!back.contains(5));
    }
}
