/*!
Details of [snapshots](../../index.html) for a table (spec.md §3, "Snapshot").

A [`Snapshot`] is a versioned pointer to the table's manifest lists plus the
bookkeeping needed for idempotent commit retry (`commit_identifier`,
`commit_user`).
*/
use serde::{Deserialize, Serialize};

/// The kind of change a snapshot represents (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitKind {
    /// Only new files were added.
    Append,
    /// Files were rewritten without changing table contents (compaction).
    Compact,
    /// Files were replaced or dropped, logically changing table contents.
    /// Partition drops always produce this kind (spec.md §4.9).
    Overwrite,
}

/// A versioned metadata pointer (spec.md §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Snapshot {
    /// Unique, strictly increasing snapshot id.
    pub id: i64,
    /// APPEND, COMPACT, or OVERWRITE.
    pub commit_kind: CommitKind,
    /// Id of the schema this snapshot was written under.
    pub schema_id: i32,
    /// Manifest list this snapshot inherits from its predecessor.
    pub base_manifest_list: String,
    /// Manifest list of files added/removed by this snapshot alone.
    pub delta_manifest_list: String,
    /// Manifest list of changelog files, present only when changelog
    /// producing is enabled for the table.
    pub changelog_manifest_list: Option<String>,
    /// Writer-provided monotonic tag correlating a prepared commit with the
    /// snapshot that published it (see [`crate::commit`]).
    pub commit_identifier: i64,
    /// Identity of the writer that produced this snapshot.
    pub commit_user: String,
    /// Wall-clock time the snapshot was created, in epoch milliseconds.
    pub timestamp_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_roundtrip() {
        let snapshot = Snapshot {
            id: 3,
            commit_kind: CommitKind::Append,
            schema_id: 0,
            base_manifest_list: "manifest-list-2".to_string(),
            delta_manifest_list: "manifest-list-3-delta".to_string(),
            changelog_manifest_list: None,
            commit_identifier: 7,
            commit_user: "writer-1".to_string(),
            timestamp_ms: 1_700_000_000_000,
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, back);
    }

    #[test]
    fn test_overwrite_commit_kind() {
        let data = r#"
            {
                "id": 5,
                "commit-kind": "overwrite",
                "schema-id": 0,
                "base-manifest-list": "m4",
                "delta-manifest-list": "m5-delta",
                "changelog-manifest-list": null,
                "commit-identifier": 11,
                "commit-user": "expire-controller",
                "timestamp-ms": 1700000001000
            }
        "#;
        let snapshot: Snapshot = serde_json::from_str(data).unwrap();
        assert_eq!(snapshot.commit_kind, CommitKind::Overwrite);
    }
}
