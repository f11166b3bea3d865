/*!
Manifest entries: the avro-encoded listing of files a snapshot's manifest
list points at (spec.md §4.8, "manifest listings").

A `Status` tracking tag plus an avro reader/writer shape built on
`apache_avro`. [`super::data_file::DataFileMeta`] already carries the
statistics an entry needs, so manifest-list-level aggregate summaries are
out of scope here — an external-collaborator concern.
*/
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::model::data_file::DataFileMeta;
use crate::model::partition::Partition;

/// Tracks why a file is listed in a manifest.
#[derive(Debug, Serialize_repr, Deserialize_repr, PartialEq, Eq, Clone)]
#[repr(u8)]
pub enum Status {
    /// File existed before this manifest's snapshot.
    Existing = 0,
    /// File was added by this manifest's snapshot.
    Added = 1,
    /// File was removed by this manifest's snapshot.
    Deleted = 2,
}

/// One listed file, with the partition/bucket it belongs to.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ManifestEntry {
    /// Whether the file was added, removed, or carried over unchanged.
    pub status: Status,
    /// Partition the file belongs to, as a plain string map (spec.md §3:
    /// "every DataFileMeta belongs to exactly one (partition, bucket) pair").
    pub partition: Vec<(String, String)>,
    /// Bucket the file belongs to within its partition.
    pub bucket: i32,
    /// The file itself.
    pub file: DataFileMeta,
}

impl ManifestEntry {
    /// The partition this entry's file belongs to.
    pub fn partition(&self) -> Partition {
        Partition::new(self.partition.clone())
    }
}

/// Avro schema for a manifest file: one record per [`ManifestEntry`],
/// with the entry payload itself carried as a JSON-encoded byte blob —
/// this crate does not need a fully columnar avro schema for its own
/// metadata, only the framing.
const MANIFEST_ENTRY_SCHEMA: &str = r#"
{
    "type": "record",
    "name": "manifest_entry",
    "fields": [
        {"name": "status", "type": "int"},
        {"name": "payload", "type": "bytes"}
    ]
}
"#;

/// Serialize a list of entries into the avro manifest-entry wire format.
pub fn write_entries(entries: &[ManifestEntry]) -> Result<Vec<u8>> {
    let schema = apache_avro::Schema::parse_str(MANIFEST_ENTRY_SCHEMA)?;
    let mut writer = apache_avro::Writer::new(&schema, Vec::new());
    for entry in entries {
        let payload = serde_json::to_vec(entry)?;
        let status = match entry.status {
            Status::Existing => 0i32,
            Status::Added => 1i32,
            Status::Deleted => 2i32,
        };
        let record = apache_avro::types::Value::Record(vec![
            ("status".to_string(), apache_avro::types::Value::Int(status)),
            (
                "payload".to_string(),
                apache_avro::types::Value::Bytes(payload),
            ),
        ]);
        writer.append(record)?;
    }
    writer.into_inner().context("flushing manifest writer")
}

/// Read back a list of entries written by [`write_entries`].
pub fn read_entries<R: std::io::Read>(r: R) -> Result<Vec<ManifestEntry>> {
    let reader = apache_avro::Reader::new(r)?;
    let mut entries = Vec::new();
    for value in reader {
        let value = value?;
        if let apache_avro::types::Value::Record(fields) = value {
            let payload = fields
                .into_iter()
                .find(|(name, _)| name == "payload")
                .map(|(_, v)| v)
                .context("manifest entry missing payload")?;
            if let apache_avro::types::Value::Bytes(bytes) = payload {
                entries.push(serde_json::from_slice(&bytes)?);
            } else {
                anyhow::bail!("manifest entry payload was not bytes");
            }
        } else {
            anyhow::bail!("avro record expected");
        }
    }
    Ok(entries)
}
