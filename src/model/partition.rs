/*!
Partition values and the codec that converts them to/from string maps and
derives a timestamp from them (spec.md §3 "Partition", §4.2 "Partition Codec").

A partition value here is an already-materialized string tuple (any
upstream transform that derived it from a source column has already run);
what this module owns is the encode/decode between that tuple and a typed
row, and the timestamp extraction used by the expire controller.
*/
use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{CoreError, Result};
use crate::model::value::{DataField, GenericRow, PrimitiveType, RowType, Value};

/// Ordered field names and types a partition value is shaped by.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionSchema {
    /// The partition-key columns, in declaration order.
    pub fields: Vec<DataField>,
}

impl PartitionSchema {
    /// View this schema as a [`RowType`] for encode/decode purposes.
    pub fn as_row_type(&self) -> RowType {
        RowType {
            fields: self.fields.clone(),
        }
    }
}

/// A partition value: an ordered map from column name to its formatted
/// string representation (spec.md §3).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    entries: Vec<(String, String)>,
}

impl Partition {
    /// Build a partition from ordered `(name, value)` pairs.
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Partition { entries }
    }

    /// Value for a named column, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The entries in declaration order.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Render as `name=value,name=value` for error messages and logs.
    pub fn display(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Encodes/decodes partition key tuples against a [`PartitionSchema`]
/// (spec.md §4.2).
pub struct PartitionCodec;

impl PartitionCodec {
    /// Encode a key row into its partition string map.
    pub fn encode(schema: &PartitionSchema, row: &GenericRow) -> Partition {
        let entries = schema
            .fields
            .iter()
            .zip(row.0.iter())
            .map(|(field, value)| (field.name.clone(), format_value(value)))
            .collect();
        Partition::new(entries)
    }

    /// Decode a partition string map back into a typed row.
    pub fn decode(schema: &PartitionSchema, partition: &Partition) -> Result<GenericRow> {
        let mut values = Vec::with_capacity(schema.fields.len());
        for field in &schema.fields {
            let raw = partition
                .get(&field.name)
                .ok_or_else(|| CoreError::Message(format!("missing partition field {}", field.name)))?;
            values.push(parse_value(raw, field.field_type)?);
        }
        Ok(GenericRow(values))
    }

    /// Extract a [`NaiveDateTime`] from a partition using `pattern` (a
    /// `partition.timestamp-pattern` template naming which field(s) feed the
    /// formatter, or `None` to use the first partition column) and
    /// `formatter` (a `yyyyMMdd`-style pattern, default `yyyyMMdd`).
    ///
    /// Returns [`CoreError::Unparseable`] rather than propagating a parse
    /// failure up as a hard error — callers (the expire controller) treat
    /// an unparseable partition as never-expiring (spec.md §4.8).
    pub fn extract_timestamp(
        schema: &PartitionSchema,
        partition: &Partition,
        pattern: Option<&str>,
        formatter: &str,
    ) -> Result<NaiveDateTime> {
        let field_name = pattern
            .map(|p| p.to_string())
            .or_else(|| schema.fields.first().map(|f| f.name.clone()))
            .ok_or_else(|| CoreError::Unparseable("no partition fields configured".to_string()))?;
        let raw = partition
            .get(&field_name)
            .ok_or_else(|| CoreError::Unparseable(format!("no value for field {field_name}")))?;
        let strftime = translate_formatter(formatter);
        NaiveDateTime::parse_from_str(raw, &strftime)
            .or_else(|_| {
                chrono::NaiveDate::parse_from_str(raw, &strftime)
                    .map(|d| d.and_hms_opt(0, 0, 0).unwrap())
            })
            .map_err(|_| CoreError::Unparseable(format!("'{raw}' does not match pattern '{formatter}'")))
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Boolean(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Long(l) => l.to_string(),
        Value::String(s) => s.clone(),
        Value::Binary(b) => String::from_utf8_lossy(b).into_owned(),
    }
}

fn parse_value(raw: &str, field_type: PrimitiveType) -> Result<Value> {
    if raw.is_empty() {
        return Ok(Value::Null);
    }
    let err = || CoreError::Message(format!("cannot parse '{raw}' as {field_type:?}"));
    Ok(match field_type {
        PrimitiveType::Boolean => Value::Boolean(raw.parse().map_err(|_| err())?),
        PrimitiveType::Int => Value::Int(raw.parse().map_err(|_| err())?),
        PrimitiveType::Long => Value::Long(raw.parse().map_err(|_| err())?),
        PrimitiveType::String => Value::String(raw.to_string()),
        PrimitiveType::Binary => Value::Binary(raw.as_bytes().to_vec()),
        PrimitiveType::Float | PrimitiveType::Double | PrimitiveType::Date | PrimitiveType::Timestamp => {
            Value::String(raw.to_string())
        }
    })
}

/// Translate a `yyyyMMdd`-style formatter pattern into a chrono `strftime`
/// pattern. Unrecognised characters pass through unchanged.
fn translate_formatter(pattern: &str) -> String {
    lazy_static! {
        static ref TOKEN: Regex = Regex::new("yyyy|MM|dd|HH|mm|ss").unwrap();
    }
    TOKEN
        .replace_all(pattern, |caps: &regex::Captures| match &caps[0] {
            "yyyy" => "%Y",
            "MM" => "%m",
            "dd" => "%d",
            "HH" => "%H",
            "mm" => "%M",
            "ss" => "%S",
            _ => unreachable!(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn schema() -> PartitionSchema {
        PartitionSchema {
            fields: vec![DataField {
                id: 1,
                name: "f0".to_string(),
                field_type: PrimitiveType::String,
                nullable: false,
            }],
        }
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let schema = schema();
        let row = GenericRow(vec![Value::String("20230101".to_string())]);
        let partition = PartitionCodec::encode(&schema, &row);
        assert_eq!(partition.get("f0"), Some("20230101"));
        let back = PartitionCodec::decode(&schema, &partition).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_extract_timestamp_default_formatter() {
        let schema = schema();
        let partition = Partition::new(vec![("f0".to_string(), "20230105".to_string())]);
        let ts = PartitionCodec::extract_timestamp(&schema, &partition, None, "yyyyMMdd").unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2023, 1, 5).unwrap());
    }

    #[test]
    fn test_extract_timestamp_unparseable_is_an_error_not_a_panic() {
        let schema = schema();
        let partition = Partition::new(vec![("f0".to_string(), "abcd".to_string())]);
        let result = PartitionCodec::extract_timestamp(&schema, &partition, None, "yyyyMMdd");
        assert!(matches!(result, Err(CoreError::Unparseable(_))));
    }
}
