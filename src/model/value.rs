/*!
Row, key and value representation (spec.md §3, "KeyValue").

Covers the primitives a merge-read engine actually compares and projects,
plus [`KeyValue`] and [`RowKind`], which carry the row-kind and sequence
bookkeeping a merge needs to resolve ties between records for the same key.
*/
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Primitive column types a key or value field can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    /// True or false.
    Boolean,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 32-bit IEEE-754 float.
    Float,
    /// 64-bit IEEE-754 float.
    Double,
    /// UTF-8 string.
    String,
    /// Arbitrary-length byte array.
    Binary,
    /// Calendar date without a time component.
    Date,
    /// Timestamp without timezone.
    Timestamp,
}

/// A single column in a [`RowType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataField {
    /// Id unique within the owning schema.
    pub id: i32,
    /// Column name.
    pub name: String,
    /// Column type.
    pub field_type: PrimitiveType,
    /// Whether the column can hold nulls.
    pub nullable: bool,
}

/// An ordered list of columns describing a key or value row shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowType {
    /// The fields, in positional order.
    pub fields: Vec<DataField>,
}

impl RowType {
    /// Build a [`RowType`] restricted to the named fields, preserving this
    /// type's field order. Unknown names are ignored.
    pub fn project(&self, names: &[String]) -> RowType {
        RowType {
            fields: self
                .fields
                .iter()
                .filter(|f| names.iter().any(|n| n == &f.name))
                .cloned()
                .collect(),
        }
    }

    /// Index of a field by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Names of all fields, in order.
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}

/// A single cell value. `Null` is distinct from any typed value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// [`PrimitiveType::Boolean`].
    Boolean(bool),
    /// [`PrimitiveType::Int`].
    Int(i32),
    /// [`PrimitiveType::Long`].
    Long(i64),
    /// [`PrimitiveType::String`].
    String(String),
    /// [`PrimitiveType::Binary`].
    Binary(Vec<u8>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Null, Null) => Some(Ordering::Equal),
            (Null, _) => Some(Ordering::Less),
            (_, Null) => Some(Ordering::Greater),
            (Boolean(a), Boolean(b)) => a.partial_cmp(b),
            (Int(a), Int(b)) => a.partial_cmp(b),
            (Long(a), Long(b)) => a.partial_cmp(b),
            (String(a), String(b)) => a.partial_cmp(b),
            (Binary(a), Binary(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// A tuple of column values, positionally aligned with a [`RowType`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenericRow(pub Vec<Value>);

impl GenericRow {
    /// Build a row by projecting `src_type`'s columns named in
    /// `projected` out of `self`, which must be shaped like `src_type`.
    pub fn project(&self, src_type: &RowType, projected: &RowType) -> GenericRow {
        GenericRow(
            projected
                .fields
                .iter()
                .map(|f| {
                    src_type
                        .index_of(&f.name)
                        .and_then(|i| self.0.get(i))
                        .cloned()
                        .unwrap_or(Value::Null)
                })
                .collect(),
        )
    }
}

impl GenericRow {
    /// Value of the named column under `row_type`, if present.
    pub fn field(&self, row_type: &RowType, name: &str) -> Option<Value> {
        row_type.index_of(name).and_then(|i| self.0.get(i)).cloned()
    }
}

/// Compare two rows lexicographically by value, used to order keys.
pub fn compare_rows(a: &GenericRow, b: &GenericRow) -> Ordering {
    for (x, y) in a.0.iter().zip(b.0.iter()) {
        match x.partial_cmp(y) {
            Some(Ordering::Equal) => continue,
            Some(other) => return other,
            None => return Ordering::Equal,
        }
    }
    a.0.len().cmp(&b.0.len())
}

/// The kind of change a [`KeyValue`] represents (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowKind {
    /// A brand new row.
    Insert,
    /// The pre-image of an update, paired with a following `UpdateAfter`.
    UpdateBefore,
    /// The post-image of an update.
    UpdateAfter,
    /// A tombstone.
    Delete,
}

impl RowKind {
    /// Whether this row kind represents a deletion.
    pub fn is_delete(self) -> bool {
        matches!(self, RowKind::Delete)
    }
}

/// A single record read from a data file: a key, a value, the sequence
/// number it was written with, and its row kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    /// The primary-key tuple.
    pub key: GenericRow,
    /// The value tuple.
    pub value: GenericRow,
    /// Monotonically increasing per-writer sequence number.
    pub seq_number: i64,
    /// INSERT / UPDATE_BEFORE / UPDATE_AFTER / DELETE.
    pub row_kind: RowKind,
}

impl KeyValue {
    /// Build a new record.
    pub fn new(key: GenericRow, value: GenericRow, seq_number: i64, row_kind: RowKind) -> Self {
        KeyValue {
            key,
            value,
            seq_number,
            row_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_rows() {
        let a = GenericRow(vec![Value::Int(1)]);
        let b = GenericRow(vec![Value::Int(2)]);
        assert_eq!(compare_rows(&a, &b), Ordering::Less);
        assert_eq!(compare_rows(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_project() {
        let row_type = RowType {
            fields: vec![
                DataField {
                    id: 1,
                    name: "a".into(),
                    field_type: PrimitiveType::Int,
                    nullable: false,
                },
                DataField {
                    id: 2,
                    name: "b".into(),
                    field_type: PrimitiveType::String,
                    nullable: true,
                },
            ],
        };
        let projected = row_type.project(&["b".to_string()]);
        let row = GenericRow(vec![Value::Int(1), Value::String("x".into())]);
        let out = row.project(&row_type, &projected);
        assert_eq!(out.0, vec![Value::String("x".into())]);
    }

    #[test]
    fn test_null_ordering() {
        assert!(Value::Null < Value::Int(0));
    }
}
