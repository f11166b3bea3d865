/*!
A table's schema: its row shape plus which columns are primary-key and
partition-key columns (spec.md §6, "SchemaManager").

A flat primitive row shape ([`super::value::RowType`]) is all this engine
keys and merges on; nested/list/map column types have no counterpart here.
*/
use serde::{Deserialize, Serialize};

use crate::model::value::RowType;

/// A resolved table schema (spec.md §6 `SchemaManager::latest`/`get`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TableSchema {
    /// Identifier of this schema version.
    pub schema_id: i32,
    /// All columns, in declaration order.
    pub fields: RowType,
    /// Names of the columns that form the primary key, in key order.
    pub primary_key: Vec<String>,
    /// Names of the columns that form the partition key, in partition order.
    pub partition_keys: Vec<String>,
}

impl TableSchema {
    /// Row type restricted to the primary-key columns.
    pub fn key_type(&self) -> RowType {
        self.fields.project(&self.primary_key)
    }

    /// Row type restricted to the partition-key columns.
    pub fn partition_type(&self) -> RowType {
        self.fields.project(&self.partition_keys)
    }

    /// Whether this table has any partition columns configured.
    pub fn is_partitioned(&self) -> bool {
        !self.partition_keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::value::{DataField, PrimitiveType};

    fn schema() -> TableSchema {
        TableSchema {
            schema_id: 0,
            fields: RowType {
                fields: vec![
                    DataField {
                        id: 1,
                        name: "f0".into(),
                        field_type: PrimitiveType::String,
                        nullable: false,
                    },
                    DataField {
                        id: 2,
                        name: "id".into(),
                        field_type: PrimitiveType::Int,
                        nullable: false,
                    },
                    DataField {
                        id: 3,
                        name: "value".into(),
                        field_type: PrimitiveType::Int,
                        nullable: true,
                    },
                ],
            },
            primary_key: vec!["id".into()],
            partition_keys: vec!["f0".into()],
        }
    }

    #[test]
    fn test_key_and_partition_type() {
        let schema = schema();
        assert_eq!(schema.key_type().field_names(), vec!["id".to_string()]);
        assert_eq!(schema.partition_type().field_names(), vec!["f0".to_string()]);
        assert!(schema.is_partitioned());
    }

    #[test]
    fn test_roundtrip() {
        let schema = schema();
        let json = serde_json::to_string(&schema).unwrap();
        let back: TableSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, back);
    }
}
