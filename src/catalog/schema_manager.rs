/*!
Schema resolution, consumed by the core (spec.md §6, "SchemaManager").
*/
use async_trait::async_trait;

use crate::error::Result;
use crate::model::schema::TableSchema;

/// Resolves schema ids to [`TableSchema`] values.
#[async_trait]
pub trait SchemaManager: Send + Sync {
    /// The table's current schema.
    async fn latest(&self) -> Result<TableSchema>;
    /// A specific schema version.
    async fn get(&self, schema_id: i32) -> Result<TableSchema>;
}

/// A fixed-schema [`SchemaManager`] for tables that never evolve their
/// schema, and for tests.
pub struct StaticSchemaManager {
    schema: TableSchema,
}

impl StaticSchemaManager {
    /// Build a manager that always resolves to `schema`.
    pub fn new(schema: TableSchema) -> Self {
        StaticSchemaManager { schema }
    }
}

#[async_trait]
impl SchemaManager for StaticSchemaManager {
    async fn latest(&self) -> Result<TableSchema> {
        Ok(self.schema.clone())
    }

    async fn get(&self, schema_id: i32) -> Result<TableSchema> {
        if schema_id == self.schema.schema_id {
            Ok(self.schema.clone())
        } else {
            Err(crate::error::CoreError::Message(format!(
                "no schema with id {schema_id}"
            )))
        }
    }
}
