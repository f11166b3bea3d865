/*!
[`Table`]: the façade gluing the external collaborators and the
read/expire/commit subsystems together into one entry point.
*/
use std::collections::HashSet;

use chrono::NaiveDateTime;

use crate::catalog::file_reader_factory::KeyValueFileReaderFactory;
use crate::catalog::{FileIO, PartitionHandler, SchemaManager, SnapshotManager};
use crate::commit::CommitCoordinator;
use crate::config::CoreOptions;
use crate::error::Result;
use crate::expire::PartitionExpireController;
use crate::merge::{Reducer, UdsComparator};
use crate::model::partition::PartitionSchema;
use crate::model::split::DataSplit;
use crate::model::value::KeyValue;
use crate::split_reader::SplitReadFacade;

/// A table: the collaborators a read, an expire pass, or a commit needs,
/// plus the configuration governing all three.
pub struct Table<'a> {
    io: &'a dyn FileIO,
    schema_manager: &'a dyn SchemaManager,
    snapshot_manager: &'a dyn SnapshotManager,
    partition_handler: &'a dyn PartitionHandler,
    options: CoreOptions,
}

impl<'a> Table<'a> {
    /// Build a table over its collaborators. `options` should already have
    /// passed [`CoreOptions::validate`].
    pub fn new(
        io: &'a dyn FileIO,
        schema_manager: &'a dyn SchemaManager,
        snapshot_manager: &'a dyn SnapshotManager,
        partition_handler: &'a dyn PartitionHandler,
        options: CoreOptions,
    ) -> Self {
        Table {
            io,
            schema_manager,
            snapshot_manager,
            partition_handler,
            options,
        }
    }

    /// This table's configuration.
    pub fn options(&self) -> &CoreOptions {
        &self.options
    }

    /// Build a reader for `split` against the table's current schema
    /// (spec.md §4.7).
    pub async fn create_reader(
        &self,
        split: &DataSplit,
        file_reader_factory: &dyn KeyValueFileReaderFactory,
        reducer: &dyn Reducer,
        uds: Option<UdsComparator>,
    ) -> Result<Vec<KeyValue>> {
        let schema = self.schema_manager.latest().await?;
        let facade = SplitReadFacade::new(schema.key_type(), schema.fields.clone())
            .with_sequence_fields(self.options.sequence_field.clone());
        facade
            .create_reader(
                split,
                self.io,
                file_reader_factory,
                reducer,
                uds,
                self.options.sequence_field_sort_order,
            )
            .await
    }

    /// Build the partition expire controller for this table, or `None` if
    /// `partition.expiration-time` is not configured.
    pub async fn expire_controller(
        &self,
        commit_user: impl Into<String>,
    ) -> Result<Option<PartitionExpireController<'_>>> {
        let schema = self.schema_manager.latest().await?;
        let partition_schema = PartitionSchema {
            fields: schema.partition_type().fields,
        };
        Ok(PartitionExpireController::from_options(
            &self.options,
            partition_schema,
            schema.schema_id,
            commit_user,
            self.snapshot_manager,
            self.partition_handler,
        ))
    }

    /// Build a commit coordinator over this table's snapshot manager.
    pub fn commit_coordinator(&self) -> CommitCoordinator<'_> {
        CommitCoordinator::new(self.snapshot_manager)
    }

    /// Partitions currently expired as of `now`, for a writer to pass as
    /// [`CommitCoordinator::commit`]'s `expired_partitions` write guard
    /// (spec.md §4.8, "Write guard"). Returns an empty set if
    /// `partition.expiration-time` is not configured.
    pub async fn currently_expired_partitions(&self, now: NaiveDateTime) -> Result<HashSet<String>> {
        match self.expire_controller("write-guard-check").await? {
            Some(controller) => controller.currently_expired(now).await,
            None => Ok(HashSet::new()),
        }
    }
}
