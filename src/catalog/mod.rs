/*!
Traits for the collaborators this core consumes from, or is consumed by,
the surrounding system (spec.md §1, §6: "External Interfaces").

This crate's external seam pulls in two directions: it both *consumes*
`FileIO`/`SchemaManager`/`SnapshotManager` and is *called by* the
surrounding catalog through `PartitionHandler`.
*/

pub mod file_io;
pub mod file_reader_factory;
pub mod partition_handler;
pub mod schema_manager;
pub mod snapshot_manager;

pub use file_io::FileIO;
pub use file_reader_factory::KeyValueFileReaderFactory;
pub use partition_handler::{PartitionHandler, PartitionStatistics};
pub use schema_manager::SchemaManager;
pub use snapshot_manager::SnapshotManager;
