/*!
 * Process Table Store Traits
 * Contract of the external table service consumed by the simulator
 */

use crate::core::errors::StoreError;
use crate::core::types::{ProcessLabel, RecordId};
use crate::process::{MemorySegment, Process, ProcessStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store operation result
pub type StoreResult<T> = Result<T, StoreError>;

/// Process tables served by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Active process control blocks
    Pcb,
    /// Submitted, not yet admitted
    Queue,
}

impl Table {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pcb => "pcb",
            Self::Queue => "queue",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field/value filter understood by [`ProcessStore::filter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Status(ProcessStatus),
    ProcessId(ProcessLabel),
    Id(RecordId),
}

impl Filter {
    #[inline]
    pub fn matches(&self, record: &Process) -> bool {
        match *self {
            Filter::Status(status) => record.status == status,
            Filter::ProcessId(label) => record.process_id == label,
            Filter::Id(id) => record.id == id,
        }
    }
}

/// Asynchronous process table service
///
/// Records come back in insertion order. `edit` is an upsert keyed by id, and
/// deleting an absent id succeeds, so both can be replayed after a failure.
#[async_trait]
pub trait ProcessStore: Send + Sync {
    /// All records of a table
    async fn list(&self, table: Table) -> StoreResult<Vec<Process>>;

    /// Insert a record; an id of 0 asks the store to assign one
    async fn add(&self, record: Process, table: Table) -> StoreResult<Process>;

    /// Insert or replace a record by id
    async fn edit(&self, record: Process, table: Table) -> StoreResult<Process>;

    /// Remove a record by id
    async fn delete(&self, id: RecordId, table: Table) -> StoreResult<()>;

    /// Remove every record of a table
    async fn delete_all(&self, table: Table) -> StoreResult<()>;

    /// Records matching a field/value filter
    async fn filter(&self, filter: Filter, table: Table) -> StoreResult<Vec<Process>>;

    /// Rows of the memory side table
    async fn memory_segments(&self) -> StoreResult<Vec<MemorySegment>>;

    /// Clear the memory side table and seed it with one row
    async fn reset_memory(&self, initial: MemorySegment) -> StoreResult<()>;
}
