/*!
 * In-Memory Process Store
 * Reference implementation of the table contract with fault injection
 */

use super::traits::{Filter, ProcessStore, StoreResult, Table};
use crate::core::errors::StoreError;
use crate::core::types::RecordId;
use crate::process::{MemorySegment, Process};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Process tables held in memory
///
/// Ids are allocated monotonically, so id order is insertion order.
/// Cloning yields another handle to the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pcb: Arc<RwLock<BTreeMap<RecordId, Process>>>,
    queue: Arc<RwLock<BTreeMap<RecordId, Process>>>,
    memory: Arc<RwLock<Vec<MemorySegment>>>,
    next_id: Arc<AtomicU32>,
    // Pending injected failures
    failures: Arc<AtomicU32>,
    operations: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` operations fail with `StoreError::Unavailable`
    pub fn inject_failures(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Operations attempted so far, failed ones included
    pub fn operation_count(&self) -> u64 {
        self.operations.load(Ordering::Relaxed)
    }

    fn table(&self, table: Table) -> &RwLock<BTreeMap<RecordId, Process>> {
        match table {
            Table::Pcb => &self.pcb,
            Table::Queue => &self.queue,
        }
    }

    fn check_available(&self, op: &str) -> StoreResult<()> {
        self.operations.fetch_add(1, Ordering::Relaxed);
        let injected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            debug!(op, "Injected store failure");
            return Err(StoreError::Unavailable(format!("injected failure during {}", op)));
        }
        Ok(())
    }

    fn allocate_id(&self) -> RecordId {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    // Keep the allocator ahead of caller-chosen ids
    fn reserve_id(&self, id: RecordId) {
        self.next_id.fetch_max(id, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProcessStore for MemoryStore {
    async fn list(&self, table: Table) -> StoreResult<Vec<Process>> {
        self.check_available("list")?;
        Ok(self.table(table).read().values().cloned().collect())
    }

    async fn add(&self, mut record: Process, table: Table) -> StoreResult<Process> {
        self.check_available("add")?;
        let mut rows = self.table(table).write();

        if record.id == 0 {
            record.id = self.allocate_id();
        } else if rows.contains_key(&record.id) {
            return Err(StoreError::Rejected {
                table: table.to_string(),
                id: record.id,
                reason: "duplicate id".into(),
            });
        } else {
            self.reserve_id(record.id);
        }

        rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn edit(&self, mut record: Process, table: Table) -> StoreResult<Process> {
        self.check_available("edit")?;
        if record.id == 0 {
            record.id = self.allocate_id();
        } else {
            self.reserve_id(record.id);
        }
        self.table(table).write().insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: RecordId, table: Table) -> StoreResult<()> {
        self.check_available("delete")?;
        self.table(table).write().remove(&id);
        Ok(())
    }

    async fn delete_all(&self, table: Table) -> StoreResult<()> {
        self.check_available("delete_all")?;
        self.table(table).write().clear();
        Ok(())
    }

    async fn filter(&self, filter: Filter, table: Table) -> StoreResult<Vec<Process>> {
        self.check_available("filter")?;
        Ok(self
            .table(table)
            .read()
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    async fn memory_segments(&self) -> StoreResult<Vec<MemorySegment>> {
        self.check_available("memory_segments")?;
        Ok(self.memory.read().clone())
    }

    async fn reset_memory(&self, initial: MemorySegment) -> StoreResult<()> {
        self.check_available("reset_memory")?;
        let mut memory = self.memory.write();
        memory.clear();
        memory.push(initial);
        Ok(())
    }
}
