/*!
 * Tick Plans
 * Table writes and state transitions planned from one snapshot
 */

use crate::core::types::{ProcessLabel, ReadySeq, RecordId};
use crate::process::Process;
use crate::store::Table;
use serde::{Deserialize, Serialize};

/// One idempotent table write
///
/// Both variants can be replayed after a partial commit: upserts are keyed by
/// id and deleting an absent id succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOp {
    Upsert { table: Table, record: Process },
    Delete { table: Table, id: RecordId },
}

impl TableOp {
    pub fn upsert(record: Process) -> Self {
        TableOp::Upsert {
            table: Table::Pcb,
            record,
        }
    }

    pub fn delete(id: RecordId) -> Self {
        TableOp::Delete {
            table: Table::Pcb,
            id,
        }
    }

    /// Record id the write targets
    pub fn id(&self) -> RecordId {
        match self {
            TableOp::Upsert { record, .. } => record.id,
            TableOp::Delete { id, .. } => *id,
        }
    }
}

/// State change observed while planning a phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum Transition {
    /// Moved from the queue into the process table
    Admitted { id: RecordId, process_id: ProcessLabel },
    /// Took the CPU
    Dispatched { id: RecordId, process_id: ProcessLabel },
    /// Lost the CPU with burst remaining
    Preempted {
        id: RecordId,
        process_id: ProcessLabel,
        steps: u32,
    },
    /// Burst exhausted and marked Completed
    Completed {
        id: RecordId,
        process_id: ProcessLabel,
        final_steps: u32,
    },
    /// Blocked for I/O
    BlockedOnIo {
        id: RecordId,
        process_id: ProcessLabel,
        io_time: u32,
    },
    /// I/O finished, back to Ready
    IoFinished { id: RecordId, process_id: ProcessLabel },
    /// Completed records removed from the table
    Purged { ids: Vec<RecordId> },
    /// Terminal drain of the last Completed records
    Drained { ids: Vec<RecordId> },
}

/// Writes and transitions produced by one planning step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub ops: Vec<TableOp>,
    pub transitions: Vec<Transition>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn upsert(&mut self, record: Process) {
        self.ops.push(TableOp::upsert(record));
    }

    #[inline]
    pub fn delete(&mut self, id: RecordId) {
        self.ops.push(TableOp::delete(id));
    }

    #[inline]
    pub fn note(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty() && self.transitions.is_empty()
    }

    /// Append another plan after this one
    pub fn extend(&mut self, other: Plan) {
        self.ops.extend(other.ops);
        self.transitions.extend(other.transitions);
    }
}

/// Issues ready-queue tickets
///
/// Every entry into Ready takes a fresh ticket, so ascending tickets give the
/// order in which records joined the ready queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequencer {
    next: ReadySeq,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn next_ticket(&mut self) -> ReadySeq {
        self.next += 1;
        self.next
    }

    /// Never hand out a ticket at or below one already stored
    pub fn observe(&mut self, seen: ReadySeq) {
        self.next = self.next.max(seen);
    }
}
