/*!
 * Process Types
 * Process records, admission specs, and the memory side table
 */

use crate::core::types::{Priority, ProcessLabel, ReadySeq, RecordId, Tick};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Process status inside the process table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessStatus {
    /// Admitted and waiting for the CPU
    Ready,
    /// Holding the CPU
    Running,
    /// Blocked on I/O
    Waiting,
    /// Burst exhausted; kept until the timeline has observed it
    Completed,
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ready => "Ready",
            Self::Running => "Running",
            Self::Waiting => "Waiting",
            Self::Completed => "Completed",
        };
        f.write_str(s)
    }
}

/// Process control block record
///
/// Built only from a validated [`ProcessSpec`]; every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Process {
    pub id: RecordId,
    pub process_id: ProcessLabel,
    pub status: ProcessStatus,
    /// Remaining CPU time
    pub burst_time: u32,
    /// Burst at admission, never modified afterwards
    pub init_burst: u32,
    /// CPU time in the current run segment
    pub steps: u32,
    /// `steps` captured when the record was marked Completed
    pub final_steps: u32,
    /// Ticks spent Ready
    pub waiting_time: u32,
    /// Remaining I/O duration
    pub io_time: u32,
    /// Remaining-burst offset that triggers I/O (0 = no I/O)
    pub io_when: u32,
    pub priority: Priority,
    /// Elapsed time before which the record stays queued
    pub arrival: Tick,
    /// Ready-queue ticket, refreshed on every entry into Ready
    pub ready_seq: ReadySeq,
}

impl Process {
    /// Build a queued record from a validated spec; the store assigns `id`
    pub(crate) fn from_spec(spec: &ProcessSpec) -> Self {
        Self {
            id: 0,
            process_id: spec.process_id,
            status: ProcessStatus::Ready,
            burst_time: spec.burst,
            init_burst: spec.burst,
            steps: 0,
            final_steps: 0,
            waiting_time: 0,
            io_time: spec.io_time,
            io_when: spec.io_when,
            priority: spec.priority,
            arrival: spec.arrival,
            ready_seq: 0,
        }
    }

    /// CPU time executed since admission
    #[inline]
    pub fn executed(&self) -> u32 {
        self.init_burst.saturating_sub(self.burst_time)
    }

    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.status == ProcessStatus::Running
    }

    #[inline(always)]
    pub fn is_ready(&self) -> bool {
        self.status == ProcessStatus::Ready
    }

    #[inline(always)]
    pub fn is_waiting(&self) -> bool {
        self.status == ProcessStatus::Waiting
    }

    #[inline(always)]
    pub fn is_completed(&self) -> bool {
        self.status == ProcessStatus::Completed
    }

    /// Whether the record is due to block for I/O at its current burst
    #[inline]
    pub fn io_due(&self) -> bool {
        self.is_running() && self.io_when > 0 && self.burst_time == self.io_when
    }

    /// Display label, e.g. `P3`
    pub fn label(&self) -> String {
        format!("P{}", self.process_id)
    }
}

/// Submission request for a new process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ProcessSpec {
    pub process_id: ProcessLabel,
    pub burst: u32,
    pub priority: Priority,
    /// Remaining-burst offset at which to block for I/O (0 = never)
    pub io_when: u32,
    /// I/O duration in ticks
    pub io_time: u32,
    pub arrival: Tick,
}

impl Default for ProcessSpec {
    fn default() -> Self {
        Self {
            process_id: 0,
            burst: 1,
            priority: 0,
            io_when: 0,
            io_time: 0,
            arrival: 0,
        }
    }
}

impl ProcessSpec {
    pub fn new(process_id: ProcessLabel, burst: u32) -> Self {
        Self {
            process_id,
            burst,
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_io(mut self, io_when: u32, io_time: u32) -> Self {
        self.io_when = io_when;
        self.io_time = io_time;
        self
    }

    pub fn with_arrival(mut self, arrival: Tick) -> Self {
        self.arrival = arrival;
        self
    }
}

/// Allocation state of a memory block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentStatus {
    Free,
    Allocated,
}

/// Row of the memory side table (seeded on reset, never driven here)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MemorySegment {
    pub block_size: u32,
    pub location: u32,
    pub process_id: Option<ProcessLabel>,
    pub job_size: Option<u32>,
    pub status: SegmentStatus,
    pub fragmentation: Option<u32>,
    pub splittable: bool,
}

impl MemorySegment {
    /// Single free block covering the whole pool
    pub fn free_block(block_size: u32) -> Self {
        Self {
            block_size,
            location: 0,
            process_id: None,
            job_size: None,
            status: SegmentStatus::Free,
            fragmentation: None,
            splittable: true,
        }
    }
}
