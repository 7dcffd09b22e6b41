/*!
 * Round-Robin
 */

use crate::process::Process;
use crate::scheduler::traits::SchedulingPolicy;
use crate::scheduler::types::{PolicyKind, TimeQuantum};

/// FCFS selection with a fixed time slice
///
/// A preempted record re-enters the ready queue at the tail, so the head of
/// the queue is always the record that has waited longest since its last run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobin {
    quantum: TimeQuantum,
}

impl RoundRobin {
    pub fn new(quantum: TimeQuantum) -> Self {
        Self { quantum }
    }
}

impl SchedulingPolicy for RoundRobin {
    fn kind(&self) -> PolicyKind {
        PolicyKind::RoundRobin
    }

    fn quantum(&self) -> Option<TimeQuantum> {
        Some(self.quantum)
    }

    fn select<'a>(&self, ready: &[&'a Process]) -> Option<&'a Process> {
        ready.iter().copied().min_by_key(|p| (p.ready_seq, p.id))
    }
}
