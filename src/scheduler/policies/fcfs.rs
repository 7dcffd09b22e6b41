/*!
 * First-Come-First-Served
 */

use crate::process::Process;
use crate::scheduler::traits::SchedulingPolicy;
use crate::scheduler::types::PolicyKind;

/// Runs Ready records in the order they joined the ready queue
#[derive(Debug, Clone, Copy, Default)]
pub struct Fcfs;

impl SchedulingPolicy for Fcfs {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Fcfs
    }

    fn select<'a>(&self, ready: &[&'a Process]) -> Option<&'a Process> {
        ready.iter().copied().min_by_key(|p| (p.ready_seq, p.id))
    }
}
