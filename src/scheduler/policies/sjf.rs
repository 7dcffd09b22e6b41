/*!
 * Shortest-Job-First
 */

use crate::process::Process;
use crate::scheduler::traits::SchedulingPolicy;
use crate::scheduler::types::PolicyKind;

/// Runs the Ready record with the least remaining burst
///
/// Ties go to the earlier ready-queue entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sjf;

impl SchedulingPolicy for Sjf {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Sjf
    }

    fn select<'a>(&self, ready: &[&'a Process]) -> Option<&'a Process> {
        ready
            .iter()
            .copied()
            .min_by_key(|p| (p.burst_time, p.ready_seq, p.id))
    }
}
