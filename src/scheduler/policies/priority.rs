/*!
 * Priority Scheduling
 */

use crate::core::types::Priority;
use crate::process::Process;
use crate::scheduler::traits::SchedulingPolicy;
use crate::scheduler::types::{PolicyKind, PriorityOrder};

/// Runs the most urgent Ready record, FCFS among equals
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityPolicy {
    order: PriorityOrder,
}

impl PriorityPolicy {
    pub fn new(order: PriorityOrder) -> Self {
        Self { order }
    }

    // Smaller key runs first
    #[inline]
    fn urgency(&self, priority: Priority) -> u16 {
        match self.order {
            PriorityOrder::LowerFirst => priority as u16,
            PriorityOrder::HigherFirst => Priority::MAX as u16 - priority as u16,
        }
    }
}

impl SchedulingPolicy for PriorityPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Priority
    }

    fn select<'a>(&self, ready: &[&'a Process]) -> Option<&'a Process> {
        ready
            .iter()
            .copied()
            .min_by_key(|p| (self.urgency(p.priority), p.ready_seq, p.id))
    }
}
