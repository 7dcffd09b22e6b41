/*!
 * Scheduling Policy Traits
 * Selection rule and quantum of a scheduling discipline
 */

use super::types::{PolicyKind, TimeQuantum};
use crate::process::Process;

/// A scheduling discipline
///
/// Policies only decide; the shared state machine in [`super::machine`]
/// applies the decision to the table.
pub trait SchedulingPolicy: Send + Sync {
    fn kind(&self) -> PolicyKind;

    /// Time slice before preemption; `None` for non-preemptive policies
    fn quantum(&self) -> Option<TimeQuantum> {
        None
    }

    /// Pick the next record to run among Ready candidates
    fn select<'a>(&self, ready: &[&'a Process]) -> Option<&'a Process>;

    /// Whether `current` may keep the CPU for another tick
    #[inline]
    fn keeps_cpu(&self, current: &Process) -> bool {
        current.burst_time > 0
            && self
                .quantum()
                .map_or(true, |quantum| current.steps < quantum.ticks())
    }
}
