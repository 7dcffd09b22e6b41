/*!
 * Completion Detector
 *
 * Pure reconciliation of the termination signals: executed steps against
 * expected work, emptiness of the active sets, and Completed records.
 */

use crate::process::Process;
use crate::timeline::TimelineReconstructor;
use serde::{Deserialize, Serialize};

/// Snapshot the detector decides on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompletionInput {
    pub total_steps: u32,
    pub valuemax: u32,
    pub running: usize,
    pub ready: usize,
    pub waiting: usize,
    pub completed: usize,
    pub pcb_len: usize,
    pub queue_len: usize,
    /// Completion already surfaced for the current state
    pub already_signaled: bool,
    /// Largest step gap reconciled without a desync
    pub tolerance: u32,
}

impl CompletionInput {
    pub fn from_snapshot(
        pcb: &[Process],
        queue: &[Process],
        timeline: &TimelineReconstructor,
        already_signaled: bool,
        tolerance: u32,
    ) -> Self {
        let count = |f: fn(&Process) -> bool| pcb.iter().filter(|p| f(p)).count();
        Self {
            total_steps: timeline.total_steps(),
            valuemax: timeline.valuemax(),
            running: count(Process::is_running),
            ready: count(Process::is_ready),
            waiting: count(Process::is_waiting),
            completed: count(Process::is_completed),
            pcb_len: pcb.len(),
            queue_len: queue.len(),
            already_signaled,
            tolerance,
        }
    }

    /// Executed steps match the expected total
    #[inline]
    pub fn steps_complete(&self) -> bool {
        self.total_steps == self.valuemax && self.valuemax != 0
    }

    /// Nothing left to run, and something ran
    #[inline]
    pub fn table_drained(&self) -> bool {
        self.running == 0
            && self.ready == 0
            && self.waiting == 0
            && self.queue_len == 0
            && (self.completed > 0 || self.pcb_len == 0)
            && self.valuemax != 0
    }

    #[inline]
    pub fn gap(&self) -> u32 {
        self.total_steps.abs_diff(self.valuemax)
    }
}

/// Outcome of one detection pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum CompletionDecision {
    /// Still running (re-arms the completion guard)
    Pending,
    /// Complete, and already surfaced
    AlreadySignaled,
    /// Complete; `reconciled` when the total must be forced to `valuemax`
    Complete { reconciled: bool },
    /// The table drained but the step total is off by more than the tolerance
    Desynced {
        total_steps: u32,
        valuemax: u32,
        gap: u32,
    },
}

/// Decide whether the simulation has finished
pub fn detect(input: &CompletionInput) -> CompletionDecision {
    let primary = input.steps_complete();
    let secondary = input.table_drained();

    if !primary && !secondary {
        return CompletionDecision::Pending;
    }
    if input.already_signaled {
        return CompletionDecision::AlreadySignaled;
    }
    if primary {
        return CompletionDecision::Complete { reconciled: false };
    }

    let gap = input.gap();
    if gap <= input.tolerance {
        CompletionDecision::Complete { reconciled: true }
    } else {
        CompletionDecision::Desynced {
            total_steps: input.total_steps,
            valuemax: input.valuemax,
            gap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drained(total_steps: u32, valuemax: u32) -> CompletionInput {
        CompletionInput {
            total_steps,
            valuemax,
            completed: 1,
            pcb_len: 1,
            tolerance: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_primary_signal() {
        let input = CompletionInput {
            total_steps: 12,
            valuemax: 12,
            running: 1,
            pcb_len: 1,
            tolerance: 5,
            ..Default::default()
        };
        assert_eq!(detect(&input), CompletionDecision::Complete { reconciled: false });
    }

    #[test]
    fn test_nothing_submitted_is_pending() {
        assert_eq!(detect(&CompletionInput::default()), CompletionDecision::Pending);
    }

    #[test]
    fn test_active_work_is_pending() {
        let mut input = drained(8, 12);
        input.waiting = 1;
        assert_eq!(detect(&input), CompletionDecision::Pending);

        let mut input = drained(8, 12);
        input.queue_len = 1;
        assert_eq!(detect(&input), CompletionDecision::Pending);
    }

    #[test]
    fn test_secondary_within_tolerance_reconciles() {
        assert_eq!(detect(&drained(9, 12)), CompletionDecision::Complete { reconciled: true });
        assert_eq!(detect(&drained(7, 12)), CompletionDecision::Complete { reconciled: true });
    }

    #[test]
    fn test_secondary_beyond_tolerance_desyncs() {
        assert_eq!(
            detect(&drained(3, 12)),
            CompletionDecision::Desynced {
                total_steps: 3,
                valuemax: 12,
                gap: 9
            }
        );
    }

    #[test]
    fn test_empty_pcb_counts_as_drained() {
        let input = CompletionInput {
            total_steps: 10,
            valuemax: 12,
            tolerance: 5,
            ..Default::default()
        };
        assert_eq!(detect(&input), CompletionDecision::Complete { reconciled: true });
    }

    #[test]
    fn test_already_signaled_is_idempotent() {
        let mut input = drained(12, 12);
        input.already_signaled = true;
        assert_eq!(detect(&input), CompletionDecision::AlreadySignaled);
        assert_eq!(detect(&input), CompletionDecision::AlreadySignaled);

        input.queue_len = 1;
        input.total_steps = 11;
        assert_eq!(detect(&input), CompletionDecision::Pending);
    }
}
