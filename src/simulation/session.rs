/*!
 * Simulation Session
 * Per-run state: flags, tick counter, purge schedule, and the tick journal
 */

use crate::completion::CompletionDecision;
use crate::core::types::{ProcessLabel, RecordId, Tick};
use crate::scheduler::{Sequencer, TableOp, Transition};
use crate::store::Table;
use std::collections::VecDeque;
use std::fmt;
use uuid::Uuid;

/// Phases of one tick, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Admit,
    Policy,
    Purge,
    IoTransition,
    ReadyAccrual,
    WaitingCountdown,
    Observe,
    Detect,
    Finish,
}

impl Phase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Phase::Admit => "admit",
            Phase::Policy => "policy",
            Phase::Purge => "purge",
            Phase::IoTransition => "io_transition",
            Phase::ReadyAccrual => "ready_accrual",
            Phase::WaitingCountdown => "waiting_countdown",
            Phase::Observe => "observe",
            Phase::Detect => "detect",
            Phase::Finish => "finish",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tick in flight
///
/// Phases plan their writes into `pending` and advance `next_phase` before
/// committing. A failed commit leaves the rest here, and the next call to
/// `tick()` finishes this tick instead of starting another.
#[derive(Debug, Clone)]
pub struct TickJournal {
    pub tick: Tick,
    pub next_phase: Phase,
    pub pending: VecDeque<TableOp>,
    pub transitions: Vec<Transition>,
    /// Running process seen by the observation phase
    pub running: Option<ProcessLabel>,
    /// Set by detection; a terminal decision is surfaced once its writes commit
    pub decision: Option<CompletionDecision>,
    /// Commit attempts that failed for this tick
    pub stalls: u32,
}

impl TickJournal {
    pub fn new(tick: Tick) -> Self {
        Self {
            tick,
            next_phase: Phase::Admit,
            pending: VecDeque::new(),
            transitions: Vec::new(),
            running: None,
            decision: None,
            stalls: 0,
        }
    }

    /// Queue writes and advance to `next`
    pub fn plan(&mut self, ops: Vec<TableOp>, transitions: Vec<Transition>, next: Phase) {
        self.pending.extend(ops);
        self.transitions.extend(transitions);
        self.next_phase = next;
    }

    pub fn is_resumed(&self) -> bool {
        self.stalls > 0
    }
}

/// Explicit per-run state
#[derive(Debug, Clone)]
pub struct SessionState {
    pub id: Uuid,
    /// Last tick started (0 before the first)
    pub tick: Tick,
    pub started: bool,
    pub paused: bool,
    /// Policy announcement already made for this run
    pub announced: bool,
    /// Completion already surfaced for the current state
    pub completion_signaled: bool,
    /// Marked Completed this tick; purged next tick
    pub completed_this_tick: Vec<RecordId>,
    /// Marked Completed on an earlier tick; purged this tick
    pub purge_due: Vec<RecordId>,
    pub sequencer: Sequencer,
    pub journal: Option<TickJournal>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            tick: 0,
            started: false,
            paused: true,
            announced: false,
            completion_signaled: false,
            completed_this_tick: Vec::new(),
            purge_due: Vec::new(),
            sequencer: Sequencer::new(),
            journal: None,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue the journaled tick, or open the next one
    pub fn open_tick(&mut self) -> TickJournal {
        match self.journal.take() {
            Some(journal) => journal,
            None => {
                self.tick += 1;
                TickJournal::new(self.tick)
            }
        }
    }

    /// Remember which records to purge on the next tick
    pub fn note_completions(&mut self, ops: &[TableOp]) {
        for op in ops {
            if let TableOp::Upsert {
                table: Table::Pcb,
                record,
            } = op
            {
                if record.is_completed() && !self.completed_this_tick.contains(&record.id) {
                    self.completed_this_tick.push(record.id);
                }
            }
        }
    }

    /// End-of-tick rotation of the purge schedule
    pub fn rotate_purge(&mut self) {
        self.purge_due = std::mem::take(&mut self.completed_this_tick);
    }
}
