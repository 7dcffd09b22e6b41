/*!
 * Simulation Statistics
 * Lock-free run counters and the per-process run report
 */

use crate::core::types::{ProcessLabel, RecordId, Tick};
use crate::process::Process;
use crate::scheduler::{PolicyKind, Transition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Point-in-time copy of the run counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    pub ticks: u64,
    pub admissions: u64,
    pub dispatches: u64,
    pub context_switches: u64,
    pub preemptions: u64,
    pub io_blocks: u64,
    pub completions: u64,
    pub store_retries: u64,
    pub stalled_ticks: u64,
}

/// Atomic run counters
///
/// Cache-line aligned; every update is a relaxed increment. A snapshot may mix
/// values from neighbouring ticks, which is fine for monitoring.
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct AtomicSimulationStats {
    ticks: AtomicU64,
    admissions: AtomicU64,
    dispatches: AtomicU64,
    context_switches: AtomicU64,
    preemptions: AtomicU64,
    io_blocks: AtomicU64,
    completions: AtomicU64,
    store_retries: AtomicU64,
    stalled_ticks: AtomicU64,
}

impl AtomicSimulationStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn inc_ticks(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_store_retries(&self) {
        self.store_retries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_stalled_ticks(&self) {
        self.stalled_ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a planned transition
    pub fn record(&self, transition: &Transition) {
        let counter = match transition {
            Transition::Admitted { .. } => &self.admissions,
            Transition::Dispatched { .. } => &self.dispatches,
            Transition::Preempted { .. } => {
                self.context_switches.fetch_add(1, Ordering::Relaxed);
                &self.preemptions
            }
            Transition::Completed { .. } => {
                self.context_switches.fetch_add(1, Ordering::Relaxed);
                &self.completions
            }
            Transition::BlockedOnIo { .. } => {
                self.context_switches.fetch_add(1, Ordering::Relaxed);
                &self.io_blocks
            }
            Transition::IoFinished { .. } | Transition::Purged { .. } | Transition::Drained { .. } => {
                return;
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SimulationStats {
        SimulationStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            admissions: self.admissions.load(Ordering::Relaxed),
            dispatches: self.dispatches.load(Ordering::Relaxed),
            context_switches: self.context_switches.load(Ordering::Relaxed),
            preemptions: self.preemptions.load(Ordering::Relaxed),
            io_blocks: self.io_blocks.load(Ordering::Relaxed),
            completions: self.completions.load(Ordering::Relaxed),
            store_retries: self.store_retries.load(Ordering::Relaxed),
            stalled_ticks: self.stalled_ticks.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.ticks,
            &self.admissions,
            &self.dispatches,
            &self.context_switches,
            &self.preemptions,
            &self.io_blocks,
            &self.completions,
            &self.store_retries,
            &self.stalled_ticks,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Lifetime summary of one process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessSummary {
    pub id: RecordId,
    pub process_id: ProcessLabel,
    pub burst: u32,
    pub arrival: Tick,
    pub admitted_at: Tick,
    /// Tick in which the last unit of burst ran
    pub finished_at: Option<Tick>,
    pub waiting_time: u32,
    /// Cumulative CPU time captured when marked Completed
    pub final_steps: u32,
}

impl ProcessSummary {
    /// Finish time minus arrival
    pub fn turnaround(&self) -> Option<Tick> {
        self.finished_at.map(|t| t.saturating_sub(self.arrival))
    }
}

/// Collects process summaries from the writes of each tick
#[derive(Debug, Clone, Default)]
pub struct RunLedger {
    processes: BTreeMap<RecordId, ProcessSummary>,
}

impl RunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admitted(&mut self, record: &Process, tick: Tick) {
        self.processes.entry(record.id).or_insert(ProcessSummary {
            id: record.id,
            process_id: record.process_id,
            burst: record.init_burst,
            arrival: record.arrival,
            admitted_at: tick,
            finished_at: None,
            waiting_time: 0,
            final_steps: 0,
        });
    }

    /// Track a written pcb record
    pub fn written(&mut self, record: &Process, tick: Tick) {
        if let Some(summary) = self.processes.get_mut(&record.id) {
            summary.waiting_time = record.waiting_time;
            if record.burst_time == 0 && summary.finished_at.is_none() {
                summary.finished_at = Some(tick);
            }
            if record.is_completed() {
                summary.final_steps = record.final_steps;
            }
        }
    }

    pub fn summaries(&self) -> Vec<ProcessSummary> {
        self.processes.values().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.processes.clear();
    }
}

/// Final report attached to the completion event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunReport {
    pub session: Uuid,
    pub policy: PolicyKind,
    pub ticks: Tick,
    pub total_steps: u32,
    pub valuemax: u32,
    pub reconciled: bool,
    pub desynced: bool,
    pub processes: Vec<ProcessSummary>,
    pub average_waiting: f64,
    pub average_turnaround: f64,
    pub stats: SimulationStats,
}

impl RunReport {
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        session: Uuid,
        policy: PolicyKind,
        ticks: Tick,
        total_steps: u32,
        valuemax: u32,
        reconciled: bool,
        desynced: bool,
        processes: Vec<ProcessSummary>,
        stats: SimulationStats,
    ) -> Self {
        let average_waiting = mean(processes.iter().map(|p| p.waiting_time as f64));
        let average_turnaround = mean(processes.iter().filter_map(|p| p.turnaround()).map(|t| t as f64));
        Self {
            session,
            policy,
            ticks,
            total_steps,
            valuemax,
            reconciled,
            desynced,
            processes,
            average_waiting,
            average_turnaround,
            stats,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0u32), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessSpec;

    #[test]
    fn test_transitions_update_counters() {
        let stats = AtomicSimulationStats::new();
        stats.inc_ticks();
        stats.record(&Transition::Dispatched { id: 1, process_id: 1 });
        stats.record(&Transition::Preempted {
            id: 1,
            process_id: 1,
            steps: 3,
        });
        stats.record(&Transition::Completed {
            id: 2,
            process_id: 2,
            final_steps: 2,
        });
        stats.record(&Transition::Purged { ids: vec![2] });

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.ticks, 1);
        assert_eq!(snapshot.dispatches, 1);
        assert_eq!(snapshot.preemptions, 1);
        assert_eq!(snapshot.completions, 1);
        assert_eq!(snapshot.context_switches, 2);

        stats.reset();
        assert_eq!(stats.snapshot(), SimulationStats::default());
    }

    #[test]
    fn test_ledger_and_report_averages() {
        let mut ledger = RunLedger::new();
        let mut a = Process::from_spec(&ProcessSpec::new(1, 2));
        a.id = 1;
        let mut b = Process::from_spec(&ProcessSpec::new(2, 1).with_arrival(1));
        b.id = 2;

        ledger.admitted(&a, 1);
        ledger.admitted(&b, 2);

        a.burst_time = 0;
        ledger.written(&a, 2);
        b.burst_time = 0;
        b.waiting_time = 2;
        ledger.written(&b, 4);
        // Later writes do not move the finish tick
        ledger.written(&b, 5);

        let summaries = ledger.summaries();
        assert_eq!(summaries[0].turnaround(), Some(2));
        assert_eq!(summaries[1].turnaround(), Some(3));

        let report = RunReport::build(
            Uuid::nil(),
            PolicyKind::Fcfs,
            4,
            3,
            3,
            false,
            false,
            summaries,
            SimulationStats::default(),
        );
        assert!((report.average_turnaround - 2.5).abs() < f64::EPSILON);
        assert!((report.average_waiting - 1.0).abs() < f64::EPSILON);
    }
}
