/*!
 * Timeline Reconstructor
 *
 * Folds one table snapshot per tick into a run-length history. Work is
 * accounted from `init_burst - burst_time`, so a tick executed between two
 * observations is attributed to the run that did it even when the record has
 * already moved on (blocked on I/O, preempted, or completed).
 */

use super::types::{HistoryEntry, Segment, TimelineView};
use crate::core::types::RecordId;
use crate::process::Process;
use ahash::{AHashMap, AHashSet};
use tracing::{debug, trace};

// Records are identified by id and init_burst; a reused id with a new burst is a new process
type Key = (RecordId, u32);

#[inline]
fn key(record: &Process) -> Key {
    (record.id, record.init_burst)
}

/// Result of folding one snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Observation {
    /// `init_burst` discovered in this snapshot
    pub discovered: u32,
    /// Entries appended in this snapshot
    pub appended: usize,
    pub total_steps: u32,
    pub valuemax: u32,
}

/// Derived execution timeline
#[derive(Debug, Clone, Default)]
pub struct TimelineReconstructor {
    history: Vec<HistoryEntry>,
    // Every process ever seen in pcb or queue; drives valuemax
    seen: AHashSet<Key>,
    // Executed work already attributed to some entry, per process
    attributed: AHashMap<Key, u32>,
    valuemax: u32,
    // Correction applied on top of the raw total once reconciled
    forced_offset: Option<i64>,
}

impl TimelineReconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a pcb/queue snapshot into the history
    pub fn observe(&mut self, pcb: &[Process], queue: &[Process]) -> Observation {
        let mut observation = Observation::default();

        for record in pcb.iter().chain(queue) {
            if self.seen.insert(key(record)) {
                self.valuemax += record.init_burst;
                observation.discovered += record.init_burst;
            }
        }

        self.refresh_last(pcb);

        let before = self.history.len();

        for record in pcb.iter().filter(|p| p.is_completed()) {
            if !self.is_represented(key(record)) {
                trace!(id = record.id, final_steps = record.final_steps, "Folding in unobserved completion");
                self.push(record, record.final_steps);
            }
        }

        if let Some(running) = pcb.iter().find(|p| p.is_running()) {
            let continuation = self
                .history
                .last()
                .is_some_and(|last| last.continues_with(running.id, running.init_burst, running.io_time));

            if !continuation {
                let prior = self.attributed.get(&key(running)).copied().unwrap_or(0);
                let contribution = running.executed().saturating_sub(prior);
                debug!(
                    process = %running.label(),
                    start = self.raw_total(),
                    steps = contribution,
                    "New timeline segment"
                );
                self.push(running, contribution);
            }
        }

        observation.appended = self.history.len() - before;
        observation.total_steps = self.total_steps();
        observation.valuemax = self.valuemax;
        observation
    }

    // Credit the latest entry with work done since it was last observed
    fn refresh_last(&mut self, pcb: &[Process]) {
        let Some(last) = self.history.last_mut() else {
            return;
        };
        let Some(live) = pcb.iter().find(|p| p.id == last.id && p.init_burst == last.init_burst)
        else {
            return;
        };

        let work = live.executed();
        if work > last.last_work {
            last.steps += work - last.last_work;
            last.last_work = work;
            self.attributed.insert((last.id, last.init_burst), work);
        }
        last.status = live.status;
    }

    fn push(&mut self, record: &Process, contribution: u32) {
        let work = record.executed();
        self.attributed
            .entry(key(record))
            .and_modify(|w| *w = (*w).max(work))
            .or_insert(work);
        self.history.push(HistoryEntry {
            id: record.id,
            process_id: record.process_id,
            init_burst: record.init_burst,
            io_time: record.io_time,
            status: record.status,
            steps: contribution,
            last_work: work,
        });
    }

    fn is_represented(&self, key: Key) -> bool {
        self.history
            .iter()
            .any(|entry| entry.id == key.0 && entry.init_burst == key.1)
    }

    #[inline]
    fn raw_total(&self) -> u32 {
        self.history.iter().map(|entry| entry.steps).sum()
    }

    /// Executed steps shown to the user
    pub fn total_steps(&self) -> u32 {
        let raw = self.raw_total();
        match self.forced_offset {
            Some(offset) => (i64::from(raw) + offset).clamp(0, i64::from(u32::MAX)) as u32,
            None => raw,
        }
    }

    /// Expected total work of every process seen so far
    #[inline]
    pub fn valuemax(&self) -> u32 {
        self.valuemax
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Pin the total at `valuemax` after a tolerated disagreement
    ///
    /// The correction is kept as an offset, so work observed afterwards still
    /// moves the total.
    pub fn reconcile(&mut self) {
        self.forced_offset = Some(i64::from(self.valuemax) - i64::from(self.raw_total()));
    }

    pub fn is_reconciled(&self) -> bool {
        self.forced_offset.is_some()
    }

    /// Cumulative boundaries `[0, t1, ..., tk]`
    pub fn boundaries(&self) -> Vec<u32> {
        let mut boundaries = Vec::with_capacity(self.history.len() + 1);
        boundaries.push(0);
        let mut acc = 0;
        for entry in &self.history {
            acc += entry.steps;
            boundaries.push(acc);
        }
        boundaries
    }

    /// Boundaries plus a trailing one pinned at `valuemax`
    pub fn rendered_boundaries(&self) -> Vec<u32> {
        let mut boundaries = self.boundaries();
        if boundaries.last().is_some_and(|&last| self.valuemax > last) {
            boundaries.push(self.valuemax);
        }
        boundaries
    }

    /// Non-empty runs as Gantt segments
    pub fn segments(&self) -> Vec<Segment> {
        let mut start = 0;
        let mut segments = Vec::with_capacity(self.history.len());
        for entry in &self.history {
            let end = start + entry.steps;
            if end > start {
                segments.push(Segment {
                    process_id: entry.process_id,
                    label: format!("P{}", entry.process_id),
                    start,
                    end,
                });
            }
            start = end;
        }
        segments
    }

    pub fn progress(&self) -> f64 {
        if self.valuemax == 0 {
            return 0.0;
        }
        (self.total_steps() as f64 / self.valuemax as f64).min(1.0)
    }

    pub fn view(&self) -> TimelineView {
        TimelineView {
            segments: self.segments(),
            boundaries: self.rendered_boundaries(),
            total_steps: self.total_steps(),
            valuemax: self.valuemax,
            progress: self.progress(),
            reconciled: self.is_reconciled(),
        }
    }

    /// Back to the empty timeline with `valuemax = 0`
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ProcessSpec, ProcessStatus};

    fn record(id: u32, burst: u32) -> Process {
        let mut p = Process::from_spec(&ProcessSpec::new(id, burst));
        p.id = id;
        p
    }

    fn running(id: u32, burst: u32, remaining: u32, steps: u32) -> Process {
        let mut p = record(id, burst);
        p.status = ProcessStatus::Running;
        p.burst_time = remaining;
        p.steps = steps;
        p
    }

    #[test]
    fn test_valuemax_counts_queue_and_pcb_once() {
        let mut timeline = TimelineReconstructor::new();
        let queued = vec![record(1, 4), record(2, 6)];
        timeline.observe(&[], &queued);
        assert_eq!(timeline.valuemax(), 10);

        // Same records after admission
        timeline.observe(&queued, &[]);
        assert_eq!(timeline.valuemax(), 10);
    }

    #[test]
    fn test_continuation_extends_in_place() {
        let mut timeline = TimelineReconstructor::new();
        timeline.observe(&[running(1, 5, 4, 1)], &[]);
        timeline.observe(&[running(1, 5, 3, 2)], &[]);
        timeline.observe(&[running(1, 5, 2, 3)], &[]);

        assert_eq!(timeline.history().len(), 1);
        assert_eq!(timeline.total_steps(), 3);
        assert_eq!(timeline.boundaries(), vec![0, 3]);
        assert_eq!(timeline.rendered_boundaries(), vec![0, 3, 5]);
    }

    #[test]
    fn test_work_done_before_blocking_is_kept() {
        let mut timeline = TimelineReconstructor::new();
        timeline.observe(&[running(1, 5, 4, 1)], &[]);

        // Ran once more, then blocked before the next observation
        let mut blocked = running(1, 5, 3, 2);
        blocked.status = ProcessStatus::Waiting;
        blocked.steps = 0;
        timeline.observe(&[blocked], &[]);

        assert_eq!(timeline.total_steps(), 2);
        assert_eq!(timeline.history()[0].status, ProcessStatus::Waiting);
    }

    #[test]
    fn test_completed_before_observation_is_folded_in() {
        let mut timeline = TimelineReconstructor::new();
        let mut done = record(7, 2);
        done.status = ProcessStatus::Completed;
        done.burst_time = 0;
        done.final_steps = 2;

        timeline.observe(&[done.clone()], &[]);
        timeline.observe(&[done], &[]);

        assert_eq!(timeline.history().len(), 1);
        assert_eq!(timeline.total_steps(), 2);
    }

    #[test]
    fn test_reconciled_total_follows_later_work() {
        let mut timeline = TimelineReconstructor::new();
        timeline.observe(&[running(1, 5, 4, 1), record(2, 2)], &[]);
        timeline.reconcile();
        assert_eq!(timeline.total_steps(), 7);

        timeline.observe(&[running(3, 4, 2, 2)], &[]);
        assert_eq!(timeline.valuemax(), 11);
        assert_eq!(timeline.total_steps(), 9);

        timeline.observe(&[running(3, 4, 0, 4)], &[]);
        assert_eq!(timeline.total_steps(), timeline.valuemax());
        assert!(timeline.is_reconciled());
    }

    #[test]
    fn test_resumed_process_gets_new_segment() {
        let mut timeline = TimelineReconstructor::new();
        timeline.observe(&[running(1, 4, 1, 3)], &[]);
        timeline.observe(&[running(2, 2, 1, 1)], &[]);
        timeline.observe(&[running(2, 2, 0, 2)], &[]);
        timeline.observe(&[running(1, 4, 0, 1)], &[]);

        let segments = timeline.segments();
        let spans: Vec<(u32, u32, u32)> = segments
            .iter()
            .map(|s| (s.process_id, s.start, s.end))
            .collect();
        assert_eq!(spans, vec![(1, 0, 3), (2, 3, 5), (1, 5, 6)]);
    }

    #[test]
    fn test_reconcile_and_reset() {
        let mut timeline = TimelineReconstructor::new();
        timeline.observe(&[running(1, 6, 3, 3)], &[]);
        assert!((timeline.progress() - 0.5).abs() < f64::EPSILON);

        timeline.reconcile();
        assert_eq!(timeline.total_steps(), 6);
        assert!(timeline.view().reconciled);

        timeline.reset();
        assert_eq!(timeline.valuemax(), 0);
        assert_eq!(timeline.total_steps(), 0);
        assert_eq!(timeline.boundaries(), vec![0]);
        assert_eq!(timeline.progress(), 0.0);
    }
}
