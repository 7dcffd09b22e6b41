/*!
 * Timeline Types
 * History entries, rendered segments, and the presentation view
 */

use crate::core::types::{ProcessLabel, RecordId};
use crate::process::ProcessStatus;
use serde::{Deserialize, Serialize};

/// One contiguous run of a process as recorded by the reconstructor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HistoryEntry {
    pub id: RecordId,
    pub process_id: ProcessLabel,
    pub init_burst: u32,
    /// `io_time` when the run started; part of the continuation key
    pub io_time: u32,
    /// Status at the last observation
    pub status: ProcessStatus,
    /// Ticks this run contributes to the timeline
    pub steps: u32,
    /// Executed work of the process at the last observation
    #[serde(skip)]
    pub(crate) last_work: u32,
}

impl HistoryEntry {
    /// Whether a running record extends this entry rather than starting a new one
    #[inline]
    pub fn continues_with(&self, id: RecordId, init_burst: u32, io_time: u32) -> bool {
        self.id == id && self.init_burst == init_burst && self.io_time == io_time
    }
}

/// Rendered Gantt segment `[start, end)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Segment {
    pub process_id: ProcessLabel,
    pub label: String,
    pub start: u32,
    pub end: u32,
}

impl Segment {
    #[inline]
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// What the presentation layer draws
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TimelineView {
    pub segments: Vec<Segment>,
    /// Cumulative boundaries with a trailing boundary pinned at `valuemax`
    pub boundaries: Vec<u32>,
    pub total_steps: u32,
    pub valuemax: u32,
    /// `total_steps / valuemax`, clamped to 1.0
    pub progress: f64,
    pub reconciled: bool,
}
