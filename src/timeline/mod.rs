/*!
 * Timeline Module
 * Run-length execution timeline derived from per-tick table snapshots
 */

pub mod reconstructor;
pub mod types;

// Re-export public API
pub use reconstructor::{Observation, TimelineReconstructor};
pub use types::{HistoryEntry, Segment, TimelineView};
