/*!
 * Core Types
 * Common types used across the simulator
 */

/// Store-assigned record identifier
pub type RecordId = u32;

/// Human-facing process label (rendered as `P{n}`)
pub type ProcessLabel = u32;

/// Tick counter (first tick of a run is 1)
pub type Tick = u64;

/// Priority level used by the priority policy
pub type Priority = u8;

/// Ticket ordering entries of the ready queue
pub type ReadySeq = u64;

/// Common result type for simulator operations
pub type SimResult<T> = Result<T, super::errors::SimError>;
