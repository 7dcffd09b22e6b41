/*!
 * Process Module
 * Process records and admission validation
 */

pub mod types;
pub mod validation;

// Re-export for convenience
pub use types::{MemorySegment, Process, ProcessSpec, ProcessStatus, SegmentStatus};
pub use validation::validate_spec;
