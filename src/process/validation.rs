/*!
 * Admission Validation
 * Reject process specs that would break burst or I/O accounting
 */

use super::types::ProcessSpec;
use crate::core::errors::ProcessError;
use crate::core::limits::MAX_BURST_TICKS;

/// Validate a submission before it reaches the queue table
pub fn validate_spec(spec: &ProcessSpec) -> Result<(), ProcessError> {
    validate_burst(spec.burst)?;
    validate_io(spec)?;
    Ok(())
}

fn validate_burst(burst: u32) -> Result<(), ProcessError> {
    if burst == 0 {
        return Err(ProcessError::InvalidBurst {
            burst,
            reason: "a process needs at least one tick of CPU".into(),
        });
    }

    if burst > MAX_BURST_TICKS {
        return Err(ProcessError::InvalidBurst {
            burst,
            reason: format!("exceeds the {} tick limit", MAX_BURST_TICKS),
        });
    }

    Ok(())
}

fn validate_io(spec: &ProcessSpec) -> Result<(), ProcessError> {
    // No I/O requested
    if spec.io_when == 0 {
        if spec.io_time > 0 {
            return Err(ProcessError::InvalidIo {
                io_when: spec.io_when,
                io_time: spec.io_time,
                reason: "io_time given without an io_when offset".into(),
            });
        }
        return Ok(());
    }

    // The offset is compared against the remaining burst after a dispatch,
    // so it must leave at least one tick before and after the block.
    if spec.io_when >= spec.burst {
        return Err(ProcessError::InvalidIo {
            io_when: spec.io_when,
            io_time: spec.io_time,
            reason: format!("must be below the burst ({})", spec.burst),
        });
    }

    Ok(())
}
