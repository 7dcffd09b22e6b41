/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::RecordId;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Process table store errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    #[diagnostic(
        code(store::unavailable),
        help("The process table could not be reached. The tick stays journaled and is retried.")
    )]
    Unavailable(String),

    #[error("Record {id} rejected by {table} table: {reason}")]
    #[diagnostic(
        code(store::rejected),
        help("The store refused the write. Check record ids for collisions.")
    )]
    Rejected {
        table: String,
        id: RecordId,
        reason: String,
    },
}

impl StoreError {
    /// Whether the operation may succeed if attempted again
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Admission-time process validation errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ProcessError {
    #[error("Invalid burst {burst}: {reason}")]
    #[diagnostic(
        code(process::invalid_burst),
        help("Bursts must be at least one tick.")
    )]
    InvalidBurst { burst: u32, reason: String },

    #[error("Invalid I/O request (io_when {io_when}, io_time {io_time}): {reason}")]
    #[diagnostic(
        code(process::invalid_io),
        help("io_when is a remaining-burst offset strictly between 0 and the burst. Use 0 for no I/O.")
    )]
    InvalidIo {
        io_when: u32,
        io_time: u32,
        reason: String,
    },
}

/// Scheduler-related errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SchedulerError {
    #[error("Invalid scheduling policy: {0}")]
    #[diagnostic(
        code(scheduler::invalid_policy),
        help("Use one of: First Come, First Serve | Shortest Job First | Priority | Round Robin.")
    )]
    InvalidPolicy(String),

    #[error("Invalid quantum: {0} ticks")]
    #[diagnostic(
        code(scheduler::invalid_quantum),
        help("Round-Robin quantum must be between 1 and 1000 ticks.")
    )]
    InvalidQuantum(u32),

    #[error("Invalid priority order: {0}")]
    #[diagnostic(
        code(scheduler::invalid_priority_order),
        help("Use lower_first or higher_first.")
    )]
    InvalidPriorityOrder(String),
}

/// Configuration loading errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value} ({reason})")]
    #[diagnostic(code(config::invalid_value))]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read configuration: {0}")]
    #[diagnostic(
        code(config::io),
        help("Check that SCHED_SIM_CONFIG points to a readable file.")
    )]
    Io(String),

    #[error("Failed to parse configuration: {0}")]
    #[diagnostic(code(config::parse), help("The configuration file must be JSON."))]
    Parse(String),
}

/// Unified simulator error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum SimError {
    #[error("Store error: {0}")]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error("Process error: {0}")]
    #[diagnostic(transparent)]
    Process(#[from] ProcessError),

    #[error("Scheduler error: {0}")]
    #[diagnostic(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("Configuration error: {0}")]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("Timeline desync: total steps {total_steps} vs expected {valuemax}")]
    #[diagnostic(
        code(sim::timeline_desync),
        help("Step accounting drifted beyond the completion tolerance. Inspect the event log.")
    )]
    TimelineDesync { total_steps: u32, valuemax: u32 },

    #[error("Run did not complete within {max_ticks} ticks")]
    #[diagnostic(
        code(sim::tick_budget_exhausted),
        help("Raise the tick budget or check for processes that never finish.")
    )]
    TickBudgetExhausted { max_ticks: u64 },

    #[error("Internal error: {0}")]
    #[diagnostic(
        code(sim::internal_error),
        help("An unexpected internal error occurred. Please report this issue.")
    )]
    Internal(String),
}

impl SimError {
    /// True for the `StoreUnavailable` condition
    #[inline]
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, SimError::Store(err) if err.is_transient())
    }
}

impl From<String> for SimError {
    fn from(msg: String) -> Self {
        SimError::Internal(msg)
    }
}

impl From<&str> for SimError {
    fn from(msg: &str) -> Self {
        SimError::Internal(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_serialization() {
        let error = StoreError::Unavailable("connection refused".into());
        let json = serde_json::to_string(&error).unwrap();
        let deserialized: StoreError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, deserialized);
        assert!(json.contains("\"error_type\":\"unavailable\""));
    }

    #[test]
    fn test_store_unavailable_detection() {
        let transient: SimError = StoreError::Unavailable("down".into()).into();
        assert!(transient.is_store_unavailable());

        let rejected: SimError = StoreError::Rejected {
            table: "pcb".into(),
            id: 4,
            reason: "duplicate id".into(),
        }
        .into();
        assert!(!rejected.is_store_unavailable());
    }

    #[test]
    fn test_desync_display() {
        let error = SimError::TimelineDesync {
            total_steps: 3,
            valuemax: 12,
        };
        assert_eq!(
            error.to_string(),
            "Timeline desync: total steps 3 vs expected 12"
        );
    }

    #[test]
    fn test_sim_error_from_string() {
        let error: SimError = "boom".into();
        assert!(matches!(error, SimError::Internal(_)));
    }
}
