/*!
 * Scheduler Module
 * Scheduling policies and the per-tick state machine they share
 */

pub mod machine;
pub mod plan;
pub mod policies;
pub mod traits;
pub mod types;

// Re-export public API
pub use machine::plan_tick;
pub use plan::{Plan, Sequencer, TableOp, Transition};
pub use policies::{policy_for, Fcfs, PriorityPolicy, RoundRobin, Sjf};
pub use traits::SchedulingPolicy;
pub use types::{PolicyKind, PriorityOrder, TimeQuantum};
