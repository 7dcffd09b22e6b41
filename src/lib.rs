/*!
 * Scheduling Simulator Library
 * Discrete-tick CPU scheduling simulation with a derived execution timeline
 */

pub mod completion;
pub mod core;
pub mod monitoring;
pub mod process;
pub mod scheduler;
pub mod simulation;
pub mod store;
pub mod timeline;

// Re-exports
pub use crate::core::{
    ConfigError, ProcessError, SchedulerError, SimError, SimResult, SimulationConfig, StoreError,
};
pub use completion::{detect, CompletionDecision, CompletionInput};
pub use monitoring::{init_tracing, Event, EventBus, RunReport, SimEvent, SimulationStats};
pub use process::{Process, ProcessSpec, ProcessStatus};
pub use scheduler::{PolicyKind, PriorityOrder, TimeQuantum, Transition};
pub use simulation::{Simulation, SimulationTask, TickOutcome, TickReport};
pub use store::{MemoryStore, ProcessStore, Table};
pub use timeline::{Segment, TimelineReconstructor, TimelineView};
