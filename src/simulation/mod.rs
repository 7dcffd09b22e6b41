/*!
 * Simulation Module
 * Tick driver: per-run session state, phase planners, engine, and timer task
 */

pub mod engine;
pub mod session;
pub mod task;
pub mod updates;

// Re-export public API
pub use engine::{Simulation, TickOutcome, TickReport};
pub use session::{Phase, SessionState, TickJournal};
pub use task::{SharedSimulation, SimulationCommand, SimulationTask};
