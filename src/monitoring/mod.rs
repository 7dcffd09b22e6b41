/*!
 * Monitoring
 * Event broadcast, run statistics, and tracing setup
 */

mod events;
mod stats;
mod tracer;

pub use events::{Event, EventBus, Severity, SimEvent};
pub use stats::{
    AtomicSimulationStats, ProcessSummary, RunLedger, RunReport, SimulationStats,
};
pub use tracer::{init_tracing, tick_span, TRACE_JSON_ENV};
