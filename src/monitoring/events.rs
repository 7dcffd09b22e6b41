/*!
 * Simulation Events
 * Strongly-typed events broadcast to the presentation layer
 */

use super::stats::RunReport;
use crate::core::types::Tick;
use crate::scheduler::{PolicyKind, Transition};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

/// Event severity for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Severity {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

/// Every observable simulation event flows through this
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Tick the event belongs to (0 before the first tick)
    pub tick: Tick,
    /// Run the event belongs to
    pub session: Uuid,
    pub severity: Severity,
    pub payload: SimEvent,
}

/// Event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum SimEvent {
    /// First invocation of a policy in this run
    PolicyAnnounced { policy: PolicyKind },
    /// Table state change
    Transition(Transition),
    Started,
    Paused,
    Resumed,
    Reset,
    /// Step total forced to the expected total
    Reconciled {
        total_steps: u32,
        valuemax: u32,
        gap: u32,
    },
    /// Step total disagrees with the expected total beyond tolerance
    TimelineDesync {
        total_steps: u32,
        valuemax: u32,
        gap: u32,
    },
    /// Tick left journaled after a store failure
    TickStalled { error: String },
    /// Run finished
    Completed(Box<RunReport>),
}

impl SimEvent {
    pub fn severity(&self) -> Severity {
        match self {
            SimEvent::Transition(_) => Severity::Debug,
            SimEvent::Reconciled { .. } | SimEvent::TickStalled { .. } => Severity::Warn,
            SimEvent::TimelineDesync { .. } => Severity::Error,
            _ => Severity::Info,
        }
    }

    #[inline]
    pub fn is_completion(&self) -> bool {
        matches!(self, SimEvent::Completed(_))
    }
}

/// Broadcast fan-out of simulation events
///
/// Publishing never blocks; a lagging subscriber loses the oldest events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish to current subscribers; returns how many received it
    pub fn publish(&self, event: Event) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Events as a stream, skipping over lag gaps
    pub fn stream(&self) -> impl Stream<Item = Event> + Send + 'static {
        BroadcastStream::new(self.sender.subscribe()).filter_map(|item| item.ok())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
