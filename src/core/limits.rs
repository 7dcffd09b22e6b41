/*!
 * Simulator Limits and Defaults
 *
 * Centralized location for defaults, thresholds, and magic numbers.
 * Organized by domain for maintainability and discoverability.
 */

use std::time::Duration;

// =============================================================================
// SCHEDULING
// =============================================================================

/// Default Round-Robin time quantum (ticks)
pub const DEFAULT_QUANTUM_TICKS: u32 = 3;

/// Largest quantum accepted by configuration (ticks)
pub const MAX_QUANTUM_TICKS: u32 = 1_000;

/// Default wall-clock period of one tick
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(1_000);

/// Shortest tick period accepted by configuration
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Largest burst accepted at admission (ticks)
pub const MAX_BURST_TICKS: u32 = 100_000;

// =============================================================================
// COMPLETION
// =============================================================================

/// Maximum |total_steps - valuemax| reconciled silently on completion
pub const COMPLETION_TOLERANCE: u32 = 5;

// =============================================================================
// STORE
// =============================================================================

/// Attempts per store operation before a tick is abandoned
pub const STORE_RETRY_ATTEMPTS: u32 = 3;

/// First backoff between store retries (doubles per attempt)
pub const STORE_RETRY_BACKOFF: Duration = Duration::from_millis(20);

/// Size of the single free block seeded into the memory table on reset
pub const INITIAL_MEMORY_BLOCK: u32 = 24;

// =============================================================================
// OBSERVABILITY
// =============================================================================

/// Broadcast buffer for simulation events (lagging subscribers drop oldest)
pub const EVENT_CHANNEL_CAPACITY: usize = 1_024;
