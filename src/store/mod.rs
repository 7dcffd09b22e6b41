/*!
 * Store Module
 * Process table contract, in-memory implementation, and retry policy
 */

pub mod memory;
pub mod retry;
pub mod traits;

// Re-export public API
pub use memory::MemoryStore;
pub use retry::RetryPolicy;
pub use traits::{Filter, ProcessStore, StoreResult, Table};
