//! Render cache.
//!
//! Stores rendered cards in memory, deduplicates concurrent renders of the
//! same track, and clears itself on a fixed schedule.

pub mod coordinator;
pub mod pending;
pub mod store;

// Re-export commonly used types
pub use coordinator::{RenderCoordinator, DEFAULT_RENDER_TIMEOUT, DEFAULT_SWEEP_INTERVAL};
pub use pending::{PendingRender, RenderOutcome};
pub use store::RenderStore;
