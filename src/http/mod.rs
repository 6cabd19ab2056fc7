//! HTTP front door.
//!
//! Routes:
//! - `GET /{trackID}`: rendered preview card (PNG)
//! - `GET /{trackID}/info`: resolved metadata as JSON
//! - `GET /{trackID}/audio`: redirect to the audio preview

pub mod handlers;
pub mod server;

// Re-export commonly used items
pub use server::{router, run_server, AppState};
