//! Generator state management
//!
//! The orchestrator that owns the engine, entropy source, seed record, and
//! distribution states, plus the checkpoint codec it persists through.
//!
//! See `engine.rs` for the manager, `checkpoint.rs` for persistence.

pub mod checkpoint;
mod engine;

// Re-export main types for convenience
pub use engine::{LoadStatus, ManagerConfig, RngError, RngManager, SeedStatus};
