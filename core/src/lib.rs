//! Reproducible RNG Core - Rust Engine
//!
//! Deterministic-reproducibility manager for pseudo-random generators:
//! owns a generator's seed material, coordinates re-seeding from an OS
//! entropy source, tracks the cumulative warm-up offset, and persists the
//! full generator + distribution state so a long-running stochastic
//! process can pause and resume bit-identically.
//!
//! # Architecture
//!
//! - **entropy**: scoped handle over the OS entropy device
//! - **rng**: generator capability trait and the default xoshiro256** engine
//! - **distributions**: normal / uniform sampling transforms
//! - **manager**: the orchestrator and its checkpoint codec
//!
//! # Critical Invariants
//!
//! 1. The seed record and the engine never diverge: every record change
//!    reseeds the engine in the same step
//! 2. Checkpoint round-trips are bit-identical (same next-N samples)
//! 3. The entropy handle is released on every exit path

// Module declarations
pub mod distributions;
pub mod entropy;
pub mod manager;
pub mod rng;

// Re-exports for convenience
pub use distributions::{NormalState, UniformState};
pub use entropy::{EntropyError, EntropySource};
pub use manager::{
    checkpoint::{GaussSnapshot, StateSnapshot, UniSnapshot, CHECKPOINT_EXT},
    LoadStatus, ManagerConfig, RngError, RngManager, SeedStatus,
};
pub use rng::{Engine, SplitMix64, Xoshiro256StarStar};
