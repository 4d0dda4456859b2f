//! Non-deterministic entropy acquisition
//!
//! A scoped handle over an OS entropy device, producing fixed-width words
//! on demand. Used for entropy-backed seeding and for one-off random draws
//! that must not advance the deterministic engine.

mod urandom;

pub use urandom::{EntropyError, EntropySource, DEFAULT_DEVICE, WORD_BYTES};
