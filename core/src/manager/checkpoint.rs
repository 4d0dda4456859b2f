//! Checkpoint - Save/Load Generator State
//!
//! Serialization of the manager's persisted fields to a structured,
//! human-inspectable JSON file with named sections, plus the legacy
//! line-oriented seed format.
//!
//! # Critical Invariants
//!
//! - **Determinism**: a saved state restores to a bit-identical sample stream
//! - **Mandatory engine state**: a file without `engine_state` is unusable
//! - **Graceful degradation**: missing distribution sections keep defaults
//! - **Format separation**: legacy seed files and checkpoints never share a
//!   path silently; the extension rules live only in this module
//!
//! Format selection is by explicit entry point (checkpoint vs legacy), not
//! by suffix sniffing at the call sites.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::distributions::{NormalState, UniformState};
use crate::manager::RngError;

/// Canonical checkpoint file extension, appended when absent.
pub const CHECKPOINT_EXT: &str = "json";

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete persisted state of a manager.
///
/// Every section is optional at the serde layer so that a partially
/// populated file deserializes cleanly; the load path decides which
/// absences are fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Opaque engine word sequence (engine-defined width)
    pub engine_state: Option<Vec<u64>>,

    /// Normal-distribution parameters and latent state
    pub gauss_state: Option<GaussSnapshot>,

    /// Uniform-distribution bounds
    pub uni_state: Option<UniSnapshot>,

    /// Cumulative warm-up length, written only on request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discard: Option<u64>,
}

/// Persisted form of [`NormalState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussSnapshot {
    pub location: f64,
    pub scale: f64,
    /// Cached second Box-Muller deviate, if one was pending
    pub latent: Option<f64>,
}

impl From<&NormalState> for GaussSnapshot {
    fn from(state: &NormalState) -> Self {
        GaussSnapshot {
            location: state.location(),
            scale: state.scale(),
            latent: state.latent(),
        }
    }
}

impl GaussSnapshot {
    /// Rebuild the live state; `None` when the persisted fields are
    /// unusable (treated by the loader as a missing section).
    pub fn restore(&self) -> Option<NormalState> {
        NormalState::restore(self.location, self.scale, self.latent)
    }
}

/// Persisted form of [`UniformState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniSnapshot {
    pub lower: f64,
    pub upper: f64,
}

impl From<&UniformState> for UniSnapshot {
    fn from(state: &UniformState) -> Self {
        UniSnapshot {
            lower: state.lower(),
            upper: state.upper(),
        }
    }
}

impl UniSnapshot {
    pub fn restore(&self) -> Option<UniformState> {
        UniformState::restore(self.lower, self.upper)
    }
}

// ============================================================================
// Path Rules
// ============================================================================

/// Whether the path carries the canonical checkpoint extension.
pub fn is_checkpoint_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case(CHECKPOINT_EXT))
        .unwrap_or(false)
}

/// Append the canonical extension when absent.
///
/// A same-named non-checkpoint file is therefore never overwritten by a
/// checkpoint write.
pub fn canonical_path(path: &Path) -> PathBuf {
    if is_checkpoint_path(path) {
        return path.to_path_buf();
    }
    let mut os_string = path.as_os_str().to_os_string();
    os_string.push(".");
    os_string.push(CHECKPOINT_EXT);
    PathBuf::from(os_string)
}

// ============================================================================
// Checkpoint Codec
// ============================================================================

/// Write a snapshot as pretty-printed JSON, returning the path actually
/// written (extension appended when needed).
pub fn write_snapshot(path: &Path, snapshot: &StateSnapshot) -> Result<PathBuf, RngError> {
    let target = canonical_path(path);
    let body = serde_json::to_string_pretty(snapshot)
        .map_err(|err| RngError::File(format!("checkpoint encode failed: {}", err)))?;
    fs::write(&target, body)?;
    Ok(target)
}

/// Read a snapshot back. Unreadable or unparseable files are file errors;
/// missing sections are left to the caller.
pub fn read_snapshot(path: &Path) -> Result<StateSnapshot, RngError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|err| RngError::File(format!("checkpoint parse failed: {}", err)))
}

// ============================================================================
// Legacy Seed Files
// ============================================================================

/// Write seeds in the legacy line-oriented format: one decimal word per
/// line, no header or footer.
///
/// Refuses checkpoint-extension paths so the two formats are never
/// conflated under one name.
pub fn write_seed_lines(path: &Path, words: &[u64]) -> Result<(), RngError> {
    if is_checkpoint_path(path) {
        return Err(RngError::File(format!(
            "refusing to write legacy seeds to a checkpoint path: {}",
            path.display()
        )));
    }
    let mut body = String::new();
    for word in words {
        let _ = writeln!(body, "{}", word);
    }
    fs::write(path, body)?;
    Ok(())
}

/// Read at most `max_words` whitespace-delimited decimal words.
///
/// Stops early at end of file or at the first token that is not an
/// unsigned integer; whatever was read up to that point is returned.
pub fn read_seed_lines(path: &Path, max_words: usize) -> Result<Vec<u64>, RngError> {
    let text = fs::read_to_string(path)?;
    let mut words = Vec::with_capacity(max_words);
    for token in text.split_whitespace() {
        if words.len() == max_words {
            break;
        }
        match token.parse::<u64>() {
            Ok(word) => words.push(word),
            Err(_) => break,
        }
    }
    Ok(words)
}
