//! RngManager - deterministic-reproducibility orchestrator
//!
//! Owns the generator engine, the entropy source, the seed record, and the
//! two distribution states. Every seeding strategy funnels through one
//! choke point: install seed material, reseed the engine, reset the
//! warm-up flag. The seed record can therefore never silently diverge from
//! the engine it seeded.
//!
//! # Warm-up policy
//!
//! The cumulative discard length survives reseeds and is reset only on
//! explicit request. The no-argument [`RngManager::warm_up`] re-applies
//! the recorded length exactly once per `Cold` period: while `Warmed` it
//! is a no-op, so the counter always equals the number of states actually
//! discarded since it was last reset. The explicit-count form is additive
//! on every call.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::distributions::{NormalState, UniformState};
use crate::entropy::{EntropySource, DEFAULT_DEVICE};
use crate::manager::checkpoint::{self, GaussSnapshot, StateSnapshot, UniSnapshot};
use crate::rng::{word_to_unit, Engine, Xoshiro256StarStar};

/// Entropy-derived warm-up counts are clamped to this mask so the
/// non-reproducible path stays bounded (a raw 64-bit count would spin the
/// engine for longer than the process lifetime).
const WARMUP_MASK: u64 = 0xFFFF;

// ============================================================================
// Errors and Status Codes
// ============================================================================

/// Hard failures: the operation aborted and, unless documented otherwise,
/// left the manager untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RngError {
    /// Source or destination cannot be opened, read, written, or parsed
    #[error("file error: {0}")]
    File(String),

    /// No seed material available (empty record, or a checkpoint without
    /// its mandatory engine-state section)
    #[error("seed material not found")]
    SeedNotFound,

    /// Entropy-backed operation requested but the device yielded nothing
    #[error("entropy source unavailable: {0}")]
    EntropySourceUnavailable(String),
}

impl From<std::io::Error> for RngError {
    fn from(err: std::io::Error) -> Self {
        RngError::File(err.to_string())
    }
}

/// Canonical report of the seed record vs the engine's required count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedStatus {
    /// Record holds at least the required number of seed words
    Success,

    /// Record is non-empty but shorter than required; the engine is seeded,
    /// with degraded statistical quality
    EntropyShortage,

    /// Record is empty
    SeedNotFound,
}

/// Soft outcome of a checkpoint restore. Hard failures are [`RngError`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Everything restored
    Success,

    /// Engine restored from fewer words than its state width
    EntropyShortage,

    /// One or both distribution sections missing or unusable; defaults (or
    /// previously configured parameters) retained for those
    DistStateNotFound,
}

// ============================================================================
// Configuration
// ============================================================================

/// Construction-time settings for a manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Path of the entropy device backing non-deterministic operations
    #[serde(default = "default_entropy_path")]
    pub entropy_path: PathBuf,

    /// Cumulative discard length carried over from a previous run, for
    /// old-seed workflows where the warm-up must be re-applied by hand
    #[serde(default)]
    pub initial_discard: u64,
}

fn default_entropy_path() -> PathBuf {
    PathBuf::from(DEFAULT_DEVICE)
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            entropy_path: default_entropy_path(),
            initial_discard: 0,
        }
    }
}

// ============================================================================
// Manager
// ============================================================================

/// Deterministic-reproducibility manager for a pseudo-random engine.
///
/// Single-threaded and synchronous; for multi-threaded use, give each
/// thread its own manager or share one behind a mutex (a reseed must be
/// atomic with respect to subsequent sampling).
///
/// # Example
/// ```
/// use reproducible_rng_core_rs::{ManagerConfig, RngManager, SeedStatus};
///
/// let mut rng = RngManager::new(ManagerConfig::default());
/// assert_eq!(rng.seed_status(), SeedStatus::SeedNotFound);
///
/// let mut next = 1u64;
/// let status = rng.seed_from_generator(|| {
///     let word = next;
///     next += 1;
///     word
/// });
/// assert_eq!(status, SeedStatus::Success);
///
/// let value = rng.sample_uniform();
/// assert!((0.0..1.0).contains(&value));
/// ```
#[derive(Debug)]
pub struct RngManager<E: Engine = Xoshiro256StarStar> {
    engine: E,
    entropy: EntropySource,
    seed_list: Vec<u64>,
    total_discard: u64,
    warmed: bool,
    gauss: NormalState,
    uni: UniformState,
}

impl RngManager<Xoshiro256StarStar> {
    /// Manager over the default xoshiro256** engine.
    ///
    /// The engine starts default-seeded with an empty seed record;
    /// [`RngManager::seed_status`] reports [`SeedStatus::SeedNotFound`]
    /// until a seeding strategy runs.
    pub fn new(config: ManagerConfig) -> Self {
        Self::with_engine(Xoshiro256StarStar::default(), config)
    }
}

impl Default for RngManager<Xoshiro256StarStar> {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl<E: Engine> RngManager<E> {
    /// Manager over a caller-supplied engine.
    pub fn with_engine(engine: E, config: ManagerConfig) -> Self {
        Self {
            engine,
            entropy: EntropySource::with_path(&config.entropy_path),
            seed_list: Vec::new(),
            total_discard: config.initial_discard,
            warmed: false,
            gauss: NormalState::standard(),
            uni: UniformState::standard(),
        }
    }

    // ------------------------------------------------------------------
    // Seeding strategies
    //
    // Common post-condition: the record is replaced, the engine is
    // reseeded from it exactly once, and the warm-up machine is Cold.
    // ------------------------------------------------------------------

    /// Replace the record and reseed the engine in the same step.
    fn install_seeds(&mut self, words: Vec<u64>) -> SeedStatus {
        self.seed_list = words;
        self.engine.reseed(&self.seed_list);
        self.warmed = false;
        let status = self.seed_status();
        tracing::debug!(words = self.seed_list.len(), status = ?status, "engine reseeded");
        status
    }

    /// Seed with the engine's built-in default value.
    pub fn seed_with_default(&mut self) -> SeedStatus {
        self.install_seeds(vec![E::DEFAULT_SEED])
    }

    /// Seed with the current clock reading as a single word.
    ///
    /// Not reproducible across runs; useful when a run only needs to be
    /// replayable from its own checkpoints.
    pub fn seed_with_time(&mut self) -> SeedStatus {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or(E::DEFAULT_SEED);
        self.install_seeds(vec![nanos])
    }

    /// Seed with exactly one caller-chosen word.
    pub fn seed_with_value(&mut self, word: u64) -> SeedStatus {
        self.install_seeds(vec![word])
    }

    /// Seed with [`Engine::SEED_WORDS`] words drawn from the entropy
    /// source, opened and closed around the burst.
    ///
    /// If the device cannot be opened, or yields nothing at all, the call
    /// fails without touching the record. A burst that runs short after at
    /// least one word still reseeds and reports the shortage.
    pub fn seed_from_entropy(&mut self) -> Result<SeedStatus, RngError> {
        if !self.entropy.open() {
            return Err(RngError::EntropySourceUnavailable(format!(
                "cannot open {}",
                self.entropy.path().display()
            )));
        }

        let mut words = Vec::with_capacity(E::SEED_WORDS);
        let mut failure = None;
        for _ in 0..E::SEED_WORDS {
            match self.entropy.read_word() {
                Ok(word) => words.push(word),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        self.entropy.close();

        if let Some(err) = failure {
            if words.is_empty() {
                return Err(RngError::EntropySourceUnavailable(err.to_string()));
            }
            tracing::warn!(
                read = words.len(),
                needed = E::SEED_WORDS,
                error = %err,
                "entropy ran short; seeding with a partial sequence"
            );
        }
        Ok(self.install_seeds(words))
    }

    /// Seed by invoking a caller-supplied word producer exactly
    /// [`Engine::SEED_WORDS`] times, in order.
    pub fn seed_from_generator(&mut self, mut supplier: impl FnMut() -> u64) -> SeedStatus {
        let words: Vec<u64> = (0..E::SEED_WORDS).map(|_| supplier()).collect();
        self.install_seeds(words)
    }

    /// Reseed the engine from the words already in the record.
    ///
    /// Rewinds the engine to its post-seed position without re-applying
    /// any warm-up. No-op on an empty record.
    pub fn reload_seeds(&mut self) -> SeedStatus {
        if self.seed_list.is_empty() {
            return SeedStatus::SeedNotFound;
        }
        self.engine.reseed(&self.seed_list);
        self.warmed = false;
        self.seed_status()
    }

    // ------------------------------------------------------------------
    // Seed record queries
    // ------------------------------------------------------------------

    /// Record size vs the engine's required seed count.
    pub fn seed_status(&self) -> SeedStatus {
        if self.seed_list.is_empty() {
            SeedStatus::SeedNotFound
        } else if self.seed_list.len() < E::SEED_WORDS {
            SeedStatus::EntropyShortage
        } else {
            SeedStatus::Success
        }
    }

    /// The seed words most recently used to build the engine state, in
    /// the order they were used.
    pub fn seed_words(&self) -> &[u64] {
        &self.seed_list
    }

    /// First seed word, for cheap run-to-run comparison while debugging.
    pub fn first_seed(&self) -> Option<u64> {
        self.seed_list.first().copied()
    }

    /// Number of words in the record.
    pub fn seed_count(&self) -> usize {
        self.seed_list.len()
    }

    /// Seed count the engine wants for a full-quality reseed.
    pub fn required_seed_count(&self) -> usize {
        E::SEED_WORDS
    }

    /// SHA-256 hex digest of the record, for comparing runs without
    /// dumping whole word lists.
    pub fn seed_fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for word in &self.seed_list {
            hasher.update(word.to_le_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    // ------------------------------------------------------------------
    // Warm-up state machine
    // ------------------------------------------------------------------

    /// Re-apply the recorded warm-up, or derive one from entropy.
    ///
    /// - Already `Warmed`: no-op, returns 0.
    /// - `Cold` with a nonzero recorded length: discards exactly that many
    ///   states (the old-seed restore path) and leaves the counter as is.
    /// - `Cold` with nothing recorded: draws one entropy word, clamps it
    ///   to 16 bits, discards that many states and accumulates the count.
    ///   Not reproducible across runs.
    ///
    /// Returns the number of states discarded by this call.
    pub fn warm_up(&mut self) -> Result<u64, RngError> {
        if self.warmed {
            return Ok(0);
        }
        if self.total_discard > 0 {
            self.engine.discard(self.total_discard);
            self.warmed = true;
            tracing::debug!(discarded = self.total_discard, "recorded warm-up re-applied");
            return Ok(self.total_discard);
        }

        let advance = self.entropy_word_once()? & WARMUP_MASK;
        self.engine.discard(advance);
        self.total_discard += advance;
        self.warmed = true;
        tracing::debug!(discarded = advance, "entropy warm-up applied");
        Ok(advance)
    }

    /// Discard exactly `count` states and add them to the cumulative
    /// length. Additive on every call.
    pub fn warm_up_by(&mut self, count: u64) -> u64 {
        self.engine.discard(count);
        self.total_discard += count;
        self.warmed = true;
        count
    }

    /// Whether a warm-up has been applied since the last reseed.
    pub fn warmed_up(&self) -> bool {
        self.warmed
    }

    /// Cumulative number of states discarded since the counter was last
    /// reset. Survives reseeds.
    pub fn discard_length(&self) -> u64 {
        self.total_discard
    }

    /// Zero the cumulative discard counter. This is the only implicit-free
    /// way the counter ever decreases.
    pub fn reset_discard(&mut self) {
        self.total_discard = 0;
    }

    // ------------------------------------------------------------------
    // Checkpointing
    // ------------------------------------------------------------------

    /// Persist engine and distribution state, and optionally the
    /// cumulative discard length, to a checkpoint file.
    ///
    /// The canonical extension is appended when absent; the path actually
    /// written is returned.
    pub fn save_checkpoint(
        &self,
        path: impl AsRef<Path>,
        include_discard: bool,
    ) -> Result<PathBuf, RngError> {
        let snapshot = StateSnapshot {
            engine_state: Some(self.engine.state_words()),
            gauss_state: Some(GaussSnapshot::from(&self.gauss)),
            uni_state: Some(UniSnapshot::from(&self.uni)),
            discard: include_discard.then_some(self.total_discard),
        };
        let written = checkpoint::write_snapshot(path.as_ref(), &snapshot)?;
        tracing::debug!(path = %written.display(), include_discard, "checkpoint saved");
        Ok(written)
    }

    /// Restore state from a checkpoint file.
    ///
    /// `engine_state` is mandatory; when absent the call fails with
    /// [`RngError::SeedNotFound`] and the prior in-memory state is left
    /// untouched. Missing or unusable distribution sections are soft
    /// failures: the affected distribution keeps its current parameters
    /// and the result degrades to [`LoadStatus::DistStateNotFound`].
    ///
    /// The restored `engine_state` words become the new seed record. With
    /// `include_discard`, a persisted nonzero `discard` restores the
    /// cumulative length and marks the machine `Warmed`: the engine words
    /// already embed every past discard, so the no-argument warm-up has
    /// nothing left to re-apply and the resumed sample stream is
    /// bit-identical.
    pub fn load_checkpoint(
        &mut self,
        path: impl AsRef<Path>,
        include_discard: bool,
    ) -> Result<LoadStatus, RngError> {
        let snapshot = checkpoint::read_snapshot(path.as_ref())?;

        let words = snapshot.engine_state.ok_or(RngError::SeedNotFound)?;
        if words.is_empty() {
            return Err(RngError::SeedNotFound);
        }

        // Matching state width restores the exact position; anything else
        // is treated as plain seed material.
        if !self.engine.restore_words(&words) {
            self.engine.reseed(&words);
        }
        self.seed_list = words;
        self.warmed = false;

        let mut missing_dist = false;
        match snapshot.gauss_state.as_ref().and_then(GaussSnapshot::restore) {
            Some(state) => self.gauss = state,
            None => missing_dist = true,
        }
        match snapshot.uni_state.as_ref().and_then(UniSnapshot::restore) {
            Some(state) => self.uni = state,
            None => missing_dist = true,
        }
        if missing_dist {
            tracing::warn!(
                path = %path.as_ref().display(),
                "checkpoint is missing distribution state; keeping current parameters"
            );
        }

        if include_discard {
            if let Some(discard) = snapshot.discard {
                self.total_discard = discard;
                self.warmed = discard > 0;
            }
        }

        let outcome = if missing_dist {
            LoadStatus::DistStateNotFound
        } else {
            match self.seed_status() {
                SeedStatus::SeedNotFound => return Err(RngError::SeedNotFound),
                SeedStatus::EntropyShortage => LoadStatus::EntropyShortage,
                SeedStatus::Success => LoadStatus::Success,
            }
        };
        tracing::debug!(path = %path.as_ref().display(), outcome = ?outcome, "checkpoint loaded");
        Ok(outcome)
    }

    /// Write the record in the legacy line-oriented format: one decimal
    /// word per line.
    ///
    /// Refuses checkpoint-extension paths with a file error; the two
    /// formats never share a name silently.
    pub fn save_legacy_seeds(&self, path: impl AsRef<Path>) -> Result<SeedStatus, RngError> {
        checkpoint::write_seed_lines(path.as_ref(), &self.seed_list)?;
        Ok(self.seed_status())
    }

    /// Seed from a legacy line-oriented file.
    ///
    /// Reads at most [`Engine::SEED_WORDS`] words, stopping early on a
    /// short file; a short read reseeds from what was read and degrades
    /// the status, it does not fail. A file with no usable words fails
    /// with [`RngError::SeedNotFound`] and leaves the record untouched.
    pub fn load_legacy_seeds(&mut self, path: impl AsRef<Path>) -> Result<SeedStatus, RngError> {
        let words = checkpoint::read_seed_lines(path.as_ref(), E::SEED_WORDS)?;
        if words.is_empty() {
            return Err(RngError::SeedNotFound);
        }
        let status = self.install_seeds(words);
        if status == SeedStatus::EntropyShortage {
            tracing::warn!(path = %path.as_ref().display(), "legacy seed file ran short");
        }
        Ok(status)
    }

    // ------------------------------------------------------------------
    // Sampling
    // ------------------------------------------------------------------

    /// Normal deviate driven by the deterministic engine.
    pub fn sample_normal(&mut self) -> f64 {
        if let Some(value) = self.gauss.cached() {
            return value;
        }
        let u1 = self.engine.next_f64();
        let u2 = self.engine.next_f64();
        self.gauss.transform(u1, u2)
    }

    /// Uniform deviate driven by the deterministic engine.
    pub fn sample_uniform(&mut self) -> f64 {
        let unit = self.engine.next_f64();
        self.uni.sample(unit)
    }

    /// Normal deviate driven by the entropy source instead of the engine.
    ///
    /// The device is opened on demand and left open for further entropy
    /// draws. Never consults or mutates the seed record.
    pub fn sample_normal_from_entropy(&mut self) -> Result<f64, RngError> {
        if let Some(value) = self.gauss.cached() {
            return Ok(value);
        }
        let u1 = word_to_unit(self.entropy_word()?);
        let u2 = word_to_unit(self.entropy_word()?);
        Ok(self.gauss.transform(u1, u2))
    }

    /// Uniform deviate driven by the entropy source instead of the engine.
    ///
    /// The device is opened on demand and left open for further entropy
    /// draws. Never consults or mutates the seed record.
    pub fn sample_uniform_from_entropy(&mut self) -> Result<f64, RngError> {
        let unit = word_to_unit(self.entropy_word()?);
        Ok(self.uni.sample(unit))
    }

    /// Raw word from the entropy source, leaving the device open for
    /// reuse.
    pub fn entropy_word(&mut self) -> Result<u64, RngError> {
        if !self.entropy.open() {
            return Err(RngError::EntropySourceUnavailable(format!(
                "cannot open {}",
                self.entropy.path().display()
            )));
        }
        self.entropy
            .read_word()
            .map_err(|err| RngError::EntropySourceUnavailable(err.to_string()))
    }

    /// Raw word from the entropy source, closing the device afterwards.
    /// Recommended for one-off draws.
    pub fn entropy_word_once(&mut self) -> Result<u64, RngError> {
        let word = self.entropy_word();
        self.entropy.close();
        word
    }

    /// Whether the managed entropy device is currently open.
    pub fn entropy_is_open(&self) -> bool {
        self.entropy.is_open()
    }

    /// Release the managed entropy device, if open.
    pub fn close_entropy(&mut self) {
        self.entropy.close();
    }

    // ------------------------------------------------------------------
    // Distribution configuration
    // ------------------------------------------------------------------

    /// Replace the normal distribution's parameters, dropping any cached
    /// latent draw.
    ///
    /// # Panics
    /// Panics if `scale` is not strictly positive and finite.
    pub fn set_normal_limits(&mut self, location: f64, scale: f64) {
        self.gauss.set_limits(location, scale);
    }

    /// Replace the uniform distribution's bounds.
    ///
    /// # Panics
    /// Panics if `upper` is not strictly greater than `lower`.
    pub fn set_uniform_limits(&mut self, lower: f64, upper: f64) {
        self.uni.set_limits(lower, upper);
    }

    /// Current normal parameters as `(location, scale)`.
    pub fn normal_limits(&self) -> (f64, f64) {
        (self.gauss.location(), self.gauss.scale())
    }

    /// Current uniform bounds as `(lower, upper)`.
    pub fn uniform_limits(&self) -> (f64, f64) {
        (self.uni.lower(), self.uni.upper())
    }
}
