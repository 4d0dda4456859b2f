//! Scoped handle over the OS entropy device
//!
//! Wraps a byte-oriented non-deterministic source (`/dev/urandom` by
//! default) behind an open/read/close lifecycle. The handle is an exclusive
//! resource: it is opened around bounded bursts of reads and released on
//! every exit path, including early returns, because dropping the source
//! drops the underlying file.
//!
//! A short read is always surfaced as an error; a word is never silently
//! padded with missing bytes.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default entropy device path.
pub const DEFAULT_DEVICE: &str = "/dev/urandom";

/// Fixed read width: bytes consumed from the device per result word.
pub const WORD_BYTES: usize = std::mem::size_of::<u64>();

/// Errors surfaced by entropy reads.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntropyError {
    /// Read attempted while the source is closed
    #[error("entropy source is not open")]
    NotOpen,

    /// The device returned fewer bytes than a full word
    #[error("short read from entropy source")]
    ShortRead,

    /// Any other I/O failure while reading
    #[error("entropy read failed: {0}")]
    Io(String),
}

/// Scoped handle over a non-deterministic byte source.
///
/// The `Option<File>` is both the open flag and the OS handle, so the two
/// can never disagree. Reads from a urandom-class character device never
/// block; reading a regular file past its end surfaces
/// [`EntropyError::ShortRead`] instead of hanging or padding.
///
/// # Example
/// ```no_run
/// use reproducible_rng_core_rs::EntropySource;
///
/// let mut source = EntropySource::new();
/// assert!(source.open());
/// let word = source.read_word().unwrap();
/// source.close();
/// # let _ = word;
/// ```
#[derive(Debug)]
pub struct EntropySource {
    path: PathBuf,
    handle: Option<File>,
}

impl EntropySource {
    /// Handle over the default device.
    pub fn new() -> Self {
        Self::with_path(DEFAULT_DEVICE)
    }

    /// Handle over an arbitrary device or file path.
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            handle: None,
        }
    }

    /// Path this source reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire the OS handle read-only.
    ///
    /// Returns whether acquisition succeeded. Idempotent: opening an
    /// already-open source keeps the existing handle and never leaks a
    /// second descriptor.
    pub fn open(&mut self) -> bool {
        if self.handle.is_some() {
            return true;
        }
        match File::open(&self.path) {
            Ok(file) => {
                self.handle = Some(file);
                true
            }
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed to open entropy source"
                );
                false
            }
        }
    }

    /// Whether the handle is currently open.
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Release the handle. Safe to call when already closed.
    pub fn close(&mut self) {
        // Dropping the File releases the descriptor exactly once.
        self.handle = None;
    }

    /// Read [`WORD_BYTES`] bytes and return the constructed word.
    ///
    /// Fails with [`EntropyError::NotOpen`] when closed and
    /// [`EntropyError::ShortRead`] when the device cannot fill a full word.
    pub fn read_word(&mut self) -> Result<u64, EntropyError> {
        let handle = self.handle.as_mut().ok_or(EntropyError::NotOpen)?;
        let mut buf = [0u8; WORD_BYTES];
        match handle.read_exact(&mut buf) {
            Ok(()) => Ok(u64::from_le_bytes(buf)),
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                tracing::warn!(path = %self.path.display(), "short read from entropy source");
                Err(EntropyError::ShortRead)
            }
            Err(err) => Err(EntropyError::Io(err.to_string())),
        }
    }
}

impl Default for EntropySource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_open_missing_path_returns_false() {
        let mut source = EntropySource::with_path("/nonexistent/entropy/device");
        assert!(!source.open());
        assert!(!source.is_open());
    }

    #[test]
    fn test_open_is_idempotent() {
        let mut source = EntropySource::new();
        assert!(source.open());
        assert!(source.open(), "second open must succeed without reopening");
        assert!(source.is_open());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut source = EntropySource::new();
        assert!(source.open());
        source.close();
        assert!(!source.is_open());
        source.close();
        assert!(!source.is_open());
    }

    #[test]
    fn test_reopen_after_close() {
        let mut source = EntropySource::new();
        assert!(source.open());
        source.close();
        assert!(source.open());
        assert!(source.read_word().is_ok());
    }

    #[test]
    fn test_read_while_closed_fails() {
        let mut source = EntropySource::new();
        assert_eq!(source.read_word(), Err(EntropyError::NotOpen));
    }

    #[test]
    fn test_read_word_from_device() {
        let mut source = EntropySource::new();
        assert!(source.open());
        // Two device words colliding is astronomically unlikely; this is a
        // smoke test that full words are produced at all.
        let a = source.read_word().unwrap();
        let b = source.read_word().unwrap();
        assert!(a != b || a != 0);
    }

    #[test]
    fn test_short_read_is_surfaced() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xAB, 0xCD, 0xEF]).unwrap();

        let mut source = EntropySource::with_path(file.path());
        assert!(source.open());
        assert_eq!(source.read_word(), Err(EntropyError::ShortRead));
    }

    #[test]
    fn test_regular_file_reads_words_until_exhausted() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&1u64.to_le_bytes()).unwrap();
        file.write_all(&2u64.to_le_bytes()).unwrap();

        let mut source = EntropySource::with_path(file.path());
        assert!(source.open());
        assert_eq!(source.read_word(), Ok(1));
        assert_eq!(source.read_word(), Ok(2));
        assert_eq!(source.read_word(), Err(EntropyError::ShortRead));
    }
}
