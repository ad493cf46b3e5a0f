//! Size-prefixed BLAKE3 digests and file content loading.
//!
//! # Overview
//!
//! Every digest is computed over the file size (as a little-endian `u64`)
//! followed by a payload:
//!
//! - the **short digest** covers at most the first [`PREHASH_SIZE`] bytes
//! - the **full digest** covers the entire content
//!
//! Prefixing the size means two files of different lengths can never share a
//! short digest, which bounds how many files get promoted to full hashing.
//!
//! File bytes come from a [`ContentSource`]. [`MmapSource`] maps files into
//! memory with `memmap2`; [`InMemorySource`] serves fixed buffers and is
//! handy for driving the classifier without touching the disk.

use std::collections::HashMap;
use std::fs::File;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use super::HashError;

/// Number of leading bytes covered by the short digest (4 KiB).
pub const PREHASH_SIZE: usize = 4096;

/// A 32-byte BLAKE3 digest.
pub type Hash = [u8; 32];

/// Render a digest as lowercase hex.
///
/// # Example
///
/// ```
/// use dupscan::scanner::{hash_to_hex, hex_to_hash};
///
/// let hash = [0xabu8; 32];
/// let hex = hash_to_hex(&hash);
/// assert_eq!(hex.len(), 64);
/// assert_eq!(hex_to_hash(&hex), Some(hash));
/// ```
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    blake3::Hash::from(*hash).to_hex().to_string()
}

/// Parse a 64-character hex string back into a digest.
#[must_use]
pub fn hex_to_hash(hex: &str) -> Option<Hash> {
    blake3::Hash::from_hex(hex).ok().map(|h| *h.as_bytes())
}

/// Bytes of one file, either mapped or owned.
#[derive(Debug)]
pub enum FileContent {
    /// Zero-length file; nothing to map.
    Empty,
    /// Read-only memory mapping of the whole file.
    Mapped(Mmap),
    /// Bytes held in memory.
    Owned(Vec<u8>),
}

impl FileContent {
    /// Size of the content in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.len() as u64
    }
}

impl Deref for FileContent {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Empty => &[],
            Self::Mapped(map) => &map[..],
            Self::Owned(bytes) => &bytes[..],
        }
    }
}

/// Supplies file content to the classifier.
///
/// The classifier calls [`load`](ContentSource::load) once for every newly
/// discovered file and once more for the earlier member of a bucket when its
/// first short-digest collision forces a full-content comparison.
pub trait ContentSource {
    /// Load the complete content of `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or mapped.
    fn load(&self, path: &Path) -> Result<FileContent, HashError>;
}

impl<T: ContentSource + ?Sized> ContentSource for &T {
    fn load(&self, path: &Path) -> Result<FileContent, HashError> {
        (**self).load(path)
    }
}

/// Loads files by memory-mapping them.
#[derive(Debug, Clone, Copy, Default)]
pub struct MmapSource;

impl ContentSource for MmapSource {
    fn load(&self, path: &Path) -> Result<FileContent, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path.to_path_buf(), e))?;
        let len = file
            .metadata()
            .map_err(|e| HashError::from_io(path.to_path_buf(), e))?
            .len();

        if len == 0 {
            return Ok(FileContent::Empty);
        }

        // SAFETY: the mapping is read-only and dropped as soon as hashing is
        // done. A file truncated by another process while mapped may fault.
        let map = unsafe { Mmap::map(&file) }.map_err(|source| HashError::Map {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(FileContent::Mapped(map))
    }
}

/// Serves file content from an in-memory table.
///
/// # Example
///
/// ```
/// use dupscan::scanner::{ContentSource, InMemorySource};
/// use std::path::Path;
///
/// let mut source = InMemorySource::new();
/// source.insert("/x/a.txt", b"hello12345".to_vec());
///
/// let content = source.load(Path::new("/x/a.txt")).unwrap();
/// assert_eq!(&*content, b"hello12345");
/// assert!(source.load(Path::new("/missing")).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl InMemorySource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the content of a file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, content: Vec<u8>) {
        self.files.insert(path.into(), content);
    }

    /// Remove a file, making subsequent loads fail with `NotFound`.
    pub fn remove(&mut self, path: &Path) -> Option<Vec<u8>> {
        self.files.remove(path)
    }
}

impl ContentSource for InMemorySource {
    fn load(&self, path: &Path) -> Result<FileContent, HashError> {
        match self.files.get(path) {
            Some(bytes) if bytes.is_empty() => Ok(FileContent::Empty),
            Some(bytes) => Ok(FileContent::Owned(bytes.clone())),
            None => Err(HashError::NotFound(path.to_path_buf())),
        }
    }
}

/// Computes short and full digests.
#[derive(Debug, Clone, Copy)]
pub struct Hasher {
    prehash_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher whose short digest covers [`PREHASH_SIZE`] bytes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prehash_size: PREHASH_SIZE,
        }
    }

    /// Change how many leading bytes the short digest covers (at least 1).
    #[must_use]
    pub fn with_prehash_size(mut self, bytes: usize) -> Self {
        self.prehash_size = bytes.max(1);
        self
    }

    /// Number of leading bytes covered by the short digest.
    #[must_use]
    pub fn prehash_size(&self) -> usize {
        self.prehash_size
    }

    /// Whether the short digest of a file of `size` bytes already covers all
    /// of its content, making it equal to the full digest.
    #[must_use]
    pub fn prefix_covers(&self, size: u64) -> bool {
        size <= self.prehash_size as u64
    }

    /// Digest over `size || payload`.
    #[must_use]
    pub fn digest(size: u64, payload: &[u8]) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&size.to_le_bytes());
        hasher.update(payload);
        *hasher.finalize().as_bytes()
    }

    /// Digest over the content size and its first `prehash_size` bytes.
    #[must_use]
    pub fn short_digest(&self, content: &[u8]) -> Hash {
        let take = content.len().min(self.prehash_size);
        Self::digest(content.len() as u64, &content[..take])
    }

    /// Digest over the content size and the whole content.
    #[must_use]
    pub fn full_digest(&self, content: &[u8]) -> Hash {
        Self::digest(content.len() as u64, content)
    }
}
