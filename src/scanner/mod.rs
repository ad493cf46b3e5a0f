//! File identity, content digests, and the scan error taxonomy.
//!
//! This module provides functionality for:
//! - Size-prefixed BLAKE3 digests over a file prefix or the whole file
//! - Content sources that memory-map files or serve bytes from memory
//! - Error types for hashing and directory listing failures
//!
//! # Architecture
//!
//! - [`hasher`]: digest computation and [`ContentSource`] implementations
//!
//! # Example
//!
//! ```no_run
//! use dupscan::scanner::{ContentSource, Hasher, MmapSource};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let content = MmapSource.load(Path::new("photo.jpg")).unwrap();
//! let short = hasher.short_digest(&content);
//! let full = hasher.full_digest(&content);
//! println!("{} / {}", dupscan::scanner::hash_to_hex(&short), dupscan::scanner::hash_to_hex(&full));
//! ```

pub mod hasher;

use std::path::PathBuf;

// Re-export main types
pub use hasher::{
    hash_to_hex, hex_to_hash, ContentSource, FileContent, Hash, Hasher, InMemorySource,
    MmapSource, PREHASH_SIZE,
};

/// What the classifier remembers about a file it has seen.
///
/// Created when a file is first classified and kept until the file is
/// removed with a remove-file command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Digest over the size and the first `prehash_size` bytes
    pub short_hash: Hash,
    /// Digest over the size and the whole content, once promoted
    pub full_hash: Option<Hash>,
}

impl FileIdentity {
    /// Create an identity that has not been promoted to the full tier yet.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, short_hash: Hash) -> Self {
        Self {
            path,
            size,
            short_hash,
            full_hash: None,
        }
    }

    /// Whether the file has been through full-content classification.
    #[must_use]
    pub fn is_promoted(&self) -> bool {
        self.full_hash.is_some()
    }
}

/// Errors that can occur while listing directories or seeding roots.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The specified root is a symbolic link; links are never followed.
    #[error("Refusing to scan symbolic link: {0}")]
    SymlinkRoot(PathBuf),

    /// An I/O error occurred while accessing a directory.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised while accessing `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source },
        }
    }
}

/// Errors that can occur while loading file content for hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The file could not be opened or inspected.
    #[error("Can't open file {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file was opened but could not be mapped into memory.
    #[error("Can't map file {path} to memory: {source}")]
    Map {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while opening `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source },
        }
    }
}
