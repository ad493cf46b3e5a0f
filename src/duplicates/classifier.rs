//! Two-tier content classifier.
//!
//! # Overview
//!
//! Every file gets a cheap **short digest** (size + first 4 KiB). Files are
//! bucketed by it, and only when a bucket gains a second member are its
//! members **promoted** to a **full digest** over their whole content:
//!
//! 1. A new short digest opens a bucket. Nothing else happens.
//! 2. The first collision promotes both the earlier member (weight 0) and
//!    the newcomer (weight 2).
//! 3. Later collisions promote only the newcomer (weight 1).
//!
//! A promotion that finds no matching full digest adds its weight to the
//! false-duplicate counter. A promotion that does find one confirms a
//! duplicate group: the group's earlier members are announced the first
//! time it is confirmed, and every later member is announced as it arrives.
//!
//! The classifier is plain single-threaded state. The scan worker owns it
//! outright; nothing else touches it.
//!
//! # Example
//!
//! ```
//! use dupscan::duplicates::{HashClassifier, Verdict};
//! use dupscan::scanner::{Hasher, InMemorySource};
//! use std::path::Path;
//!
//! let mut source = InMemorySource::new();
//! source.insert("/x/a.txt", b"hello12345".to_vec());
//! source.insert("/y/b.txt", b"hello12345".to_vec());
//!
//! let mut classifier = HashClassifier::new(Hasher::new());
//! assert_eq!(classifier.classify(Path::new("/x/a.txt"), &source).verdict, Verdict::Unique);
//!
//! let outcome = classifier.classify(Path::new("/y/b.txt"), &source);
//! assert_eq!(outcome.verdict, Verdict::Duplicate);
//! assert_eq!(outcome.announcements.len(), 2);
//! assert_eq!(classifier.stats().total_duplicates, 2);
//! ```

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use super::ScanStats;
use crate::scanner::{hash_to_hex, ContentSource, FileIdentity, Hash, HashError, Hasher};

/// Members sharing one full digest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FullHashEntry {
    /// Paths whose whole content hashes to this digest
    pub members: BTreeSet<PathBuf>,
    /// Whether every member has been announced
    pub reported: bool,
}

/// How a single `classify` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// First file with this short digest.
    Unique,
    /// Path was classified before with the same content; nothing changed.
    AlreadyKnown,
    /// Promoted to full hashing, but no full-digest match (yet).
    Candidate,
    /// Promoted and matched an existing full digest.
    Duplicate,
    /// Zero-length file, counted but not hashed.
    Empty,
    /// Content could not be loaded; the file was not counted.
    Unreadable,
}

/// A path that just joined a confirmed duplicate group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    /// Path of the duplicate
    pub path: PathBuf,
    /// Full digest shared by the group
    pub hash: Hash,
}

/// Result of classifying one file.
#[derive(Debug)]
pub struct DuplicateOutcome {
    /// Summary verdict
    pub verdict: Verdict,
    /// Paths to announce, in announcement order
    pub announcements: Vec<Announcement>,
    /// Recoverable load failures hit along the way
    pub errors: Vec<HashError>,
}

impl DuplicateOutcome {
    fn new(verdict: Verdict) -> Self {
        Self {
            verdict,
            announcements: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Whether this file turned out to be part of a confirmed group.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        self.verdict == Verdict::Duplicate
    }
}

/// Short-digest buckets, full-digest groups, and the counters over them.
#[derive(Debug)]
pub struct HashClassifier {
    hasher: Hasher,
    skip_empty_files: bool,
    short_store: HashMap<Hash, BTreeSet<PathBuf>>,
    full_store: HashMap<Hash, FullHashEntry>,
    identities: HashMap<PathBuf, FileIdentity>,
    stats: ScanStats,
}

impl HashClassifier {
    /// Create an empty classifier. Zero-length files are skipped.
    #[must_use]
    pub fn new(hasher: Hasher) -> Self {
        Self {
            hasher,
            skip_empty_files: true,
            short_store: HashMap::new(),
            full_store: HashMap::new(),
            identities: HashMap::new(),
            stats: ScanStats::default(),
        }
    }

    /// Choose whether zero-length files are classified (they are all
    /// identical to each other) or only counted.
    #[must_use]
    pub fn with_skip_empty_files(mut self, skip: bool) -> Self {
        self.skip_empty_files = skip;
        self
    }

    /// Current counters. Directory counters are left for the caller to fill.
    #[must_use]
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    /// What is known about `path`, if it has been classified.
    #[must_use]
    pub fn identity(&self, path: &Path) -> Option<&FileIdentity> {
        self.identities.get(path)
    }

    /// Number of paths currently tracked.
    #[must_use]
    pub fn known_files(&self) -> usize {
        self.identities.len()
    }

    /// Members of the bucket for a short digest.
    #[must_use]
    pub fn short_bucket(&self, short_hash: &Hash) -> Option<&BTreeSet<PathBuf>> {
        self.short_store.get(short_hash)
    }

    /// The group for a full digest.
    #[must_use]
    pub fn full_entry(&self, full_hash: &Hash) -> Option<&FullHashEntry> {
        self.full_store.get(full_hash)
    }

    /// Every full-digest group with two or more members, sorted by digest.
    #[must_use]
    pub fn duplicate_groups(&self) -> Vec<(Hash, Vec<PathBuf>)> {
        let mut groups: Vec<(Hash, Vec<PathBuf>)> = self
            .full_store
            .iter()
            .filter(|(_, entry)| entry.members.len() > 1)
            .map(|(hash, entry)| (*hash, entry.members.iter().cloned().collect()))
            .collect();
        groups.sort_by(|a, b| a.0.cmp(&b.0));
        groups
    }

    /// Classify one regular file.
    ///
    /// Loads the file through `source`, files it under its short digest and,
    /// when that digest is shared, promotes it to full-content comparison.
    pub fn classify<S: ContentSource + ?Sized>(&mut self, path: &Path, source: &S) -> DuplicateOutcome {
        let content = match source.load(path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Skipping unreadable file: {}", e);
                let mut outcome = DuplicateOutcome::new(Verdict::Unreadable);
                outcome.errors.push(e);
                return outcome;
            }
        };

        self.stats.total_files += 1;

        if content.is_empty() && self.skip_empty_files {
            log::trace!("Skipping empty file: {}", path.display());
            return DuplicateOutcome::new(Verdict::Empty);
        }

        let size = content.size();
        let short_hash = self.hasher.short_digest(&content);

        if let Some(known) = self.identities.get(path) {
            if known.short_hash == short_hash && known.size == size {
                return DuplicateOutcome::new(Verdict::AlreadyKnown);
            }
            log::debug!("Content changed, reclassifying: {}", path.display());
            self.forget(path, None);
        }

        let bucket = self.short_store.entry(short_hash).or_default();
        let earlier = match bucket.len() {
            0 => {
                bucket.insert(path.to_path_buf());
                self.identities.insert(
                    path.to_path_buf(),
                    FileIdentity::new(path.to_path_buf(), size, short_hash),
                );
                return DuplicateOutcome::new(Verdict::Unique);
            }
            1 => bucket.iter().next().cloned(),
            _ => None,
        };
        bucket.insert(path.to_path_buf());
        self.identities.insert(
            path.to_path_buf(),
            FileIdentity::new(path.to_path_buf(), size, short_hash),
        );

        let mut outcome = DuplicateOutcome::new(Verdict::Candidate);
        let mut matched = false;
        let mut weight = 1;

        // First collision in this bucket: the earlier member needs a full
        // digest too, unless it already got one before a removal shrank the
        // bucket back to a single path.
        if let Some(earlier) = earlier.filter(|p| !self.is_promoted(p)) {
            weight = 2;
            log::trace!(
                "Short digest collision, promoting {} and {}",
                earlier.display(),
                path.display()
            );
            match source.load(&earlier) {
                Ok(earlier_content) => {
                    matched |= self.promote(&earlier, &earlier_content, None, 0, &mut outcome);
                }
                Err(e) => {
                    log::warn!("Can't reload {} for promotion: {}", earlier.display(), e);
                    outcome.errors.push(e);
                }
            }
        }

        matched |= self.promote(path, &content, Some(short_hash), weight, &mut outcome);

        if matched {
            outcome.verdict = Verdict::Duplicate;
        }
        outcome
    }

    fn is_promoted(&self, path: &Path) -> bool {
        self.identities
            .get(path)
            .is_some_and(FileIdentity::is_promoted)
    }

    /// Full-content classification of one path. Returns `true` on a match.
    ///
    /// `short_hash` must have been computed from `content` itself; it is
    /// reused as the full digest when the prefix covers the whole file.
    fn promote(
        &mut self,
        path: &Path,
        content: &[u8],
        short_hash: Option<Hash>,
        false_dup_weight: u64,
        outcome: &mut DuplicateOutcome,
    ) -> bool {
        let full_hash = match short_hash {
            Some(hash) if self.hasher.prefix_covers(content.len() as u64) => hash,
            _ => self.hasher.full_digest(content),
        };

        if let Some(identity) = self.identities.get_mut(path) {
            identity.full_hash = Some(full_hash);
        }

        match self.full_store.get_mut(&full_hash) {
            None => {
                let mut entry = FullHashEntry::default();
                entry.members.insert(path.to_path_buf());
                self.full_store.insert(full_hash, entry);
                self.stats.total_false_duplicates += false_dup_weight;
                false
            }
            Some(entry) => {
                if !entry.reported {
                    log::debug!(
                        "Duplicate group {} confirmed with {} earlier member(s)",
                        hash_to_hex(&full_hash),
                        entry.members.len()
                    );
                    for member in &entry.members {
                        outcome.announcements.push(Announcement {
                            path: member.clone(),
                            hash: full_hash,
                        });
                        self.stats.total_duplicates += 1;
                    }
                    entry.reported = true;
                }

                outcome.announcements.push(Announcement {
                    path: path.to_path_buf(),
                    hash: full_hash,
                });
                self.stats.total_duplicates += 1;
                entry.members.insert(path.to_path_buf());
                true
            }
        }
    }

    /// Forget a file, typically because it was deleted.
    ///
    /// `full_hash` is the digest the caller was told about; the recorded one
    /// is cleared as well. Returns `false` for paths that were never seen.
    pub fn remove_file(&mut self, path: &Path, full_hash: &Hash) -> bool {
        let removed = self.forget(path, Some(*full_hash));
        if !removed {
            log::debug!("Remove requested for unknown file: {}", path.display());
        }
        removed
    }

    fn forget(&mut self, path: &Path, full_hint: Option<Hash>) -> bool {
        let Some(identity) = self.identities.remove(path) else {
            return false;
        };

        if let Some(bucket) = self.short_store.get_mut(&identity.short_hash) {
            bucket.remove(path);
            if bucket.is_empty() {
                self.short_store.remove(&identity.short_hash);
            }
        }

        let mut full_hashes: Vec<Hash> = identity.full_hash.into_iter().chain(full_hint).collect();
        full_hashes.dedup();
        for full_hash in full_hashes {
            if let Some(entry) = self.full_store.get_mut(&full_hash) {
                entry.members.remove(path);
                if entry.members.is_empty() {
                    self.full_store.remove(&full_hash);
                }
            }
        }

        true
    }

    /// Mark every group as unannounced, so the next member to join a group
    /// re-announces the whole group. Returns the number of groups touched.
    pub fn reset_reported_flags(&mut self) -> usize {
        let mut reset = 0;
        for entry in self.full_store.values_mut() {
            if entry.reported {
                entry.reported = false;
                reset += 1;
            }
        }
        reset
    }
}
