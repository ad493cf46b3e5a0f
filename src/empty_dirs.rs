//! Empty directory detection.
//!
//! While scanning, the worker records every directory that contains no
//! regular files, together with the names of its immediate subdirectories.
//! [`EmptyDirCollector::collect`] folds those records bottom-up: a directory
//! is empty when every subdirectory is itself recorded and empty. Only the
//! topmost empty directory of each empty subtree is reported; its empty
//! descendants go away with it.
//!
//! # Example
//!
//! ```
//! use dupscan::empty_dirs::EmptyDirCollector;
//! use std::ffi::OsString;
//! use std::path::{Path, PathBuf};
//!
//! let mut collector = EmptyDirCollector::new();
//! collector.record(PathBuf::from("/r/a"), vec![OsString::from("b")]);
//! collector.record(PathBuf::from("/r/a/b"), vec![]);
//!
//! assert_eq!(collector.collect(), vec![PathBuf::from("/r/a")]);
//! ```

use std::cmp::Reverse;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, Copy)]
struct DirVerdict {
    empty: bool,
    parent_empty: bool,
}

/// Records file-less directories and reduces them to removable roots.
#[derive(Debug, Default, Clone)]
pub struct EmptyDirCollector {
    records: HashMap<PathBuf, Vec<OsString>>,
}

impl EmptyDirCollector {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a directory without regular files and its subdirectory names.
    ///
    /// A later listing of the same directory replaces the earlier record.
    pub fn record(&mut self, dir: PathBuf, subdirs: Vec<OsString>) {
        self.records.insert(dir, subdirs);
    }

    /// Drop the record for `dir`, which turned out to contain files.
    pub fn forget(&mut self, dir: &Path) -> bool {
        self.records.remove(dir).is_some()
    }

    /// Drop the records for `root` and everything below it.
    pub fn forget_subtree(&mut self, root: &Path) {
        self.records.retain(|dir, _| !dir.starts_with(root));
    }

    /// Number of recorded directories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Empty directories whose parent is not also reported, sorted by path.
    #[must_use]
    pub fn collect(&self) -> Vec<PathBuf> {
        let mut ordered: Vec<(&PathBuf, &Vec<OsString>)> = self.records.iter().collect();
        // Deepest first, so children are settled before their parents
        ordered.sort_by_key(|(dir, _)| Reverse(dir.components().count()));

        let mut verdicts: HashMap<PathBuf, DirVerdict> = HashMap::new();
        for (dir, subdirs) in ordered {
            let empty = subdirs.iter().all(|name| {
                verdicts
                    .get(&dir.join(name))
                    .is_some_and(|verdict| verdict.empty)
            });
            verdicts.entry(dir.clone()).or_default().empty = empty;

            if empty {
                for name in subdirs {
                    verdicts.entry(dir.join(name)).or_default().parent_empty = true;
                }
            }
        }

        let mut result: Vec<PathBuf> = verdicts
            .into_iter()
            .filter(|(_, verdict)| verdict.empty && !verdict.parent_empty)
            .map(|(dir, _)| dir)
            .collect();
        result.sort();
        result
    }
}
