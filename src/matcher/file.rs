//! File selection: extension filtering and directory enumeration.

use crate::error::{RepforError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A regular file found in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File name relative to the listed directory.
    pub name: String,
    /// Full path used for I/O.
    pub path: PathBuf,
}

/// Predicates for selecting files to process.
#[derive(Debug, Default, Clone)]
pub struct FileMatcher {
    extension: Option<String>,
}

impl FileMatcher {
    /// Creates a matcher that accepts every file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts only names ending with the given suffix (e.g. ".go").
    ///
    /// The suffix is matched literally, so "go" would also accept "cargo".
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        let ext = ext.into();
        self.extension = (!ext.is_empty()).then_some(ext);
        self
    }

    /// Returns true if the name passes the extension filter.
    pub fn accepts(&self, name: &str) -> bool {
        match &self.extension {
            Some(ext) => name.ends_with(ext.as_str()),
            None => true,
        }
    }

    /// Lists the regular files directly inside `dir`, sorted by name.
    ///
    /// Subdirectories, symlinks and special files (FIFOs, sockets, devices)
    /// are skipped. A directory that cannot be listed is an error.
    pub fn list_files(&self, dir: &Path) -> Result<Vec<FileEntry>> {
        let read_dir = fs::read_dir(dir).map_err(|source| RepforError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|source| RepforError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })?;

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    warn!("failed to get file info for {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            if !file_type.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if !self.accepts(&name) {
                debug!("skipping {} (extension filter)", name);
                continue;
            }

            files.push(FileEntry {
                name,
                path: entry.path(),
            });
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    /// Expands each root into itself plus every nested directory.
    ///
    /// Roots come first in pre-order with siblings sorted by name. A
    /// directory reachable twice (overlapping roots) is kept once, keyed by
    /// its canonical path. Unreadable subtrees are logged and skipped; a root
    /// that is missing or not a directory is kept so that listing it reports
    /// the error.
    pub fn collect_directories(roots: &[PathBuf]) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut dirs = Vec::new();

        for root in roots {
            for entry in WalkDir::new(root).sort_by_file_name() {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("failed to access {}: {}", display_walk_path(&e, root), e);
                        if e.depth() == 0 && seen.insert(canonical_key(root)) {
                            dirs.push(root.clone());
                        }
                        continue;
                    }
                };
                if !entry.file_type().is_dir() {
                    if entry.depth() == 0 && seen.insert(canonical_key(root)) {
                        dirs.push(root.clone());
                    }
                    continue;
                }
                let path = entry.into_path();
                if seen.insert(canonical_key(&path)) {
                    dirs.push(path);
                }
            }
        }

        dirs
    }
}

fn canonical_key(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn display_walk_path(err: &walkdir::Error, root: &Path) -> String {
    err.path().unwrap_or(root).display().to_string()
}
