//! Replacement requests and the engine that applies them.
//!
//! A [`ReplaceRequest`] is built once at the boundary and never mutated by the
//! engine. [`ReplaceRequest::apply`] walks the requested directories (or the
//! explicit file list), runs each eligible file through a [`FileProcessor`],
//! and rolls the counts up into an [`OperationResult`].

pub mod processor;
pub mod walker;

pub use processor::{FileProcessor, FileStats, MAX_LINE_SIZE};
pub use walker::Walker;

use crate::error::{RepforError, Result};
use crate::matcher::{FileMatcher, MatchMode};
use crate::report::OperationResult;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Parameters of one search-and-replace run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceRequest {
    directories: Vec<PathBuf>,
    files: Vec<PathBuf>,
    search: String,
    replace: String,
    extension: Option<String>,
    exclude: Vec<String>,
    case_insensitive: bool,
    whole_word: bool,
    dry_run: bool,
    recursive: bool,
    diff: bool,
}

impl ReplaceRequest {
    /// Creates a request over the current directory.
    ///
    /// An empty `replace` deletes every match.
    pub fn new(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            directories: vec![PathBuf::from(".")],
            files: Vec::new(),
            search: search.into(),
            replace: replace.into(),
            extension: None,
            exclude: Vec::new(),
            case_insensitive: false,
            whole_word: false,
            dry_run: false,
            recursive: false,
            diff: false,
        }
    }

    /// Sets the directories to scan. An empty list keeps the current
    /// directory.
    pub fn directories(mut self, dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        let dirs: Vec<PathBuf> = dirs.into_iter().map(Into::into).collect();
        if !dirs.is_empty() {
            self.directories = dirs;
        }
        self
    }

    /// Sets an explicit file list, which takes precedence over directories.
    pub fn files(mut self, files: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Only process names ending with this suffix.
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        let ext = ext.into();
        self.extension = (!ext.is_empty()).then_some(ext);
        self
    }

    /// Skip any line containing one of these substrings.
    pub fn exclude(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Match regardless of letter case.
    pub fn case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    /// Only match occurrences bounded by non-word characters.
    pub fn whole_word(mut self, enabled: bool) -> Self {
        self.whole_word = enabled;
        self
    }

    /// Compute everything but never write.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Also scan every nested directory.
    pub fn recursive(mut self, enabled: bool) -> Self {
        self.recursive = enabled;
        self
    }

    /// Attach a unified diff to each modified file's outcome.
    pub fn diff(mut self, enabled: bool) -> Self {
        self.diff = enabled;
        self
    }

    /// The text to search for.
    pub fn search(&self) -> &str {
        &self.search
    }

    /// The text each match is replaced with.
    pub fn replacement(&self) -> &str {
        &self.replace
    }

    /// Directories to scan when no file list is set.
    pub fn directory_list(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Explicit files to process.
    pub fn file_list(&self) -> &[PathBuf] {
        &self.files
    }

    /// Substrings that mark a line as off limits.
    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude
    }

    /// Whether writes are suppressed.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Whether outcomes carry a unified diff.
    pub fn wants_diff(&self) -> bool {
        self.diff
    }

    /// The match mode implied by the case and word flags.
    pub fn mode(&self) -> MatchMode {
        MatchMode::from_flags(self.case_insensitive, self.whole_word)
    }

    /// Returns true when search equals replace; such a run changes nothing.
    pub fn is_noop(&self) -> bool {
        self.search == self.replace
    }

    /// Builds the file filter for this request.
    pub fn file_matcher(&self) -> FileMatcher {
        match &self.extension {
            Some(ext) => FileMatcher::new().extension(ext.as_str()),
            None => FileMatcher::new(),
        }
    }

    /// Rejects requests that cannot run, before touching the filesystem.
    pub fn validate(&self) -> Result<()> {
        if self.search.is_empty() {
            return Err(RepforError::InvalidConfig(
                "a non-empty search term is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Runs the request.
    ///
    /// A directory that cannot be listed aborts the whole run. A file that
    /// cannot be processed is logged and skipped.
    pub fn apply(&self) -> Result<OperationResult> {
        self.validate()?;
        if self.is_noop() {
            warn!("search and replace are identical, no changes will be made");
        }

        let walker = Walker::new(self);
        let directories = if self.files.is_empty() {
            let dirs = if self.recursive {
                FileMatcher::collect_directories(&self.directories)
            } else {
                self.directories.clone()
            };
            dirs.iter()
                .map(|dir| walker.replace_in_directory(dir))
                .collect::<Result<Vec<_>>>()?
        } else {
            vec![walker.replace_in_files(&self.files)]
        };

        let across = self.directories.len() > 1;
        Ok(OperationResult::new(directories, across, self.dry_run))
    }

    /// Processes a single file with this request's settings.
    pub fn process_file(&self, path: &Path) -> Result<FileStats> {
        FileProcessor::new(self).process(path)
    }
}
