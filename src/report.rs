//! Aggregated results of a replacement run.
//!
//! Ownership is strictly hierarchical: file outcomes roll into directory
//! outcomes, which roll into one [`OperationResult`].

use serde::Serialize;
use std::fmt;

/// Per-file counts, reported only for files with at least one change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    /// Path relative to the directory outcome that holds it.
    pub path: String,
    pub lines_changed: usize,
    pub replacements: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

/// Counts for one scanned directory (or the synthetic file group).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryOutcome {
    #[serde(rename = "dir")]
    pub directory: String,
    pub files_modified: usize,
    pub lines_changed: usize,
    pub total_replacements: usize,
    pub files: Vec<FileOutcome>,
}

impl DirectoryOutcome {
    /// Label of the outcome produced in file mode.
    pub const FILES_GROUP: &'static str = "(files)";

    pub fn new(directory: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    /// Adds a file's counts; files without changed lines are not recorded.
    pub fn record(&mut self, file: FileOutcome) {
        if file.lines_changed == 0 {
            return;
        }
        self.files_modified += 1;
        self.lines_changed += file.lines_changed;
        self.total_replacements += file.replacements;
        self.files.push(file);
    }
}

/// Whether a successful run changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// At least one replacement was made (or would be, in a dry run).
    Changed,
    /// The run succeeded but found nothing to replace.
    NoMatches,
}

/// Totals across every directory outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub files: usize,
    pub lines: usize,
    pub replacements: usize,
    pub directories_with_changes: usize,
    /// Mention the directory count (more than one directory was requested).
    pub across_directories: bool,
    pub dry_run: bool,
}

impl Summary {
    /// Totals the given directory outcomes.
    pub fn from_directories(
        directories: &[DirectoryOutcome],
        across_directories: bool,
        dry_run: bool,
    ) -> Self {
        let mut summary = Summary {
            across_directories,
            dry_run,
            ..Summary::default()
        };
        for dir in directories {
            summary.merge(dir);
        }
        summary
    }

    /// Adds one directory's counts.
    pub fn merge(&mut self, dir: &DirectoryOutcome) {
        self.files += dir.files_modified;
        self.lines += dir.lines_changed;
        self.replacements += dir.total_replacements;
        if dir.files_modified > 0 {
            self.directories_with_changes += 1;
        }
    }
}

fn plural(count: usize, singular: &'static str, plural: &'static str) -> &'static str {
    if count == 1 { singular } else { plural }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = if self.dry_run { "Would modify" } else { "Modified" };
        write!(f, "{} {} {}", action, self.files, plural(self.files, "file", "files"))?;
        if self.across_directories {
            let dirs = self.directories_with_changes;
            write!(f, " across {} {}", dirs, plural(dirs, "directory", "directories"))?;
        }
        write!(
            f,
            ": {} {} in {} {}",
            self.replacements,
            plural(self.replacements, "replacement", "replacements"),
            self.lines,
            plural(self.lines, "line", "lines"),
        )
    }
}

/// Top-level result of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    /// Human-readable recap derived from the counts.
    pub summary: String,
    pub directories: Vec<DirectoryOutcome>,
    #[serde(skip_serializing_if = "is_false")]
    pub dry_run: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl OperationResult {
    /// Builds the result and its summary sentence.
    pub fn new(directories: Vec<DirectoryOutcome>, across_directories: bool, dry_run: bool) -> Self {
        let summary = Summary::from_directories(&directories, across_directories, dry_run);
        Self {
            summary: summary.to_string(),
            directories,
            dry_run,
        }
    }

    /// Replacements summed over every directory.
    pub fn total_replacements(&self) -> usize {
        self.directories.iter().map(|d| d.total_replacements).sum()
    }

    /// Files with at least one changed line.
    pub fn files_modified(&self) -> usize {
        self.directories.iter().map(|d| d.files_modified).sum()
    }

    pub fn outcome(&self) -> Outcome {
        if self.total_replacements() == 0 {
            Outcome::NoMatches
        } else {
            Outcome::Changed
        }
    }
}
