//! Directory and file-list traversal.

use super::{FileProcessor, ReplaceRequest};
use crate::error::Result;
use crate::matcher::FileMatcher;
use crate::report::DirectoryOutcome;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Feeds eligible files to a [`FileProcessor`] and groups the results.
#[derive(Debug, Clone)]
pub struct Walker<'a> {
    processor: FileProcessor<'a>,
    matcher: FileMatcher,
}

impl<'a> Walker<'a> {
    pub fn new(request: &'a ReplaceRequest) -> Self {
        Self {
            processor: FileProcessor::new(request),
            matcher: request.file_matcher(),
        }
    }

    /// Processes the regular files directly inside `dir`.
    ///
    /// Failing to list the directory is an error. Failing to process one
    /// file is logged and the file is skipped.
    pub fn replace_in_directory(&self, dir: &Path) -> Result<DirectoryOutcome> {
        let entries = self.matcher.list_files(dir)?;
        let mut outcome = DirectoryOutcome::new(dir.display().to_string());

        for entry in entries {
            match self.processor.process(&entry.path) {
                Ok(stats) => outcome.record(stats.into_outcome(entry.name)),
                Err(e) => warn!("failed to process {}: {}", entry.path.display(), e),
            }
        }
        Ok(outcome)
    }

    /// Processes an explicit list of files.
    ///
    /// Missing paths and non-regular files are logged and skipped. Results
    /// are grouped under [`DirectoryOutcome::FILES_GROUP`] and keep each path
    /// as given.
    pub fn replace_in_files(&self, paths: &[PathBuf]) -> DirectoryOutcome {
        let mut outcome = DirectoryOutcome::new(DirectoryOutcome::FILES_GROUP);

        for path in paths {
            match fs::metadata(path) {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => {
                    warn!("not a regular file: {}", path.display());
                    continue;
                }
                Err(e) => {
                    warn!("failed to stat file {}: {}", path.display(), e);
                    continue;
                }
            }

            let label = path.display().to_string();
            if !self.matcher.accepts(&label) {
                debug!("skipping {} (extension filter)", label);
                continue;
            }

            match self.processor.process(path) {
                Ok(stats) => outcome.record(stats.into_outcome(label)),
                Err(e) => warn!("failed to process {}: {}", label, e),
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_files(dir: &TempDir) {
        fs::write(dir.path().join("a.txt"), "foo bar\nfoo\n").unwrap();
        fs::write(dir.path().join("b.go"), "foo := 1\n").unwrap();
        fs::write(dir.path().join("c.txt"), "nothing here\n").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/d.txt"), "foo\n").unwrap();
    }

    #[test]
    fn test_directory_is_not_recursive() {
        let dir = TempDir::new().unwrap();
        create_test_files(&dir);

        let request = ReplaceRequest::new("foo", "qux");
        let outcome = Walker::new(&request)
            .replace_in_directory(dir.path())
            .unwrap();

        assert_eq!(outcome.files_modified, 2);
        assert_eq!(outcome.total_replacements, 3);
        let names: Vec<_> = outcome.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.go"]);
        assert_eq!(fs::read_to_string(dir.path().join("sub/d.txt")).unwrap(), "foo\n");
    }

    #[test]
    fn test_extension_filter() {
        let dir = TempDir::new().unwrap();
        create_test_files(&dir);

        let request = ReplaceRequest::new("foo", "qux").extension(".go");
        let outcome = Walker::new(&request)
            .replace_in_directory(dir.path())
            .unwrap();

        assert_eq!(outcome.files_modified, 1);
        assert_eq!(outcome.files[0].path, "b.go");
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "foo bar\nfoo\n");
    }

    #[test]
    fn test_missing_directory_is_error() {
        let dir = TempDir::new().unwrap();
        let request = ReplaceRequest::new("foo", "qux");
        let result = Walker::new(&request).replace_in_directory(&dir.path().join("nope"));
        assert!(result.is_err());
    }

    #[test]
    fn test_file_list_skips_missing_and_directories() {
        let dir = TempDir::new().unwrap();
        create_test_files(&dir);

        let request = ReplaceRequest::new("foo", "qux");
        let paths = vec![
            dir.path().join("a.txt"),
            dir.path().join("missing.txt"),
            dir.path().join("sub"),
        ];
        let outcome = Walker::new(&request).replace_in_files(&paths);

        assert_eq!(outcome.directory, "(files)");
        assert_eq!(outcome.files_modified, 1);
        assert_eq!(outcome.files[0].path, paths[0].display().to_string());
    }

    #[test]
    fn test_file_list_applies_extension_to_full_path() {
        let dir = TempDir::new().unwrap();
        create_test_files(&dir);

        let request = ReplaceRequest::new("foo", "qux").extension(".txt");
        let paths = vec![dir.path().join("a.txt"), dir.path().join("b.go")];
        let outcome = Walker::new(&request).replace_in_files(&paths);

        assert_eq!(outcome.files_modified, 1);
        assert_eq!(fs::read_to_string(dir.path().join("b.go")).unwrap(), "foo := 1\n");
    }
}
