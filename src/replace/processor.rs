//! Per-file replacement.

use super::ReplaceRequest;
use crate::atomic::{WriteContent, write_atomic};
use crate::diff::unified_diff;
use crate::error::{RepforError, Result};
use crate::report::FileOutcome;
use crate::transform::{
    ExcludeFilter, LineEnding, LineReplacer, is_multiline, replace_content_multiline,
};
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

/// Longest line accepted in line mode, in bytes.
pub const MAX_LINE_SIZE: usize = 10 * 1024 * 1024;

/// What processing one file produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileStats {
    pub lines_changed: usize,
    pub replacements: usize,
    pub diff: Option<String>,
}

impl FileStats {
    /// Labels the stats for reporting.
    pub fn into_outcome(self, path: impl Into<String>) -> FileOutcome {
        FileOutcome {
            path: path.into(),
            lines_changed: self.lines_changed,
            replacements: self.replacements,
            diff: self.diff,
        }
    }
}

/// Applies one request to individual files.
///
/// Holds no per-file state, so one processor can be shared across threads.
#[derive(Debug, Clone)]
pub struct FileProcessor<'a> {
    request: &'a ReplaceRequest,
    replacer: LineReplacer,
    exclude: ExcludeFilter,
}

impl<'a> FileProcessor<'a> {
    pub fn new(request: &'a ReplaceRequest) -> Self {
        let mode = request.mode();
        Self {
            request,
            replacer: LineReplacer::new(request.search(), request.replacement(), mode),
            exclude: ExcludeFilter::new(request.exclude_patterns(), mode),
        }
    }

    /// Replaces every occurrence in the file at `path`.
    ///
    /// The file is rewritten only if at least one line changed and the
    /// request is not a dry run.
    pub fn process(&self, path: &Path) -> Result<FileStats> {
        let request = self.request;
        if request.is_noop() {
            return Ok(FileStats::default());
        }
        if is_multiline(request.search(), request.replacement()) {
            self.process_content(path)
        } else {
            self.process_lines(path)
        }
    }

    fn process_lines(&self, path: &Path) -> Result<FileStats> {
        let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
        let head = reader.fill_buf()?;
        let ending = LineEnding::sniff(head);
        let mut original = self.request.wants_diff().then(Vec::new);
        let (mut lines, trailing_newline) =
            read_lines(&mut reader, ending, path, original.as_mut())?;

        let matcher = self.replacer.matcher();
        let mut stats = FileStats::default();
        for (number, line) in lines.iter_mut().enumerate() {
            if !matcher.is_match(line) {
                continue;
            }
            if self.exclude.excludes(line) {
                debug!("{}:{}: line excluded", path.display(), number + 1);
                continue;
            }

            let (replaced, count) = self.replacer.replace(line.as_slice());
            let replaced = match replaced {
                Cow::Owned(replaced) if replaced != *line => replaced,
                _ => continue,
            };
            *line = replaced;
            stats.lines_changed += 1;
            stats.replacements += count;
        }

        if stats.lines_changed == 0 {
            return Ok(FileStats::default());
        }

        let content = WriteContent::Lines {
            lines: &lines,
            ending,
            trailing_newline,
        };
        if let Some(original) = original {
            stats.diff = Some(unified_diff(
                &original,
                &content.to_bytes(),
                &path.display().to_string(),
            ));
        }
        if !self.request.is_dry_run() {
            write_atomic(path, content)?;
            self.log_modified(path, &stats);
        }
        Ok(stats)
    }

    fn process_content(&self, path: &Path) -> Result<FileStats> {
        let content = fs::read(path)?;
        let ending = LineEnding::detect(&content);
        let search = ending.apply_to(self.request.search());
        let replace = ending.apply_to(self.request.replacement());

        let outcome = replace_content_multiline(
            &content,
            &search,
            &replace,
            self.request.mode(),
            &self.exclude,
        );
        if outcome.replacements == 0 {
            return Ok(FileStats::default());
        }

        let mut stats = FileStats {
            lines_changed: outcome.lines_affected,
            replacements: outcome.replacements,
            diff: None,
        };
        if self.request.wants_diff() {
            stats.diff = Some(unified_diff(
                &content,
                &outcome.content,
                &path.display().to_string(),
            ));
        }
        if !self.request.is_dry_run() {
            write_atomic(path, WriteContent::Bytes(&outcome.content))?;
            self.log_modified(path, &stats);
        }
        Ok(stats)
    }

    fn log_modified(&self, path: &Path, stats: &FileStats) {
        info!(
            "Modified: {} ({} replacements in {} lines)",
            path.display(),
            stats.replacements,
            stats.lines_changed
        );
    }
}

/// Splits a stream into lines without their terminators.
///
/// `\r` is stripped only for CRLF files. Returns the lines and whether the
/// last one ended with a newline. When `raw` is given, the bytes read are
/// copied into it unchanged.
fn read_lines<R: BufRead>(
    reader: &mut R,
    ending: LineEnding,
    path: &Path,
    mut raw: Option<&mut Vec<u8>>,
) -> Result<(Vec<Vec<u8>>, bool)> {
    let mut lines = Vec::new();
    let mut trailing_newline = false;

    loop {
        // Leaves room for a full `\r\n` after a line of exactly the cap.
        let mut line = Vec::new();
        let read = reader
            .by_ref()
            .take(MAX_LINE_SIZE as u64 + 2)
            .read_until(b'\n', &mut line)?;
        if read == 0 {
            break;
        }
        if let Some(raw) = raw.as_deref_mut() {
            raw.extend_from_slice(&line);
        }

        trailing_newline = line.last() == Some(&b'\n');
        if trailing_newline {
            line.pop();
            if ending == LineEnding::CrLf && line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        if line.len() > MAX_LINE_SIZE {
            return Err(RepforError::LineTooLong {
                path: path.to_path_buf(),
                max_mib: MAX_LINE_SIZE / (1024 * 1024),
            });
        }
        lines.push(line);
    }

    Ok((lines, trailing_newline))
}
