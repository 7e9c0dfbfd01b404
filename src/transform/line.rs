//! Per-line replacement.

use crate::matcher::{MatchMode, Matcher};
use std::borrow::Cow;

/// Replaces a search term inside single lines.
///
/// Matches are consumed left to right without overlap. Scanning resumes after
/// the matched source span, so inserted replacement text is never rescanned.
/// In case-insensitive modes only the comparison is lowercased; unmatched
/// text keeps its case and the replacement is inserted verbatim.
#[derive(Debug, Clone)]
pub struct LineReplacer {
    matcher: Matcher,
    replacement: Vec<u8>,
}

impl LineReplacer {
    pub fn new(search: &str, replace: &str, mode: MatchMode) -> Self {
        Self {
            matcher: Matcher::new(search, mode),
            replacement: replace.as_bytes().to_vec(),
        }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Replaces every match, returning the new line and the substitution
    /// count. Lines without a match are returned borrowed.
    pub fn replace<'a>(&self, line: &'a [u8]) -> (Cow<'a, [u8]>, usize) {
        if self.matcher.is_empty() {
            return (Cow::Borrowed(line), 0);
        }

        let folded = self.matcher.mode().fold(line);
        let mut result = Vec::new();
        let mut pos = 0;
        let mut count = 0;

        while let Some(m) = self.matcher.find_at(&folded, pos) {
            if count == 0 {
                result.reserve(line.len());
            }
            result.extend_from_slice(&line[pos..m.start]);
            result.extend_from_slice(&self.replacement);
            pos = m.end;
            count += 1;
        }

        if count == 0 {
            return (Cow::Borrowed(line), 0);
        }
        result.extend_from_slice(&line[pos..]);
        (Cow::Owned(result), count)
    }

    /// Counts the substitutions [`LineReplacer::replace`] would perform.
    pub fn count(&self, line: &[u8]) -> usize {
        if self.matcher.is_empty() {
            return 0;
        }

        let folded = self.matcher.mode().fold(line);
        let mut pos = 0;
        let mut count = 0;
        while let Some(m) = self.matcher.find_at(&folded, pos) {
            pos = m.end;
            count += 1;
        }
        count
    }
}

/// Replaces `search` with `replace` in one line.
///
/// An empty search term leaves the line untouched.
pub fn replace_in_line(
    line: &str,
    search: &str,
    replace: &str,
    case_insensitive: bool,
    whole_word: bool,
) -> String {
    let mode = MatchMode::from_flags(case_insensitive, whole_word);
    let replacer = LineReplacer::new(search, replace, mode);
    match replacer.replace(line.as_bytes()).0 {
        Cow::Borrowed(_) => line.to_string(),
        Cow::Owned(bytes) => into_string(bytes),
    }
}

/// Counts how many substitutions [`replace_in_line`] performs.
pub fn count_replacements(
    line: &str,
    search: &str,
    case_insensitive: bool,
    whole_word: bool,
) -> usize {
    LineReplacer::new(search, "", MatchMode::from_flags(case_insensitive, whole_word))
        .count(line.as_bytes())
}

// Matches of a valid UTF-8 needle always start and end on char boundaries.
fn into_string(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}
