//! Whole-content replacement for patterns that span line breaks.

use super::ExcludeFilter;
use crate::matcher::word::is_bounded;
use crate::matcher::{MatchMode, Matcher};
use memchr::{memchr, memchr_iter, memrchr};
use std::collections::BTreeSet;

/// Result of a whole-content replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultilineOutcome {
    pub content: Vec<u8>,
    pub replacements: usize,
    /// Distinct original lines touched by at least one replaced match.
    pub lines_affected: usize,
}

/// Replaces `search` with `replace` across the whole content.
///
/// A match whose enclosing line span (from the line holding its first byte to
/// the line holding its end) contains an exclude pattern is copied through
/// unchanged and scanning resumes after it. Under whole-word modes a
/// candidate glued to a word character is rejected and scanning resumes one
/// byte further on.
pub fn replace_content_multiline(
    content: &[u8],
    search: &str,
    replace: &str,
    mode: MatchMode,
    exclude: &ExcludeFilter,
) -> MultilineOutcome {
    let matcher = Matcher::new(search, mode);
    if matcher.is_empty() {
        return MultilineOutcome {
            content: content.to_vec(),
            replacements: 0,
            lines_affected: 0,
        };
    }

    let folded = mode.fold(content);
    let mut result = Vec::with_capacity(content.len());
    let mut affected = BTreeSet::new();
    let mut replacements = 0;
    let mut pos = 0;
    let mut lines = LineCounter::default();

    while let Some(m) = matcher.find_candidate(&folded, pos) {
        if mode.is_whole_word() && !is_bounded(content, m.start, m.end) {
            result.extend_from_slice(&content[pos..=m.start]);
            pos = m.start + 1;
            continue;
        }

        if !exclude.is_empty() {
            let line_start = memrchr(b'\n', &content[..m.start]).map_or(0, |i| i + 1);
            let line_end = memchr(b'\n', &content[m.end..]).map_or(content.len(), |i| m.end + i);
            if exclude.excludes(&content[line_start..line_end]) {
                result.extend_from_slice(&content[pos..m.end]);
                pos = m.end;
                continue;
            }
        }

        let first = lines.line_of(content, m.start);
        let spanned = memchr_iter(b'\n', &content[m.start..m.end]).count();
        affected.extend(first..=first + spanned);

        result.extend_from_slice(&content[pos..m.start]);
        result.extend_from_slice(replace.as_bytes());
        pos = m.end;
        replacements += 1;
    }
    result.extend_from_slice(&content[pos..]);

    MultilineOutcome {
        content: result,
        replacements,
        lines_affected: affected.len(),
    }
}

/// Incremental newline counter for monotonically increasing offsets.
#[derive(Default)]
struct LineCounter {
    offset: usize,
    line: usize,
}

impl LineCounter {
    fn line_of(&mut self, content: &[u8], offset: usize) -> usize {
        self.line += memchr_iter(b'\n', &content[self.offset..offset]).count();
        self.offset = offset;
        self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(content: &str, search: &str, replace: &str, mode: MatchMode) -> (String, usize, usize) {
        run_excluding(content, search, replace, mode, &[])
    }

    fn run_excluding(
        content: &str,
        search: &str,
        replace: &str,
        mode: MatchMode,
        exclude: &[&str],
    ) -> (String, usize, usize) {
        let filter = ExcludeFilter::new(exclude, mode);
        let out = replace_content_multiline(content.as_bytes(), search, replace, mode, &filter);
        (
            String::from_utf8(out.content).unwrap(),
            out.replacements,
            out.lines_affected,
        )
    }

    #[test]
    fn test_span_counting() {
        let (out, n, lines) = run("aaa\nbbb\nccc\n", "aaa\nbbb", "xxx", MatchMode::Exact);
        assert_eq!(out, "xxx\nccc\n");
        assert_eq!(n, 1);
        assert_eq!(lines, 2);
    }

    #[test]
    fn test_multiple_occurrences() {
        let (out, n, lines) = run(
            "aaa\nbbb\nccc\naaa\nbbb\nddd\n",
            "aaa\nbbb",
            "xxx",
            MatchMode::Exact,
        );
        assert_eq!(out, "xxx\nccc\nxxx\nddd\n");
        assert_eq!(n, 2);
        assert_eq!(lines, 4);
    }

    #[test]
    fn test_exclude_checks_whole_spanned_lines() {
        let (out, n, _) = run_excluding(
            "aaa\nbbb SKIP\naaa\nbbb\n",
            "aaa\nbbb",
            "xxx",
            MatchMode::Exact,
            &["SKIP"],
        );
        assert_eq!(out, "aaa\nbbb SKIP\nxxx\n");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_exclude_respects_case_flag() {
        let (out, n, _) = run_excluding(
            "aaa\nbbb skip\naaa\nbbb\n",
            "aaa\nbbb",
            "xxx",
            MatchMode::CaseInsensitive,
            &["SKIP"],
        );
        assert_eq!(out, "aaa\nbbb skip\nxxx\n");
        assert_eq!(n, 1);

        let (_, n, _) = run_excluding(
            "aaa\nbbb skip\n",
            "aaa\nbbb",
            "xxx",
            MatchMode::Exact,
            &["SKIP"],
        );
        assert_eq!(n, 1);
    }

    #[test]
    fn test_case_insensitive() {
        let (out, n, _) = run(
            "Hello\nWorld\nfoo\n",
            "hello\nworld",
            "greetings",
            MatchMode::CaseInsensitive,
        );
        assert_eq!(out, "greetings\nfoo\n");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_whole_word() {
        let (out, n, _) = run(
            "foo bar\nbaz qux\nfoobar\nbaz\n",
            "bar\nbaz",
            "xxx",
            MatchMode::WholeWord,
        );
        assert_eq!(out, "foo xxx qux\nfoobar\nbaz\n");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_replace_with_more_lines() {
        let (out, n, lines) = run(
            "line1\nline2\nline3\n",
            "line2",
            "line2a\nline2b",
            MatchMode::Exact,
        );
        assert_eq!(out, "line1\nline2a\nline2b\nline3\n");
        assert_eq!(n, 1);
        assert_eq!(lines, 1);
    }

    #[test]
    fn test_replace_with_fewer_lines() {
        let (out, _, lines) = run(
            "line1\nline2\nline3\nline4\n",
            "line2\nline3",
            "combined",
            MatchMode::Exact,
        );
        assert_eq!(out, "line1\ncombined\nline4\n");
        assert_eq!(lines, 2);
    }

    #[test]
    fn test_matches_sharing_a_line_count_once() {
        let (out, n, lines) = run("ab ab\nab\n", "ab", "x\ny", MatchMode::Exact);
        assert_eq!(out, "x\ny x\ny\nx\ny\n");
        assert_eq!(n, 3);
        assert_eq!(lines, 2);
    }

    #[test]
    fn test_crlf_patterns() {
        let (out, n, _) = run(
            "line1\r\nline2\r\nline3\r\n",
            "line1\r\nline2",
            "combined",
            MatchMode::Exact,
        );
        assert_eq!(out, "combined\r\nline3\r\n");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_empty_search_is_identity() {
        let (out, n, lines) = run("a\nb\n", "", "x\n", MatchMode::Exact);
        assert_eq!(out, "a\nb\n");
        assert_eq!((n, lines), (0, 0));
    }

    #[test]
    fn test_no_match() {
        let (out, n, lines) = run("a\nb\n", "c\nd", "x", MatchMode::CaseInsensitiveWholeWord);
        assert_eq!(out, "a\nb\n");
        assert_eq!((n, lines), (0, 0));
    }
}
