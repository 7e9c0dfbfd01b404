//! Text transformations: per-line and whole-content replacement.

pub mod line;
pub mod multiline;

pub use line::{LineReplacer, count_replacements, replace_in_line};
pub use multiline::{MultilineOutcome, replace_content_multiline};

use crate::matcher::MatchMode;
use memchr::memmem;

/// How many bytes are sniffed for the line-ending style.
const SNIFF_LEN: usize = 8192;

/// Line terminator style of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// Detects the style from the first line break in the leading chunk.
    ///
    /// Content without any line break in that chunk is treated as LF.
    pub fn sniff(head: &[u8]) -> Self {
        let head = &head[..head.len().min(SNIFF_LEN)];
        match memchr::memchr(b'\n', head) {
            Some(i) if i > 0 && head[i - 1] == b'\r' => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }

    /// Detects CRLF anywhere in the content.
    pub fn detect(content: &[u8]) -> Self {
        if memmem::find(content, b"\r\n").is_some() {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
        }
    }

    /// Rewrites the `\n` breaks of a pattern to this style.
    ///
    /// Existing `\r\n` pairs are collapsed first, so patterns are always
    /// written with plain `\n` regardless of the target file.
    pub fn apply_to(self, pattern: &str) -> String {
        match self {
            LineEnding::Lf => pattern.to_string(),
            LineEnding::CrLf => pattern.replace("\r\n", "\n").replace('\n', "\r\n"),
        }
    }
}

/// Returns true if either pattern spans a line break.
pub fn is_multiline(search: &str, replace: &str) -> bool {
    search.contains('\n') || replace.contains('\n')
}

/// Substrings that veto a replacement on any line containing them.
#[derive(Debug, Clone, Default)]
pub struct ExcludeFilter {
    patterns: Vec<Vec<u8>>,
    mode: MatchMode,
}

impl ExcludeFilter {
    /// Builds a filter; case-insensitive modes compare lowercased text.
    ///
    /// Empty patterns are dropped, since they would veto every line.
    pub fn new<S: AsRef<str>>(patterns: &[S], mode: MatchMode) -> Self {
        let patterns = patterns
            .iter()
            .map(|p| p.as_ref().as_bytes())
            .filter(|p| !p.is_empty())
            .map(|p| mode.fold(p).into_owned())
            .collect();
        Self { patterns, mode }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns true if the text contains any exclude pattern.
    pub fn excludes(&self, text: &[u8]) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let folded = self.mode.fold(text);
        self.excludes_folded(&folded)
    }

    /// Like [`ExcludeFilter::excludes`] for text already folded by this
    /// filter's mode.
    pub fn excludes_folded(&self, folded: &[u8]) -> bool {
        self.patterns
            .iter()
            .any(|p| memmem::find(folded, p).is_some())
    }
}
