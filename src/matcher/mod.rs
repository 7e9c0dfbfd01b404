//! Literal pattern matching and file selection.
//!
//! A [`Matcher`] is a search term compiled for one of the four [`MatchMode`]s.
//! Case-insensitive modes compare against a folded copy of the text; folding
//! keeps every byte offset aligned with the original, so match ranges found in
//! the folded text can be spliced straight into the original.

pub mod file;
pub mod word;

pub use file::FileMatcher;
pub use word::{contains_whole_word, count_whole_words, is_word_char};

use memchr::memmem;
use std::borrow::Cow;
use std::ops::Range;

/// The four ways a search term can match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Literal, case-sensitive substring.
    #[default]
    Exact,
    /// Literal substring compared after lowercasing both sides.
    CaseInsensitive,
    /// Case-sensitive, bounded by non-word characters.
    WholeWord,
    /// Lowercased comparison, bounded by non-word characters.
    CaseInsensitiveWholeWord,
}

impl MatchMode {
    /// Selects the mode for a pair of request flags.
    pub fn from_flags(case_insensitive: bool, whole_word: bool) -> Self {
        match (case_insensitive, whole_word) {
            (false, false) => MatchMode::Exact,
            (true, false) => MatchMode::CaseInsensitive,
            (false, true) => MatchMode::WholeWord,
            (true, true) => MatchMode::CaseInsensitiveWholeWord,
        }
    }

    /// Returns true if both sides are lowercased before comparing.
    pub fn is_case_insensitive(self) -> bool {
        matches!(
            self,
            MatchMode::CaseInsensitive | MatchMode::CaseInsensitiveWholeWord
        )
    }

    /// Returns true if matches must sit on word boundaries.
    pub fn is_whole_word(self) -> bool {
        matches!(
            self,
            MatchMode::WholeWord | MatchMode::CaseInsensitiveWholeWord
        )
    }

    /// Returns the text as this mode compares it.
    pub fn fold<'a>(self, text: &'a [u8]) -> Cow<'a, [u8]> {
        if self.is_case_insensitive() {
            fold_case(text)
        } else {
            Cow::Borrowed(text)
        }
    }
}

/// Lowercases text without moving any byte offsets.
///
/// Each character is replaced by its simple lowercase form when that form is
/// a single character of the same encoded length. Characters whose lowercase
/// expands or changes width (`İ`, the Kelvin sign) are left alone, as are
/// invalid UTF-8 bytes. No full case folding: `ß` never matches `ss`.
pub fn fold_case(text: &[u8]) -> Cow<'_, [u8]> {
    if text.is_ascii() {
        if !text.iter().any(u8::is_ascii_uppercase) {
            return Cow::Borrowed(text);
        }
        return Cow::Owned(text.to_ascii_lowercase());
    }

    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for chunk in text.utf8_chunks() {
        for c in chunk.valid().chars() {
            let mut lower = c.to_lowercase();
            let folded = match (lower.next(), lower.next()) {
                (Some(l), None) if l.len_utf8() == c.len_utf8() => l,
                _ => c,
            };
            out.extend_from_slice(folded.encode_utf8(&mut buf).as_bytes());
        }
        out.extend_from_slice(chunk.invalid());
    }
    Cow::Owned(out)
}

/// A search term compiled for one match mode.
#[derive(Debug, Clone)]
pub struct Matcher {
    needle: Vec<u8>,
    mode: MatchMode,
}

impl Matcher {
    /// Compiles a search term.
    pub fn new(search: impl AsRef<[u8]>, mode: MatchMode) -> Self {
        Self {
            needle: mode.fold(search.as_ref()).into_owned(),
            mode,
        }
    }

    /// The mode this matcher was compiled for.
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Length in bytes of every match.
    pub fn len(&self) -> usize {
        self.needle.len()
    }

    /// Returns true for an empty search term, which never matches.
    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// Finds the next accepted match at or after `from`.
    ///
    /// `folded` must be `self.mode().fold(original)`. Folding never changes
    /// whether a byte is a word character, so the boundary check on the
    /// folded text agrees with one on the original.
    pub fn find_at(&self, folded: &[u8], from: usize) -> Option<Range<usize>> {
        if self.needle.is_empty() || from > folded.len() {
            return None;
        }

        let start = if self.mode.is_whole_word() {
            word::find_whole_word(folded, &self.needle, from)?
        } else {
            from + memmem::find(&folded[from..], &self.needle)?
        };
        Some(start..start + self.needle.len())
    }

    /// Finds the next literal occurrence at or after `from`, ignoring word
    /// boundaries.
    pub fn find_candidate(&self, folded: &[u8], from: usize) -> Option<Range<usize>> {
        if self.needle.is_empty() || from > folded.len() {
            return None;
        }
        let start = from + memmem::find(&folded[from..], &self.needle)?;
        Some(start..start + self.needle.len())
    }

    /// Returns true if the text contains at least one accepted match.
    pub fn is_match(&self, text: &[u8]) -> bool {
        let folded = self.mode.fold(text);
        self.find_at(&folded, 0).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_flags() {
        assert_eq!(MatchMode::from_flags(false, false), MatchMode::Exact);
        assert_eq!(MatchMode::from_flags(true, false), MatchMode::CaseInsensitive);
        assert_eq!(MatchMode::from_flags(false, true), MatchMode::WholeWord);
        assert_eq!(
            MatchMode::from_flags(true, true),
            MatchMode::CaseInsensitiveWholeWord
        );
        assert!(MatchMode::CaseInsensitiveWholeWord.is_case_insensitive());
        assert!(MatchMode::CaseInsensitiveWholeWord.is_whole_word());
        assert!(!MatchMode::Exact.is_whole_word());
    }

    #[test]
    fn test_fold_case_ascii() {
        assert_eq!(fold_case(b"Hello WORLD").as_ref(), b"hello world");
        assert!(matches!(fold_case(b"already lower"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_fold_case_keeps_offsets() {
        let inputs: [&[u8]; 5] = [
            "ПРИВЕТ мир".as_bytes(),
            "İstanbul".as_bytes(),
            "\u{212A}elvin".as_bytes(),
            "STRASSE straße".as_bytes(),
            b"bad \xFF\xFE BYTES",
        ];
        for input in inputs {
            assert_eq!(fold_case(input).len(), input.len());
        }
        assert_eq!(fold_case("ПРИВЕТ".as_bytes()).as_ref(), "привет".as_bytes());
        assert_eq!(fold_case(b"BAD \xFF").as_ref(), b"bad \xFF");
    }

    #[test]
    fn test_find_at_exact() {
        let m = Matcher::new("foo", MatchMode::Exact);
        assert_eq!(m.find_at(b"a foo foo", 0), Some(2..5));
        assert_eq!(m.find_at(b"a foo foo", 3), Some(6..9));
        assert_eq!(m.find_at(b"a foo foo", 7), None);
        assert_eq!(m.find_at(b"foo", 4), None);
    }

    #[test]
    fn test_find_at_case_insensitive() {
        let m = Matcher::new("FOO", MatchMode::CaseInsensitive);
        let text = b"say Foo";
        let folded = m.mode().fold(text);
        assert_eq!(m.find_at(&folded, 0), Some(4..7));
    }

    #[test]
    fn test_find_at_whole_word() {
        let m = Matcher::new("foo", MatchMode::WholeWord);
        assert_eq!(m.find_at(b"foobar foo", 0), Some(7..10));
        assert_eq!(m.find_candidate(b"foobar foo", 0), Some(0..3));
    }

    #[test]
    fn test_empty_matcher() {
        let m = Matcher::new("", MatchMode::Exact);
        assert!(m.is_empty());
        assert_eq!(m.find_at(b"anything", 0), None);
        assert!(!m.is_match(b"anything"));
    }

    #[test]
    fn test_is_match() {
        let m = Matcher::new("Word", MatchMode::CaseInsensitiveWholeWord);
        assert!(m.is_match(b"a WORD here"));
        assert!(!m.is_match(b"PASSWORD"));
    }
}
