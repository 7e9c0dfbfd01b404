//! Word-boundary classification for whole-word matching.
//!
//! Only ASCII letters, ASCII digits and `_` count as word characters. Every
//! other byte, including each byte of a multi-byte UTF-8 sequence, is a
//! boundary. Accented, Cyrillic or CJK letters therefore never join a word:
//! `"word"` is a whole word inside `"éwordé"`.

use memchr::memmem;

/// Returns true if the byte participates in a word.
pub fn is_word_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Returns true if `[start, end)` of `haystack` is not glued to a word
/// character on either side.
pub fn is_bounded(haystack: &[u8], start: usize, end: usize) -> bool {
    let before_ok = start == 0 || !is_word_char(haystack[start - 1]);
    let after_ok = end >= haystack.len() || !is_word_char(haystack[end]);
    before_ok && after_ok
}

/// Returns the start of the first whole-word occurrence of `needle` at or
/// after `from`.
///
/// A rejected candidate moves the scan forward by a single byte, so a true
/// match overlapping a rejected one is still found.
pub fn find_whole_word(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }

    let finder = memmem::Finder::new(needle);
    let mut pos = from;
    while pos <= haystack.len() {
        let start = pos + finder.find(&haystack[pos..])?;
        if is_bounded(haystack, start, start + needle.len()) {
            return Some(start);
        }
        pos = start + 1;
    }
    None
}

/// Returns true if `needle` occurs in `haystack` as a whole word.
///
/// An empty needle matches nothing.
pub fn contains_whole_word(haystack: &str, needle: &str) -> bool {
    find_whole_word(haystack.as_bytes(), needle.as_bytes(), 0).is_some()
}

/// Counts non-overlapping whole-word occurrences of `needle`.
pub fn count_whole_words(haystack: &str, needle: &str) -> usize {
    let (haystack, needle) = (haystack.as_bytes(), needle.as_bytes());
    let mut count = 0;
    let mut pos = 0;
    while let Some(start) = find_whole_word(haystack, needle, pos) {
        count += 1;
        pos = start + needle.len();
    }
    count
}
