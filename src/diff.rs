//! Diff generation for previewing changes.

use similar::{ChangeTag, TextDiff};
use std::fmt::Write;

/// Generates a unified diff between two file contents.
///
/// Invalid UTF-8 is shown lossily; the diff is for display only.
pub fn unified_diff(original: &[u8], modified: &[u8], path: &str) -> String {
    let original = String::from_utf8_lossy(original);
    let modified = String::from_utf8_lossy(modified);
    let diff = TextDiff::from_lines(original.as_ref(), modified.as_ref());
    let mut output = String::new();

    let _ = writeln!(output, "--- a/{path}");
    let _ = writeln!(output, "+++ b/{path}");

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            output.push('\n');
        }

        for op in group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                    ChangeTag::Equal => ' ',
                };

                output.push(sign);
                output.push_str(change.value());
                if change.missing_newline() {
                    output.push('\n');
                }
            }
        }
    }

    output
}
