//! # repfor
//!
//! Exact-string search and replace across files.
//!
//! This crate provides:
//! - Literal matching in four modes (exact, case-insensitive, whole-word,
//!   and both), per line or across line breaks
//! - Directory scanning (single level or recursive) and explicit file lists
//! - Extension filtering and line exclusion
//! - Crash-safe in-place rewrites that keep line endings and permissions
//! - Dry runs with optional unified diffs
//! - A line-delimited JSON-RPC tool server
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use repfor::prelude::*;
//!
//! let result = ReplaceRequest::new("old_api", "new_api")
//!     .directories(["./src"])
//!     .extension(".rs")
//!     .whole_word(true)
//!     .recursive(true)
//!     .dry_run(true)
//!     .apply()?;
//!
//! println!("{}", result.summary);
//! # Ok::<(), repfor::error::RepforError>(())
//! ```
//!
//! ## Single Lines
//!
//! ```rust
//! use repfor::transform::{count_replacements, replace_in_line};
//!
//! assert_eq!(replace_in_line("Foo foo", "foo", "bar", true, false), "bar bar");
//! assert_eq!(count_replacements("password word", "word", false, true), 1);
//! ```

pub mod atomic;
pub mod diff;
pub mod error;
pub mod matcher;
pub mod replace;
pub mod report;
pub mod server;
pub mod transform;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{RepforError, Result};
    pub use crate::matcher::{FileMatcher, MatchMode, Matcher};
    pub use crate::replace::{FileProcessor, FileStats, ReplaceRequest, Walker};
    pub use crate::report::{DirectoryOutcome, FileOutcome, OperationResult, Outcome, Summary};
    pub use crate::server::Server;
    pub use crate::transform::{ExcludeFilter, LineEnding, LineReplacer};
}

pub use prelude::*;
