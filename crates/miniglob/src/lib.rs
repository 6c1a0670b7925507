#![deny(missing_docs)]
//! Glob pattern matching with the pieces a filesystem traversal needs.
//!
//! Patterns are compiled once into an immutable [`CompiledPattern`] that
//! answers two questions: does a path match ([`CompiledPattern::matches`]),
//! and could entries below a directory still match
//! ([`CompiledPattern::matches_prefix`], a tri-state [`PartialMatch`] used
//! to prune subtrees during a walk). On top of the matcher sit two
//! traversal drivers, blocking [`glob_sync`] and asynchronous [`glob`],
//! plus the path utilities a caller needs to build patterns safely:
//! escaping ([`escape_path`]), POSIX/Windows conversion
//! ([`convert_path_to_pattern`]), literal-prefix splitting
//! ([`split_pattern`]) and dynamic-pattern detection
//! ([`is_dynamic_pattern`]).
//!
//! # Pattern dialect
//!
//! - `*` matches any run of characters within one path level
//! - `?` matches exactly one character within a level
//! - `**`, alone in a level, matches zero or more whole levels
//! - `[abc]`, `[a-z]`, `[!abc]` match one character from (or not from) a set
//! - `{a,b}` expands into independent alternatives, OR-ed together
//! - a leading `!` negates the whole pattern
//! - `\` escapes the next character
//!
//! # Matching semantics
//!
//! Hidden entries (names starting with `.`) never match a wildcard unless
//! [`MatchOptions::dot_files`] is set or the pattern spells the dot out.
//! Matching is case-sensitive unless [`MatchOptions::case_sensitive`] is
//! cleared. Wildcard evaluation is a dynamic program over pattern and path
//! positions, so pathological patterns cannot go exponential.
//!
//! # Example
//!
//! ```no_run
//! use miniglob::{glob_sync, GlobOptions};
//!
//! let options = GlobOptions::default();
//! let sources = glob_sync(["src/**/*.rs", "!**/*_generated.rs"], &options)?;
//! # Ok::<(), miniglob::GlobError>(())
//! ```
//!
//! Compiled patterns can be shared across calls through a [`PatternCache`];
//! there is no implicit global cache.

mod cache;
mod compile;
mod error;
mod matcher;
mod parse;
mod paths;
mod walk;
mod walk_async;

pub use cache::PatternCache;
pub use compile::{CompiledPattern, MatchOptions};
pub use error::GlobError;
pub use matcher::{PartialMatch, PartialMatcher};
pub use paths::{
    convert_path_to_pattern, convert_posix_path_to_pattern, convert_win32_path_to_pattern,
    escape_path, escape_posix_path, escape_win32_path, is_dynamic_pattern, split_pattern,
    SplitPattern,
};
pub use walk::{glob_sync, GlobOptions};
pub use walk_async::glob;
