//! Path-to-pattern conversion, escaping, and pattern introspection.
//!
//! The pattern dialect is POSIX-flavoured: `/` separates levels and a
//! backslash escapes the next character. Converting a Windows path swaps
//! its separators for `/` while keeping any glob metacharacter in the
//! original file names escaped, so the result matches exactly the path it
//! was derived from.

use crate::compile::{CompiledPattern, MatchOptions};

/// Characters that carry meaning in the pattern dialect.
const GLOB_METACHARS: [char; 9] = ['*', '?', '[', ']', '{', '}', '(', ')', '!'];

fn is_metachar(c: char) -> bool {
    GLOB_METACHARS.contains(&c)
}

/// `C:`-style drive prefix, the usual tell of a Windows path.
fn has_drive_prefix(path: &str) -> bool {
    let mut chars = path.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(drive), Some(':')) if drive.is_ascii_alphabetic()
    )
}

fn looks_like_win32(path: &str) -> bool {
    path.contains('\\') || has_drive_prefix(path)
}

/// Escape every glob metacharacter in a POSIX path so the result, used as a
/// pattern, matches only the literal path it came from.
pub fn escape_posix_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if is_metachar(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape every glob metacharacter in a Windows path, including the drive
/// letter colon. Separators are left alone; use
/// [`convert_win32_path_to_pattern`] to obtain a matchable pattern.
pub fn escape_win32_path(path: &str) -> String {
    let drive = has_drive_prefix(path);
    let mut out = String::with_capacity(path.len());
    for (i, c) in path.char_indices() {
        if is_metachar(c) || (c == ':' && i == 1 && drive) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape a path using whichever convention it appears to follow.
pub fn escape_path(path: &str) -> String {
    if looks_like_win32(path) {
        escape_win32_path(path)
    } else {
        escape_posix_path(path)
    }
}

/// Convert a POSIX path into a pattern matching exactly that path.
///
/// POSIX paths already use the pattern separator, so this only escapes
/// metacharacters present in the file names.
pub fn convert_posix_path_to_pattern(path: &str) -> String {
    escape_posix_path(path)
}

/// Convert a Windows path into a pattern matching exactly that path:
/// backslash separators become `/`, metacharacters and the drive-letter
/// colon are escaped.
pub fn convert_win32_path_to_pattern(path: &str) -> String {
    let drive = has_drive_prefix(path);
    let mut out = String::with_capacity(path.len());
    for (i, c) in path.char_indices() {
        match c {
            // in a Windows path a backslash is always a separator
            '\\' => out.push('/'),
            ':' if i == 1 && drive => {
                out.push('\\');
                out.push(':');
            }
            c if is_metachar(c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Convert a path using whichever convention it appears to follow.
pub fn convert_path_to_pattern(path: &str) -> String {
    if looks_like_win32(path) {
        convert_win32_path_to_pattern(path)
    } else {
        convert_posix_path_to_pattern(path)
    }
}

/// Whether `pattern` contains any wildcard construct, negation, or brace
/// alternatives, as opposed to being a plain literal path.
///
/// A pattern that fails to parse is reported as dynamic: it is certainly
/// not a safe literal path, and callers that need the parse error can call
/// [`CompiledPattern::compile`] instead.
pub fn is_dynamic_pattern(pattern: &str, options: &MatchOptions) -> bool {
    // cheap reject: without a metacharacter or escape there is nothing to compile
    if !pattern.contains(|c: char| is_metachar(c) || c == '\\') {
        return false;
    }
    match CompiledPattern::compile(pattern, options) {
        Ok(compiled) => compiled.is_dynamic(),
        Err(_) => true,
    }
}

/// Result of [`split_pattern`]: the literal base directory to start a walk
/// from, plus the remainder to match below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPattern {
    /// Leading literal levels of the pattern (may be empty).
    pub base: String,
    /// Everything from the first dynamic level on; never empty.
    pub pattern: String,
}

/// Split the longest literal level prefix off the dynamic remainder.
///
/// Joining `base` and `pattern` back together with `/` yields a pattern
/// that matches exactly what the input matched. The final level always
/// stays in `pattern`, so a fully literal input splits into its parent
/// directory and file name. Negated patterns are not split at all: they
/// apply to the full candidate set.
pub fn split_pattern(pattern: &str) -> SplitPattern {
    if pattern.starts_with('!') {
        return SplitPattern {
            base: String::new(),
            pattern: pattern.to_string(),
        };
    }
    let levels: Vec<&str> = pattern.split('/').collect();
    let first_dynamic = levels
        .iter()
        .position(|level| level_is_dynamic(level))
        .unwrap_or(levels.len());
    let split_at = first_dynamic.min(levels.len().saturating_sub(1));
    SplitPattern {
        base: levels[..split_at].join("/"),
        pattern: levels[split_at..].join("/"),
    }
}

fn level_is_dynamic(level: &str) -> bool {
    let mut chars = level.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            c if is_metachar(c) => return true,
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::compile::CompiledPattern;

    fn matches(pattern: &str, path: &str) -> bool {
        CompiledPattern::compile(pattern, &MatchOptions::default())
            .unwrap()
            .matches(path)
    }

    #[rstest]
    #[case("plain/path.txt")]
    #[case("with space/file.txt")]
    #[case("weird/(parens)/file!.txt")]
    #[case("stars/a*b/q?.txt")]
    #[case("class/[abc]/x{1,2}.txt")]
    fn escaped_paths_match_only_themselves(#[case] path: &str) {
        let pattern = escape_path(path);
        assert!(matches(&pattern, path), "{pattern:?} should match {path:?}");
        assert!(!matches(&pattern, &format!("{path}x")));
        assert!(!matches(&pattern, &path[..path.len() - 1]));
    }

    #[test]
    fn win32_conversion_normalizes_separators() {
        assert_eq!(convert_win32_path_to_pattern(r"a\b\c"), "a/b/c");
        assert!(matches(&convert_win32_path_to_pattern(r"a\b\c"), "a/b/c"));
    }

    #[test]
    fn win32_conversion_escapes_drive_colon_and_metachars() {
        assert_eq!(
            convert_win32_path_to_pattern(r"C:\dir\file(1).txt"),
            r"C\:/dir/file\(1\).txt"
        );
    }

    #[test]
    fn conversion_dispatches_on_path_convention() {
        assert_eq!(convert_path_to_pattern(r"a\b"), "a/b");
        assert_eq!(convert_path_to_pattern("a/b"), "a/b");
        assert_eq!(convert_path_to_pattern(r"C:\x"), r"C\:/x");
    }

    #[rstest]
    #[case("a/b/c", false)]
    #[case("plain.txt", false)]
    #[case(r"escaped\*.txt", false)]
    #[case("*.txt", true)]
    #[case("a/?.txt", true)]
    #[case("**/x", true)]
    #[case("[ab]c", true)]
    #[case("x.{ts,js}", true)]
    #[case("!literal", true)]
    fn dynamic_pattern_detection(#[case] pattern: &str, #[case] expected: bool) {
        assert_eq!(
            is_dynamic_pattern(pattern, &MatchOptions::default()),
            expected,
            "{pattern:?}"
        );
    }

    #[test]
    fn malformed_patterns_are_reported_dynamic() {
        assert!(is_dynamic_pattern("a[unclosed", &MatchOptions::default()));
    }

    #[rstest]
    #[case("src/**/*.ts", "src", "**/*.ts")]
    #[case("a/b/*.rs", "a/b", "*.rs")]
    #[case("*.rs", "", "*.rs")]
    #[case("a/b/c.txt", "a/b", "c.txt")]
    #[case("single", "", "single")]
    #[case("!a/*.txt", "", "!a/*.txt")]
    fn split_pattern_cases(#[case] input: &str, #[case] base: &str, #[case] rest: &str) {
        let split = split_pattern(input);
        assert_eq!(split.base, base);
        assert_eq!(split.pattern, rest);
    }

    #[rstest]
    #[case("src/**/*.ts", "src/deep/x.ts")]
    #[case("a/b/c.txt", "a/b/c.txt")]
    #[case("/abs/*.rs", "abs/lib.rs")]
    fn split_pattern_round_trips(#[case] input: &str, #[case] path: &str) {
        let split = split_pattern(input);
        let rejoined = if split.base.is_empty() {
            split.pattern.clone()
        } else {
            format!("{}/{}", split.base, split.pattern)
        };
        assert_eq!(matches(input, path), matches(&rejoined, path));
        assert!(matches(&rejoined, path));
    }
}
