//! Turns pattern text into an immutable [`CompiledPattern`].
//!
//! Compilation strips a leading `!` (negation), expands brace groups into
//! independent alternatives, parses each alternative into path levels, and
//! precomputes the metadata traversal drivers rely on: whether the pattern
//! is dynamic at all and the longest literal directory prefix it can only
//! ever match below.

use itertools::Itertools;

use crate::error::GlobError;
use crate::parse::{parse, Level};

/// Default upper bound on how many alternatives one brace group may expand to.
pub(crate) const DEFAULT_BRACE_LIMIT: usize = 512;

/// Options controlling how patterns compile and match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchOptions {
    /// Compare path characters case-sensitively. Defaults to `true`.
    pub case_sensitive: bool,
    /// Let wildcards match entries whose name starts with a dot. Defaults to
    /// `false`: hidden entries only match when the pattern names the dot
    /// explicitly.
    pub dot_files: bool,
    /// Upper bound on the number of alternatives brace expansion may
    /// produce; exceeding it fails with [`GlobError::TooComplex`].
    pub max_brace_expansions: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            dot_files: false,
            max_brace_expansions: DEFAULT_BRACE_LIMIT,
        }
    }
}

/// A parsed and preprocessed glob pattern.
///
/// Compiled patterns are immutable and cheap to share: all matching state
/// lives on the stack of the match call, so a `CompiledPattern` (typically
/// behind an `Arc`) can serve concurrent matches.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pattern: String,
    pub(crate) alternatives: Vec<Vec<Level>>,
    pub(crate) options: MatchOptions,
    negated: bool,
    is_dynamic: bool,
    base_path: String,
}

impl CompiledPattern {
    /// Compile `pattern` under the given options.
    ///
    /// # Errors
    ///
    /// Returns [`GlobError::InvalidPattern`] for malformed syntax and
    /// [`GlobError::TooComplex`] when brace expansion exceeds
    /// `options.max_brace_expansions`.
    pub fn compile(pattern: &str, options: &MatchOptions) -> Result<Self, GlobError> {
        let (negated, body) = strip_negation(pattern);
        let expanded = expand_braces(body, options.max_brace_expansions)?;
        let had_braces = expanded.len() > 1 || expanded.first().map(String::as_str) != Some(body);

        let mut alternatives = Vec::with_capacity(expanded.len());
        for alternative in &expanded {
            alternatives.push(parse(alternative)?);
        }

        let is_dynamic = negated
            || had_braces
            || alternatives.iter().flatten().any(Level::is_dynamic);
        // A negated pattern must be evaluated against the full candidate
        // set, so it never restricts the walk.
        let base_path = if negated {
            String::new()
        } else {
            common_literal_prefix(&alternatives)
        };

        Ok(Self {
            pattern: pattern.to_string(),
            alternatives,
            options: *options,
            negated,
            is_dynamic,
            base_path,
        })
    }

    /// The original pattern text.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the pattern contains any wildcard construct (or negation or
    /// brace alternatives) as opposed to being a plain literal path.
    pub fn is_dynamic(&self) -> bool {
        self.is_dynamic
    }

    /// Longest literal directory prefix below which every match lives.
    ///
    /// Walking from this directory can never miss a match; empty for
    /// negated patterns and patterns that are dynamic from the first level.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Whether the pattern carried a leading `!`.
    pub fn negated(&self) -> bool {
        self.negated
    }
}

/// Strip leading `!` markers; each one toggles negation.
fn strip_negation(pattern: &str) -> (bool, &str) {
    let mut negated = false;
    let mut rest = pattern;
    while let Some(body) = rest.strip_prefix('!') {
        negated = !negated;
        rest = body;
    }
    (negated, rest)
}

/// Expand `{a,b}` groups (nesting supported) into flat alternatives.
///
/// Escaped braces are literal. An opening brace without a matching close is
/// malformed; a stray `}` is treated as a literal character.
pub(crate) fn expand_braces(pattern: &str, limit: usize) -> Result<Vec<String>, GlobError> {
    let mut out = Vec::new();
    expand_into(pattern, pattern, limit, &mut out)?;
    Ok(out)
}

fn expand_into(
    original: &str,
    text: &str,
    limit: usize,
    out: &mut Vec<String>,
) -> Result<(), GlobError> {
    let mut iter = text.char_indices();
    let mut open = None;
    while let Some((i, c)) = iter.next() {
        match c {
            '\\' => {
                iter.next();
            }
            '{' => {
                open = Some(i);
                break;
            }
            _ => {}
        }
    }
    let Some(start) = open else {
        if out.len() >= limit {
            return Err(GlobError::TooComplex {
                pattern: original.to_string(),
                limit,
            });
        }
        out.push(text.to_string());
        return Ok(());
    };

    let mut depth = 1usize;
    let mut alternatives = Vec::new();
    let mut alternative_start = start + 1;
    let mut close = None;
    let mut iter = text[start + 1..].char_indices();
    while let Some((rel, c)) = iter.next() {
        let i = start + 1 + rel;
        match c {
            '\\' => {
                iter.next();
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    alternatives.push(&text[alternative_start..i]);
                    close = Some(i);
                    break;
                }
            }
            ',' if depth == 1 => {
                alternatives.push(&text[alternative_start..i]);
                alternative_start = i + 1;
            }
            _ => {}
        }
    }
    let Some(close) = close else {
        return Err(GlobError::invalid(original, start, "unbalanced brace group"));
    };

    let prefix = &text[..start];
    let suffix = &text[close + 1..];
    for alternative in alternatives {
        expand_into(original, &format!("{prefix}{alternative}{suffix}"), limit, out)?;
    }
    Ok(())
}

/// Longest run of leading literal levels shared by every alternative,
/// excluding each alternative's final level (the final level names the
/// entry itself, not a directory to start walking from).
fn common_literal_prefix(alternatives: &[Vec<Level>]) -> String {
    let literal_levels = |levels: &[Level]| -> Vec<String> {
        levels
            .iter()
            .take(levels.len().saturating_sub(1))
            .map_while(|level| level.as_literal().map(str::to_string))
            .collect()
    };

    let Some(first) = alternatives.first() else {
        return String::new();
    };
    let mut prefix = literal_levels(first);
    for alternative in &alternatives[1..] {
        let other = literal_levels(alternative);
        let shared = prefix
            .iter()
            .zip(other.iter())
            .take_while(|(a, b)| a == b)
            .count();
        prefix.truncate(shared);
    }
    prefix.iter().join("/")
}
