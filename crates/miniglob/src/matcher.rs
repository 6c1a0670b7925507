//! The matching engine: full matching and tri-state prefix matching.
//!
//! Matching runs level-by-level over separator-delimited path parts. Both
//! the cross-level globstar evaluation and the in-level `*` evaluation are
//! forward dynamic programs over (pattern-position, path-position) pairs,
//! so backtracking cost stays polynomial regardless of how many wildcards a
//! pattern contains.

use crate::compile::{CompiledPattern, MatchOptions};
use crate::error::GlobError;
use crate::parse::{ClassEntry, Level, Segment};

/// Outcome of evaluating a path prefix against a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartialMatch {
    /// The prefix can never lead to a match; the subtree can be pruned.
    NoMatch,
    /// The prefix itself is a full match.
    Matches,
    /// The prefix does not fully match, but deeper entries still can.
    MayMatchDeeper,
}

impl CompiledPattern {
    /// Test whether `path` fully matches this pattern.
    ///
    /// `path` is interpreted as a `/`-separated relative path; a leading
    /// `./` and a trailing `/` are ignored. Brace alternatives are OR-ed
    /// together and a negated pattern inverts the final outcome.
    pub fn matches(&self, path: &str) -> bool {
        let parts = split_path(path);
        let matched = self
            .alternatives
            .iter()
            .any(|levels| match_levels(levels, &parts, &self.options));
        matched != self.negated()
    }

    /// Evaluate whether `prefix` matches, or could still match deeper.
    ///
    /// Traversal drivers prune a subtree exactly when this returns
    /// [`PartialMatch::NoMatch`]. Negated patterns always report
    /// [`PartialMatch::MayMatchDeeper`]: an exclusion can never justify
    /// pruning on its own.
    pub fn matches_prefix(&self, prefix: &str) -> PartialMatch {
        if self.negated() {
            return PartialMatch::MayMatchDeeper;
        }
        let parts = split_path(prefix);
        let mut best = PartialMatch::NoMatch;
        for levels in &self.alternatives {
            match prefix_match_levels(levels, &parts, &self.options) {
                PartialMatch::Matches => return PartialMatch::Matches,
                PartialMatch::MayMatchDeeper => best = PartialMatch::MayMatchDeeper,
                PartialMatch::NoMatch => {}
            }
        }
        best
    }
}

/// Compiles a set of patterns once and answers prefix queries for all of
/// them; used by traversal drivers to decide whether to descend.
#[derive(Debug, Clone)]
pub struct PartialMatcher {
    patterns: Vec<CompiledPattern>,
}

impl PartialMatcher {
    /// Compile every pattern in the set under the same options.
    ///
    /// # Errors
    ///
    /// Fails with the first pattern that does not compile.
    pub fn new<'t>(
        patterns: impl IntoIterator<Item = &'t str>,
        options: &MatchOptions,
    ) -> Result<Self, GlobError> {
        let patterns = patterns
            .into_iter()
            .map(|pattern| CompiledPattern::compile(pattern, options))
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    /// Prefix evaluation across the whole set. `Matches` wins over
    /// `MayMatchDeeper`, which wins over `NoMatch`.
    pub fn partial_match(&self, path: &str) -> PartialMatch {
        let mut best = PartialMatch::NoMatch;
        for pattern in &self.patterns {
            match pattern.matches_prefix(path) {
                PartialMatch::Matches => return PartialMatch::Matches,
                PartialMatch::MayMatchDeeper => best = PartialMatch::MayMatchDeeper,
                PartialMatch::NoMatch => {}
            }
        }
        best
    }

    /// Full match against any pattern in the set.
    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(path))
    }
}

/// Normalize a candidate path into separator-delimited parts.
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    let mut text = path.strip_prefix("./").unwrap_or(path);
    text = text.strip_suffix('/').unwrap_or(text);
    if text.is_empty() {
        Vec::new()
    } else {
        text.split('/').collect()
    }
}

pub(crate) fn match_levels(levels: &[Level], parts: &[&str], options: &MatchOptions) -> bool {
    let width = parts.len() + 1;
    let reach = reachability(levels, parts, options);
    reach[levels.len() * width + parts.len()]
}

fn prefix_match_levels(levels: &[Level], parts: &[&str], options: &MatchOptions) -> PartialMatch {
    let width = parts.len() + 1;
    let reach = reachability(levels, parts, options);
    if reach[levels.len() * width + parts.len()] {
        return PartialMatch::Matches;
    }
    // Some proper prefix of the pattern consumed every part: whatever
    // levels remain can still be satisfied by deeper entries.
    if (0..levels.len()).any(|l| reach[l * width + parts.len()]) {
        return PartialMatch::MayMatchDeeper;
    }
    PartialMatch::NoMatch
}

/// Forward dynamic program over (level, part) pairs.
///
/// `reach[l * width + p]` is true when the first `l` pattern levels can
/// consume exactly the first `p` path parts. This is the memoization table
/// that keeps globstar evaluation linear in `levels × parts`.
fn reachability(levels: &[Level], parts: &[&str], options: &MatchOptions) -> Vec<bool> {
    let width = parts.len() + 1;
    let mut reach = vec![false; (levels.len() + 1) * width];
    reach[0] = true;

    for (l, level) in levels.iter().enumerate() {
        for p in 0..=parts.len() {
            if !reach[l * width + p] {
                continue;
            }
            match level {
                Level::Globstar => {
                    // zero levels consumed
                    reach[(l + 1) * width + p] = true;
                    // or one more level, provided the dot-file rule allows it
                    if p < parts.len() && dot_allowed(parts[p], options) {
                        reach[l * width + p + 1] = true;
                    }
                }
                Level::Parts(segments) => {
                    if p < parts.len() && level_matches(segments, parts[p], options) {
                        reach[(l + 1) * width + p + 1] = true;
                    }
                }
            }
        }
    }
    reach
}

fn dot_allowed(name: &str, options: &MatchOptions) -> bool {
    options.dot_files || !name.starts_with('.')
}

/// Match one level's segment sequence against one path part, again as a
/// forward dynamic program so repeated `*`s cannot go exponential.
fn level_matches(segments: &[Segment], name: &str, options: &MatchOptions) -> bool {
    if !options.dot_files && name.starts_with('.') {
        // hidden entries only match when the pattern spells out the dot
        let explicit_dot =
            matches!(segments.first(), Some(Segment::Literal(text)) if text.starts_with('.'));
        if !explicit_dot {
            return false;
        }
    }

    let chars: Vec<char> = name.chars().collect();
    let width = chars.len() + 1;
    let mut reach = vec![false; (segments.len() + 1) * width];
    reach[0] = true;

    for (s, segment) in segments.iter().enumerate() {
        for c in 0..=chars.len() {
            if !reach[s * width + c] {
                continue;
            }
            match segment {
                Segment::Literal(text) => {
                    let mut end = c;
                    let matched = text.chars().all(|expected| {
                        let ok = end < chars.len() && chars_eq(expected, chars[end], options);
                        end += 1;
                        ok
                    });
                    if matched {
                        reach[(s + 1) * width + end] = true;
                    }
                }
                Segment::SingleWildcard => {
                    if c < chars.len() {
                        reach[(s + 1) * width + c + 1] = true;
                    }
                }
                Segment::MultiWildcard => {
                    reach[(s + 1) * width + c] = true;
                    if c < chars.len() {
                        reach[s * width + c + 1] = true;
                    }
                }
                Segment::CharClass { entries, negated } => {
                    if c < chars.len() && class_matches(entries, *negated, chars[c], options) {
                        reach[(s + 1) * width + c + 1] = true;
                    }
                }
            }
        }
    }
    reach[segments.len() * width + chars.len()]
}

fn chars_eq(a: char, b: char, options: &MatchOptions) -> bool {
    if a == b {
        return true;
    }
    !options.case_sensitive && a.to_lowercase().eq(b.to_lowercase())
}

fn class_matches(entries: &[ClassEntry], negated: bool, c: char, options: &MatchOptions) -> bool {
    let inside = entries.iter().any(|entry| match entry {
        ClassEntry::Single(member) => chars_eq(*member, c, options),
        ClassEntry::Range(lo, hi) => {
            let range = *lo..=*hi;
            range.contains(&c)
                || (!options.case_sensitive
                    && (range.contains(&c.to_ascii_lowercase())
                        || range.contains(&c.to_ascii_uppercase())))
        }
    });
    inside != negated
}
