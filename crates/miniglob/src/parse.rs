//! Tokenizes a single pattern alternative into path levels.
//!
//! Brace groups are expanded before parsing (see `compile::expand_braces`),
//! so this module never sees an unescaped `{`.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::GlobError;

/// One matching unit within a path level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    /// `?`: exactly one character, never the separator.
    SingleWildcard,
    /// `*`: zero or more characters, never the separator.
    MultiWildcard,
    /// `[...]`: one character from (or not from) a set.
    CharClass {
        entries: Vec<ClassEntry>,
        negated: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ClassEntry {
    Single(char),
    Range(char, char),
}

/// One separator-delimited path level of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Level {
    /// `**` occupying the whole level: zero or more path levels.
    Globstar,
    Parts(Vec<Segment>),
}

impl Level {
    /// The literal text of this level, if it contains no wildcard construct.
    pub(crate) fn as_literal(&self) -> Option<&str> {
        match self {
            Level::Parts(parts) => match parts.as_slice() {
                [Segment::Literal(text)] => Some(text),
                _ => None,
            },
            Level::Globstar => None,
        }
    }

    pub(crate) fn is_dynamic(&self) -> bool {
        self.as_literal().is_none()
    }
}

/// Split `pattern` on `/` and classify each level.
///
/// A leading `./` or `/` and a single trailing `/` are stripped; matching is
/// always performed against separator-normalized relative paths.
pub(crate) fn parse(pattern: &str) -> Result<Vec<Level>, GlobError> {
    let mut text = pattern;
    let mut offset = 0usize;
    if let Some(rest) = text.strip_prefix("./") {
        text = rest;
        offset += 2;
    }
    if let Some(rest) = text.strip_prefix('/') {
        text = rest;
        offset += 1;
    }
    if let Some(rest) = text.strip_suffix('/') {
        text = rest;
    }
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let mut levels = Vec::new();
    for raw in text.split('/') {
        if raw.is_empty() {
            return Err(GlobError::invalid(pattern, offset, "empty path level (`//`)"));
        }
        levels.push(parse_level(pattern, raw, offset)?);
        offset += raw.len() + 1;
    }
    Ok(levels)
}

fn parse_level(pattern: &str, level: &str, offset: usize) -> Result<Level, GlobError> {
    // `**` counts as a globstar only when it is the entire level; `a**b`
    // degrades to plain `*` wildcards within the level.
    if level == "**" {
        return Ok(Level::Globstar);
    }

    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = level.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => literal.push(escaped),
                None => {
                    return Err(GlobError::invalid(
                        pattern,
                        offset + i,
                        "dangling escape at end of pattern",
                    ));
                }
            },
            '?' => {
                flush_literal(&mut literal, &mut parts);
                parts.push(Segment::SingleWildcard);
            }
            '*' => {
                flush_literal(&mut literal, &mut parts);
                // consecutive stars within a level collapse to one
                if !matches!(parts.last(), Some(Segment::MultiWildcard)) {
                    parts.push(Segment::MultiWildcard);
                }
            }
            '[' => {
                flush_literal(&mut literal, &mut parts);
                let (entries, negated) = parse_class(pattern, &mut chars, offset + i)?;
                parts.push(Segment::CharClass { entries, negated });
            }
            _ => literal.push(c),
        }
    }
    flush_literal(&mut literal, &mut parts);
    Ok(Level::Parts(parts))
}

fn flush_literal(literal: &mut String, parts: &mut Vec<Segment>) {
    if !literal.is_empty() {
        parts.push(Segment::Literal(std::mem::take(literal)));
    }
}

/// Parse a `[...]` class body; the opening bracket at `open_at` has already
/// been consumed. A `]` immediately after `[` or `[!` is a literal member.
fn parse_class(
    pattern: &str,
    chars: &mut Peekable<CharIndices<'_>>,
    open_at: usize,
) -> Result<(Vec<ClassEntry>, bool), GlobError> {
    let unterminated = || GlobError::invalid(pattern, open_at, "unterminated character class");

    let mut entries = Vec::new();
    let mut negated = false;
    let mut members = 0usize;
    let mut pending: Option<char> = None;

    loop {
        let Some((_, c)) = chars.next() else {
            return Err(unterminated());
        };
        if members == 0 && !negated && (c == '!' || c == '^') {
            negated = true;
            continue;
        }
        if c == ']' && members > 0 {
            if let Some(p) = pending.take() {
                entries.push(ClassEntry::Single(p));
            }
            return Ok((entries, negated));
        }

        let mut escaped = false;
        let mut member = c;
        if c == '\\' {
            let Some((_, e)) = chars.next() else {
                return Err(unterminated());
            };
            member = e;
            escaped = true;
        }

        if member == '-' && !escaped && pending.is_some() {
            match chars.peek() {
                // `[a-]`: the dash is a literal member
                Some((_, ']')) => {
                    entries.push(ClassEntry::Single(pending.take().unwrap_or('-')));
                    pending = Some('-');
                }
                Some(_) => {
                    let (_, mut hi) = chars.next().unwrap_or((0, '-'));
                    if hi == '\\' {
                        let Some((_, e)) = chars.next() else {
                            return Err(unterminated());
                        };
                        hi = e;
                    }
                    let lo = pending.take().unwrap_or(hi);
                    if lo > hi {
                        return Err(GlobError::invalid(
                            pattern,
                            open_at,
                            "character class range is out of order",
                        ));
                    }
                    entries.push(ClassEntry::Range(lo, hi));
                }
                None => return Err(unterminated()),
            }
            members += 1;
            continue;
        }

        if let Some(p) = pending.take() {
            entries.push(ClassEntry::Single(p));
        }
        pending = Some(member);
        members += 1;
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn level(pattern: &str) -> Level {
        let mut levels = parse(pattern).unwrap();
        assert_eq!(levels.len(), 1, "expected one level for {pattern:?}");
        levels.remove(0)
    }

    #[test]
    fn splits_on_separators() {
        let levels = parse("a/*/c").unwrap();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].as_literal(), Some("a"));
        assert!(levels[1].is_dynamic());
        assert_eq!(levels[2].as_literal(), Some("c"));
    }

    #[test]
    fn globstar_must_fill_its_level() {
        assert_eq!(level("**"), Level::Globstar);
        assert_eq!(
            level("a**b"),
            Level::Parts(vec![
                Segment::Literal("a".into()),
                Segment::MultiWildcard,
                Segment::Literal("b".into()),
            ])
        );
    }

    #[test]
    fn consecutive_stars_collapse() {
        assert_eq!(level("***"), Level::Parts(vec![Segment::MultiWildcard]));
    }

    #[test]
    fn strips_leading_dot_slash_and_trailing_slash() {
        assert_eq!(parse("./a/b/").unwrap(), parse("a/b").unwrap());
    }

    #[test]
    fn escape_makes_metacharacters_literal() {
        assert_eq!(level(r"a\*b").as_literal(), Some("a*b"));
        assert_eq!(level(r"\[x\]").as_literal(), Some("[x]"));
    }

    #[test]
    fn dangling_escape_is_rejected() {
        assert_matches!(parse("a\\"), Err(GlobError::InvalidPattern { .. }));
    }

    #[test]
    fn empty_interior_level_is_rejected() {
        assert_matches!(parse("a//b"), Err(GlobError::InvalidPattern { .. }));
    }

    #[test]
    fn class_with_negation_and_range() {
        let parsed = level("[!a-c]");
        assert_eq!(
            parsed,
            Level::Parts(vec![Segment::CharClass {
                entries: vec![ClassEntry::Range('a', 'c')],
                negated: true,
            }])
        );
    }

    #[test]
    fn closing_bracket_as_first_member_is_literal() {
        assert_eq!(
            level("[]]"),
            Level::Parts(vec![Segment::CharClass {
                entries: vec![ClassEntry::Single(']')],
                negated: false,
            }])
        );
        assert_eq!(
            level("[!]]"),
            Level::Parts(vec![Segment::CharClass {
                entries: vec![ClassEntry::Single(']')],
                negated: true,
            }])
        );
    }

    #[test]
    fn trailing_dash_is_literal_member() {
        assert_eq!(
            level("[a-]"),
            Level::Parts(vec![Segment::CharClass {
                entries: vec![ClassEntry::Single('a'), ClassEntry::Single('-')],
                negated: false,
            }])
        );
    }

    #[test]
    fn unterminated_class_is_rejected() {
        assert_matches!(parse("abc[def"), Err(GlobError::InvalidPattern { .. }));
        assert_matches!(parse("abc[]"), Err(GlobError::InvalidPattern { .. }));
        assert_matches!(parse("abc[!]"), Err(GlobError::InvalidPattern { .. }));
    }

    #[test]
    fn out_of_order_range_is_rejected() {
        assert_matches!(parse("[z-a]"), Err(GlobError::InvalidPattern { .. }));
    }
}
