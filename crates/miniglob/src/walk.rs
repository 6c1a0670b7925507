//! The blocking traversal driver and the pieces it shares with the async
//! one: option validation, pattern compilation into a walk plan, and the
//! emit/descend decisions taken at every visited entry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs_err as fs;
use indexmap::IndexSet;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cache::PatternCache;
use crate::compile::{CompiledPattern, MatchOptions};
use crate::error::GlobError;
use crate::matcher::PartialMatch;

/// Options accepted by [`glob`](crate::glob) and [`glob_sync`].
#[derive(Debug, Clone)]
pub struct GlobOptions {
    /// Directory patterns are resolved against; defaults to the process
    /// working directory.
    pub cwd: Option<PathBuf>,
    /// Return absolute instead of cwd-relative paths.
    pub absolute: bool,
    /// Compare path characters case-sensitively. Defaults to `true`.
    pub case_sensitive: bool,
    /// Let wildcards match entries whose name starts with a dot.
    pub dot_files: bool,
    /// Patterns excluding entries from the result set; an entry is emitted
    /// only if no ignore pattern matches it.
    pub ignore: Vec<String>,
    /// Emit only files. Mutually exclusive with `only_directories`.
    pub only_files: bool,
    /// Emit only directories. Mutually exclusive with `only_files`.
    pub only_directories: bool,
    /// Resolve symbolic links and descend into linked directories. When
    /// off, symlinks are treated as plain files.
    pub follow_symlinks: bool,
    /// Maximum number of path levels below `cwd` to descend into.
    pub max_depth: Option<usize>,
    /// Abort the whole traversal on the first unreadable directory instead
    /// of skipping it.
    pub fail_fast: bool,
    /// Return results in lexicographic instead of discovery order.
    pub sort: bool,
    /// Cancellation signal for the async driver; checked between directory
    /// reads. The blocking driver ignores it.
    pub cancellation: Option<CancellationToken>,
    /// Shared compiled-pattern cache; patterns are compiled per call when
    /// absent.
    pub cache: Option<Arc<PatternCache>>,
}

impl Default for GlobOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            absolute: false,
            case_sensitive: true,
            dot_files: false,
            ignore: Vec::new(),
            only_files: false,
            only_directories: false,
            follow_symlinks: false,
            max_depth: None,
            fail_fast: false,
            sort: false,
            cancellation: None,
            cache: None,
        }
    }
}

impl GlobOptions {
    /// Reject contradictory flags before any I/O happens.
    pub(crate) fn validate(&self) -> Result<(), GlobError> {
        if self.only_files && self.only_directories {
            return Err(GlobError::InvalidOptions(
                "`only_files` and `only_directories` cannot both be set".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn match_options(&self) -> MatchOptions {
        MatchOptions {
            case_sensitive: self.case_sensitive,
            dot_files: self.dot_files,
            ..MatchOptions::default()
        }
    }
}

/// Everything the walkers need, compiled once per call: include and ignore
/// matchers plus the traversal flags.
pub(crate) struct WalkPlan {
    includes: Vec<Arc<CompiledPattern>>,
    ignores: Vec<Arc<CompiledPattern>>,
    only_files: bool,
    only_directories: bool,
    pub(crate) follow_symlinks: bool,
    max_depth: Option<usize>,
}

impl WalkPlan {
    /// Compile `patterns` and the ignore list. A leading `!` moves an input
    /// pattern into the ignore set, mirroring how exclusion patterns are
    /// written inline in pattern lists.
    pub(crate) fn build<'t>(
        patterns: impl IntoIterator<Item = &'t str>,
        options: &GlobOptions,
    ) -> Result<Self, GlobError> {
        options.validate()?;
        let match_options = options.match_options();
        let compile = |pattern: &str| -> Result<Arc<CompiledPattern>, GlobError> {
            match &options.cache {
                Some(cache) => cache.compile(pattern, &match_options),
                None => CompiledPattern::compile(pattern, &match_options).map(Arc::new),
            }
        };

        let mut includes = Vec::new();
        let mut ignores = Vec::new();
        for pattern in patterns {
            if let Some(body) = pattern.strip_prefix('!') {
                ignores.push(compile(body)?);
            } else {
                includes.push(compile(pattern)?);
            }
        }
        for pattern in &options.ignore {
            ignores.push(compile(pattern.strip_prefix('!').unwrap_or(pattern))?);
        }

        Ok(Self {
            includes,
            ignores,
            only_files: options.only_files,
            only_directories: options.only_directories,
            follow_symlinks: options.follow_symlinks,
            max_depth: options.max_depth,
        })
    }

    /// Distinct base directories to start walking from, with bases covered
    /// by a shorter base removed.
    pub(crate) fn walk_bases(&self) -> Vec<String> {
        let distinct: IndexSet<String> = self
            .includes
            .iter()
            .map(|pattern| pattern.base_path().to_string())
            .collect();
        let mut kept: Vec<String> = Vec::new();
        for base in distinct {
            if kept.iter().any(|existing| is_path_prefix(existing, &base)) {
                continue;
            }
            kept.retain(|existing| !is_path_prefix(&base, existing));
            kept.push(base);
        }
        kept
    }

    /// Whether to descend into the directory at `rel` (depth = its level
    /// count below cwd).
    pub(crate) fn should_descend(&self, rel: &str, depth: usize) -> bool {
        if let Some(max) = self.max_depth {
            if depth >= max {
                return false;
            }
        }
        self.includes
            .iter()
            .any(|pattern| pattern.matches_prefix(rel) != PartialMatch::NoMatch)
    }

    /// Whether the entry at `rel` belongs in the result set.
    pub(crate) fn should_emit(&self, rel: &str, is_dir: bool) -> bool {
        if is_dir && self.only_files {
            return false;
        }
        if !is_dir && self.only_directories {
            return false;
        }
        self.includes.iter().any(|pattern| pattern.matches(rel))
            && !self.ignores.iter().any(|pattern| pattern.matches(rel))
    }
}

fn is_path_prefix(prefix: &str, path: &str) -> bool {
    prefix.is_empty()
        || path == prefix
        || (path.len() > prefix.len()
            && path.starts_with(prefix)
            && path.as_bytes()[prefix.len()] == b'/')
}

pub(crate) fn resolve_cwd(options: &GlobOptions) -> Result<PathBuf, GlobError> {
    match &options.cwd {
        Some(cwd) => Ok(cwd.clone()),
        None => std::env::current_dir().map_err(|source| GlobError::Walk {
            path: PathBuf::from("."),
            source,
        }),
    }
}

pub(crate) fn join_rel(rel: &str, name: &str) -> String {
    if rel.is_empty() {
        name.to_string()
    } else {
        format!("{rel}/{name}")
    }
}

pub(crate) fn rel_depth(rel: &str) -> usize {
    rel.split('/').count()
}

/// Shape the deduplicated result set per the output options.
pub(crate) fn finish(
    results: IndexSet<String>,
    options: &GlobOptions,
    cwd: &Path,
) -> Vec<String> {
    let mut out: Vec<String> = if options.absolute {
        let root = cwd.to_string_lossy().replace('\\', "/");
        let root = root.trim_end_matches('/').to_string();
        results
            .into_iter()
            .map(|rel| format!("{root}/{rel}"))
            .collect()
    } else {
        results.into_iter().collect()
    };
    if options.sort {
        out.sort();
    }
    out
}

/// Match `patterns` against the filesystem, blocking until the walk
/// completes.
///
/// Patterns are resolved against `options.cwd`; results are
/// `/`-separated paths relative to it (absolute with `options.absolute`),
/// deduplicated, in discovery order unless `options.sort` is set. See
/// [`GlobOptions`] for traversal behavior and [`crate::glob`] for the
/// asynchronous form.
///
/// # Errors
///
/// Fails on invalid options or patterns before touching the filesystem,
/// and on the first unreadable directory when `options.fail_fast` is set;
/// otherwise unreadable subtrees are skipped with a warning.
pub fn glob_sync<'t>(
    patterns: impl IntoIterator<Item = &'t str>,
    options: &GlobOptions,
) -> Result<Vec<String>, GlobError> {
    let plan = WalkPlan::build(patterns, options)?;
    let cwd = resolve_cwd(options)?;
    let mut results = IndexSet::new();
    for base in plan.walk_bases() {
        let start = if base.is_empty() {
            cwd.clone()
        } else {
            cwd.join(&base)
        };
        if !start.is_dir() {
            continue;
        }
        walk_dir(&plan, &start, &base, &mut results, options.fail_fast)?;
    }
    Ok(finish(results, options, &cwd))
}

fn walk_dir(
    plan: &WalkPlan,
    dir: &Path,
    rel: &str,
    results: &mut IndexSet<String>,
    fail_fast: bool,
) -> Result<(), GlobError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(source) => {
            if fail_fast {
                return Err(GlobError::Walk {
                    path: dir.to_path_buf(),
                    source,
                });
            }
            warn!(path = %dir.display(), error = %source, "skipping unreadable directory");
            return Ok(());
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) => {
                if fail_fast {
                    return Err(GlobError::Walk {
                        path: dir.to_path_buf(),
                        source,
                    });
                }
                warn!(path = %dir.display(), error = %source, "skipping unreadable entry");
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let rel_child = join_rel(rel, &name);

        let Some((is_dir, descend)) = classify(&entry, plan.follow_symlinks) else {
            continue;
        };

        if is_dir {
            if plan.should_emit(&rel_child, true) {
                results.insert(rel_child.clone());
            }
            if descend && plan.should_descend(&rel_child, rel_depth(&rel_child)) {
                walk_dir(plan, &entry.path(), &rel_child, results, fail_fast)?;
            }
        } else if plan.should_emit(&rel_child, false) {
            results.insert(rel_child);
        }
    }
    Ok(())
}

/// Classify a directory entry as (is_dir, descend); `None` skips entries
/// whose type cannot be determined (e.g. a broken symlink under
/// `follow_symlinks`).
fn classify(entry: &fs::DirEntry, follow_symlinks: bool) -> Option<(bool, bool)> {
    let file_type = entry.file_type().ok()?;
    if file_type.is_symlink() {
        if !follow_symlinks {
            return Some((false, false));
        }
        let meta = fs::metadata(entry.path()).ok()?;
        return Some((meta.is_dir(), meta.is_dir()));
    }
    Some((file_type.is_dir(), file_type.is_dir()))
}
