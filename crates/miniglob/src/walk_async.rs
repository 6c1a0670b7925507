//! The asynchronous traversal driver.
//!
//! Directory reads are the only suspension points. Sibling directories are
//! read concurrently through a [`FuturesUnordered`] pump, but the driver is
//! a single logical task: compiled patterns are shared read-only and the
//! result set has one owner, so no locking is involved. Cancellation is
//! checked before scheduling each directory read; once the token fires the
//! call returns [`GlobError::Cancelled`] and the partial results are
//! dropped, never returned.

use std::io;
use std::path::{Path, PathBuf};

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use indexmap::IndexSet;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::GlobError;
use crate::walk::{finish, join_rel, rel_depth, resolve_cwd, GlobOptions, WalkPlan};

/// Match `patterns` against the filesystem, suspending on directory reads.
///
/// The asynchronous counterpart of [`glob_sync`](crate::glob_sync): same
/// pattern semantics, options, and output shape. Subdirectories discovered
/// at the same level are read concurrently. Supplying
/// `options.cancellation` lets the caller abandon the walk; a fired token
/// surfaces as [`GlobError::Cancelled`] rather than a partial result.
///
/// # Errors
///
/// Fails on invalid options or patterns before touching the filesystem, on
/// the first unreadable directory when `options.fail_fast` is set, and with
/// [`GlobError::Cancelled`] when the cancellation token fires.
pub async fn glob<'t>(
    patterns: impl IntoIterator<Item = &'t str>,
    options: &GlobOptions,
) -> Result<Vec<String>, GlobError> {
    let plan = WalkPlan::build(patterns, options)?;
    let cwd = resolve_cwd(options)?;
    let cancellation = options.cancellation.clone();

    if is_cancelled(&cancellation) {
        return Err(GlobError::Cancelled);
    }

    let mut results = IndexSet::new();
    let mut pending = FuturesUnordered::new();
    for base in plan.walk_bases() {
        let dir = if base.is_empty() {
            cwd.clone()
        } else {
            cwd.join(&base)
        };
        pending.push(read_dir(dir, base, plan.follow_symlinks));
    }

    while let Some((dir, rel, outcome)) = pending.next().await {
        if is_cancelled(&cancellation) {
            return Err(GlobError::Cancelled);
        }
        let entries = match outcome {
            Ok(entries) => entries,
            Err(source) if source.kind() == io::ErrorKind::NotFound && rel_is_base(&rel, &plan) => {
                // a pattern's base directory simply does not exist
                continue;
            }
            Err(source) => {
                if options.fail_fast {
                    return Err(GlobError::Walk { path: dir, source });
                }
                warn!(path = %dir.display(), error = %source, "skipping unreadable directory");
                continue;
            }
        };

        for entry in entries {
            let rel_child = join_rel(&rel, &entry.name);
            if entry.is_dir {
                if plan.should_emit(&rel_child, true) {
                    results.insert(rel_child.clone());
                }
                if entry.descend && plan.should_descend(&rel_child, rel_depth(&rel_child)) {
                    pending.push(read_dir(entry.path, rel_child, plan.follow_symlinks));
                }
            } else if plan.should_emit(&rel_child, false) {
                results.insert(rel_child);
            }
        }
    }

    Ok(finish(results, options, &cwd))
}

fn is_cancelled(token: &Option<CancellationToken>) -> bool {
    token.as_ref().is_some_and(CancellationToken::is_cancelled)
}

fn rel_is_base(rel: &str, plan: &WalkPlan) -> bool {
    plan.walk_bases().iter().any(|base| base == rel)
}

struct RawEntry {
    name: String,
    path: PathBuf,
    is_dir: bool,
    descend: bool,
}

async fn read_dir(
    dir: PathBuf,
    rel: String,
    follow_symlinks: bool,
) -> (PathBuf, String, io::Result<Vec<RawEntry>>) {
    let outcome = collect_entries(&dir, follow_symlinks).await;
    (dir, rel, outcome)
}

async fn collect_entries(dir: &Path, follow_symlinks: bool) -> io::Result<Vec<RawEntry>> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let file_type = entry.file_type().await?;
        let (is_dir, descend) = if file_type.is_symlink() {
            if follow_symlinks {
                match tokio::fs::metadata(entry.path()).await {
                    Ok(meta) => (meta.is_dir(), meta.is_dir()),
                    // broken link: nothing to emit or descend into
                    Err(_) => continue,
                }
            } else {
                (false, false)
            }
        } else {
            (file_type.is_dir(), file_type.is_dir())
        };
        entries.push(RawEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.path(),
            is_dir,
            descend,
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use fs_err::{self as fs, File};
    use tempfile::tempdir;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::glob_sync;

    fn options_in(dir: &Path) -> GlobOptions {
        GlobOptions {
            cwd: Some(dir.to_path_buf()),
            sort: true,
            ..GlobOptions::default()
        }
    }

    #[tokio::test]
    async fn async_and_sync_drivers_agree() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src/deep")).unwrap();
        fs::create_dir(root.join("docs")).unwrap();
        File::create(root.join("src/lib.rs")).unwrap();
        File::create(root.join("src/deep/mod.rs")).unwrap();
        File::create(root.join("src/deep/skip.txt")).unwrap();
        File::create(root.join("docs/readme.md")).unwrap();

        let options = options_in(root);
        let patterns = ["src/**/*.rs", "docs/*.md", "!**/skip.*"];
        let from_async = glob(patterns, &options).await.unwrap();
        let from_sync = glob_sync(patterns, &options).unwrap();
        assert_eq!(from_async, from_sync);
        assert_eq!(
            from_async,
            vec!["docs/readme.md", "src/deep/mod.rs", "src/lib.rs"]
        );
    }

    #[tokio::test]
    async fn sibling_directories_are_all_visited() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        for dir in ["a", "b", "c"] {
            fs::create_dir(root.join(dir)).unwrap();
            File::create(root.join(dir).join("leaf.txt")).unwrap();
        }

        let paths = glob(["**/leaf.txt"], &options_in(root)).await.unwrap();
        assert_eq!(paths, vec!["a/leaf.txt", "b/leaf.txt", "c/leaf.txt"]);
    }

    #[tokio::test]
    async fn fired_cancellation_discards_results() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        File::create(root.join("a.txt")).unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let options = GlobOptions {
            cancellation: Some(token),
            ..options_in(root)
        };
        assert_matches!(
            glob(["*.txt"], &options).await,
            Err(GlobError::Cancelled)
        );
    }

    #[tokio::test]
    async fn unfired_cancellation_does_not_interfere() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        File::create(root.join("a.txt")).unwrap();

        let options = GlobOptions {
            cancellation: Some(CancellationToken::new()),
            ..options_in(root)
        };
        let paths = glob(["*.txt"], &options).await.unwrap();
        assert_eq!(paths, vec!["a.txt"]);
    }

    #[tokio::test]
    async fn missing_base_directory_yields_no_matches() {
        let temp = tempdir().unwrap();
        let paths = glob(["missing/*.txt"], &options_in(temp.path()))
            .await
            .unwrap();
        assert!(paths.is_empty());
    }

    #[tokio::test]
    async fn contradictory_options_fail_before_io() {
        let options = GlobOptions {
            only_files: true,
            only_directories: true,
            cwd: Some(PathBuf::from("/nonexistent")),
            ..GlobOptions::default()
        };
        assert_matches!(
            glob(["*"], &options).await,
            Err(GlobError::InvalidOptions(_))
        );
    }
}
