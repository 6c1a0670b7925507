use std::sync::Arc;

use dashmap::DashMap;

use crate::compile::{CompiledPattern, MatchOptions};
use crate::error::GlobError;

/// An explicit cache of compiled patterns, keyed by pattern text and the
/// options it was compiled under.
///
/// Entries are immutable once inserted and never invalidated. Wrap the
/// cache in an [`Arc`] and hand it to [`GlobOptions`](crate::GlobOptions)
/// to share compiled patterns across repeated `glob` calls; there is no
/// implicit global cache.
#[derive(Debug, Default)]
pub struct PatternCache {
    entries: DashMap<(String, MatchOptions), Arc<CompiledPattern>>,
}

impl PatternCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `pattern`, reusing a previously compiled entry when present.
    ///
    /// # Errors
    ///
    /// Propagates the compile error on a cache miss; failures are not cached.
    pub fn compile(
        &self,
        pattern: &str,
        options: &MatchOptions,
    ) -> Result<Arc<CompiledPattern>, GlobError> {
        let key = (pattern.to_string(), *options);
        if let Some(hit) = self.entries.get(&key) {
            return Ok(Arc::clone(&hit));
        }
        let compiled = Arc::new(CompiledPattern::compile(pattern, options)?);
        self.entries.insert(key, Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Number of cached patterns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuses_compiled_patterns() {
        let cache = PatternCache::new();
        let options = MatchOptions::default();
        let first = cache.compile("src/**/*.rs", &options).unwrap();
        let second = cache.compile("src/**/*.rs", &options).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn options_are_part_of_the_key() {
        let cache = PatternCache::new();
        let sensitive = MatchOptions::default();
        let insensitive = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::default()
        };
        let a = cache.compile("*.RS", &sensitive).unwrap();
        let b = cache.compile("*.RS", &insensitive).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = PatternCache::new();
        assert!(cache.compile("a[", &MatchOptions::default()).is_err());
        assert!(cache.is_empty());
    }
}
