//! Host-side name cache for hot call sites
//!
//! Building a `StringName` crosses the ABI. Call sites that name the same
//! method over and over (typed wrappers, builtin methods, utilities) go
//! through this cache instead and get a process-lifetime handle back.

use crate::core::string_name::StringName;
use dashmap::DashMap;
use once_cell::sync::Lazy;

/// Global text -> name mapping; entries are never removed
static NAMES: Lazy<DashMap<Box<str>, &'static StringName>> = Lazy::new(|| DashMap::with_capacity(256));

impl StringName {
    /// Cached handle for `text`, built through the runtime on first use
    pub fn cached(text: &str) -> &'static StringName {
        // Fast path: already cached
        if let Some(name) = NAMES.get(text) {
            return *name;
        }

        // Concurrent misses may both build a name; only one is kept
        *NAMES
            .entry(text.into())
            .or_insert_with(|| Box::leak(Box::new(StringName::new(text))))
    }
}

/// Number of names cached so far
pub fn interned_count() -> usize {
    NAMES.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::init;

    #[test]
    fn test_cached_identity() {
        init();
        let a = StringName::cached("intern_test_method");
        let b = StringName::cached(&String::from("intern_test_method"));
        assert!(core::ptr::eq(a, b));
        assert_eq!(*a, StringName::new("intern_test_method"));
        assert!(interned_count() >= 1);
    }

    #[test]
    fn test_concurrent_fill() {
        init();
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| StringName::cached("intern_concurrent") as *const StringName as usize))
            .collect();
        let addrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
    }
}
