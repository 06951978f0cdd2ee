/*
 * cache.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Memoization of extracted ancestor configurations.
//!
//! Many derived components share the same catalog bases; extracting a base's
//! layer once per (stack, component, ancestor) saves repeated work when a
//! whole stack is resolved. The cache is an explicit, injectable object
//! (one per [`crate::Resolver`]), never a process-wide singleton, so tests
//! and independent runs stay isolated.
//!
//! Concurrency: `DashMap` gives lock-free reads across keys, and the entry
//! API keeps the shard locked while a vacant key is populated, so a key is
//! computed at most once even under concurrent first access. A failed build
//! never inserts.

use crate::error::Result;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use strata_config::ConfigValue;

/// Cache of extracted ancestor layers, keyed `"stack:component:ancestor"`.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: DashMap<String, Arc<ConfigValue>>,
}

impl ResolutionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the cache key for an ancestor extraction.
    pub fn key(stack: &str, component: &str, ancestor: &str) -> String {
        format!("{stack}:{component}:{ancestor}")
    }

    /// Look up a cached layer.
    pub fn get(&self, key: &str) -> Option<Arc<ConfigValue>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Get the layer for `key`, computing and storing it on first access.
    ///
    /// The build closure runs at most once per key; if it fails, the error
    /// propagates and the key stays vacant.
    pub fn get_or_try_insert_with<F>(&self, key: String, build: F) -> Result<Arc<ConfigValue>>
    where
        F: FnOnce() -> Result<ConfigValue>,
    {
        match self.entries.entry(key) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let value = Arc::new(build()?);
                entry.insert(value.clone());
                Ok(value)
            }
        }
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all cached entries.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use strata_yaml::SourceInfo;

    fn value(s: &str) -> ConfigValue {
        ConfigValue::string(s, SourceInfo::default())
    }

    #[test]
    fn test_key_format() {
        assert_eq!(ResolutionCache::key("prod", "vpc", "vpc-defaults"), "prod:vpc:vpc-defaults");
    }

    #[test]
    fn test_computed_once() {
        let cache = ResolutionCache::new();
        let mut calls = 0;

        for _ in 0..3 {
            let got = cache
                .get_or_try_insert_with("prod:vpc:base".to_string(), || {
                    calls += 1;
                    Ok(value("layer"))
                })
                .unwrap();
            assert_eq!(got.value.as_str(), Some("layer"));
        }

        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failure_does_not_populate() {
        let cache = ResolutionCache::new();

        let result = cache.get_or_try_insert_with("prod:vpc:base".to_string(), || {
            Err(ResolveError::ComponentNotFound {
                stack: "prod".into(),
                component: "base".into(),
            })
        });

        assert!(result.is_err());
        assert!(cache.is_empty());

        // The key is still computable after the failure.
        let got = cache
            .get_or_try_insert_with("prod:vpc:base".to_string(), || Ok(value("layer")))
            .unwrap();
        assert_eq!(got.value.as_str(), Some("layer"));
    }

    #[test]
    fn test_clear() {
        let cache = ResolutionCache::new();
        cache
            .get_or_try_insert_with("k".to_string(), || Ok(value("v")))
            .unwrap();
        cache.clear();
        assert!(cache.get("k").is_none());
    }
}
