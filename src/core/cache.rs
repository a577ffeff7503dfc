//! Process-wide cache of loaded models.
//!
//! Models are loaded once per process and shared read-only afterwards. Cached
//! values are cloned out of the cache, so model types are expected to be cheap
//! handles (an `Arc` around the loaded plan).

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Trait implemented by model option types to generate a stable cache key.
pub trait ModelOptions {
    fn cache_key(&self) -> String;
}

type CacheStorage = HashMap<(TypeId, String), Arc<dyn Any + Send + Sync>>;

pub struct ModelCache {
    cache: Mutex<CacheStorage>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    // Entries are only ever inserted whole, so a poisoned lock still guards a
    // consistent map.
    fn storage(&self) -> MutexGuard<'_, CacheStorage> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get or create a model from the cache.
    ///
    /// If a model of type `M` with the given key already exists, a clone is
    /// returned. Otherwise `loader` is called and its result is stored.
    /// Loader failures are not cached.
    pub fn get_or_create<M, F>(&self, key: &str, loader: F) -> anyhow::Result<M>
    where
        M: Clone + Send + Sync + 'static,
        F: FnOnce() -> anyhow::Result<M>,
    {
        let cache_key = (TypeId::of::<M>(), key.to_string());

        if let Some(model) = self
            .storage()
            .get(&cache_key)
            .and_then(|cached| cached.downcast_ref::<M>())
        {
            tracing::debug!(key, "model cache hit");
            return Ok(model.clone());
        }

        // The lock is not held while loading; a concurrent loader for the same
        // key only costs a redundant load.
        let model = loader()?;

        self.storage().insert(
            cache_key,
            Arc::new(model.clone()) as Arc<dyn Any + Send + Sync>,
        );

        Ok(model)
    }

    pub fn clear(&self) {
        self.storage().clear();
    }

    pub fn len(&self) -> usize {
        self.storage().len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage().is_empty()
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_MODEL_CACHE: once_cell::sync::Lazy<ModelCache> =
    once_cell::sync::Lazy::new(ModelCache::new);

/// Get a reference to the global model cache.
pub fn global_cache() -> &'static ModelCache {
    &GLOBAL_MODEL_CACHE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct TestModel {
        id: String,
    }

    #[test]
    fn test_cache_returns_same_instance() {
        let cache = ModelCache::new();

        let model1 = cache
            .get_or_create::<TestModel, _>("test-model", || {
                Ok(TestModel {
                    id: "original".to_string(),
                })
            })
            .unwrap();

        let model2 = cache
            .get_or_create::<TestModel, _>("test-model", || {
                // This should not be called
                Ok(TestModel {
                    id: "new".to_string(),
                })
            })
            .unwrap();

        assert_eq!(model1.id, model2.id);
        assert_eq!(model1.id, "original");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let cache = ModelCache::new();

        let failed = cache.get_or_create::<TestModel, _>("flaky", || anyhow::bail!("disk error"));
        assert!(failed.is_err());
        assert!(cache.is_empty());

        let model = cache
            .get_or_create::<TestModel, _>("flaky", || {
                Ok(TestModel {
                    id: "second".to_string(),
                })
            })
            .unwrap();
        assert_eq!(model.id, "second");
    }

    #[test]
    fn test_keys_are_scoped_by_type() {
        let cache = ModelCache::new();
        cache
            .get_or_create::<TestModel, _>("shared", || Ok(TestModel { id: "a".into() }))
            .unwrap();
        let other = cache
            .get_or_create::<String, _>("shared", || Ok("b".to_string()))
            .unwrap();
        assert_eq!(other, "b");
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
