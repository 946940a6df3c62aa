//! Memoized derived resources.
//!
//! A [`FunctionCache`] remembers the last key it built a resource for. As
//! long as callers keep asking with an equal key, the same resource is handed
//! back. A new key builds a new resource and releases the old one.
//!
//! ```text
//! apply(k1) -> build(k1)             held: (k1, r1)
//! apply(k1) -> r1                    held: (k1, r1)    no build, no release
//! apply(k2) -> build(k2), release r1 held: (k2, r2)
//! ```

use std::fmt;

use crate::backend::Release;

/// Single-entry cache from a key to a derived resource.
pub struct FunctionCache<K, R: Release> {
    entry: Option<(K, R)>,
}

impl<K: PartialEq, R: Release> FunctionCache<K, R> {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self { entry: None }
    }

    /// Returns the resource for `key`, building it if the key changed.
    ///
    /// If `build` fails the previous entry is kept untouched. Callers that
    /// must build several resources before publishing any of them split this
    /// into [`Self::is_current`] and [`Self::install`], as
    /// [`crate::SceneLoader`] does for its BVH and sun buffers.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `build`.
    pub fn apply<E>(&mut self, key: &K, build: impl FnOnce(&K) -> Result<R, E>) -> Result<&R, E>
    where
        K: Clone,
    {
        let entry = match self.entry.take() {
            Some((held, resource)) if held == *key => (held, resource),
            previous => {
                tracing::debug!("derived resource cache miss");
                let resource = match build(key) {
                    Ok(resource) => resource,
                    Err(e) => {
                        self.entry = previous;
                        return Err(e);
                    }
                };
                if let Some((_, old)) = previous {
                    old.release();
                }
                (key.clone(), resource)
            }
        };
        let (_, resource) = self.entry.insert(entry);
        Ok(resource)
    }

    /// Returns true if the held resource was built for an equal key.
    #[must_use]
    pub fn is_current(&self, key: &K) -> bool {
        matches!(&self.entry, Some((held, _)) if held == key)
    }

    /// Stores a resource built elsewhere, releasing the one it replaces.
    pub fn install(&mut self, key: K, resource: R) {
        if let Some((_, old)) = self.entry.replace((key, resource)) {
            old.release();
        }
    }

    /// The held resource, if any.
    #[must_use]
    pub fn get(&self) -> Option<&R> {
        self.entry.as_ref().map(|(_, resource)| resource)
    }

    /// The key the held resource was built for.
    #[must_use]
    pub fn key(&self) -> Option<&K> {
        self.entry.as_ref().map(|(key, _)| key)
    }

    /// Releases the held resource.
    pub fn clear(&mut self) {
        if let Some((_, old)) = self.entry.take() {
            old.release();
        }
    }
}

impl<K: PartialEq, R: Release> Default for FunctionCache<K, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, R: Release> Drop for FunctionCache<K, R> {
    fn drop(&mut self) {
        if let Some((_, old)) = self.entry.take() {
            old.release();
        }
    }
}

impl<K, R: Release> fmt::Debug for FunctionCache<K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionCache")
            .field("held", &self.entry.is_some())
            .finish()
    }
}
