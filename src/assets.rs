//! Asset boundary
//!
//! The core never decodes images. Species profiles name their animation
//! frames by string key ("drifter/walk_03"); the host loads whatever it
//! wants behind [`AssetProvider`] and hands back opaque handles. Frame keys
//! are resolved once, at spawn, so a missing asset fails the spawn loudly
//! instead of flickering at draw time.
//!
//! [`AssetManifest`] is the explicit registration list: each species
//! contributes every key it can ever display, the host loads that set up
//! front. No directory scanning, no reflection.

use std::collections::{BTreeSet, HashMap};

/// Opaque handle to a host-loaded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub u64);

/// Host-side image store the factory resolves frame keys against
pub trait AssetProvider {
    /// Handle for a previously loaded key, or None if it was never loaded.
    fn image(&self, key: &str) -> Option<ImageHandle>;
}

/// The full set of asset keys a run can display, collected from profiles
#[derive(Debug, Clone, Default)]
pub struct AssetManifest {
    keys: BTreeSet<String>,
}

impl AssetManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>) {
        self.keys.insert(key.into());
    }

    pub fn extend<I: IntoIterator<Item = String>>(&mut self, keys: I) {
        self.keys.extend(keys);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Map-backed provider, also the workhorse for tests
#[derive(Debug, Default)]
pub struct StaticAssets {
    images: HashMap<String, ImageHandle>,
    next_id: u64,
}

impl StaticAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one key, assigning the next sequential handle.
    pub fn insert(&mut self, key: impl Into<String>) -> ImageHandle {
        let handle = ImageHandle(self.next_id);
        self.next_id += 1;
        self.images.insert(key.into(), handle);
        handle
    }

    /// Provider with every key in the manifest already registered.
    pub fn preloaded(manifest: &AssetManifest) -> Self {
        let mut assets = Self::new();
        for key in manifest.iter() {
            assets.insert(key);
        }
        assets
    }
}

impl AssetProvider for StaticAssets {
    fn image(&self, key: &str) -> Option<ImageHandle> {
        self.images.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_assets_lookup() {
        let mut assets = StaticAssets::new();
        let a = assets.insert("drifter/idle_00");
        assert_eq!(assets.image("drifter/idle_00"), Some(a));
        assert_eq!(assets.image("drifter/idle_99"), None);
    }

    #[test]
    fn test_manifest_dedupes() {
        let mut manifest = AssetManifest::new();
        manifest.add("coin/spin_00");
        manifest.add("coin/spin_00");
        manifest.add("coin/spin_01");
        assert_eq!(manifest.len(), 2);
    }

    #[test]
    fn test_preloaded_covers_manifest() {
        let mut manifest = AssetManifest::new();
        manifest.add("a");
        manifest.add("b");
        let assets = StaticAssets::preloaded(&manifest);
        assert!(assets.image("a").is_some());
        assert!(assets.image("b").is_some());
    }
}
