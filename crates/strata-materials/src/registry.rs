//! Flat key → node table shared by builders and the library loader.

use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use rustc_hash::FxHashMap;

use crate::node::MaterialNode;

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Append-only, first-write-wins map from bare material key to node.
///
/// Builders and the [`Library`](crate::Library) take a registry by reference;
/// [`Registry::global`] is the process-wide instance for callers that want one.
#[derive(Default)]
pub struct Registry {
    materials: RwLock<FxHashMap<String, Arc<MaterialNode>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Registers `node` under `key` unless the key is taken.
    /// Returns whether the node was inserted.
    pub fn register(&self, key: &str, node: Arc<MaterialNode>) -> bool {
        let mut materials = self.materials.write().unwrap_or_else(PoisonError::into_inner);
        if materials.contains_key(key) {
            return false;
        }
        materials.insert(key.to_string(), node);
        true
    }

    pub fn get(&self, key: &str) -> Option<Arc<MaterialNode>> {
        self.materials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.materials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .materials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Copy of every entry, sorted by key.
    pub fn snapshot(&self) -> Vec<(String, Arc<MaterialNode>)> {
        let mut entries: Vec<_> = self
            .materials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.materials.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry. Intended for tests.
    pub fn clear(&self) {
        self.materials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
