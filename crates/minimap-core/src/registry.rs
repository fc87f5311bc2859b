//! View-to-engine registry.

use crate::engine::MinimapEngine;
use crate::host::ViewId;
use std::collections::{BTreeMap, btree_map};

/// One [`MinimapEngine`] per open view.
#[derive(Debug, Default)]
pub struct MinimapRegistry {
    engines: BTreeMap<ViewId, MinimapEngine>,
}

impl MinimapRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine for `view`, creating a detached one if needed.
    pub fn entry(&mut self, view: ViewId) -> &mut MinimapEngine {
        self.engines.entry(view).or_default()
    }

    /// Engine for `view`.
    pub fn get(&self, view: ViewId) -> Option<&MinimapEngine> {
        self.engines.get(&view)
    }

    /// Mutable engine for `view`.
    pub fn get_mut(&mut self, view: ViewId) -> Option<&mut MinimapEngine> {
        self.engines.get_mut(&view)
    }

    /// Remove and return the engine for `view`.
    pub fn remove(&mut self, view: ViewId) -> Option<MinimapEngine> {
        self.engines.remove(&view)
    }

    /// Ids of every registered view.
    pub fn view_ids(&self) -> Vec<ViewId> {
        self.engines.keys().copied().collect()
    }

    /// Number of registered engines.
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// Whether no engine is registered.
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Remove every engine, returning them for cleanup.
    pub fn drain(&mut self) -> btree_map::IntoIter<ViewId, MinimapEngine> {
        std::mem::take(&mut self.engines).into_iter()
    }
}
