//! In-memory cache of resolved analyzer configurations.
//!
//! Each extension gets its own `OnceCell`, so concurrent lookups of the same
//! extension load the descriptor exactly once while lookups of different
//! extensions never wait on each other. Failed loads leave the cell empty.

use super::{AnalyzerConfig, RegistryError};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

type Slot = Arc<OnceCell<Arc<AnalyzerConfig>>>;

/// Compute-once-per-extension cache.
#[derive(Default)]
pub struct AnalyzerCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl AnalyzerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached configuration without loading anything.
    pub fn get(&self, extension: &str) -> Option<Arc<AnalyzerConfig>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(extension).and_then(|slot| slot.get().cloned())
    }

    /// Get the configuration for an extension, running `load` if it has not
    /// been loaded yet.
    pub fn get_or_try_load<F>(
        &self,
        extension: &str,
        load: F,
    ) -> Result<Arc<AnalyzerConfig>, RegistryError>
    where
        F: FnOnce() -> Result<AnalyzerConfig, RegistryError>,
    {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(extension.to_string()).or_default())
        };

        // The map lock is released here; only callers for this extension
        // block on the cell.
        slot.get_or_try_init(|| load().map(Arc::new)).cloned()
    }

    /// Extensions with a loaded configuration, sorted.
    pub fn keys(&self) -> Vec<String> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = slots
            .iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Number of loaded configurations.
    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
