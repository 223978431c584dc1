//! Plugin output store: one keyed slot per plugin
use crate::plugin::PluginResult;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared `plugins` map of a computation.
///
/// Only the dispatcher (one write per plugin, into that plugin's slot) and
/// the color remap pass write here. The lock is never held across an await.
#[derive(Debug, Clone, Default)]
pub struct PluginOutputs {
    slots: Arc<Mutex<BTreeMap<String, PluginResult>>>,
}

impl PluginOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, PluginResult>> {
        // a poisoned slot map still holds complete entries
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, name: impl Into<String>, result: PluginResult) {
        self.lock().insert(name.into(), result);
    }

    pub fn get(&self, name: &str) -> Option<PluginResult> {
        self.lock().get(name).cloned()
    }

    /// Successful value of `name`, if any
    pub fn value(&self, name: &str) -> Option<Value> {
        self.get(name).and_then(Result::ok)
    }

    /// Mutate the successful value of `name` in place. Returns whether a value was found.
    pub fn update_value<F>(&self, name: &str, f: F) -> bool
    where
        F: FnOnce(&mut Value),
    {
        match self.lock().get_mut(name) {
            Some(Ok(value)) => {
                f(value);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of every slot
    pub fn snapshot(&self) -> BTreeMap<String, PluginResult> {
        self.lock().clone()
    }
}
