//! Shared context bag attached to an invocation and its clones.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::invocation::Value;

/// User attributes shared by an invocation and every clone made from it.
///
/// Cloning the handle shares the underlying map. Writes from any holder are
/// visible to all of them; the last writer wins.
#[derive(Debug, Clone, Default)]
pub struct UserAttributes {
    inner: Arc<Mutex<HashMap<String, Value>>>,
}

impl UserAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.lock().get(key).cloned()
    }

    /// Insert `value` under `key`, or remove the key when `value` is `None`.
    pub fn set(&self, key: impl Into<String>, value: Option<Value>) {
        let key = key.into();
        let mut map = self.inner.lock();
        match value {
            Some(value) => {
                map.insert(key, value);
            }
            None => {
                map.remove(&key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether two handles refer to the same bag.
    pub fn shares_with(&self, other: &UserAttributes) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
