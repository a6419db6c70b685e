use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One mutex per store key, created on first use.
///
/// Holders of different keys never contend; holders of the same key run one
/// after the other.
#[derive(Debug, Default)]
pub struct KeyLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    /// Runs `f` while holding the lock for `key`.
    pub fn with_key<T>(&self, key: &str, f: impl FnOnce() -> T) -> T {
        let slot = {
            let mut map = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(map.entry(key.to_string()).or_default())
        };
        let _guard = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f()
    }
}
