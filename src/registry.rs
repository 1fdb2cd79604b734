//! Keyed store of shared resources with generated opaque handles.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

const KEY_MASK: u64 = 0x9e37_79b9_7f4a_7c15;
const KEY_ROTATION: u32 = 23;

/// Thread-safe map from opaque `u64` keys to shared resources.
///
/// Keys come from a counter seeded with the clock and scrambled by a fixed
/// rotation and XOR, so handles are never small sequential numbers. Zero is
/// never issued.
#[derive(Debug)]
pub struct HandleRegistry<T> {
    entries: RwLock<HashMap<u64, Arc<T>>>,
    counter: AtomicU64,
}

impl<T> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandleRegistry<T> {
    /// Empty registry
    pub fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(1);
        Self {
            entries: RwLock::new(HashMap::new()),
            counter: AtomicU64::new(seed),
        }
    }

    fn next_key(&self) -> u64 {
        let raw = self.counter.fetch_add(1, Ordering::Relaxed);
        raw.rotate_left(KEY_ROTATION) ^ KEY_MASK
    }

    /// Store `value` and return its key
    pub fn insert(&self, value: T) -> u64 {
        let value = Arc::new(value);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        loop {
            let key = self.next_key();
            if key == 0 || entries.contains_key(&key) {
                continue;
            }
            entries.insert(key, value);
            return key;
        }
    }

    /// Shared reference to the value under `key`
    pub fn get(&self, key: u64) -> Option<Arc<T>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&key).cloned()
    }

    /// Drop the registry's reference; returns false for unknown keys.
    ///
    /// Callers still holding an `Arc` from [`Self::get`] keep the value alive.
    pub fn remove(&self, key: u64) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(&key).is_some()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_insert_get_remove() {
        let registry = HandleRegistry::new();
        let a = registry.insert("a".to_string());
        let b = registry.insert("b".to_string());
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(a).as_deref().map(String::as_str), Some("a"));

        assert!(registry.remove(a));
        assert!(!registry.remove(a));
        assert!(registry.get(a).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_keys_are_not_sequential() {
        let registry = HandleRegistry::new();
        let a = registry.insert(1u8);
        let b = registry.insert(2u8);
        assert_ne!(a, 0);
        assert_ne!(b.wrapping_sub(a), 1);
    }

    #[test]
    fn test_zero_is_never_issued() {
        // Seed the counter so the first raw value maps to key zero
        let registry: HandleRegistry<u8> = HandleRegistry::new();
        registry
            .counter
            .store(KEY_MASK.rotate_right(KEY_ROTATION), Ordering::Relaxed);
        let key = registry.insert(0);
        assert_ne!(key, 0);
    }

    #[test]
    fn test_concurrent_inserts_unique() {
        let registry = Arc::new(HandleRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || (0..100).map(|i| registry.insert(t * 100 + i)).collect::<Vec<_>>())
            })
            .collect();
        let mut keys = HashSet::new();
        for h in handles {
            for key in h.join().unwrap() {
                assert!(keys.insert(key));
            }
        }
        assert_eq!(registry.len(), 800);
    }

    #[test]
    fn test_removed_value_outlives_registry_entry() {
        let registry = HandleRegistry::new();
        let key = registry.insert(vec![1, 2, 3]);
        let held = registry.get(key).unwrap();
        registry.remove(key);
        assert_eq!(*held, vec![1, 2, 3]);
    }
}
