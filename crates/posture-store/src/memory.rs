//! In-process snapshot medium.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use posture_core::error::PersistenceError;
use posture_core::traits::SnapshotMedium;

/// Keeps snapshots in memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    values: Mutex<HashMap<String, String>>,
    /// Maximum total bytes across all stored values.
    quota: Option<usize>,
    unavailable: AtomicBool,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse writes that would push the stored total past `bytes`.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Simulate the medium disappearing (or coming back).
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::Relaxed);
    }

    /// Total bytes currently stored.
    pub fn used_bytes(&self) -> usize {
        self.lock()
            .map(|values| values.values().map(String::len).sum())
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, PersistenceError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(PersistenceError::Unavailable("memory medium switched off".into()));
        }
        self.values
            .lock()
            .map_err(|_| PersistenceError::Unavailable("memory medium lock poisoned".into()))
    }
}

impl SnapshotMedium for MemoryMedium {
    fn name(&self) -> &str {
        "memory"
    }

    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut values = self.lock()?;
        if let Some(limit) = self.quota {
            let others: usize = values
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let needed = others + value.len();
            if needed > limit {
                return Err(PersistenceError::QuotaExceeded { needed, limit });
            }
        }
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
