// ============================================================================
// KEY-VALUE STORAGE - Backends detrás del local store
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::error::StorageError;

/// Persistencia síncrona clave-valor de strings (semántica de localStorage)
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    fn clear(&self) -> Result<(), StorageError>;
}

/// Backend en memoria para hosts nativos y tests.
///
/// Una cuota opcional en bytes imita los errores de cuota del navegador.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
    quota_bytes: Cell<Option<usize>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        let storage = Self::default();
        storage.quota_bytes.set(Some(quota_bytes));
        storage
    }

    pub fn set_quota(&self, quota_bytes: Option<usize>) {
        self.quota_bytes.set(quota_bytes);
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota_bytes.get() {
            if self.used_bytes_without(key) + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.entries.borrow_mut().clear();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserStorage;

#[cfg(target_arch = "wasm32")]
mod browser {
    use web_sys::{window, Storage};

    use super::KeyValueStorage;
    use crate::error::StorageError;

    /// `window.localStorage`
    #[derive(Debug, Clone, Copy, Default)]
    pub struct BrowserStorage;

    impl BrowserStorage {
        fn storage(&self) -> Result<Storage, StorageError> {
            window()
                .and_then(|w| w.local_storage().ok())
                .flatten()
                .ok_or_else(|| StorageError::Unavailable("localStorage is not accessible".to_string()))
        }
    }

    impl KeyValueStorage for BrowserStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.storage()?
                .get_item(key)
                .map_err(|e| StorageError::Backend(format!("reading '{}': {:?}", key, e)))
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            // En la práctica setItem solo falla con QuotaExceededError
            self.storage()?.set_item(key, value).map_err(|e| {
                log::error!("❌ Error escribiendo {} en localStorage: {:?}", key, e);
                StorageError::QuotaExceeded {
                    key: key.to_string(),
                }
            })
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.storage()?
                .remove_item(key)
                .map_err(|e| StorageError::Backend(format!("removing '{}': {:?}", key, e)))
        }

        fn clear(&self) -> Result<(), StorageError> {
            self.storage()?
                .clear()
                .map_err(|e| StorageError::Backend(format!("clearing: {:?}", e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_round_trips_and_removes() {
        let storage = MemoryStorage::new();
        storage.set("a", "1").unwrap();
        assert_eq!(storage.get("a").unwrap().as_deref(), Some("1"));

        storage.remove("a").unwrap();
        assert_eq!(storage.get("a").unwrap(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn quota_counts_replacement_not_old_value() {
        let storage = MemoryStorage::with_quota(10);
        storage.set("k", "12345678").unwrap();
        // Sobrescribir la misma clave no cuenta doble
        storage.set("k", "87654321").unwrap();

        let err = storage.set("other", "xxxxxx").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { key } if key == "other"));
    }
}
