// ============================================================================
// LOCAL STORE - Snapshot + queue pendiente persistidos en storage clave-valor
// ============================================================================
// Único escritor del snapshot de items y de la queue de acciones pendientes.
// ============================================================================

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::rc::Rc;

use crate::config::SyncConfig;
use crate::error::StorageError;
use crate::models::{Item, ItemId, PendingAction};
use crate::services::storage::KeyValueStorage;

const SNAPSHOT_KEY: &str = "items_snapshot";
const QUEUE_KEY: &str = "pending_actions";
const LAST_SYNC_KEY: &str = "last_sync";

pub struct LocalStore {
    storage: Rc<dyn KeyValueStorage>,
    snapshot_key: String,
    queue_key: String,
    last_sync_key: String,
}

impl LocalStore {
    pub fn new(storage: Rc<dyn KeyValueStorage>, config: &SyncConfig) -> Self {
        Self {
            storage,
            snapshot_key: config.storage_key(SNAPSHOT_KEY),
            queue_key: config.storage_key(QUEUE_KEY),
            last_sync_key: config.storage_key(LAST_SYNC_KEY),
        }
    }

    fn load_json<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, StorageError> {
        match self.storage.get(key)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(T::default()),
        }
    }

    fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)?;
        self.storage.set(key, &json)
    }

    // ==========================================
    // SNAPSHOT
    // ==========================================

    pub fn load_snapshot(&self) -> Result<Vec<Item>, StorageError> {
        self.load_json(&self.snapshot_key)
    }

    pub fn save_snapshot(&self, items: &[Item]) -> Result<(), StorageError> {
        self.save_json(&self.snapshot_key, items)?;
        log::debug!("💾 Snapshot guardado: {} items", items.len());
        Ok(())
    }

    /// Reemplaza la entrada con el mismo id, o la agrega al final
    pub fn upsert_item(&self, item: Item) -> Result<(), StorageError> {
        let mut items = self.load_snapshot()?;
        match items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }
        self.save_snapshot(&items)
    }

    /// Devuelve si se eliminó alguna entrada
    pub fn remove_item(&self, id: &ItemId) -> Result<bool, StorageError> {
        let mut items = self.load_snapshot()?;
        let before = items.len();
        items.retain(|item| &item.id != id);
        if items.len() == before {
            return Ok(false);
        }
        self.save_snapshot(&items)?;
        Ok(true)
    }

    // ==========================================
    // QUEUE PENDIENTE
    // ==========================================

    pub fn load_queue(&self) -> Result<Vec<PendingAction>, StorageError> {
        self.load_json(&self.queue_key)
    }

    pub fn save_queue(&self, actions: &[PendingAction]) -> Result<(), StorageError> {
        self.save_json(&self.queue_key, actions)?;
        log::debug!("💾 Queue guardada: {} acciones pendientes", actions.len());
        Ok(())
    }

    // ==========================================
    // ÚLTIMA SINCRONIZACIÓN
    // ==========================================

    pub fn last_sync(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        match self.storage.get(&self.last_sync_key)? {
            Some(raw) => DateTime::parse_from_rfc3339(&raw)
                .map(|ts| Some(ts.with_timezone(&Utc)))
                .map_err(|e| StorageError::Backend(format!("bad last-sync timestamp '{}': {}", raw, e))),
            None => Ok(None),
        }
    }

    pub fn set_last_sync(&self, at: DateTime<Utc>) -> Result<(), StorageError> {
        self.storage.set(&self.last_sync_key, &at.to_rfc3339())
    }

    /// Borra snapshot, queue y marca de última sincronización
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(&self.snapshot_key)?;
        self.storage.remove(&self.queue_key)?;
        self.storage.remove(&self.last_sync_key)?;
        log::info!("🗑️ Local store limpiado");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemData;
    use crate::services::storage::MemoryStorage;
    use chrono::TimeZone;

    fn store() -> (Rc<MemoryStorage>, LocalStore) {
        let storage = Rc::new(MemoryStorage::new());
        let store = LocalStore::new(storage.clone(), &SyncConfig::default());
        (storage, store)
    }

    #[test]
    fn missing_keys_read_as_empty() {
        let (_, store) = store();
        assert!(store.load_snapshot().unwrap().is_empty());
        assert!(store.load_queue().unwrap().is_empty());
        assert_eq!(store.last_sync().unwrap(), None);
    }

    #[test]
    fn snapshot_is_a_json_array_under_the_prefixed_key() {
        let (storage, store) = store();
        store
            .save_snapshot(&[Item::new(1, ItemData::new("Flour", 5.0, "kg"))])
            .unwrap();

        let raw = storage.get("stock_items_snapshot").unwrap().unwrap();
        assert!(raw.starts_with("[{"));
        assert_eq!(store.load_snapshot().unwrap().len(), 1);
    }

    #[test]
    fn upsert_replaces_and_remove_reports() {
        let (_, store) = store();
        store.upsert_item(Item::new(1, ItemData::new("Flour", 5.0, "kg"))).unwrap();
        store.upsert_item(Item::new(1, ItemData::new("Flour", 8.0, "kg"))).unwrap();

        let items = store.load_snapshot().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].data.quantity, 8.0);

        assert!(store.remove_item(&ItemId::Server(1)).unwrap());
        assert!(!store.remove_item(&ItemId::Server(1)).unwrap());
    }

    #[test]
    fn corrupt_queue_is_a_storage_error() {
        let (storage, store) = store();
        storage.set("stock_pending_actions", "not json").unwrap();
        assert!(matches!(
            store.load_queue(),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn last_sync_round_trips() {
        let (_, store) = store();
        let at = Utc.timestamp_millis_opt(1_700_000_123_000).unwrap();
        store.set_last_sync(at).unwrap();
        assert_eq!(store.last_sync().unwrap(), Some(at));

        store.clear().unwrap();
        assert_eq!(store.last_sync().unwrap(), None);
    }
}
