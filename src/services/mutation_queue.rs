// ============================================================================
// MUTATION QUEUE - Log FIFO append-only de acciones pendientes
// ============================================================================

use std::rc::Rc;

use crate::error::StorageError;
use crate::models::{ActionId, ItemId, Mutation, PendingAction};
use crate::services::clock::Clock;
use crate::services::local_store::LocalStore;

/// El orden de creación es el orden de replay y de merge; nada se reordena.
pub struct MutationQueue {
    store: Rc<LocalStore>,
    clock: Rc<dyn Clock>,
}

impl MutationQueue {
    pub fn new(store: Rc<LocalStore>, clock: Rc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Agrega al final
    pub fn enqueue(&self, target: ItemId, mutation: Mutation) -> Result<ActionId, StorageError> {
        let action = PendingAction::new(target, mutation, self.clock.now());
        let id = action.id.clone();

        let mut actions = self.store.load_queue()?;
        log::info!(
            "📝 {} encolado para {} ({} pendientes)",
            action.kind(),
            action.target,
            actions.len() + 1
        );
        actions.push(action);
        self.store.save_queue(&actions)?;

        Ok(id)
    }

    pub fn list_pending(&self) -> Result<Vec<PendingAction>, StorageError> {
        self.store.load_queue()
    }

    pub fn get(&self, id: &ActionId) -> Result<Option<PendingAction>, StorageError> {
        Ok(self
            .store
            .load_queue()?
            .into_iter()
            .find(|action| &action.id == id))
    }

    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.store.load_queue()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    pub fn has_pending_for(&self, target: &ItemId) -> Result<bool, StorageError> {
        Ok(self
            .store
            .load_queue()?
            .iter()
            .any(|action| &action.target == target))
    }

    /// Elimina una acción por id. Un id ausente no hace nada.
    pub fn remove(&self, id: &ActionId) -> Result<bool, StorageError> {
        let mut actions = self.store.load_queue()?;
        let Some(position) = actions.iter().position(|action| &action.id == id) else {
            return Ok(false);
        };
        actions.remove(position);
        self.store.save_queue(&actions)?;
        Ok(true)
    }

    /// Quita todas las acciones sobre `target`; devuelve cuántas
    pub fn remove_for_target(&self, target: &ItemId) -> Result<usize, StorageError> {
        let mut actions = self.store.load_queue()?;
        let before = actions.len();
        actions.retain(|action| &action.target != target);
        let dropped = before - actions.len();
        if dropped > 0 {
            self.store.save_queue(&actions)?;
        }
        Ok(dropped)
    }

    /// Redirige las acciones de un id local al id de servidor que obtuvo
    pub fn retarget(&self, local: &ItemId, server: &ItemId) -> Result<usize, StorageError> {
        let mut actions = self.store.load_queue()?;
        let mut changed = 0;
        for action in actions.iter_mut().filter(|action| &action.target == local) {
            action.target = server.clone();
            changed += 1;
        }
        if changed > 0 {
            self.store.save_queue(&actions)?;
            log::info!("🔁 {} acciones en queue movidas de {} a {}", changed, local, server);
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::models::{ItemData, ItemPatch};
    use crate::services::clock::ManualClock;
    use crate::services::storage::MemoryStorage;
    use proptest::prelude::*;

    fn queue_with(storage: Rc<MemoryStorage>) -> MutationQueue {
        let store = Rc::new(LocalStore::new(storage, &SyncConfig::default()));
        MutationQueue::new(store, Rc::new(ManualClock::new()))
    }

    fn queue() -> MutationQueue {
        queue_with(Rc::new(MemoryStorage::new()))
    }

    fn update(quantity: f64) -> Mutation {
        Mutation::Update {
            patch: ItemPatch::quantity(quantity),
        }
    }

    #[test]
    fn remove_is_idempotent() {
        let queue = queue();
        let id = queue.enqueue(ItemId::Server(1), Mutation::Delete).unwrap();

        assert!(queue.remove(&id).unwrap());
        assert!(!queue.remove(&id).unwrap());
        assert!(queue.is_empty().unwrap());
    }

    #[test]
    fn remove_deletes_exactly_one_action() {
        let queue = queue();
        let first = queue.enqueue(ItemId::Server(1), update(1.0)).unwrap();
        let second = queue.enqueue(ItemId::Server(1), update(2.0)).unwrap();

        queue.remove(&first).unwrap();

        let pending = queue.list_pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second);
    }

    #[test]
    fn retarget_rewrites_only_matching_actions() {
        let queue = queue();
        let local = ItemId::Local("local_1_aa".into());
        queue
            .enqueue(
                local.clone(),
                Mutation::Create {
                    data: ItemData::new("Salt", 1.0, "kg"),
                },
            )
            .unwrap();
        queue.enqueue(local.clone(), update(4.0)).unwrap();
        queue.enqueue(ItemId::Server(9), Mutation::Delete).unwrap();

        assert_eq!(queue.retarget(&local, &ItemId::Server(42)).unwrap(), 2);
        assert!(!queue.has_pending_for(&local).unwrap());
        assert!(queue.has_pending_for(&ItemId::Server(42)).unwrap());
        assert!(queue.has_pending_for(&ItemId::Server(9)).unwrap());
    }

    #[test]
    fn remove_for_target_drops_all_actions_of_an_item() {
        let queue = queue();
        let local = ItemId::Local("local_1_bb".into());
        queue.enqueue(local.clone(), update(1.0)).unwrap();
        queue.enqueue(local.clone(), update(2.0)).unwrap();
        queue.enqueue(ItemId::Server(3), update(3.0)).unwrap();

        assert_eq!(queue.remove_for_target(&local).unwrap(), 2);
        assert_eq!(queue.len().unwrap(), 1);
    }

    #[test]
    fn enqueue_surfaces_quota_errors() {
        let queue = queue_with(Rc::new(MemoryStorage::with_quota(16)));
        let err = queue.enqueue(ItemId::Server(1), Mutation::Delete).unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
    }

    proptest! {
        #[test]
        fn list_pending_preserves_enqueue_order(targets in proptest::collection::vec(0i64..50, 0..40)) {
            let queue = queue();
            let mut expected = Vec::new();
            for (n, target) in targets.iter().enumerate() {
                let mutation = match n % 3 {
                    0 => Mutation::Delete,
                    1 => update(n as f64),
                    _ => Mutation::Create { data: ItemData::new("Item", n as f64, "pcs") },
                };
                expected.push(queue.enqueue(ItemId::Server(*target), mutation).unwrap());
            }

            let listed: Vec<ActionId> = queue.list_pending().unwrap().into_iter().map(|a| a.id).collect();
            prop_assert_eq!(listed, expected);
        }
    }
}
