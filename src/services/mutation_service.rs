// ============================================================================
// MUTATION SERVICE - Enruta intenciones create/update/delete
// ============================================================================
// Llamada remota directa cuando se puede; si no (o ante cualquier fallo) la
// intención va a la queue pendiente. Los errores remotos nunca llegan al llamador.
// ============================================================================

use std::rc::Rc;

use crate::config::SyncConfig;
use crate::error::Result;
use crate::models::pending_action::generate_local_id;
use crate::models::{ItemData, ItemId, ItemPatch, Mutation, MutationResult, RejectReason};
use crate::services::api_client::ItemApi;
use crate::services::clock::{with_timeout, Clock};
use crate::services::local_store::LocalStore;
use crate::services::mutation_queue::MutationQueue;
use crate::services::network_monitor::NetworkMonitor;
use crate::services::view_merger;

/// El snapshot solo guarda lo confirmado por el servidor; lo optimista se ve
/// en la vista mezclada (snapshot + queue), no se escribe en el snapshot.
pub struct MutationDispatcher {
    store: Rc<LocalStore>,
    queue: Rc<MutationQueue>,
    monitor: Rc<NetworkMonitor>,
    api: Rc<dyn ItemApi>,
    clock: Rc<dyn Clock>,
    config: SyncConfig,
}

impl MutationDispatcher {
    pub fn new(
        store: Rc<LocalStore>,
        queue: Rc<MutationQueue>,
        monitor: Rc<NetworkMonitor>,
        api: Rc<dyn ItemApi>,
        clock: Rc<dyn Clock>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            queue,
            monitor,
            api,
            clock,
            config,
        }
    }

    pub async fn create(&self, data: ItemData) -> Result<MutationResult> {
        if let Some(problem) = data.validate() {
            return Ok(MutationResult::Rejected(RejectReason::Invalid(problem)));
        }

        if self.monitor.allows_remote() {
            let call = self.api.create_item(&data);
            match with_timeout(self.clock.as_ref(), self.config.request_timeout(), call).await {
                Ok(item) => {
                    log::info!("✅ Creado {} ({})", item.id, item.data.name);
                    self.store.upsert_item(item.clone())?;
                    return Ok(MutationResult::Applied(Some(item)));
                }
                Err(e) => log::warn!("⚠️ Falló el create, encolando: {}", e),
            }
        }

        let local_id = generate_local_id(self.clock.now());
        let action_id = self.queue.enqueue(local_id, Mutation::Create { data })?;
        Ok(MutationResult::Queued(action_id))
    }

    pub async fn update(&self, target: ItemId, patch: ItemPatch) -> Result<MutationResult> {
        if let Some(problem) = patch.validate() {
            return Ok(MutationResult::Rejected(RejectReason::Invalid(problem)));
        }
        if !self.is_known(&target)? {
            return Ok(MutationResult::Rejected(RejectReason::UnknownTarget(target)));
        }

        if let Some(id) = self.direct_target(&target)? {
            let call = self.api.update_item(id, &patch);
            match with_timeout(self.clock.as_ref(), self.config.request_timeout(), call).await {
                Ok(item) => {
                    log::info!("✅ Actualizado {}", item.id);
                    self.store.upsert_item(item.clone())?;
                    return Ok(MutationResult::Applied(Some(item)));
                }
                Err(e) => log::warn!("⚠️ Falló el update de {}, encolando: {}", target, e),
            }
        }

        let action_id = self.queue.enqueue(target, Mutation::Update { patch })?;
        Ok(MutationResult::Queued(action_id))
    }

    pub async fn delete(&self, target: ItemId) -> Result<MutationResult> {
        if !self.is_known(&target)? {
            return Ok(MutationResult::Rejected(RejectReason::UnknownTarget(target)));
        }

        // Nunca llegó al servidor: se olvida localmente
        if target.is_local() {
            let dropped = self.queue.remove_for_target(&target)?;
            log::info!("🗑️ Descartado {} sin sincronizar ({} acciones en queue)", target, dropped);
            return Ok(MutationResult::Discarded {
                local_id: target,
                dropped,
            });
        }

        if let Some(id) = self.direct_target(&target)? {
            let call = self.api.delete_item(id);
            match with_timeout(self.clock.as_ref(), self.config.request_timeout(), call).await {
                Ok(()) => {
                    log::info!("🗑️ Eliminado {}", target);
                    self.store.remove_item(&target)?;
                    return Ok(MutationResult::Applied(None));
                }
                Err(e) => log::warn!("⚠️ Falló el delete de {}, encolando: {}", target, e),
            }
        }

        let action_id = self.queue.enqueue(target, Mutation::Delete)?;
        Ok(MutationResult::Queued(action_id))
    }

    /// Si `target` aparece en la vista mezclada
    fn is_known(&self, target: &ItemId) -> Result<bool> {
        let snapshot = self.store.load_snapshot()?;
        let pending = self.queue.list_pending()?;
        let view = view_merger::merge(&snapshot, &pending);
        Ok(view_merger::find(&view, target).is_some())
    }

    /// Id de servidor para llamar directo, o `None` si hay que encolar
    fn direct_target(&self, target: &ItemId) -> Result<Option<i64>> {
        if !self.monitor.allows_remote() {
            return Ok(None);
        }
        let Some(id) = target.server_id() else {
            return Ok(None);
        };
        // Adelantarse a acciones encoladas rompería el orden por item
        if self.queue.has_pending_for(target)? {
            log::debug!("{} tiene acciones en queue, se difiere", target);
            return Ok(None);
        }
        Ok(Some(id))
    }
}
