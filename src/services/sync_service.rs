// ============================================================================
// SYNC ENGINE - Reproduce la queue pendiente contra la API remota
// ============================================================================
// Replay FIFO secuencial, una llamada acotada por intento, throttle fijo
// entre acciones, sin fail-fast. Single-flight: un segundo llamador se
// rechaza mientras hay una pasada en curso.
// ============================================================================

use std::cell::Cell;
use std::rc::Rc;

use crate::config::SyncConfig;
use crate::error::{ApiError, Result};
use crate::models::{
    ActionId, Item, ItemId, Mutation, PendingAction, SyncOutcome, SyncProgress, SyncReport,
};
use crate::services::api_client::ItemApi;
use crate::services::clock::{with_timeout, Clock};
use crate::services::local_store::LocalStore;
use crate::services::mutation_queue::MutationQueue;
use crate::state::SyncStateWrapper;

/// Lo que el servidor confirmó para una acción reproducida
enum Confirmed {
    Created(Item),
    Updated(Item),
    Deleted(ItemId),
}

struct InFlight<'a>(&'a Cell<bool>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct SyncEngine {
    store: Rc<LocalStore>,
    queue: Rc<MutationQueue>,
    api: Rc<dyn ItemApi>,
    clock: Rc<dyn Clock>,
    config: SyncConfig,
    state: SyncStateWrapper,
    in_flight: Cell<bool>,
}

impl SyncEngine {
    pub fn new(
        store: Rc<LocalStore>,
        queue: Rc<MutationQueue>,
        api: Rc<dyn ItemApi>,
        clock: Rc<dyn Clock>,
        config: SyncConfig,
        state: SyncStateWrapper,
    ) -> Self {
        Self {
            store,
            queue,
            api,
            clock,
            config,
            state,
            in_flight: Cell::new(false),
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.in_flight.get()
    }

    pub fn state(&self) -> &SyncStateWrapper {
        &self.state
    }

    /// Vacía la queue una vez. Los fallos de storage abortan la pasada; los
    /// remotos se cuentan por acción y la acción queda en queue.
    pub async fn sync_all(&self) -> Result<SyncOutcome> {
        if self.in_flight.replace(true) {
            log::info!("🔄 Sincronización ya en curso, se omite");
            return Ok(SyncOutcome::Skipped);
        }
        let _in_flight = InFlight(&self.in_flight);

        match self.run_pass().await {
            Ok(report) => Ok(SyncOutcome::Completed(report)),
            Err(e) => {
                log::error!("❌ Sincronización abortada: {}", e);
                self.state.fail_sync(e.to_string());
                Err(e)
            }
        }
    }

    async fn run_pass(&self) -> Result<SyncReport> {
        let action_ids: Vec<ActionId> = self
            .queue
            .list_pending()?
            .into_iter()
            .map(|action| action.id)
            .collect();
        let total = action_ids.len();
        let mut report = SyncReport::default();

        if total == 0 {
            log::info!("📭 Sin cambios pendientes");
            self.state.finish_sync(&report, 0);
            return Ok(report);
        }

        log::info!("🔄 Iniciando sincronización: {} cambios pendientes", total);
        self.state.begin_sync(total, self.clock.now());

        for (index, action_id) in action_ids.iter().enumerate() {
            if index > 0 {
                self.clock.sleep(self.config.throttle()).await;
            }

            // Releer: un éxito previo pudo remapear el target, y un delete local
            // pudo quitar la acción mientras tanto
            match self.queue.get(action_id)? {
                Some(action) => match self.replay(&action).await {
                    Ok(confirmed) => {
                        self.confirm(&action, confirmed)?;
                        report.synced += 1;
                    }
                    Err(e) => {
                        log::warn!("⚠️ Falló {} {}: {}", action.kind(), action.target, e);
                        report.failed += 1;
                        report
                            .errors
                            .push(format!("{} {}: {}", action.kind(), action.target, e));
                    }
                },
                None => log::debug!("La acción {} salió de la queue antes del replay", action_id),
            }

            self.state.set_progress(SyncProgress {
                processed: index + 1,
                total,
            });
        }

        self.refresh_snapshot(&mut report).await?;

        let remaining = self.queue.len()?;
        if report.is_success() {
            log::info!("✅ Sincronización exitosa: {} cambios aplicados", report.synced);
        } else {
            log::error!(
                "❌ Sincronización con errores: {} sincronizados, {} fallidos",
                report.synced,
                report.failed
            );
        }
        self.state.finish_sync(&report, remaining);

        Ok(report)
    }

    /// Llamada remota de una acción, reintentada hasta los intentos configurados
    async fn replay(&self, action: &PendingAction) -> std::result::Result<Confirmed, ApiError> {
        let server_id = action.target.server_id();
        if server_id.is_none() && !matches!(action.mutation, Mutation::Create { .. }) {
            return Err(ApiError::Rejected(format!(
                "target {} not yet synced",
                action.target
            )));
        }

        let attempts = self.config.attempts_per_action();
        let mut attempt = 1;
        loop {
            match self.call(action, server_id).await {
                Ok(confirmed) => return Ok(confirmed),
                Err(e) if attempt < attempts => {
                    log::debug!(
                        "Intento {}/{} de {} falló: {}",
                        attempt,
                        attempts,
                        action.id,
                        e
                    );
                    attempt += 1;
                    self.clock.sleep(self.config.throttle()).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn call(
        &self,
        action: &PendingAction,
        server_id: Option<i64>,
    ) -> std::result::Result<Confirmed, ApiError> {
        let clock = self.clock.as_ref();
        let limit = self.config.request_timeout();

        match (&action.mutation, server_id) {
            (Mutation::Create { data }, _) => with_timeout(clock, limit, self.api.create_item(data))
                .await
                .map(Confirmed::Created),
            (Mutation::Update { patch }, Some(id)) => {
                with_timeout(clock, limit, self.api.update_item(id, patch))
                    .await
                    .map(Confirmed::Updated)
            }
            (Mutation::Delete, Some(id)) => with_timeout(clock, limit, self.api.delete_item(id))
                .await
                .map(|()| Confirmed::Deleted(ItemId::Server(id))),
            (_, None) => Err(ApiError::Rejected(format!(
                "target {} not yet synced",
                action.target
            ))),
        }
    }

    /// Quita la acción confirmada y refleja localmente el estado del servidor
    fn confirm(&self, action: &PendingAction, confirmed: Confirmed) -> Result<()> {
        let was_queued = self.queue.remove(&action.id)?;

        match confirmed {
            // Borrado localmente mientras el CREATE estaba en vuelo
            Confirmed::Created(item) if !was_queued => {
                log::warn!("🗑️ {} se borró durante la sincronización, eliminando {} del servidor", action.target, item.id);
                self.queue.enqueue(item.id, Mutation::Delete)?;
            }
            Confirmed::Created(item) => {
                log::info!("✅ {} creado en el servidor como {}", action.target, item.id);
                self.queue.retarget(&action.target, &item.id)?;
                self.store.upsert_item(item)?;
            }
            Confirmed::Updated(item) => self.store.upsert_item(item)?,
            Confirmed::Deleted(id) => {
                self.store.remove_item(&id)?;
            }
        }
        Ok(())
    }

    async fn refresh_snapshot(&self, report: &mut SyncReport) -> Result<()> {
        let listing = with_timeout(
            self.clock.as_ref(),
            self.config.request_timeout(),
            self.api.list_items(),
        )
        .await;

        match listing {
            Ok(items) => {
                self.store.save_snapshot(&items)?;
                self.store.set_last_sync(self.clock.now())?;
                report.snapshot_refreshed = true;
            }
            Err(e) => {
                log::warn!("⚠️ Falló el refresco del snapshot: {}", e);
                report.errors.push(format!("snapshot refresh failed: {}", e));
            }
        }
        Ok(())
    }
}
