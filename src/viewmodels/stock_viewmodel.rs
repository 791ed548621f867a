// ============================================================================
// STOCK VIEWMODEL - Fachada que usa la UI
// ============================================================================
// Dueño de store, queue, monitor, dispatcher y engine. La UI lee la vista
// mezclada y el banner, y reenvía intenciones del usuario y señales de red.
// ============================================================================

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Utc};

use crate::config::SyncConfig;
use crate::error::Result;
use crate::models::{ItemData, ItemId, ItemPatch, MutationResult, SyncOutcome, SyncProgress, SyncState};
use crate::services::api_client::{ConnectivityProbe, ItemApi};
use crate::services::clock::{with_timeout, Clock};
use crate::services::local_store::LocalStore;
use crate::services::mutation_queue::MutationQueue;
use crate::services::mutation_service::MutationDispatcher;
use crate::services::network_monitor::{ConnectivitySignal, NetworkMonitor, NetworkStatus, Transition};
use crate::services::storage::KeyValueStorage;
use crate::services::sync_service::SyncEngine;
use crate::services::view_merger::{self, MergedItem};
use crate::state::SyncStateWrapper;

pub struct StockViewModel {
    store: Rc<LocalStore>,
    queue: Rc<MutationQueue>,
    monitor: Rc<NetworkMonitor>,
    dispatcher: MutationDispatcher,
    engine: SyncEngine,
    api: Rc<dyn ItemApi>,
    probe: Rc<dyn ConnectivityProbe>,
    clock: Rc<dyn Clock>,
    config: SyncConfig,
    probe_loop_running: Cell<bool>,
    // Se incrementa en cada transición online/offline
    transitions: Cell<u64>,
}

impl StockViewModel {
    pub fn new(
        storage: Rc<dyn KeyValueStorage>,
        api: Rc<dyn ItemApi>,
        probe: Rc<dyn ConnectivityProbe>,
        clock: Rc<dyn Clock>,
        config: SyncConfig,
        initial_status: NetworkStatus,
    ) -> Self {
        let store = Rc::new(LocalStore::new(storage, &config));
        let queue = Rc::new(MutationQueue::new(store.clone(), clock.clone()));

        // El estado inicial pasa por la máquina de estados: arrancar offline
        // muestra el prompt igual que perder la conexión
        let monitor = Rc::new(NetworkMonitor::default());
        match initial_status {
            NetworkStatus::Online => {
                monitor.apply(ConnectivitySignal::BrowserOnline);
            }
            NetworkStatus::Offline => {
                monitor.apply(ConnectivitySignal::BrowserOffline);
            }
            NetworkStatus::Unknown => {}
        }

        let dispatcher = MutationDispatcher::new(
            store.clone(),
            queue.clone(),
            monitor.clone(),
            api.clone(),
            clock.clone(),
            config.clone(),
        );
        let engine = SyncEngine::new(
            store.clone(),
            queue.clone(),
            api.clone(),
            clock.clone(),
            config.clone(),
            SyncStateWrapper::new(),
        );

        let view_model = Self {
            store,
            queue,
            monitor,
            dispatcher,
            engine,
            api,
            probe,
            clock,
            config,
            probe_loop_running: Cell::new(false),
            transitions: Cell::new(0),
        };
        if let Err(e) = view_model.refresh_banner() {
            log::error!("❌ No se pudo leer la queue pendiente: {}", e);
        }
        view_model
    }

    // ========================================================================
    // DATOS
    // ========================================================================

    /// Snapshot con las acciones pendientes aplicadas
    pub fn items(&self) -> Result<Vec<MergedItem>> {
        let snapshot = self.store.load_snapshot()?;
        let pending = self.queue.list_pending()?;
        Ok(view_merger::merge(&snapshot, &pending))
    }

    pub fn pending_count(&self) -> Result<usize> {
        Ok(self.queue.len()?)
    }

    /// Reemplaza el snapshot con el listado del servidor. Devuelve si lo hizo.
    pub async fn refresh(&self) -> Result<bool> {
        if !self.monitor.allows_remote() {
            return Ok(false);
        }
        let listing = with_timeout(
            self.clock.as_ref(),
            self.config.request_timeout(),
            self.api.list_items(),
        )
        .await;

        match listing {
            Ok(items) => {
                log::info!("📥 Snapshot actualizado ({} items)", items.len());
                self.store.save_snapshot(&items)?;
                self.store.set_last_sync(self.clock.now())?;
                Ok(true)
            }
            Err(e) => {
                log::warn!("⚠️ Falló el refresco del snapshot: {}", e);
                Ok(false)
            }
        }
    }

    pub async fn create_item(&self, data: ItemData) -> Result<MutationResult> {
        let result = self.dispatcher.create(data).await?;
        self.refresh_banner()?;
        Ok(result)
    }

    pub async fn update_item(&self, target: ItemId, patch: ItemPatch) -> Result<MutationResult> {
        let result = self.dispatcher.update(target, patch).await?;
        self.refresh_banner()?;
        Ok(result)
    }

    pub async fn delete_item(&self, target: ItemId) -> Result<MutationResult> {
        let result = self.dispatcher.delete(target).await?;
        self.refresh_banner()?;
        Ok(result)
    }

    // ========================================================================
    // CONECTIVIDAD
    // ========================================================================

    pub fn monitor(&self) -> &NetworkMonitor {
        &self.monitor
    }

    /// Aplica una señal de red; volver online con trabajo en queue dispara
    /// una sincronización tras el settle delay.
    pub async fn handle_signal(&self, signal: ConnectivitySignal) -> Result<Option<SyncOutcome>> {
        let transition = self.monitor.apply(signal);
        self.refresh_banner()?;

        if transition.is_some() {
            self.transitions.set(self.transitions.get() + 1);
        }
        if transition != Some(Transition::WentOnline) {
            return Ok(None);
        }
        let generation = self.transitions.get();
        if self.monitor.is_offline_mode() || self.queue.is_empty()? {
            return Ok(None);
        }

        log::info!("⏳ Online de nuevo, sincronizando en {:?}", self.config.settle_delay());
        self.clock.sleep(self.config.settle_delay()).await;

        // La sincronización la lanza la transición más reciente
        if self.transitions.get() != generation {
            log::debug!("La conectividad cambió durante el settle delay");
            return Ok(None);
        }
        if !self.monitor.allows_remote() {
            log::info!("📴 Se perdió la conexión antes del auto-sync");
            return Ok(None);
        }
        self.sync_all().await.map(Some)
    }

    /// Un chequeo de conexión, acotado por el timeout del probe
    pub async fn probe_now(&self) -> Result<Option<SyncOutcome>> {
        let result = with_timeout(
            self.clock.as_ref(),
            self.config.probe_timeout(),
            self.probe.probe(),
        )
        .await;

        let signal = match result {
            Ok(()) => ConnectivitySignal::ProbeSucceeded,
            Err(e) => {
                log::debug!("Falló el probe: {}", e);
                ConnectivitySignal::ProbeFailed
            }
        };
        self.handle_signal(signal).await
    }

    /// Probe cada `probe_interval` hasta `stop_probe_loop`
    pub async fn run_probe_loop(&self) {
        if self.probe_loop_running.replace(true) {
            log::warn!("⚠️ El loop de probe ya está corriendo");
            return;
        }
        log::info!("📡 Loop de probe iniciado cada {:?}", self.config.probe_interval());

        while self.probe_loop_running.get() {
            if let Err(e) = self.probe_now().await {
                log::error!("❌ Error procesando el probe: {}", e);
            }
            if !self.probe_loop_running.get() {
                break;
            }
            self.clock.sleep(self.config.probe_interval()).await;
        }
        log::info!("📡 Loop de probe detenido");
    }

    pub fn stop_probe_loop(&self) {
        self.probe_loop_running.set(false);
    }

    pub fn is_probe_loop_running(&self) -> bool {
        self.probe_loop_running.get()
    }

    pub fn offline_prompt_pending(&self) -> bool {
        self.monitor.offline_prompt_pending()
    }

    pub fn confirm_offline_mode(&self) -> Result<bool> {
        let entered = self.monitor.confirm_offline_mode();
        self.refresh_banner()?;
        Ok(entered)
    }

    pub fn dismiss_offline_prompt(&self) {
        self.monitor.dismiss_offline_prompt();
    }

    pub fn exit_offline_mode(&self) -> Result<()> {
        self.monitor.exit_offline_mode();
        self.refresh_banner()
    }

    // ========================================================================
    // SINCRONIZACIÓN
    // ========================================================================

    /// Pedido explícito del usuario: sale del modo offline y vacía la queue
    pub async fn sync_now(&self) -> Result<SyncOutcome> {
        log::info!("🔄 Sincronización manual solicitada");
        self.monitor.exit_offline_mode();
        self.sync_all().await
    }

    async fn sync_all(&self) -> Result<SyncOutcome> {
        let outcome = self.engine.sync_all().await?;
        if !outcome.is_skipped() {
            self.refresh_banner()?;
        }
        Ok(outcome)
    }

    pub fn sync_state(&self) -> SyncState {
        self.engine.state().get_sync_state()
    }

    pub fn progress(&self) -> SyncProgress {
        self.engine.state().get_progress()
    }

    /// Banner y progreso observables para la UI
    pub fn state(&self) -> &SyncStateWrapper {
        self.engine.state()
    }

    pub fn last_sync(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.store.last_sync()?)
    }

    fn refresh_banner(&self) -> Result<()> {
        let pending = self.queue.len()?;
        self.engine
            .state()
            .refresh_pending(pending, self.monitor.allows_remote());
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub mod browser {
    use std::rc::Rc;

    use wasm_bindgen_futures::spawn_local;

    use super::StockViewModel;
    use crate::config::CONFIG;
    use crate::services::api_client::HttpItemApi;
    use crate::services::clock::SystemClock;
    use crate::services::network_monitor::{initial_status, start_monitoring};
    use crate::services::storage::BrowserStorage;

    impl StockViewModel {
        /// localStorage + fetch + timers del navegador, configurado desde `CONFIG`
        pub fn for_browser() -> Self {
            let api = Rc::new(HttpItemApi::new(&CONFIG));
            Self::new(
                Rc::new(BrowserStorage),
                api.clone(),
                api,
                Rc::new(SystemClock),
                CONFIG.clone(),
                initial_status(),
            )
        }
    }

    /// Conecta los eventos `online`/`offline` de window y arranca el loop de probe
    pub fn attach(view_model: Rc<StockViewModel>) {
        let listener = view_model.clone();
        start_monitoring(move |signal| {
            let view_model = listener.clone();
            spawn_local(async move {
                if let Err(e) = view_model.handle_signal(signal).await {
                    log::error!("❌ Error procesando la conectividad: {}", e);
                }
            });
        });

        spawn_local(async move {
            view_model.run_probe_loop().await;
        });
    }
}
