// ============================================================================
// STOCK SYNC - Núcleo de sincronización offline-first
// ============================================================================
// - Models: Items, acciones pendientes, resultados de sync
// - Services: Storage, queue, merge, dispatch, conectividad, sync engine
// - State: Valores observables con Rc<RefCell>
// - ViewModels: Fachada que consume la UI
// ============================================================================

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod viewmodels;

#[cfg(test)]
mod test_support;

pub use config::{SyncConfig, CONFIG};
pub use error::{ApiError, StorageError, SyncError};
pub use models::{
    ActionId, Item, ItemData, ItemId, ItemPatch, Mutation, MutationResult, PendingAction,
    RejectReason, SyncOutcome, SyncProgress, SyncReport, SyncState,
};
pub use services::MergedItem;
pub use viewmodels::StockViewModel;

/// Panic hook y salida de `log` a la consola del navegador
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("🚀 Stock sync listo");
}
