// ============================================================================
// STATE MODULE - Estado compartido Rc<RefCell> con notificaciones
// ============================================================================

pub mod reactivity;
pub mod sync_state;

pub use reactivity::ReactiveState;
pub use sync_state::SyncStateWrapper;
