pub mod api;
pub mod item;
pub mod pending_action;
pub mod sync;

pub use api::ApiEnvelope;
pub use item::{Item, ItemData, ItemId, ItemPatch};
pub use pending_action::{ActionId, ActionKind, Mutation, PendingAction};
pub use sync::{MutationResult, RejectReason, SyncOutcome, SyncProgress, SyncReport, SyncState};
