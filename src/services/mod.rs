pub mod api_client;
pub mod clock;
pub mod local_store;
pub mod mutation_queue;
pub mod mutation_service;
pub mod network_monitor;
pub mod storage;
pub mod sync_service;
pub mod view_merger;

pub use api_client::{ConnectivityProbe, ItemApi};
pub use clock::{with_timeout, Clock, ManualClock, SystemClock};
pub use local_store::LocalStore;
pub use mutation_queue::MutationQueue;
pub use mutation_service::MutationDispatcher;
pub use network_monitor::{ConnectivitySignal, NetworkMonitor, NetworkStatus, Transition};
pub use storage::{KeyValueStorage, MemoryStorage};
pub use sync_service::SyncEngine;
pub use view_merger::MergedItem;

#[cfg(target_arch = "wasm32")]
pub use api_client::HttpItemApi;
#[cfg(target_arch = "wasm32")]
pub use storage::BrowserStorage;
