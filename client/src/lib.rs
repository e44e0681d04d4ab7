//! Client core for the money manager: durable local cache, remote API
//! client, the optimistic local-first sync coordinator, and the pure
//! summary/aggregation engine. The UI layer consumes these and adds
//! nothing of its own to the data model.

pub mod api;
pub mod cache;
pub mod summary;
pub mod sync;

pub use api::ApiClient;
pub use cache::LocalCache;
pub use summary::{CategorySummary, DebtLedger, KindSummary, Summary};
pub use sync::{MutationOutcome, RemoteSnapshot, RemoteStore, SyncCoordinator, SyncError};
