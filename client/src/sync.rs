//! Optimistic local-first sync protocol.
//!
//! Every mutation commits to the local cache first and returns the updated
//! state immediately; the remote push happens afterwards and its outcome is
//! reported separately so the caller can alert on it or ignore it. Reads
//! are the opposite: the remote snapshot is authoritative and silently
//! replaces local state when it arrives, and silently loses to it when the
//! remote is unreachable.

use crate::cache::LocalCache;
use shared::{CategoryMap, Transaction, TransactionKind};
use thiserror::Error;
use tracing::{info, warn};

/// Failure modes of a remote call.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("remote store reported an error: {0}")]
    Remote(String),
}

/// Full remote state as returned by the store's `get` action:
/// transactions oldest-to-newest, categories when the sheet has them.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSnapshot {
    pub transactions: Vec<Transaction>,
    pub categories: Option<CategoryMap>,
}

/// Seam between the coordinator and the remote transaction store.
///
/// Implemented by [`crate::ApiClient`] over HTTP and by in-memory fakes in
/// tests.
pub trait RemoteStore {
    async fn fetch_all(&self) -> Result<RemoteSnapshot, SyncError>;
    async fn save(&self, transaction: &Transaction) -> Result<(), SyncError>;
    async fn delete(&self, id: &str) -> Result<(), SyncError>;
    async fn add_category(&self, kind: TransactionKind, name: &str) -> Result<(), SyncError>;
}

/// Result of an optimistic mutation: the already-committed local state,
/// plus the remote outcome the caller may inspect or ignore.
///
/// The UI surfaces `remote` failures as an alert for saves and deletes and
/// ignores them for category additions; either way `local` stands.
#[derive(Debug)]
pub struct MutationOutcome<T> {
    pub local: T,
    pub remote: Result<(), SyncError>,
}

/// Orchestrates the local cache and the remote store.
///
/// A coordinator without a remote (no store URL configured) degrades to a
/// purely local tracker: every remote step is skipped and mutations report
/// a successful remote outcome.
pub struct SyncCoordinator<R> {
    cache: LocalCache,
    remote: Option<R>,
}

impl<R: RemoteStore> SyncCoordinator<R> {
    pub fn new(cache: LocalCache, remote: R) -> Self {
        Self {
            cache,
            remote: Some(remote),
        }
    }

    /// Coordinator with no remote store configured.
    pub fn offline(cache: LocalCache) -> Self {
        Self {
            cache,
            remote: None,
        }
    }

    /// Synchronous cache read; what the UI presents before any network
    /// call completes.
    pub fn load_local(&self) -> (Vec<Transaction>, CategoryMap) {
        (self.cache.transactions(), self.cache.categories())
    }

    /// Pull the authoritative remote snapshot and replace local state.
    ///
    /// Remote rows arrive oldest-to-newest and are reversed into the local
    /// newest-first convention. Any failure - network, malformed body,
    /// remote-reported error - keeps local state and is never surfaced
    /// beyond a log line.
    pub async fn sync(&self) -> (Vec<Transaction>, CategoryMap) {
        let (local_transactions, local_categories) = self.load_local();

        let Some(remote) = &self.remote else {
            return (local_transactions, local_categories);
        };

        match remote.fetch_all().await {
            Ok(snapshot) => {
                let mut transactions = snapshot.transactions;
                transactions.reverse();
                if let Err(e) = self.cache.store_transactions(&transactions) {
                    warn!("failed to persist synced transactions: {}", e);
                }

                let categories = match snapshot.categories {
                    Some(categories) => {
                        if let Err(e) = self.cache.store_categories(&categories) {
                            warn!("failed to persist synced categories: {}", e);
                        }
                        categories
                    }
                    None => local_categories,
                };

                info!("cloud sync replaced local state ({} rows)", transactions.len());
                (transactions, categories)
            }
            Err(e) => {
                warn!("cloud sync skipped (offline or error): {}", e);
                (local_transactions, local_categories)
            }
        }
    }

    /// Save a new or updated transaction.
    ///
    /// Local commit first: replace the record if the id is already present,
    /// otherwise prepend (the local list is newest-first). The remote push
    /// follows and its outcome rides along in the returned
    /// [`MutationOutcome`].
    pub async fn save_transaction(
        &self,
        transaction: Transaction,
    ) -> anyhow::Result<MutationOutcome<Vec<Transaction>>> {
        let mut transactions = self.cache.transactions();
        if let Some(pos) = transactions.iter().position(|t| t.id == transaction.id) {
            transactions[pos] = transaction.clone();
        } else {
            transactions.insert(0, transaction.clone());
        }
        self.cache.store_transactions(&transactions)?;

        let remote = match &self.remote {
            Some(store) => store.save(&transaction).await,
            None => Ok(()),
        };
        if let Err(e) = &remote {
            warn!("cloud save failed, local write stands: {}", e);
        }

        Ok(MutationOutcome {
            local: transactions,
            remote,
        })
    }

    /// Remove a transaction by id. Removing an unknown id is a local no-op
    /// but the remote delete is still issued.
    pub async fn delete_transaction(
        &self,
        id: &str,
    ) -> anyhow::Result<MutationOutcome<Vec<Transaction>>> {
        let mut transactions = self.cache.transactions();
        transactions.retain(|t| t.id != id);
        self.cache.store_transactions(&transactions)?;

        let remote = match &self.remote {
            Some(store) => store.delete(id).await,
            None => Ok(()),
        };
        if let Err(e) = &remote {
            warn!("cloud delete failed, local removal stands: {}", e);
        }

        Ok(MutationOutcome {
            local: transactions,
            remote,
        })
    }

    /// Append a category under a kind.
    ///
    /// An exact-duplicate name is a complete no-op: nothing is persisted
    /// and nothing is pushed.
    pub async fn add_category(
        &self,
        kind: TransactionKind,
        name: &str,
    ) -> anyhow::Result<MutationOutcome<CategoryMap>> {
        let mut categories = self.cache.categories();
        if !categories.add(kind, name) {
            return Ok(MutationOutcome {
                local: categories,
                remote: Ok(()),
            });
        }
        self.cache.store_categories(&categories)?;

        let remote = match &self.remote {
            Some(store) => store.add_category(kind, name).await,
            None => Ok(()),
        };
        if let Err(e) = &remote {
            warn!("category sync failed, local addition stands: {}", e);
        }

        Ok(MutationOutcome {
            local: categories,
            remote,
        })
    }
}
