//! Account storage boundary.
//!
//! The engine only assumes a per-user document store with atomic
//! whole-document upsert; everything else about the persistence technology
//! is a collaborator concern. [`MemoryStore`] is the reference
//! implementation and the test double.

use std::collections::HashMap;
use std::future::Future;

use thiserror::Error as ThisError;
use tokio::sync::RwLock;

use honor_types::UserAccount;

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("storage I/O failure: {0}")]
    Io(String),
    #[error("stored document is corrupt: {0}")]
    Corrupt(String),
}

/// Per-user account records keyed by id.
///
/// `upsert` must apply or reject the whole document atomically; the engine
/// layers per-id serialization on top, so implementations never see two
/// concurrent writes for the same account.
pub trait AccountStore: Send + Sync + 'static {
    fn get(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<UserAccount>, StoreError>> + Send;

    fn upsert(&self, account: UserAccount)
        -> impl Future<Output = Result<(), StoreError>> + Send;

    /// All accounts, in a stable iteration order. Leaderboard ties rank in
    /// this order, so the order must not change between calls without an
    /// intervening write.
    fn all(&self) -> impl Future<Output = Result<Vec<UserAccount>, StoreError>> + Send;

    fn count(&self) -> impl Future<Output = Result<usize, StoreError>> + Send;

    /// Irreversible. Returns the number of removed accounts.
    fn remove_all(&self) -> impl Future<Output = Result<usize, StoreError>> + Send;
}

#[derive(Default)]
struct MemoryInner {
    order: Vec<String>,
    accounts: HashMap<String, UserAccount>,
}

/// In-memory store with insertion-ordered iteration.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<UserAccount>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.get(id).cloned())
    }

    async fn upsert(&self, account: UserAccount) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.accounts.contains_key(&account.id) {
            inner.order.push(account.id.clone());
        }
        inner.accounts.insert(account.id.clone(), account);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<UserAccount>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.accounts.get(id).cloned())
            .collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.len())
    }

    async fn remove_all(&self) -> Result<usize, StoreError> {
        let mut inner = self.inner.write().await;
        let removed = inner.accounts.len();
        inner.accounts.clear();
        inner.order.clear();
        Ok(removed)
    }
}
