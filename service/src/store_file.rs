//! File-backed account store.
//!
//! A stand-in for the document-store collaborator: one JSON file holding
//! every account record, rewritten atomically (temp file + rename) on each
//! mutation. All engine writes already serialize per account, so the
//! whole-file write needs no finer granularity. Individual corrupt records
//! are skipped with a warning at load; a corrupt file as a whole refuses to
//! open rather than silently discarding data.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use honor_engine::{AccountStore, StoreError};
use honor_types::{AccountRecord, UserAccount};

#[derive(Default)]
struct Inner {
    order: Vec<String>,
    accounts: HashMap<String, UserAccount>,
}

pub struct JsonFileStore {
    path: PathBuf,
    inner: RwLock<Inner>,
}

impl JsonFileStore {
    /// Open (or create) the store at `path`. A missing file is an empty
    /// store; an unparseable file is an error.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        let mut inner = Inner::default();
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let values: Vec<serde_json::Value> = serde_json::from_str(&contents)
                    .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))?;
                let now = Utc::now();
                for (index, value) in values.into_iter().enumerate() {
                    let account = serde_json::from_value::<AccountRecord>(value)
                        .map_err(|e| e.to_string())
                        .and_then(|record| record.into_account(now).map_err(|e| e.to_string()));
                    match account {
                        Ok(account) => {
                            inner.order.push(account.id.clone());
                            inner.accounts.insert(account.id.clone(), account);
                        }
                        Err(error) => {
                            warn!(index, error, "skipping corrupt account record");
                        }
                    }
                }
                info!(
                    path = %path.display(),
                    accounts = inner.accounts.len(),
                    "account store loaded"
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "account store starting empty");
            }
            Err(e) => return Err(StoreError::Io(e.to_string())),
        }
        Ok(Self {
            path,
            inner: RwLock::new(inner),
        })
    }

    async fn persist(&self, inner: &Inner) -> Result<(), StoreError> {
        let records: Vec<AccountRecord> = inner
            .order
            .iter()
            .filter_map(|id| inner.accounts.get(id).map(AccountRecord::from))
            .collect();
        let json = serde_json::to_string_pretty(&records)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))
    }
}

impl AccountStore for JsonFileStore {
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
        self.persist(&inner).await
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
        self.persist(&inner).await?;
        Ok(removed)
    }
}
