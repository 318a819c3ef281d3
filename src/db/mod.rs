pub mod models;
pub mod queries;
pub mod sealing;

pub use queries::{connect, init_db, DbPool, SqliteWalletStore};
pub use sealing::Sealer;

use crate::error::AppResult;
use async_trait::async_trait;
use chrono::Utc;
use custodybot_types::{UserId, WalletRecord};
use dashmap::DashMap;

/// Durable wallet storage, one record per user.
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Insert or replace the user's wallet.
    async fn put(&self, record: &WalletRecord) -> AppResult<()>;

    async fn get(&self, user_id: UserId) -> AppResult<Option<WalletRecord>>;

    /// Bump `last_used_at`. Returns false if the user has no wallet.
    async fn touch(&self, user_id: UserId) -> AppResult<bool>;
}

/// Process-local store for development and tests.
#[derive(Debug, Default)]
pub struct InMemoryWalletStore {
    records: DashMap<UserId, WalletRecord>,
}

impl InMemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    async fn put(&self, record: &WalletRecord) -> AppResult<()> {
        self.records.insert(record.user_id, record.clone());
        Ok(())
    }

    async fn get(&self, user_id: UserId) -> AppResult<Option<WalletRecord>> {
        Ok(self.records.get(&user_id).map(|r| r.value().clone()))
    }

    async fn touch(&self, user_id: UserId) -> AppResult<bool> {
        match self.records.get_mut(&user_id) {
            Some(mut record) => {
                record.last_used_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_last_write_wins() {
        let store = InMemoryWalletStore::new();
        let now = Utc::now();
        for key in ["A", "B"] {
            store
                .put(&WalletRecord {
                    user_id: UserId(1),
                    public_key: key.to_string(),
                    secret_key_encoded: "s".to_string(),
                    mnemonic_phrase: None,
                    created_at: now,
                    last_used_at: now,
                })
                .await
                .unwrap();
        }
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(UserId(1)).await.unwrap().unwrap().public_key, "B");
        assert!(store.touch(UserId(1)).await.unwrap());
        assert!(!store.touch(UserId(2)).await.unwrap());
    }
}
