use super::models::WalletRow;
use super::sealing::Sealer;
use super::WalletStore;
use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::Utc;
use custodybot_types::{UserId, WalletRecord};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use tracing::{error, info};

pub type DbPool = Pool<Sqlite>;

/// Open the SQLite pool described by `config`.
pub async fn connect(config: &DatabaseConfig) -> AppResult<DbPool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;
    info!("Connected to database");
    Ok(pool)
}

/// SQLite-backed wallet store with sealed secret columns.
#[derive(Debug, Clone)]
pub struct SqliteWalletStore {
    pool: DbPool,
    sealer: Sealer,
}

impl SqliteWalletStore {
    pub fn new(pool: DbPool, sealer: Sealer) -> Self {
        Self { pool, sealer }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn upsert(&self, record: &WalletRecord) -> AppResult<()> {
        let row = WalletRow::seal(record, &self.sealer)?;

        // Last write wins: a new import replaces the previous wallet.
        sqlx::query(
            r#"
            INSERT INTO wallets (user_id, public_key, secret_key_sealed, mnemonic_sealed, created_at, last_used_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                public_key = excluded.public_key,
                secret_key_sealed = excluded.secret_key_sealed,
                mnemonic_sealed = excluded.mnemonic_sealed,
                created_at = excluded.created_at,
                last_used_at = excluded.last_used_at
            "#,
        )
        .bind(row.user_id)
        .bind(&row.public_key)
        .bind(&row.secret_key_sealed)
        .bind(&row.mnemonic_sealed)
        .bind(row.created_at)
        .bind(row.last_used_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl WalletStore for SqliteWalletStore {
    async fn put(&self, record: &WalletRecord) -> AppResult<()> {
        self.upsert(record).await.map_err(|e| {
            error!("Failed to persist wallet for user {}: {}", record.user_id, e);
            AppError::SecretStoreWriteFailure("wallet could not be saved".into())
        })?;
        info!("Stored wallet {} for user {}", record.public_key, record.user_id);
        Ok(())
    }

    async fn get(&self, user_id: UserId) -> AppResult<Option<WalletRecord>> {
        let row = sqlx::query_as::<_, WalletRow>("SELECT * FROM wallets WHERE user_id = ?")
            .bind(user_id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.open(&self.sealer).map_err(AppError::from))
            .transpose()
    }

    async fn touch(&self, user_id: UserId) -> AppResult<bool> {
        let result = sqlx::query("UPDATE wallets SET last_used_at = ? WHERE user_id = ?")
            .bind(Utc::now())
            .bind(user_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
pub async fn setup_test_db() -> DbPool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    init_db(&pool).await.expect("Failed to init database");
    pool
}

/// Initialize database with migrations
pub async fn init_db(pool: &DbPool) -> AppResult<()> {
    info!("Running database migrations");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS wallets (
            user_id INTEGER PRIMARY KEY NOT NULL,
            public_key TEXT NOT NULL,
            secret_key_sealed TEXT NOT NULL,
            mnemonic_sealed TEXT,
            created_at DATETIME NOT NULL,
            last_used_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_wallets_public_key ON wallets(public_key)")
        .execute(pool)
        .await?;

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn store() -> SqliteWalletStore {
        SqliteWalletStore::new(setup_test_db().await, Sealer::new(&[4u8; 32]))
    }

    fn record(user: i64, public_key: &str, mnemonic: Option<&str>) -> WalletRecord {
        let now = Utc::now();
        WalletRecord {
            user_id: UserId(user),
            public_key: public_key.to_string(),
            secret_key_encoded: format!("secret-of-{}", public_key),
            mnemonic_phrase: mnemonic.map(str::to_string),
            created_at: now,
            last_used_at: now,
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = store().await;
        store.put(&record(1, "PubA", Some("one two three"))).await.unwrap();

        let stored = store.get(UserId(1)).await.unwrap().unwrap();
        assert_eq!(stored.public_key, "PubA");
        assert_eq!(stored.secret_key_encoded, "secret-of-PubA");
        assert_eq!(stored.mnemonic_phrase.as_deref(), Some("one two three"));
    }

    #[tokio::test]
    async fn test_get_nonexistent_returns_none() {
        let store = store().await;
        assert!(store.get(UserId(404)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = store().await;
        store.put(&record(1, "PubA", Some("one two three"))).await.unwrap();
        store.put(&record(1, "PubB", None)).await.unwrap();

        let stored = store.get(UserId(1)).await.unwrap().unwrap();
        assert_eq!(stored.public_key, "PubB");
        assert!(stored.mnemonic_phrase.is_none());

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM wallets")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_secrets_are_sealed_at_rest() {
        let store = store().await;
        store.put(&record(1, "PubA", Some("one two three"))).await.unwrap();

        let raw: (String, Option<String>) =
            sqlx::query_as("SELECT secret_key_sealed, mnemonic_sealed FROM wallets WHERE user_id = 1")
                .fetch_one(store.pool())
                .await
                .unwrap();
        assert!(!raw.0.contains("secret-of-PubA"));
        assert!(!raw.1.unwrap().contains("one two three"));
    }

    #[tokio::test]
    async fn test_touch_updates_last_used() {
        let store = store().await;
        let mut rec = record(1, "PubA", None);
        rec.last_used_at = Utc::now() - Duration::days(1);
        store.put(&rec).await.unwrap();

        assert!(store.touch(UserId(1)).await.unwrap());
        let stored = store.get(UserId(1)).await.unwrap().unwrap();
        assert!(stored.last_used_at > rec.last_used_at);

        assert!(!store.touch(UserId(2)).await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_key_cannot_read() {
        let pool = setup_test_db().await;
        SqliteWalletStore::new(pool.clone(), Sealer::new(&[4u8; 32]))
            .put(&record(1, "PubA", None))
            .await
            .unwrap();

        let other = SqliteWalletStore::new(pool, Sealer::new(&[5u8; 32]));
        assert!(matches!(other.get(UserId(1)).await, Err(AppError::Sealing(_))));
    }

    #[tokio::test]
    async fn test_write_failure_is_reported_as_store_failure() {
        let store = store().await;
        sqlx::query("DROP TABLE wallets")
            .execute(store.pool())
            .await
            .unwrap();

        assert!(matches!(
            store.put(&record(1, "PubA", None)).await,
            Err(AppError::SecretStoreWriteFailure(_))
        ));
    }
}
