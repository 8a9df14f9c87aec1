//! Profile store
//!
//! Profile records are written to Redis as JSON strings keyed by member id.
//! Persistence is best-effort: callers bound every call with a timeout and
//! log failures instead of propagating them.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tokio::sync::OnceCell;

use crate::error::StoreResult;

/// Number of keys requested per SCAN round trip
const SCAN_BATCH: usize = 100;

/// Key-value store the relay writes profile records to
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Write `value` under `key`, replacing any previous value
    async fn put(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`; removing a missing key is not an error
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Every key currently in the store
    async fn scan_all_keys(&self) -> StoreResult<Vec<String>>;

    /// Cheap liveness check used by the readiness endpoint
    async fn ping(&self) -> StoreResult<()>;
}

/// Connection settings for [`RedisStore`]
#[derive(Debug, Clone)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub db: i64,
}

impl RedisSettings {
    fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: RedisConnectionInfo {
                db: self.db,
                username: self.username.clone(),
                password: self.password.clone(),
                ..Default::default()
            },
        }
    }
}

/// Redis-backed [`ProfileStore`].
///
/// The connection is opened on first use, so the relay starts and keeps
/// acknowledging webhooks while Redis is down. `ConnectionManager`
/// reconnects on its own once a connection has been established.
pub struct RedisStore {
    client: Client,
    connection: OnceCell<ConnectionManager>,
}

impl RedisStore {
    pub fn new(settings: &RedisSettings) -> StoreResult<Self> {
        let client = Client::open(settings.connection_info())?;
        tracing::info!(
            host = %settings.host,
            port = settings.port,
            db = settings.db,
            "Redis profile store configured"
        );
        Ok(Self {
            client,
            connection: OnceCell::new(),
        })
    }

    async fn connection(&self) -> StoreResult<ConnectionManager> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                let manager = ConnectionManager::new(self.client.clone()).await?;
                tracing::info!("Redis connection established");
                Ok::<_, redis::RedisError>(manager)
            })
            .await?;
        Ok(manager.clone())
    }
}

#[async_trait]
impl ProfileStore for RedisStore {
    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let _: i64 = conn.del(key).await?;
        Ok(())
    }

    async fn scan_all_keys(&self) -> StoreResult<Vec<String>> {
        let mut conn = self.connection().await?;
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(keys)
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

/// Stores for tests; not used by the server binary
#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use tokio::sync::RwLock;

    use super::ProfileStore;
    use crate::error::{StoreError, StoreResult};

    /// In-memory [`ProfileStore`]
    #[derive(Default)]
    pub struct MemoryStore {
        entries: RwLock<BTreeMap<String, String>>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn get(&self, key: &str) -> Option<String> {
            self.entries.read().await.get(key).cloned()
        }

        pub async fn len(&self) -> usize {
            self.entries.read().await.len()
        }
    }

    #[async_trait]
    impl ProfileStore for MemoryStore {
        async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
            self.entries
                .write()
                .await
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn delete(&self, key: &str) -> StoreResult<()> {
            self.entries.write().await.remove(key);
            Ok(())
        }

        async fn scan_all_keys(&self) -> StoreResult<Vec<String>> {
            Ok(self.entries.read().await.keys().cloned().collect())
        }

        async fn ping(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    /// [`ProfileStore`] whose every call fails
    #[derive(Default)]
    pub struct FailingStore;

    #[async_trait]
    impl ProfileStore for FailingStore {
        async fn put(&self, _key: &str, _value: &str) -> StoreResult<()> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn delete(&self, _key: &str) -> StoreResult<()> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn scan_all_keys(&self) -> StoreResult<Vec<String>> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn ping(&self) -> StoreResult<()> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    /// [`ProfileStore`] that never answers within any reasonable timeout
    #[derive(Default)]
    pub struct StalledStore;

    #[async_trait]
    impl ProfileStore for StalledStore {
        async fn put(&self, _key: &str, _value: &str) -> StoreResult<()> {
            std::future::pending().await
        }

        async fn delete(&self, _key: &str) -> StoreResult<()> {
            std::future::pending().await
        }

        async fn scan_all_keys(&self) -> StoreResult<Vec<String>> {
            std::future::pending().await
        }

        async fn ping(&self) -> StoreResult<()> {
            std::future::pending().await
        }
    }
}
