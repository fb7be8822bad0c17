use super::CacheBackend;
use crate::error::CacheError;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::cluster::ClusterClient;
use redis::cluster_async::ClusterConnection;
use redis::{AsyncCommands, Client, RedisResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Something that can hand out an async Redis connection.
#[async_trait]
pub trait RedisConnector: Send + Sync + 'static {
    type Connection: AsyncCommands + Send;

    async fn open_connection(&self) -> RedisResult<Self::Connection>;
}

#[async_trait]
impl RedisConnector for Client {
    type Connection = MultiplexedConnection;

    async fn open_connection(&self) -> RedisResult<MultiplexedConnection> {
        self.get_multiplexed_async_connection().await
    }
}

#[async_trait]
impl RedisConnector for ClusterClient {
    type Connection = ClusterConnection;

    async fn open_connection(&self) -> RedisResult<ClusterConnection> {
        self.get_async_connection().await
    }
}

/// Redis-backed [`CacheBackend`].
///
/// Each operation opens a connection and runs under a single deadline, so a
/// hung node costs at most `timeout` before the adapter falls back to a miss.
#[derive(Clone)]
pub struct RedisBackend<C = Client> {
    client: Arc<C>,
    timeout: Duration,
}

pub type RedisClusterBackend = RedisBackend<ClusterClient>;

impl RedisBackend<Client> {
    pub fn new(redis_url: &str, timeout: Duration) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)?;
        Ok(Self {
            client: Arc::new(client),
            timeout,
        })
    }
}

impl RedisBackend<ClusterClient> {
    pub fn cluster(nodes: &[String], timeout: Duration) -> Result<Self, CacheError> {
        let client = ClusterClient::new(nodes.to_vec())?;
        Ok(Self {
            client: Arc::new(client),
            timeout,
        })
    }
}

/// Picks cluster mode when more than one node is configured.
pub fn connect(nodes: &[String], timeout: Duration) -> Result<Arc<dyn CacheBackend>, CacheError> {
    match nodes {
        [] => Err(CacheError::Unavailable("no cache nodes configured".to_string())),
        [single] => Ok(Arc::new(RedisBackend::new(single, timeout)?)),
        _ => Ok(Arc::new(RedisBackend::cluster(nodes, timeout)?)),
    }
}

impl<C: RedisConnector> RedisBackend<C> {
    async fn bounded<T, F>(&self, operation: F) -> Result<T, CacheError>
    where
        F: Future<Output = RedisResult<T>> + Send,
    {
        match tokio::time::timeout(self.timeout, operation).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CacheError::Unavailable(format!(
                "timed out after {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl<C: RedisConnector> CacheBackend for RedisBackend<C> {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.bounded(async {
            let mut conn = self.client.open_connection().await?;
            let value: Option<String> = conn.get(key).await?;
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError> {
        self.bounded(async {
            let mut conn = self.client.open_connection().await?;
            if ttl_seconds == 0 {
                let _: () = conn.set(key, value).await?;
            } else {
                let _: () = conn.set_ex(key, value, ttl_seconds).await?;
            }
            Ok(())
        })
        .await
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.bounded(async {
            let mut conn = self.client.open_connection().await?;
            let found: bool = conn.exists(key).await?;
            Ok(found)
        })
        .await
    }

    async fn ttl(&self, key: &str) -> Result<i64, CacheError> {
        self.bounded(async {
            let mut conn = self.client.open_connection().await?;
            let remaining: i64 = conn.ttl(key).await?;
            Ok(remaining)
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.bounded(async {
            let mut conn = self.client.open_connection().await?;
            let removed: usize = conn.del(key).await?;
            Ok(removed > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_rejects_empty_node_list() {
        assert!(matches!(
            connect(&[], Duration::from_secs(1)),
            Err(CacheError::Unavailable(_))
        ));
    }

    #[test]
    fn test_single_node_client_creation() {
        // Client::open only parses the URL; nothing is dialed yet.
        let backend = RedisBackend::new("redis://127.0.0.1:6379", Duration::from_secs(1));
        assert!(backend.is_ok());
        assert!(RedisBackend::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_node_surfaces_error() {
        // Port 1 on loopback is never a Redis server.
        let backend = RedisBackend::new("redis://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        assert!(backend.get("anything").await.is_err());
    }
}
