use crate::error::CacheError;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

pub mod memory;
pub mod redis;

pub use memory::MemoryBackend;
pub use self::redis::{RedisBackend, RedisClusterBackend};

/// Key prefix for the TLD list and its metadata.
pub const TLD_CACHE_PREFIX: &str = "tld_cache:";
/// Key prefix for per-domain MX verdicts.
pub const MX_CACHE_PREFIX: &str = "mx_cache:";

/// Raw key-value store the adapters sit on.
///
/// Implementations report faults as [`CacheError`]; deciding what a fault
/// means is left to [`PrefixedCache`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value`; a `ttl_seconds` of 0 means no expiry.
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError>;

    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Redis `TTL` semantics: seconds left, `-1` without expiry, `-2` missing.
    async fn ttl(&self, key: &str) -> Result<i64, CacheError>;

    /// Returns whether a key was actually removed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;
}

/// Remaining lifetime of a cached key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    Expires(u64),
    Persistent,
    Missing,
}

impl KeyTtl {
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            -1 => Self::Persistent,
            n if n >= 0 => Self::Expires(n as u64),
            _ => Self::Missing,
        }
    }

    /// Back to the `seconds | -1 | -2` wire convention.
    pub fn as_seconds(&self) -> i64 {
        match self {
            Self::Expires(n) => *n as i64,
            Self::Persistent => -1,
            Self::Missing => -2,
        }
    }
}

/// Namespaced view over a [`CacheBackend`] that fails open.
///
/// Every key is prefixed (`tld_cache:`, `mx_cache:`...). Backend faults are
/// logged and reported as a miss or `false`; callers never see an error,
/// because the cache only ever saves work.
#[derive(Clone)]
pub struct PrefixedCache {
    backend: Arc<dyn CacheBackend>,
    prefix: String,
}

impl fmt::Debug for PrefixedCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefixedCache")
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl PrefixedCache {
    pub fn new(backend: Arc<dyn CacheBackend>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    pub async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> bool {
        let full_key = self.key(key);
        match self.backend.set(&full_key, value, ttl_seconds).await {
            Ok(()) => true,
            Err(e) => {
                log_fault("set", &full_key, &e);
                false
            }
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let full_key = self.key(key);
        match self.backend.get(&full_key).await {
            Ok(value) => value,
            Err(e) => {
                log_fault("get", &full_key, &e);
                None
            }
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        let full_key = self.key(key);
        match self.backend.exists(&full_key).await {
            Ok(found) => found,
            Err(e) => {
                log_fault("exists", &full_key, &e);
                false
            }
        }
    }

    pub async fn get_ttl(&self, key: &str) -> KeyTtl {
        let full_key = self.key(key);
        match self.backend.ttl(&full_key).await {
            Ok(raw) => KeyTtl::from_raw(raw),
            Err(e) => {
                log_fault("ttl", &full_key, &e);
                KeyTtl::Missing
            }
        }
    }

    /// `true` when the backend accepted the delete, whether or not the key
    /// existed beforehand.
    pub async fn delete(&self, key: &str) -> bool {
        let full_key = self.key(key);
        match self.backend.delete(&full_key).await {
            Ok(_) => true,
            Err(e) => {
                log_fault("delete", &full_key, &e);
                false
            }
        }
    }

    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl_seconds: u64) -> bool {
        match serde_json::to_string(value) {
            Ok(payload) => self.set(key, &payload, ttl_seconds).await,
            Err(e) => {
                log_fault("encode", &self.key(key), &CacheError::from(e));
                false
            }
        }
    }

    /// A payload that no longer decodes is treated as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let payload = self.get(key).await?;
        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                log_fault("decode", &self.key(key), &CacheError::from(e));
                None
            }
        }
    }
}

fn log_fault(operation: &str, key: &str, error: &CacheError) {
    // Unit tests inject failing backends on purpose.
    if !cfg!(test) {
        warn!(operation, key, error = %error, "cache operation failed, continuing without cache");
    }
}

#[cfg(test)]
mod tests;
