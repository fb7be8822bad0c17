use super::{DomainValidator, EmailValidator, domain_of};
use crate::cache::{KeyTtl, PrefixedCache};
use crate::error::TldSourceError;
use crate::models::ValidationResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub mod fallback;
pub mod source;

pub use fallback::FallbackTlds;
pub use source::{HttpTldSource, ParsedTldList, TldSource, parse_tld_list};

pub const TLD_LIST_KEY: &str = "tld_list";
pub const TLD_METADATA_KEY: &str = "tld_metadata";
/// An authority response shorter than this is treated as truncated.
pub const MIN_AUTHORITY_ENTRIES: usize = 100;
pub const DEFAULT_TLD_CACHE_TTL: u64 = 86_400;

/// Which step of the load chain produced the active list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListOrigin {
    Cache,
    Authority,
    Fallback,
}

/// Stored next to the list under `tld_cache:tld_metadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TldCacheMetadata {
    pub loaded_at: DateTime<Utc>,
    pub source: ListOrigin,
    pub version: String,
    pub count: usize,
}

/// Snapshot returned by [`TldValidator::cache_info`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TldCacheInfo {
    /// `cached` or `not_cached`.
    pub status: &'static str,
    /// Remaining TTL of the cached list (`-1` no expiry, `-2` missing).
    pub ttl_seconds: i64,
    pub metadata: Option<TldCacheMetadata>,
    /// Entries in the validator's in-memory list.
    pub count: usize,
    pub source: ListOrigin,
}

#[derive(Debug)]
struct ActiveList {
    tlds: HashSet<String>,
    origin: ListOrigin,
    version: Option<String>,
}

impl ActiveList {
    fn new<I: IntoIterator<Item = String>>(tlds: I, origin: ListOrigin) -> Self {
        Self {
            tlds: tlds.into_iter().collect(),
            origin,
            version: None,
        }
    }

    fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Checks the last label of a domain against the list of delegated TLDs.
///
/// The list is loaded once on construction, trying in order:
/// 1. the shared cache (`tld_cache:tld_list`)
/// 2. the authority source, which is then written back to the cache
/// 3. the bundled [`FallbackTlds`]
///
/// so the validator always ends up with a non-empty list.
pub struct TldValidator {
    cache: PrefixedCache,
    source: Arc<dyn TldSource>,
    fallback: FallbackTlds,
    ttl: u64,
    active: RwLock<ActiveList>,
}

impl TldValidator {
    pub async fn load(
        cache: PrefixedCache,
        source: Arc<dyn TldSource>,
        fallback: FallbackTlds,
        ttl: u64,
    ) -> Self {
        let mut validator = Self {
            cache,
            source,
            fallback,
            ttl,
            active: RwLock::new(ActiveList::new(Vec::new(), ListOrigin::Fallback)),
        };
        let list = validator.resolve_list().await;
        *validator.active.get_mut() = list;
        validator
    }

    async fn resolve_list(&self) -> ActiveList {
        if let Some(list) = self.read_cache().await {
            info!(count = list.tlds.len(), "TLD list loaded from cache");
            return list;
        }

        match self.fetch_and_store().await {
            Ok(list) => {
                info!(count = list.tlds.len(), "TLD list loaded from authority");
                list
            }
            Err(e) => {
                warn!(
                    error = %e,
                    count = self.fallback.len(),
                    "TLD authority unavailable, degraded mode: using fallback TLD list"
                );
                ActiveList::new(self.fallback.tlds().iter().cloned(), ListOrigin::Fallback)
                    .with_version(self.fallback.version())
            }
        }
    }

    async fn read_cache(&self) -> Option<ActiveList> {
        let tlds: Vec<String> = self.cache.get_json(TLD_LIST_KEY).await?;
        if tlds.is_empty() {
            return None;
        }
        let list = ActiveList::new(
            tlds.into_iter().map(|tld| tld.to_ascii_uppercase()),
            ListOrigin::Cache,
        );

        match self.cache.get_json::<TldCacheMetadata>(TLD_METADATA_KEY).await {
            Some(metadata) => {
                info!(
                    version = %metadata.version,
                    loaded_at = %metadata.loaded_at,
                    source = ?metadata.source,
                    "adopting cached TLD list"
                );
                Some(list.with_version(metadata.version))
            }
            None => {
                warn!("cached TLD list has no metadata");
                Some(list)
            }
        }
    }

    async fn fetch_and_store(&self) -> Result<ActiveList, TldSourceError> {
        let body = self.source.fetch().await?;
        let parsed = parse_tld_list(&body);

        if parsed.tlds.len() < MIN_AUTHORITY_ENTRIES {
            return Err(TldSourceError::Truncated {
                count: parsed.tlds.len(),
                minimum: MIN_AUTHORITY_ENTRIES,
            });
        }

        let loaded_at = Utc::now();
        let metadata = TldCacheMetadata {
            loaded_at,
            source: ListOrigin::Authority,
            version: parsed
                .version
                .unwrap_or_else(|| loaded_at.format("%Y%m%d%H").to_string()),
            count: parsed.tlds.len(),
        };

        let stored = self.cache.set_json(TLD_LIST_KEY, &parsed.tlds, self.ttl).await
            && self.cache.set_json(TLD_METADATA_KEY, &metadata, self.ttl).await;
        if !stored {
            warn!("TLD list fetched but could not be cached");
        }

        Ok(ActiveList::new(parsed.tlds, ListOrigin::Authority).with_version(metadata.version))
    }

    /// Re-downloads the list from the authority, bypassing the cache.
    ///
    /// On failure the current in-memory list is kept and `false` returned.
    pub async fn force_refresh_cache(&self) -> bool {
        match self.fetch_and_store().await {
            Ok(list) => {
                info!(count = list.tlds.len(), "TLD list refreshed from authority");
                *self.active.write().await = list;
                true
            }
            Err(e) => {
                warn!(error = %e, "TLD list refresh failed, keeping current list");
                false
            }
        }
    }

    /// Drops the shared cache entries. The in-memory list stays in use.
    pub async fn clear_cache(&self) -> bool {
        let list_cleared = self.cache.delete(TLD_LIST_KEY).await;
        let metadata_cleared = self.cache.delete(TLD_METADATA_KEY).await;
        list_cleared && metadata_cleared
    }

    pub async fn cache_info(&self) -> TldCacheInfo {
        let ttl = self.cache.get_ttl(TLD_LIST_KEY).await;
        let metadata = self.cache.get_json(TLD_METADATA_KEY).await;
        let active = self.active.read().await;

        TldCacheInfo {
            status: if ttl == KeyTtl::Missing {
                "not_cached"
            } else {
                "cached"
            },
            ttl_seconds: ttl.as_seconds(),
            metadata,
            count: active.tlds.len(),
            source: active.origin,
        }
    }

    pub async fn origin(&self) -> ListOrigin {
        self.active.read().await.origin
    }

    /// Version of the active list, when its origin recorded one.
    pub async fn version(&self) -> Option<String> {
        self.active.read().await.version.clone()
    }

    pub async fn contains(&self, tld: &str) -> bool {
        self.active
            .read()
            .await
            .tlds
            .contains(&tld.to_ascii_uppercase())
    }
}

/// Last dot-separated label; a domain without dots is returned whole.
fn candidate_tld(domain: &str) -> &str {
    domain.rsplit('.').next().unwrap_or(domain)
}

#[async_trait]
impl DomainValidator for TldValidator {
    async fn validate_domain(&self, domain: &str, email: &str) -> ValidationResult {
        let tld = candidate_tld(domain.trim()).to_ascii_uppercase();

        if tld.is_empty() {
            return ValidationResult::invalid_tld(email, "Domain has no top-level domain");
        }

        if self.contains(&tld).await {
            ValidationResult::valid(email)
        } else {
            ValidationResult::invalid_tld(email, format!("Unrecognized top-level domain: {}", tld))
        }
    }
}

#[async_trait]
impl EmailValidator for TldValidator {
    async fn validate(&self, email: &str) -> ValidationResult {
        self.validate_domain(domain_of(email), email).await
    }
}
