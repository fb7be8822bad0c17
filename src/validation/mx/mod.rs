use super::{DomainValidator, EmailValidator, domain_of};
use crate::cache::PrefixedCache;
use crate::error::DnsError;
use crate::models::{ValidationResult, ValidationStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub mod records;
pub mod resolver;

pub use records::{MxSelection, is_lookup_candidate, select_primary};
pub use resolver::{MxRecord, MxResolver, TrustDnsResolver};

pub const DEFAULT_MX_CACHE_TTL: u64 = 7200;
pub const DEFAULT_MAX_MX_PRIORITY: u16 = 50_000;

/// Bounded retry for MX queries: `attempts` tries in total, `delay` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

/// Cached verdict for one domain, stored under `mx_cache:<domain>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MxCacheEntry {
    pub status: ValidationStatus,
    pub reason: Option<String>,
    pub cached_at: DateTime<Utc>,
}

/// Domain-level verdict, independent of the address that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Verdict {
    status: ValidationStatus,
    reason: Option<String>,
}

impl Verdict {
    fn valid() -> Self {
        Self {
            status: ValidationStatus::Valid,
            reason: None,
        }
    }

    fn valid_because(reason: impl Into<String>) -> Self {
        Self {
            status: ValidationStatus::Valid,
            reason: Some(reason.into()),
        }
    }

    fn invalid(reason: impl Into<String>) -> Self {
        Self {
            status: ValidationStatus::InvalidMx,
            reason: Some(reason.into()),
        }
    }

    fn for_email(self, email: &str) -> ValidationResult {
        ValidationResult::from_parts(email, self.status, self.reason)
    }
}

impl From<MxCacheEntry> for Verdict {
    fn from(entry: MxCacheEntry) -> Self {
        Self {
            status: entry.status,
            reason: entry.reason,
        }
    }
}

/// Checks that a domain can plausibly receive mail.
///
/// Steps on a cache miss:
/// 1. structural pre-check, to avoid DNS round-trips for garbage
/// 2. MX query with bounded retries
/// 3. no MX records: accept if the bare domain has an address (RFC 5321)
/// 4. otherwise pick the lowest-preference usable record and require its
///    host to resolve
///
/// Every verdict, positive or negative, is cached per normalized domain.
pub struct MxValidator {
    resolver: Arc<dyn MxResolver>,
    cache: PrefixedCache,
    ttl: u64,
    retry: RetryPolicy,
    max_priority: u16,
}

impl MxValidator {
    pub fn new(resolver: Arc<dyn MxResolver>, cache: PrefixedCache, ttl: u64) -> Self {
        Self {
            resolver,
            cache,
            ttl,
            retry: RetryPolicy::default(),
            max_priority: DEFAULT_MAX_MX_PRIORITY,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_priority(mut self, max_priority: u16) -> Self {
        self.max_priority = max_priority;
        self
    }

    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    async fn resolve(&self, domain: &str) -> Verdict {
        if !is_lookup_candidate(domain) {
            return Verdict::invalid(format!(
                "Domain {} has an invalid structure for DNS lookup",
                domain
            ));
        }

        let records = match self.query_mx(domain).await {
            Ok(records) => records,
            Err(e) => {
                warn!(domain, error = %e, attempts = self.retry.attempts, "MX lookup failed on every attempt");
                return Verdict::invalid(format!(
                    "DNS unreachable: could not query MX records for {} after {} attempts",
                    domain,
                    self.retry.attempts.max(1)
                ));
            }
        };

        if records.is_empty() {
            return self.address_fallback(domain).await;
        }

        match select_primary(&records, self.max_priority) {
            MxSelection::Primary(primary) => self.check_primary_host(domain, primary).await,
            MxSelection::NullMx => Verdict::invalid(format!(
                "Domain {} does not accept mail (RFC 7505 null MX)",
                domain
            )),
            MxSelection::AllRejected => Verdict::invalid(format!(
                "All MX records for {} are invalid or blocked",
                domain
            )),
        }
    }

    async fn query_mx(&self, domain: &str) -> Result<Vec<MxRecord>, DnsError> {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.resolver.lookup_mx(domain).await {
                Ok(records) => return Ok(records),
                Err(e) if attempt >= attempts => return Err(e),
                Err(e) => debug!(domain, attempt, error = %e, "MX lookup failed, retrying"),
            }
            tokio::time::sleep(self.retry.delay).await;
            attempt += 1;
        }
    }

    async fn address_fallback(&self, domain: &str) -> Verdict {
        match self.resolver.has_address(domain).await {
            Ok(true) => Verdict::valid_because(format!(
                "No MX records for {}; accepting mail via its A record (RFC 5321 fallback)",
                domain
            )),
            Ok(false) => Verdict::invalid(format!(
                "Domain {} has no MX records and no A record fallback",
                domain
            )),
            Err(e) => {
                warn!(domain, error = %e, "address fallback lookup failed");
                Verdict::invalid(format!(
                    "Domain {} has no MX records and its A record could not be verified",
                    domain
                ))
            }
        }
    }

    async fn check_primary_host(&self, domain: &str, primary: &MxRecord) -> Verdict {
        match self.resolver.has_address(&primary.exchange).await {
            Ok(true) => Verdict::valid(),
            Ok(false) => Verdict::invalid(format!(
                "Primary MX host {} for {} does not resolve to an address",
                primary.exchange, domain
            )),
            Err(e) => {
                warn!(domain, host = %primary.exchange, error = %e, "primary MX host lookup failed");
                Verdict::invalid(format!(
                    "Primary MX host {} for {} could not be resolved",
                    primary.exchange, domain
                ))
            }
        }
    }
}

#[async_trait]
impl DomainValidator for MxValidator {
    async fn validate_domain(&self, domain: &str, email: &str) -> ValidationResult {
        if domain.trim().is_empty() {
            return ValidationResult::invalid_mx(email, "Domain is empty");
        }
        let domain = domain.trim().to_ascii_lowercase();

        if let Some(entry) = self.cache.get_json::<MxCacheEntry>(&domain).await {
            debug!(domain = %domain, status = %entry.status, "MX verdict served from cache");
            return Verdict::from(entry).for_email(email);
        }

        let verdict = self.resolve(&domain).await;
        let entry = MxCacheEntry {
            status: verdict.status,
            reason: verdict.reason.clone(),
            cached_at: Utc::now(),
        };
        self.cache.set_json(&domain, &entry, self.ttl).await;

        verdict.for_email(email)
    }
}

#[async_trait]
impl EmailValidator for MxValidator {
    async fn validate(&self, email: &str) -> ValidationResult {
        self.validate_domain(domain_of(email), email).await
    }
}
