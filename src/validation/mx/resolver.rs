use crate::error::DnsError;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::warn;
use trust_dns_resolver::TokioAsyncResolver;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::system_conf::read_system_conf;

/// One mail exchanger as published in DNS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxRecord {
    pub preference: u16,
    /// Lowercased host without the trailing dot; the root (null MX) stays `.`.
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl Into<String>) -> Self {
        Self {
            preference,
            exchange: normalize_exchange(&exchange.into()),
        }
    }
}

fn normalize_exchange(exchange: &str) -> String {
    let trimmed = exchange.trim();
    if trimmed == "." {
        return trimmed.to_string();
    }
    trimmed.trim_end_matches('.').to_ascii_lowercase()
}

/// DNS queries the MX stage needs.
///
/// `Ok(vec![])` / `Ok(false)` mean the query completed with an empty answer;
/// `Err` means the answer could not be obtained at all.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MxResolver: Send + Sync {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, DnsError>;

    /// Whether `host` has at least one A/AAAA record.
    async fn has_address(&self, host: &str) -> Result<bool, DnsError>;
}

/// [`MxResolver`] on top of the platform's resolver configuration.
///
/// Retries are left to the caller: each query gets exactly one attempt,
/// bounded by `timeout`.
pub struct TrustDnsResolver {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl TrustDnsResolver {
    pub fn from_system_conf(timeout: Duration) -> Self {
        let (config, mut opts) = read_system_conf().unwrap_or_else(|e| {
            warn!(error = %e, "could not read system resolver config, using defaults");
            (ResolverConfig::default(), ResolverOpts::default())
        });
        opts.timeout = timeout;
        opts.attempts = 1;

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            timeout,
        }
    }

    async fn bounded<T, F>(&self, name: &str, query: F) -> Result<T, DnsError>
    where
        F: Future<Output = Result<T, ResolveError>>,
    {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(result) => result.map_err(|source| DnsError::Lookup {
                domain: name.to_string(),
                source,
            }),
            Err(_) => Err(DnsError::Timeout {
                domain: name.to_string(),
            }),
        }
    }
}

/// Absolute name, so the resolver's search list is never consulted.
fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

fn is_empty_answer(error: &ResolveError) -> bool {
    matches!(error.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

#[async_trait]
impl MxResolver for TrustDnsResolver {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, DnsError> {
        let name = fqdn(domain);
        let answer = self
            .bounded(domain, async {
                match self.resolver.mx_lookup(name.as_str()).await {
                    Ok(lookup) => Ok(lookup
                        .iter()
                        .map(|mx| MxRecord::new(mx.preference(), mx.exchange().to_utf8()))
                        .collect()),
                    Err(e) if is_empty_answer(&e) => Ok(Vec::new()),
                    Err(e) => Err(e),
                }
            })
            .await?;
        Ok(answer)
    }

    async fn has_address(&self, host: &str) -> Result<bool, DnsError> {
        let name = fqdn(host);
        self.bounded(host, async {
            match self.resolver.lookup_ip(name.as_str()).await {
                Ok(lookup) => Ok(lookup.iter().next().is_some()),
                Err(e) if is_empty_answer(&e) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await
    }
}
