use thiserror::Error;

/// Failure talking to the cache backend.
///
/// Never leaves the crate's cache layer: [`crate::cache::PrefixedCache`]
/// turns every variant into a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(#[from] redis::RedisError),
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache payload could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// DNS query that could not be completed (as opposed to an empty answer).
#[derive(Debug, Error)]
pub enum DnsError {
    #[error("DNS lookup for {domain} failed: {source}")]
    Lookup {
        domain: String,
        #[source]
        source: trust_dns_resolver::error::ResolveError,
    },
    #[error("DNS lookup for {domain} timed out")]
    Timeout { domain: String },
}

#[derive(Debug, Error)]
pub enum TldSourceError {
    #[error("TLD authority request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("TLD authority returned HTTP {0}")]
    Status(u16),
    #[error("TLD authority list looks truncated: {count} entries (minimum {minimum})")]
    Truncated { count: usize, minimum: usize },
    #[error("could not read TLD list file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
    #[error("{0} must list at least one node")]
    NoNodes(&'static str),
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{0}")]
    Redis(#[from] redis::RedisError),
    #[error("timed out after {0}ms")]
    Timeout(u128),
}

/// Failure wiring up the default validation pipeline.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    TldSource(#[from] TldSourceError),
}
