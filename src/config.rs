use crate::error::ConfigError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_TLD_SOURCE_URL: &str = "https://data.iana.org/TLD/tlds-alpha-by-domain.txt";

/// Runtime settings for the cache cluster, TLD authority and DNS lookups.
///
/// Values come from the process environment (optionally seeded from a
/// `.env` file). Anything unset falls back to [`Config::default`].
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub redis_nodes: Vec<String>,
    pub redis_connect_timeout: Duration,
    pub redis_read_timeout: Duration,
    pub redis_quorum: usize,
    pub tld_cache_ttl: u64,
    pub tld_source_url: String,
    pub tld_fetch_timeout: Duration,
    pub tld_fallback_path: Option<String>,
    pub mx_cache_ttl: u64,
    pub dns_timeout: Duration,
    pub dns_attempts: u32,
    pub dns_retry_delay: Duration,
    pub mx_max_priority: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_nodes: vec!["redis://127.0.0.1:6379".to_string()],
            redis_connect_timeout: Duration::from_millis(2000),
            redis_read_timeout: Duration::from_millis(2000),
            redis_quorum: 1,
            tld_cache_ttl: 86_400,
            tld_source_url: DEFAULT_TLD_SOURCE_URL.to_string(),
            tld_fetch_timeout: Duration::from_secs(10),
            tld_fallback_path: None,
            mx_cache_ttl: 7200,
            dns_timeout: Duration::from_secs(10),
            dns_attempts: 3,
            dns_retry_delay: Duration::from_millis(500),
            mx_max_priority: 50_000,
        }
    }
}

impl Config {
    /// Deadline for one cache round-trip: connect plus read.
    pub fn redis_op_timeout(&self) -> Duration {
        self.redis_connect_timeout + self.redis_read_timeout
    }

    /// Loads `.env` (if present) and reads the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, so tests don't have to
    /// mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let redis_nodes = match lookup("REDIS_CLUSTER_NODES") {
            Some(raw) => {
                let nodes = parse_node_list(&raw);
                if nodes.is_empty() {
                    return Err(ConfigError::NoNodes("REDIS_CLUSTER_NODES"));
                }
                nodes
            }
            None => defaults.redis_nodes,
        };

        let redis_quorum = match lookup("REDIS_QUORUM") {
            Some(raw) => parse_value("REDIS_QUORUM", &raw)?,
            None => majority(redis_nodes.len()),
        };

        Ok(Self {
            redis_connect_timeout: millis(&lookup, "REDIS_CONNECT_TIMEOUT_MS")?
                .unwrap_or(defaults.redis_connect_timeout),
            redis_read_timeout: millis(&lookup, "REDIS_READ_TIMEOUT_MS")?
                .unwrap_or(defaults.redis_read_timeout),
            redis_nodes,
            redis_quorum,
            tld_cache_ttl: number(&lookup, "TLD_CACHE_TTL")?.unwrap_or(defaults.tld_cache_ttl),
            tld_source_url: lookup("TLD_SOURCE_URL").unwrap_or(defaults.tld_source_url),
            tld_fetch_timeout: number(&lookup, "TLD_FETCH_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.tld_fetch_timeout),
            tld_fallback_path: lookup("TLD_FALLBACK_PATH").filter(|p| !p.trim().is_empty()),
            mx_cache_ttl: number(&lookup, "MX_CACHE_TTL")?.unwrap_or(defaults.mx_cache_ttl),
            dns_timeout: number(&lookup, "DNS_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.dns_timeout),
            dns_attempts: number(&lookup, "DNS_ATTEMPTS")?.unwrap_or(defaults.dns_attempts),
            dns_retry_delay: millis(&lookup, "DNS_RETRY_DELAY_MS")?
                .unwrap_or(defaults.dns_retry_delay),
            mx_max_priority: number(&lookup, "MX_MAX_PRIORITY")?
                .unwrap_or(defaults.mx_max_priority),
        })
    }
}

/// Strict majority of `nodes` expected masters (3 of 5, 2 of 3, 1 of 1).
pub fn majority(nodes: usize) -> usize {
    nodes / 2 + 1
}

fn parse_node_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|node| !node.is_empty())
        .map(|node| {
            if node.contains("://") {
                node.to_string()
            } else {
                format!("redis://{}", node)
            }
        })
        .collect()
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}

fn number<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|raw| parse_value(key, &raw)).transpose()
}

fn millis<F>(lookup: &F, key: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(number::<u64, F>(lookup, key)?.map(Duration::from_millis))
}
