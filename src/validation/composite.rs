use super::mx::{MxValidator, RetryPolicy, TrustDnsResolver};
use super::syntax::SyntaxValidator;
use super::tld::{FallbackTlds, HttpTldSource, TldValidator};
use super::EmailValidator;
use crate::cache::{self, CacheBackend, MX_CACHE_PREFIX, PrefixedCache, TLD_CACHE_PREFIX};
use crate::config::Config;
use crate::error::SetupError;
use crate::models::ValidationResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Runs syntax, TLD and MX checks in that order and stops at the first
/// failure, so DNS is only ever queried for addresses that already look
/// deliverable.
pub struct CompositeValidator<S, T, M> {
    syntax: S,
    tld: T,
    mx: M,
}

/// The fully wired production pipeline.
pub type DefaultValidator = CompositeValidator<SyntaxValidator, TldValidator, MxValidator>;

impl<S, T, M> CompositeValidator<S, T, M>
where
    S: EmailValidator,
    T: EmailValidator,
    M: EmailValidator,
{
    pub fn new(syntax: S, tld: T, mx: M) -> Self {
        Self { syntax, tld, mx }
    }

    pub fn syntax(&self) -> &S {
        &self.syntax
    }

    pub fn tld(&self) -> &T {
        &self.tld
    }

    pub fn mx(&self) -> &M {
        &self.mx
    }

    pub async fn validate(&self, email: &str) -> ValidationResult {
        let syntax = self.syntax.validate(email).await;
        if !syntax.is_valid() {
            debug!(status = %syntax.status(), "rejected by syntax check");
            return syntax;
        }

        let tld = self.tld.validate(email).await;
        if !tld.is_valid() {
            debug!(status = %tld.status(), "rejected by TLD check");
            return tld;
        }

        let mx = self.mx.validate(email).await;
        if !mx.is_valid() {
            debug!(status = %mx.status(), "rejected by MX check");
        }
        mx
    }
}

#[async_trait]
impl<S, T, M> EmailValidator for CompositeValidator<S, T, M>
where
    S: EmailValidator,
    T: EmailValidator,
    M: EmailValidator,
{
    async fn validate(&self, email: &str) -> ValidationResult {
        CompositeValidator::validate(self, email).await
    }
}

impl DefaultValidator {
    /// Connects to the configured cache nodes and builds every stage.
    pub async fn from_config(config: &Config) -> Result<Self, SetupError> {
        let backend = cache::redis::connect(&config.redis_nodes, config.redis_op_timeout())?;
        Self::with_backend(config, backend).await
    }

    /// Builds every stage on top of an existing cache backend.
    pub async fn with_backend(
        config: &Config,
        backend: Arc<dyn CacheBackend>,
    ) -> Result<Self, SetupError> {
        let source = HttpTldSource::new(&config.tld_source_url, config.tld_fetch_timeout)?;
        let tld = TldValidator::load(
            PrefixedCache::new(backend.clone(), TLD_CACHE_PREFIX),
            Arc::new(source),
            FallbackTlds::load(config.tld_fallback_path.as_deref()),
            config.tld_cache_ttl,
        )
        .await;

        let mx = MxValidator::new(
            Arc::new(TrustDnsResolver::from_system_conf(config.dns_timeout)),
            PrefixedCache::new(backend, MX_CACHE_PREFIX),
            config.mx_cache_ttl,
        )
        .with_retry(RetryPolicy {
            attempts: config.dns_attempts,
            delay: config.dns_retry_delay,
        })
        .with_max_priority(config.mx_max_priority);

        Ok(Self::new(SyntaxValidator::new(), tld, mx))
    }
}
