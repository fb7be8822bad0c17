use crate::models::ValidationResult;
use async_trait::async_trait;

pub mod composite;
pub mod mx;
pub mod syntax;
pub mod tld;

pub use composite::{CompositeValidator, DefaultValidator};
pub use mx::MxValidator;
pub use syntax::SyntaxValidator;
pub use tld::TldValidator;

/// A stage that can judge a complete email address.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailValidator: Send + Sync {
    async fn validate(&self, email: &str) -> ValidationResult;
}

/// A stage whose verdict depends only on the domain part.
///
/// `email` is carried through so the result can name the address the
/// caller asked about.
#[async_trait]
pub trait DomainValidator: Send + Sync {
    async fn validate_domain(&self, domain: &str, email: &str) -> ValidationResult;
}

/// Domain part of `email`: everything after the last `@`, or `""`.
pub fn domain_of(email: &str) -> &str {
    email.rsplit_once('@').map(|(_, domain)| domain).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::domain_of;

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("user@example.com"), "example.com");
        assert_eq!(domain_of("a@b@example.org"), "example.org");
        assert_eq!(domain_of("no-at-sign"), "");
        assert_eq!(domain_of("trailing@"), "");
    }
}
