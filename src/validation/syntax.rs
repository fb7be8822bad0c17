use super::EmailValidator;
use crate::models::ValidationResult;
use async_trait::async_trait;
use std::net::{IpAddr, Ipv6Addr};

pub const MAX_LOCAL_PART_LEN: usize = 64;
pub const MAX_DOMAIN_LEN: usize = 253;

/// Structural email check: no network, no cache, fully deterministic.
///
/// Rules, first failure wins:
/// 1. input must not be empty or whitespace only
/// 2. exactly one `@`
/// 3. local part: non-empty, at most 64 bytes, no `..`, no leading/trailing `.`
/// 4. domain: non-empty, at most 253 bytes, no `..`, no leading/trailing `.`,
///    at least one `.`
/// 5. the address must also pass an RFC 5322 parser as a second opinion
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxValidator;

impl SyntaxValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, email: &str) -> ValidationResult {
        match structural_error(email) {
            Some(reason) => ValidationResult::invalid_format(email, reason),
            None if !is_rfc5322_address(email) => ValidationResult::invalid_format(
                email,
                "Email address does not conform to RFC 5322 format",
            ),
            None => ValidationResult::valid(email),
        }
    }
}

#[async_trait]
impl EmailValidator for SyntaxValidator {
    async fn validate(&self, email: &str) -> ValidationResult {
        self.check(email)
    }
}

fn structural_error(email: &str) -> Option<String> {
    if email.trim().is_empty() {
        return Some("Email address is empty".to_string());
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Some("Email must contain exactly one @ symbol".to_string()),
    };

    local_part_error(local).or_else(|| domain_part_error(domain))
}

fn local_part_error(local: &str) -> Option<String> {
    if local.is_empty() {
        Some("Local part is empty".to_string())
    } else if local.len() > MAX_LOCAL_PART_LEN {
        Some(format!(
            "Local part exceeds {} characters",
            MAX_LOCAL_PART_LEN
        ))
    } else if local.contains("..") {
        Some("Local part contains consecutive dots".to_string())
    } else if local.starts_with('.') || local.ends_with('.') {
        Some("Local part cannot start or end with a dot".to_string())
    } else {
        None
    }
}

fn domain_part_error(domain: &str) -> Option<String> {
    if domain.is_empty() {
        Some("Domain part is empty".to_string())
    } else if domain.len() > MAX_DOMAIN_LEN {
        Some(format!("Domain part exceeds {} characters", MAX_DOMAIN_LEN))
    } else if domain.contains("..") {
        Some("Domain part contains consecutive dots".to_string())
    } else if domain.starts_with('.') || domain.ends_with('.') {
        Some("Domain part cannot start or end with a dot".to_string())
    } else if !domain.contains('.') {
        Some("Domain part must contain at least one dot".to_string())
    } else {
        None
    }
}

// RFC 5322 / RFC 6531 parser used as the second opinion. It understands
// quoted local parts, domain literals and internationalized labels, so it
// only disagrees with the rules above on genuinely malformed input.

/// `true` if `email` parses as an RFC 5322 address (UTF-8 allowed).
pub fn is_rfc5322_address(email: &str) -> bool {
    // RFC 5321 path limit
    if email.len() > 254 {
        return false;
    }

    let Some(at) = unquoted_at(email) else {
        return false;
    };
    let (local, domain) = (&email[..at], &email[at + 1..]);

    local.len() <= MAX_LOCAL_PART_LEN && is_local_part(local) && is_domain(domain)
}

/// Byte offset of the first `@` outside a quoted string.
fn unquoted_at(email: &str) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in email.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '@' if !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

fn is_local_part(local: &str) -> bool {
    if local.len() >= 2 && local.starts_with('"') && local.ends_with('"') {
        is_quoted_string(&local[1..local.len() - 1])
    } else {
        is_dot_atom(local, false)
    }
}

fn is_domain(domain: &str) -> bool {
    match domain.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(literal) => is_domain_literal(literal),
        None => domain.split('.').all(|label| {
            label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && is_dot_atom(label, true)
        }),
    }
}

fn is_quoted_string(content: &str) -> bool {
    let mut escaped = false;

    for c in content.chars() {
        if escaped {
            if !matches!(c, '\\' | '"') {
                return false;
            }
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return false;
        }
    }
    !escaped
}

fn is_dot_atom(s: &str, is_domain: bool) -> bool {
    s.split('.').all(|atom| {
        !atom.is_empty()
            && atom.chars().all(|c| {
                c.is_alphanumeric()
                    || c == '-'
                    || (!is_domain && "!#$%&'*+/=?^_`{|}~".contains(c))
            })
    })
}

fn is_domain_literal(literal: &str) -> bool {
    literal.parse::<IpAddr>().is_ok()
        || literal
            .strip_prefix("IPv6:")
            .is_some_and(|ip| ip.parse::<Ipv6Addr>().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationStatus;

    fn status(email: &str) -> ValidationStatus {
        SyntaxValidator::new().check(email).status()
    }

    fn reason(email: &str) -> String {
        SyntaxValidator::new()
            .check(email)
            .reason()
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn valid_standard_emails() {
        for email in [
            "simple@example.com",
            "very.common@example.com",
            "x@example.com",
            "user.name+tag@example.co.uk",
            "USER@EXAMPLE.COM",
        ] {
            assert_eq!(status(email), ValidationStatus::Valid, "{}", email);
        }
    }

    #[test]
    fn valid_international() {
        assert_eq!(status("Pelé@exämple.中国"), ValidationStatus::Valid);
        assert_eq!(status("用户@例子.中国"), ValidationStatus::Valid);
    }

    #[test]
    fn valid_result_has_no_reason() {
        let result = SyntaxValidator::new().check("user@example.com");
        assert!(result.is_valid());
        assert_eq!(result.reason(), None);
        assert_eq!(result.email(), "user@example.com");
    }

    #[test]
    fn invalid_empty_input() {
        assert_eq!(status(""), ValidationStatus::InvalidFormat);
        assert_eq!(status("   "), ValidationStatus::InvalidFormat);
        assert!(reason("  ").contains("empty"));
    }

    #[test]
    fn invalid_at_count() {
        assert_eq!(status("user@@double.com"), ValidationStatus::InvalidFormat);
        assert!(reason("user@@double.com").contains("exactly one @"));
        assert!(reason("missing.example.com").contains("exactly one @"));
        assert!(reason("a@b@c.com").contains("exactly one @"));
    }

    #[test]
    fn invalid_local_parts() {
        assert!(reason("@example.com").contains("Local part is empty"));
        assert!(reason(".leading@domain.com").contains("start or end with a dot"));
        assert!(reason("trailing.@domain.com").contains("start or end with a dot"));
        assert!(reason("no..dots@example.com").contains("consecutive dots"));

        let long_local = format!("{}@example.com", "a".repeat(65));
        assert!(reason(&long_local).contains("exceeds 64"));
        let max_local = format!("{}@example.com", "a".repeat(64));
        assert_eq!(status(&max_local), ValidationStatus::Valid);
    }

    #[test]
    fn invalid_domain_parts() {
        assert!(reason("user@").contains("Domain part is empty"));
        assert!(reason("user@localhost").contains("at least one dot"));
        assert!(reason("user@.leadingdot.com").contains("start or end with a dot"));
        assert!(reason("user@trailingdot.com.").contains("start or end with a dot"));
        assert!(reason("user@double..dot.com").contains("consecutive dots"));

        let long_domain = format!("user@{}.com", "a".repeat(250));
        assert!(reason(&long_domain).contains("exceeds 253"));
    }

    #[test]
    fn second_opinion_catches_bad_characters() {
        for email in [
            "user@-hyphenstart.com",
            "user@hyphenend-.com",
            "user@_invalidchar.com",
            "spaces unquoted@example.com",
            "un\"quoted@example.com",
        ] {
            assert_eq!(status(email), ValidationStatus::InvalidFormat, "{}", email);
            assert!(reason(email).contains("RFC 5322"), "{}", email);
        }
    }

    #[test]
    fn rfc_parser_accepts_quoted_and_literal_forms() {
        assert!(is_rfc5322_address("\"with space\"@example.com"));
        assert!(is_rfc5322_address("\"escaped\\\"quote\"@example.com"));
        assert!(is_rfc5322_address("user@[192.168.0.1]"));
        assert!(is_rfc5322_address("user@[IPv6:2001:db8::1]"));
        assert!(!is_rfc5322_address("user@[192.168.0.256]"));
        assert!(!is_rfc5322_address("\"invalid\\escape\"@example.com"));
        assert!(!is_rfc5322_address("\"unbalanced@example.com"));
    }

    #[test]
    fn rfc_parser_enforces_total_length() {
        let local = "a".repeat(64);
        let label = "b".repeat(63);
        let domain = format!("{}.{}.{}", label, label, "c".repeat(61));
        assert!(is_rfc5322_address(&format!("{}@{}", local, domain)));
        assert!(!is_rfc5322_address(&format!("{}@{}x", local, domain)));
    }

    #[tokio::test]
    async fn trait_delegates_to_check() {
        let validator = SyntaxValidator::new();
        let via_trait = validator.validate("user@@double.com").await;
        assert_eq!(via_trait, validator.check("user@@double.com"));
    }
}
