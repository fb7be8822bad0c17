use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    InvalidFormat,
    InvalidTld,
    InvalidMx,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::InvalidFormat => "invalid_format",
            Self::InvalidTld => "invalid_tld",
            Self::InvalidMx => "invalid_mx",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Validation Result
///
/// Immutable verdict for a single email address.
///
/// ## Fields
/// - `email`: the input exactly as the caller supplied it
/// - `status`: one of `valid`, `invalid_format`, `invalid_tld`, `invalid_mx`
/// - `reason`: explanation; always present for failures, and for the rare
///   `valid` verdicts that needed a fallback to be reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    email: String,
    status: ValidationStatus,
    reason: Option<String>,
}

impl ValidationResult {
    pub fn valid(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            status: ValidationStatus::Valid,
            reason: None,
        }
    }

    /// A `valid` verdict that still carries an explanation.
    pub fn valid_because(email: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            status: ValidationStatus::Valid,
            reason: Some(reason.into()),
        }
    }

    pub fn invalid_format(email: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::failure(email, ValidationStatus::InvalidFormat, reason)
    }

    pub fn invalid_tld(email: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::failure(email, ValidationStatus::InvalidTld, reason)
    }

    pub fn invalid_mx(email: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::failure(email, ValidationStatus::InvalidMx, reason)
    }

    /// Rebuilds a verdict from its parts, e.g. when replaying a cached one.
    pub fn from_parts(
        email: impl Into<String>,
        status: ValidationStatus,
        reason: Option<String>,
    ) -> Self {
        Self {
            email: email.into(),
            status,
            reason,
        }
    }

    fn failure(
        email: impl Into<String>,
        status: ValidationStatus,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            status,
            reason: Some(reason.into()),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn status(&self) -> ValidationStatus {
        self.status
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }
}
