use super::source::{ParsedTldList, parse_tld_list};
use crate::error::TldSourceError;
use std::fs;
use std::path::Path;

const EMBEDDED_LIST: &str = include_str!("../../../data/fallback_tlds.txt");

/// Every fallback list in use must contain these.
pub const REQUIRED_TLDS: [&str; 3] = ["COM", "ORG", "NET"];

/// Last-resort TLD list used in degraded mode.
///
/// Ships as a data file compiled into the binary; a deployment can point
/// `TLD_FALLBACK_PATH` at its own copy instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackTlds {
    list: ParsedTldList,
}

impl FallbackTlds {
    pub fn embedded() -> Self {
        Self::from_text(EMBEDDED_LIST)
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            list: parse_tld_list(text),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TldSourceError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| TldSourceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_text(&text))
    }

    /// Embedded list unless `path` is set; an unreadable or empty file, or
    /// one missing any of [`REQUIRED_TLDS`], also falls back to the embedded
    /// list.
    pub fn load(path: Option<&str>) -> Self {
        let Some(path) = path else {
            return Self::embedded();
        };

        match Self::from_file(path) {
            Ok(list) if list.is_empty() => {
                tracing::warn!(path, "fallback TLD file is empty, using embedded list");
                Self::embedded()
            }
            Ok(list) => match list.missing_required() {
                None => list,
                Some(tld) => {
                    tracing::warn!(path, missing = tld, "fallback TLD file lacks a core TLD, using embedded list");
                    Self::embedded()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "using embedded fallback TLD list");
                Self::embedded()
            }
        }
    }

    pub fn contains(&self, tld: &str) -> bool {
        self.list.tlds.iter().any(|t| t.eq_ignore_ascii_case(tld))
    }

    fn missing_required(&self) -> Option<&'static str> {
        REQUIRED_TLDS.into_iter().find(|tld| !self.contains(tld))
    }

    pub fn tlds(&self) -> &[String] {
        &self.list.tlds
    }

    pub fn version(&self) -> &str {
        self.list.version.as_deref().unwrap_or("embedded")
    }

    pub fn len(&self) -> usize {
        self.list.tlds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.tlds.is_empty()
    }
}

impl Default for FallbackTlds {
    fn default() -> Self {
        Self::embedded()
    }
}
