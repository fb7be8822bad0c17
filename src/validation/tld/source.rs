use crate::error::TldSourceError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;

const USER_AGENT: &str = concat!(
    "email-gatekeeper/",
    env!("CARGO_PKG_VERSION"),
    " (TLD list sync)"
);

/// Where the canonical TLD list comes from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TldSource: Send + Sync {
    /// Raw list body: one TLD per line, `#` comments.
    async fn fetch(&self) -> Result<String, TldSourceError>;
}

/// Downloads the list over HTTP(S), by default from IANA.
#[derive(Debug, Clone)]
pub struct HttpTldSource {
    client: reqwest::Client,
    url: String,
}

impl HttpTldSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TldSourceError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TldSource for HttpTldSource {
    async fn fetch(&self) -> Result<String, TldSourceError> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(TldSourceError::Status(response.status().as_u16()));
        }

        Ok(response.text().await?)
    }
}

/// A parsed TLD list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTldList {
    /// From a `# Version ...` header line, when there is one.
    pub version: Option<String>,
    /// Uppercased entries in file order, without duplicates.
    pub tlds: Vec<String>,
}

/// Parses line-oriented TLD text. Blank lines and `#` comments are skipped.
pub fn parse_tld_list(body: &str) -> ParsedTldList {
    let mut version = None;
    let mut tlds: Vec<String> = Vec::new();
    let mut seen = HashSet::new();

    for line in body.lines().map(str::trim) {
        if let Some(comment) = line.strip_prefix('#') {
            if version.is_none() {
                version = parse_version(comment);
            }
            continue;
        }
        if line.is_empty() {
            continue;
        }

        let tld = line.to_ascii_uppercase();
        if seen.insert(tld.clone()) {
            tlds.push(tld);
        }
    }

    ParsedTldList { version, tlds }
}

fn parse_version(comment: &str) -> Option<String> {
    let rest = comment.trim().strip_prefix("Version")?;
    let version = rest
        .trim()
        .split(|c: char| c == ',' || c.is_whitespace())
        .next()?;
    (!version.is_empty()).then(|| version.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const IANA_SAMPLE: &str = "# Version 2024031000, Last Updated Sun Mar 10 07:07:01 2024 UTC\n\
                               AAA\n\
                               aarp\n\
                               \n\
                               COM\n\
                               # trailing comment\n\
                               XN--P1AI\n\
                               com\n";

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let parsed = parse_tld_list(IANA_SAMPLE);
        assert_eq!(parsed.tlds, vec!["AAA", "AARP", "COM", "XN--P1AI"]);
    }

    #[test]
    fn test_parse_reads_version_header() {
        let parsed = parse_tld_list(IANA_SAMPLE);
        assert_eq!(parsed.version.as_deref(), Some("2024031000"));
    }

    #[test]
    fn test_parse_without_version() {
        let parsed = parse_tld_list("# just a note\ncom\norg\n");
        assert_eq!(parsed.version, None);
        assert_eq!(parsed.tlds.len(), 2);
    }

    #[test]
    fn test_parse_empty_body() {
        let parsed = parse_tld_list("");
        assert!(parsed.tlds.is_empty());
    }

    #[test]
    fn test_http_source_builds() {
        let source = HttpTldSource::new("https://example.invalid/tlds.txt", Duration::from_secs(1));
        assert_eq!(source.unwrap().url(), "https://example.invalid/tlds.txt");
    }
}
