use super::resolver::MxRecord;

pub const MAX_DOMAIN_LEN: usize = 253;

/// Cheap structural check run before any DNS traffic.
///
/// Letters, digits, `.` and `-` only; no leading/trailing `.` or `-`; no
/// `..` or `--` anywhere in the name.
pub fn is_lookup_candidate(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN {
        return false;
    }
    if !domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return false;
    }
    if domain.starts_with(['.', '-']) || domain.ends_with(['.', '-']) {
        return false;
    }

    !domain.contains("..") && !domain.contains("--")
}

/// RFC 7505: a single `.` exchange at preference 0 means "no mail here".
pub fn is_null_mx(record: &MxRecord) -> bool {
    record.preference == 0 && record.exchange == "."
}

fn is_usable(record: &MxRecord, max_priority: u16) -> bool {
    record.preference <= max_priority
        && !is_null_mx(record)
        && !record.exchange.trim_end_matches('.').trim().is_empty()
}

/// Outcome of sifting the MX answer for a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MxSelection<'a> {
    /// Lowest-preference usable record; ties keep answer order.
    Primary(&'a MxRecord),
    /// The domain publishes only a null MX.
    NullMx,
    /// Every record was over the priority bound or had no host.
    AllRejected,
}

pub fn select_primary(records: &[MxRecord], max_priority: u16) -> MxSelection<'_> {
    let primary = records
        .iter()
        .filter(|record| is_usable(record, max_priority))
        .min_by_key(|record| record.preference);

    match primary {
        Some(record) => MxSelection::Primary(record),
        None if !records.is_empty() && records.iter().all(is_null_mx) => MxSelection::NullMx,
        None => MxSelection::AllRejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_candidate_accepts_ordinary_domains() {
        for domain in ["example.com", "mail-1.example.co.uk", "a-b.c-d.org", "a.b"] {
            assert!(is_lookup_candidate(domain), "{}", domain);
        }
    }

    #[test]
    fn test_lookup_candidate_rejects_garbage() {
        for domain in [
            "",
            ".example.com",
            "example.com.",
            "-example.com",
            "example.com-",
            "exa..mple.com",
            "exa--mple.com",
            "exam_ple.com",
            "exa mple.com",
            "exämple.com",
        ] {
            assert!(!is_lookup_candidate(domain), "{}", domain);
        }
        assert!(!is_lookup_candidate(&format!("{}.com", "a".repeat(250))));
    }

    #[test]
    fn test_lookup_candidate_rejects_doubled_dash_in_any_label() {
        for domain in ["xn--e1afmkfd.xn--p1ai", "xn--80ak6aa92e.com", "example.xn--p1ai"] {
            assert!(!is_lookup_candidate(domain), "{}", domain);
        }
    }

    #[test]
    fn test_select_lowest_preference() {
        let records = vec![
            MxRecord::new(20, "mx2.example.com"),
            MxRecord::new(5, "mx1.example.com"),
            MxRecord::new(30, "mx3.example.com"),
        ];
        assert_eq!(
            select_primary(&records, 50_000),
            MxSelection::Primary(&records[1])
        );
    }

    #[test]
    fn test_ties_keep_answer_order() {
        let records = vec![
            MxRecord::new(10, "first.example.com"),
            MxRecord::new(10, "second.example.com"),
        ];
        match select_primary(&records, 50_000) {
            MxSelection::Primary(record) => assert_eq!(record.exchange, "first.example.com"),
            other => panic!("expected primary, got {:?}", other),
        }
    }

    #[test]
    fn test_over_bound_and_empty_hosts_are_skipped() {
        let records = vec![
            MxRecord::new(60_000, "too-high.example.com"),
            MxRecord::new(1, ""),
            MxRecord::new(40, "ok.example.com"),
        ];
        match select_primary(&records, 50_000) {
            MxSelection::Primary(record) => assert_eq!(record.exchange, "ok.example.com"),
            other => panic!("expected primary, got {:?}", other),
        }
    }

    #[test]
    fn test_all_records_over_bound() {
        let records = vec![
            MxRecord::new(60_000, "a.example.com"),
            MxRecord::new(65_535, "b.example.com"),
        ];
        assert_eq!(select_primary(&records, 50_000), MxSelection::AllRejected);
    }

    #[test]
    fn test_null_mx() {
        let records = vec![MxRecord::new(0, ".")];
        assert_eq!(select_primary(&records, 50_000), MxSelection::NullMx);

        let mixed = vec![MxRecord::new(0, "."), MxRecord::new(10, "mx.example.com")];
        assert!(matches!(select_primary(&mixed, 50_000), MxSelection::Primary(_)));
    }
}
