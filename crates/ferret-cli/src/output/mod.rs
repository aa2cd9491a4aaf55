//! Report renderers. Each takes a finished [`ScanResult`] and produces a
//! string; writing to stdout or a file is the caller's business.

pub mod console;
pub mod csv;
pub mod html;
pub mod json;
pub mod sarif;

use ferret_core::{Finding, ThreatCategory};

/// The snippet shown for a finding. Credential matches are redacted unless
/// redaction is off; the entropy analyzer redacts at the source already.
pub fn display_match(finding: &Finding, redact: bool) -> String {
    if redact
        && finding.category == ThreatCategory::Credentials
        && finding.rule_id != "ENTROPY-001"
    {
        finding.redacted_match()
    } else {
        finding.matched.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ferret_core::{ContextLine, Severity};
    use std::path::PathBuf;

    fn sample_finding(rule_id: &str, category: ThreatCategory) -> Finding {
        Finding {
            rule_id: rule_id.to_string(),
            rule_name: "sample".to_string(),
            severity: Severity::High,
            category,
            path: PathBuf::from("/scan/a.sh"),
            relative_path: "a.sh".to_string(),
            line: 3,
            column: Some(1),
            matched: "api_key = \"abcdef0123456789\"".to_string(),
            context: vec![ContextLine {
                line_number: 3,
                content: "api_key = \"abcdef0123456789\"".to_string(),
                is_match: true,
            }],
            remediation: "rotate it".to_string(),
            metadata: None,
            timestamp: Utc::now(),
            risk_score: 75,
        }
    }

    #[test]
    fn credentials_redacted_by_default() {
        let finding = sample_finding("CRED-005", ThreatCategory::Credentials);
        let shown = display_match(&finding, true);
        assert!(shown.contains('*'));
        assert!(!shown.contains("abcdef0123456789"));
    }

    #[test]
    fn redaction_can_be_disabled() {
        let finding = sample_finding("CRED-005", ThreatCategory::Credentials);
        assert_eq!(display_match(&finding, false), finding.matched);
    }

    #[test]
    fn non_credentials_never_redacted() {
        let finding = sample_finding("INJ-001", ThreatCategory::Injection);
        assert_eq!(display_match(&finding, true), finding.matched);
    }
}
