//! Documentation dampening.
//!
//! A lone CRED-001 critical in a documentation-like path is usually an
//! illustrative key, not a live one. It drops to MEDIUM unless the same
//! file also shows exfiltration/backdoor/injection signals.

use std::collections::HashSet;

use ferret_rules::{Severity, ThreatCategory};

use crate::finding::Finding;

const DAMPENED_RULE: &str = "CRED-001";

const DOC_STEMS: &[&str] = &["readme", "changelog", "contributing", "license"];

const DOC_DIRS: &[&str] = &["references", "docs", "examples"];

/// Categories that corroborate a credential finding: their presence in the
/// same file blocks the downgrade.
const CORROBORATING: [ThreatCategory; 3] = [
    ThreatCategory::Exfiltration,
    ThreatCategory::Backdoors,
    ThreatCategory::Injection,
];

/// Whether a relative path looks like documentation.
pub fn is_documentation_path(relative_path: &str) -> bool {
    let segments: Vec<&str> = relative_path.split('/').filter(|s| !s.is_empty()).collect();
    let file_name = segments.last().copied().unwrap_or("");
    let stem = file_name
        .split('.')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    if DOC_STEMS.contains(&stem.as_str()) {
        return true;
    }
    let dirs = &segments[..segments.len().saturating_sub(1)];
    if dirs.iter().any(|s| DOC_DIRS.contains(&s.to_ascii_lowercase().as_str())) {
        return true;
    }
    // Marketplace trees are third-party documentation from the scanner's
    // point of view.
    dirs.windows(3)
        .any(|w| w == [".claude", "plugins", "marketplaces"])
}

/// Apply the dampening pass in place.
pub fn apply(findings: &mut [Finding]) {
    let corroborated: HashSet<String> = findings
        .iter()
        .filter(|f| CORROBORATING.contains(&f.category))
        .map(|f| f.relative_path.clone())
        .collect();

    for finding in findings.iter_mut() {
        if finding.rule_id != DAMPENED_RULE || finding.severity != Severity::Critical {
            continue;
        }
        if !is_documentation_path(&finding.relative_path) {
            continue;
        }
        if corroborated.contains(&finding.relative_path) {
            continue;
        }
        finding.severity = Severity::Medium;
        finding.risk_score = Severity::Medium.weight() as u8;
        finding.set_metadata(
            "dampening",
            serde_json::json!({
                "fromSeverity": "critical",
                "reason": "credential pattern in documentation-like path with no corroborating findings",
            }),
        );
        tracing::debug!(
            path = %finding.relative_path,
            line = finding.line,
            "dampened CRED-001 critical to medium"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::ContextLine;
    use chrono::Utc;
    use std::path::PathBuf;

    fn finding(rule_id: &str, category: ThreatCategory, severity: Severity, rel: &str) -> Finding {
        Finding {
            rule_id: rule_id.to_string(),
            rule_name: "t".to_string(),
            severity,
            category,
            path: PathBuf::from(format!("/scan/{rel}")),
            relative_path: rel.to_string(),
            line: 1,
            column: None,
            matched: "sk-something".to_string(),
            context: vec![ContextLine {
                line_number: 1,
                content: "sk-something".to_string(),
                is_match: true,
            }],
            remediation: String::new(),
            metadata: None,
            timestamp: Utc::now(),
            risk_score: severity.weight() as u8,
        }
    }

    #[test]
    fn documentation_path_detection() {
        assert!(is_documentation_path("README.md"));
        assert!(is_documentation_path("pkg/CHANGELOG.md"));
        assert!(is_documentation_path("docs/setup.md"));
        assert!(is_documentation_path("x/references/api.md"));
        assert!(is_documentation_path("examples/demo.sh"));
        assert!(is_documentation_path(
            ".claude/plugins/marketplaces/shop/widget/guide.md"
        ));
        assert!(!is_documentation_path(".claude/hooks/run.sh"));
        assert!(!is_documentation_path("src/config.json"));
    }

    #[test]
    fn lone_critical_in_docs_downgrades() {
        let mut findings = vec![finding(
            "CRED-001",
            ThreatCategory::Credentials,
            Severity::Critical,
            ".claude/plugins/marketplaces/shop/widget/README.md",
        )];
        apply(&mut findings);
        assert_eq!(findings[0].severity, Severity::Medium);
        let dampening = &findings[0].metadata.as_ref().unwrap()["dampening"];
        assert_eq!(dampening["fromSeverity"], "critical");
    }

    #[test]
    fn corroborated_critical_stays() {
        let rel = ".claude/plugins/marketplaces/shop/widget/README.md";
        let mut findings = vec![
            finding("CRED-001", ThreatCategory::Credentials, Severity::Critical, rel),
            finding("EXFIL-001", ThreatCategory::Exfiltration, Severity::High, rel),
        ];
        apply(&mut findings);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert!(findings[0].metadata.is_none());
    }

    #[test]
    fn corroboration_in_other_file_does_not_block() {
        let mut findings = vec![
            finding(
                "CRED-001",
                ThreatCategory::Credentials,
                Severity::Critical,
                "docs/README.md",
            ),
            finding(
                "EXFIL-001",
                ThreatCategory::Exfiltration,
                Severity::High,
                "hooks/run.sh",
            ),
        ];
        apply(&mut findings);
        assert_eq!(findings[0].severity, Severity::Medium);
    }

    #[test]
    fn non_doc_path_untouched() {
        let mut findings = vec![finding(
            "CRED-001",
            ThreatCategory::Credentials,
            Severity::Critical,
            ".claude/hooks/deploy.sh",
        )];
        apply(&mut findings);
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[test]
    fn other_rules_untouched() {
        let mut findings = vec![finding(
            "CRED-002",
            ThreatCategory::Credentials,
            Severity::Critical,
            "README.md",
        )];
        apply(&mut findings);
        assert_eq!(findings[0].severity, Severity::Critical);
    }
}
