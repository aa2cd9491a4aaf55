//! Aggregation: deterministic ordering, groupings, and the overall risk
//! score.

use std::collections::BTreeMap;

use crate::finding::Finding;

/// Sort findings by (severity in declared order, risk score descending,
/// relative path ascending). This is the output order for every report
/// format.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| b.risk_score.cmp(&a.risk_score))
            .then_with(|| a.relative_path.cmp(&b.relative_path))
            .then_with(|| a.line.cmp(&b.line))
            .then_with(|| a.rule_id.cmp(&b.rule_id))
    });
}

/// `round(min(100, ln(1 + sum_of_weights) * 15))`.
pub fn overall_risk_score(findings: &[Finding]) -> u8 {
    let weight_sum: u64 = findings.iter().map(|f| f.severity.weight() as u64).sum();
    let score = ((1.0 + weight_sum as f64).ln() * 15.0).min(100.0);
    score.round() as u8
}

/// Finding counts keyed by severity name.
pub fn severity_counts(findings: &[Finding]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for finding in findings {
        *counts.entry(finding.severity.to_string()).or_default() += 1;
    }
    counts
}

/// Finding counts keyed by category name.
pub fn category_counts(findings: &[Finding]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for finding in findings {
        *counts.entry(finding.category.to_string()).or_default() += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::ContextLine;
    use chrono::Utc;
    use ferret_rules::{Severity, ThreatCategory};
    use std::path::PathBuf;

    fn finding(severity: Severity, risk: u8, rel: &str) -> Finding {
        Finding {
            rule_id: "TEST-001".to_string(),
            rule_name: "t".to_string(),
            severity,
            category: ThreatCategory::Credentials,
            path: PathBuf::from(format!("/scan/{rel}")),
            relative_path: rel.to_string(),
            line: 1,
            column: None,
            matched: "m".to_string(),
            context: vec![ContextLine {
                line_number: 1,
                content: "m".to_string(),
                is_match: true,
            }],
            remediation: String::new(),
            metadata: None,
            timestamp: Utc::now(),
            risk_score: risk,
        }
    }

    #[test]
    fn sort_order_severity_then_risk_then_path() {
        let mut findings = vec![
            finding(Severity::Low, 25, "a.md"),
            finding(Severity::Critical, 100, "z.md"),
            finding(Severity::High, 90, "b.md"),
            finding(Severity::High, 75, "a.md"),
            finding(Severity::High, 90, "a.md"),
        ];
        sort_findings(&mut findings);
        let order: Vec<(Severity, u8, &str)> = findings
            .iter()
            .map(|f| (f.severity, f.risk_score, f.relative_path.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (Severity::Critical, 100, "z.md"),
                (Severity::High, 90, "a.md"),
                (Severity::High, 90, "b.md"),
                (Severity::High, 75, "a.md"),
                (Severity::Low, 25, "a.md"),
            ]
        );
    }

    #[test]
    fn risk_score_empty_is_zero() {
        assert_eq!(overall_risk_score(&[]), 0);
    }

    #[test]
    fn risk_score_single_high() {
        // ln(76) * 15 = 64.96... -> 65
        let findings = vec![finding(Severity::High, 75, "a.md")];
        assert_eq!(overall_risk_score(&findings), 65);
    }

    #[test]
    fn risk_score_saturates_at_100() {
        let findings: Vec<Finding> = (0..20)
            .map(|i| finding(Severity::Critical, 100, &format!("f{i}.md")))
            .collect();
        assert_eq!(overall_risk_score(&findings), 100);
    }

    #[test]
    fn counts_by_severity() {
        let findings = vec![
            finding(Severity::High, 75, "a.md"),
            finding(Severity::High, 75, "b.md"),
            finding(Severity::Info, 10, "c.md"),
        ];
        let counts = severity_counts(&findings);
        assert_eq!(counts["high"], 2);
        assert_eq!(counts["info"], 1);
    }
}
