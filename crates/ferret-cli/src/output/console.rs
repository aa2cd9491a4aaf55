//! Console renderer.

use colored::Colorize;

use ferret_core::{ScanResult, Severity};

fn severity_label(severity: Severity, color: bool) -> String {
    let label = severity.to_string().to_uppercase();
    if !color {
        return label;
    }
    match severity {
        Severity::Critical => label.as_str().red().bold().to_string(),
        Severity::High => label.as_str().red().to_string(),
        Severity::Medium => label.as_str().yellow().to_string(),
        Severity::Low => label.as_str().cyan().to_string(),
        Severity::Info => label.as_str().dimmed().to_string(),
    }
}

/// Render the scan result for a terminal. `color` is off in CI mode.
pub fn render(result: &ScanResult, redact: bool, color: bool) -> String {
    let mut out = String::new();

    let header = format!(
        "ferret-scan: {} files analyzed, {} skipped in {}ms",
        result.analyzed_files, result.skipped_files, result.duration_ms
    );
    out.push_str(&header);
    out.push('\n');

    if result.findings.is_empty() {
        let line = if color {
            "No findings.".green().to_string()
        } else {
            "No findings.".to_string()
        };
        out.push_str(&line);
        out.push('\n');
    } else {
        out.push('\n');
        for finding in &result.findings {
            out.push_str(&format!(
                "{} {} [{}] {}:{}\n",
                severity_label(finding.severity, color),
                finding.rule_id,
                finding.category,
                finding.relative_path,
                finding.line
            ));
            out.push_str(&format!(
                "  {} (risk {})\n",
                finding.rule_name, finding.risk_score
            ));
            let shown_match = super::display_match(finding, redact);
            out.push_str(&format!("  match: {shown_match}\n"));
            for context_line in &finding.context {
                let marker = if context_line.is_match { ">" } else { " " };
                // Keep redaction consistent: the raw match must not leak
                // back in through the context window.
                let content = if shown_match == finding.matched {
                    context_line.content.clone()
                } else {
                    context_line.content.replace(&finding.matched, &shown_match)
                };
                out.push_str(&format!(
                    "  {marker} {:>4} | {content}\n",
                    context_line.line_number
                ));
            }
            if !finding.remediation.is_empty() {
                out.push_str(&format!("  fix: {}\n", finding.remediation));
            }
            out.push('\n');
        }
    }

    let s = &result.summary;
    out.push_str(&format!(
        "summary: {} total ({} critical, {} high, {} medium, {} low, {} info)\n",
        s.total, s.critical, s.high, s.medium, s.low, s.info
    ));
    out.push_str(&format!("overall risk score: {}\n", result.overall_risk_score));
    if result.ignored_findings > 0 {
        out.push_str(&format!(
            "{} finding(s) suppressed by inline directives\n",
            result.ignored_findings
        ));
    }
    if result.baseline_suppressed > 0 {
        out.push_str(&format!(
            "{} finding(s) suppressed by baseline\n",
            result.baseline_suppressed
        ));
    }
    if !result.errors.is_empty() {
        out.push_str(&format!("{} non-fatal error(s):\n", result.errors.len()));
        for issue in &result.errors {
            match &issue.path {
                Some(path) => out.push_str(&format!("  - {path}: {}\n", issue.message)),
                None => out.push_str(&format!("  - {}\n", issue.message)),
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ferret_core::{ContextLine, Finding, ScanSummary, ThreatCategory};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn result_with_finding() -> ScanResult {
        let findings = vec![Finding {
            rule_id: "CRED-005".to_string(),
            rule_name: "Hardcoded key assignment".to_string(),
            severity: Severity::High,
            category: ThreatCategory::Credentials,
            path: PathBuf::from("/scan/deploy.sh"),
            relative_path: "deploy.sh".to_string(),
            line: 2,
            column: Some(1),
            matched: "api_key = \"abcdefghijklmnop\"".to_string(),
            context: vec![
                ContextLine {
                    line_number: 1,
                    content: "#!/bin/sh".to_string(),
                    is_match: false,
                },
                ContextLine {
                    line_number: 2,
                    content: "api_key = \"abcdefghijklmnop\"".to_string(),
                    is_match: true,
                },
            ],
            remediation: "use an env var".to_string(),
            metadata: None,
            timestamp: Utc::now(),
            risk_score: 75,
        }];
        let summary = ScanSummary::from_findings(&findings);
        ScanResult {
            success: true,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            duration_ms: 5,
            scanned_paths: vec![PathBuf::from(".")],
            total_files: 1,
            analyzed_files: 1,
            skipped_files: 0,
            by_severity: BTreeMap::new(),
            by_category: BTreeMap::new(),
            overall_risk_score: 65,
            summary,
            errors: vec![],
            ignored_findings: 0,
            baseline_suppressed: 0,
            findings,
        }
    }

    #[test]
    fn plain_render_has_location_and_summary() {
        let out = render(&result_with_finding(), true, false);
        assert!(out.contains("CRED-005"));
        assert!(out.contains("deploy.sh:2"));
        assert!(out.contains("summary: 1 total"));
        assert!(out.contains("overall risk score: 65"));
    }

    #[test]
    fn redaction_applies_to_console() {
        let out = render(&result_with_finding(), true, false);
        assert!(!out.contains("abcdefghijklmnop"), "secret leaked: {out}");
        let raw = render(&result_with_finding(), false, false);
        assert!(raw.contains("abcdefghijklmnop"));
    }

    #[test]
    fn context_marks_match_line() {
        let out = render(&result_with_finding(), true, false);
        assert!(out.contains(">    2 |"));
        assert!(out.contains("     1 |"));
    }
}
