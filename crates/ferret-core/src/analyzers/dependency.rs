//! Dependency analysis for package manifests (DEP-001 to DEP-005).

use chrono::Utc;
use serde_json::Value;

use ferret_rules::{Severity, ThreatCategory};

use crate::discovery::DiscoveredFile;
use crate::errors::{IssueKind, ScanIssue};
use crate::finding::{ContextLine, Finding};
use crate::matcher::LineIndex;

/// Package names with a documented history of typosquatting or compromise.
const RISKY_PACKAGE_NAMES: &[&str] = &[
    "crossenv",
    "cross-env.js",
    "lodahs",
    "loadsh",
    "electorn",
    "expresss",
    "reqest",
    "requst",
    "mongose",
    "babelcli",
    "node-fabric",
    "nodefabric",
    "noblox.js-proxy",
    "flatmap-stream",
    "event-stream-compat",
    "ua-parser.js",
    "coa-utils",
];

const DEP_SECTIONS: &[&str] = &["dependencies", "devDependencies", "optionalDependencies"];

const INSTALL_SCRIPT_KEYS: &[&str] = &["preinstall", "install", "postinstall", "prepare"];

/// Analyze a `package.json`. The optional audit shell-out is separate
/// ([`run_audit`]) and disabled by default.
pub fn analyze(
    file: &DiscoveredFile,
    content: &str,
    index: &LineIndex,
) -> (Vec<Finding>, Vec<ScanIssue>) {
    let mut findings = Vec::new();
    let mut issues = Vec::new();

    if file.path.file_name().and_then(|n| n.to_str()) != Some("package.json") {
        return (findings, issues);
    }

    let root: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => {
            issues.push(
                ScanIssue::new(IssueKind::Validation, format!("invalid package.json: {e}"))
                    .with_path(file.relative_path.clone()),
            );
            return (findings, issues);
        }
    };

    for section in DEP_SECTIONS {
        let Some(deps) = root.get(section).and_then(Value::as_object) else {
            continue;
        };
        for (name, spec) in deps {
            let spec = spec.as_str().unwrap_or("");
            let line = find_key_line(content, index, name);

            if RISKY_PACKAGE_NAMES.contains(&name.as_str()) {
                findings.push(make_finding(
                    file, content, index, line,
                    "DEP-001",
                    "Known risky package name",
                    Severity::High,
                    format!("'{name}' matches a known typosquat or compromised package"),
                ));
            }
            if matches!(spec, "*" | "latest" | "x") || spec.starts_with(">=") {
                findings.push(make_finding(
                    file, content, index, line,
                    "DEP-002",
                    "Unpinned dependency version",
                    Severity::Low,
                    format!("'{name}' floats with spec '{spec}'"),
                ));
            }
            if spec.starts_with("git")
                || spec.starts_with("http://")
                || spec.starts_with("https://")
                || spec.starts_with("ssh://")
            {
                findings.push(make_finding(
                    file, content, index, line,
                    "DEP-003",
                    "Dependency resolved outside the registry",
                    Severity::Medium,
                    format!("'{name}' resolves from '{spec}'"),
                ));
            }
        }
    }

    if let Some(scripts) = root.get("scripts").and_then(Value::as_object) {
        for key in INSTALL_SCRIPT_KEYS {
            let Some(script) = scripts.get(*key).and_then(Value::as_str) else {
                continue;
            };
            let lowered = script.to_ascii_lowercase();
            if ["curl", "wget", "node -e", "bash -c", "sh -c", "| sh", "| bash"]
                .iter()
                .any(|needle| lowered.contains(needle))
            {
                let line = find_key_line(content, index, key);
                findings.push(make_finding(
                    file, content, index, line,
                    "DEP-004",
                    "Install hook runs downloaded or inline code",
                    Severity::High,
                    format!("scripts.{key} executes '{script}'"),
                ));
            }
        }
    }

    (findings, issues)
}

/// Shell out to `npm audit --json` in the manifest's directory and fold the
/// advisory counts into findings. Any failure of the external tool is a
/// non-fatal issue and leaves the static findings untouched.
pub fn run_audit(file: &DiscoveredFile) -> (Vec<Finding>, Vec<ScanIssue>) {
    let mut findings = Vec::new();
    let mut issues = Vec::new();

    let Some(dir) = file.path.parent() else {
        return (findings, issues);
    };
    let output = std::process::Command::new("npm")
        .args(["audit", "--json", "--audit-level=low"])
        .current_dir(dir)
        .output();

    let output = match output {
        Ok(output) => output,
        Err(e) => {
            issues.push(
                ScanIssue::new(IssueKind::Network, format!("npm audit failed to start: {e}"))
                    .with_path(file.relative_path.clone()),
            );
            return (findings, issues);
        }
    };

    let parsed: Value = match serde_json::from_slice(&output.stdout) {
        Ok(value) => value,
        Err(e) => {
            issues.push(
                ScanIssue::new(
                    IssueKind::Network,
                    format!("npm audit output was not parseable: {e}"),
                )
                .with_path(file.relative_path.clone()),
            );
            return (findings, issues);
        }
    };

    let vulnerabilities = parsed
        .pointer("/metadata/vulnerabilities")
        .and_then(Value::as_object);
    if let Some(counts) = vulnerabilities {
        for (level, severity) in [
            ("critical", Severity::Critical),
            ("high", Severity::High),
            ("moderate", Severity::Medium),
            ("low", Severity::Low),
        ] {
            let count = counts.get(level).and_then(Value::as_u64).unwrap_or(0);
            if count > 0 {
                let mut finding = Finding {
                    rule_id: "DEP-005".to_string(),
                    rule_name: "Vulnerable dependencies reported by audit".to_string(),
                    severity,
                    category: ThreatCategory::SupplyChain,
                    path: file.path.clone(),
                    relative_path: file.relative_path.clone(),
                    line: 1,
                    column: None,
                    matched: format!("{count} {level} advisories"),
                    context: vec![ContextLine {
                        line_number: 1,
                        content: format!("npm audit: {count} {level} advisories"),
                        is_match: true,
                    }],
                    remediation: "Run npm audit fix and review remaining advisories".to_string(),
                    metadata: None,
                    timestamp: Utc::now(),
                    risk_score: severity.weight() as u8,
                };
                finding.set_metadata("auditLevel", serde_json::json!(level));
                finding.set_metadata("count", serde_json::json!(count));
                findings.push(finding);
            }
        }
    }

    (findings, issues)
}

fn find_key_line(content: &str, index: &LineIndex, key: &str) -> usize {
    let needle = format!("\"{key}\"");
    content
        .find(&needle)
        .map(|offset| index.line_col(offset).0)
        .unwrap_or(1)
}

#[allow(clippy::too_many_arguments)]
fn make_finding(
    file: &DiscoveredFile,
    content: &str,
    index: &LineIndex,
    line: usize,
    rule_id: &str,
    rule_name: &str,
    severity: Severity,
    detail: String,
) -> Finding {
    Finding {
        rule_id: rule_id.to_string(),
        rule_name: rule_name.to_string(),
        severity,
        category: ThreatCategory::SupplyChain,
        path: file.path.clone(),
        relative_path: file.relative_path.clone(),
        line,
        column: None,
        matched: detail,
        context: vec![ContextLine {
            line_number: line,
            content: index.line_content(content, line).to_string(),
            is_match: true,
        }],
        remediation: "Pin dependencies to vetted registry versions and keep install hooks inert"
            .to_string(),
        metadata: None,
        timestamp: Utc::now(),
        risk_score: severity.weight() as u8,
    }
}
