//! Capability mapping for AI-CLI settings files (CAP-001 to CAP-005).
//!
//! Extracts granted capabilities (tool allowances, hook commands, MCP tool
//! grants) and rates each by baseline risk. A capability is a risk
//! indicator, not an exploit, so severities top out at HIGH.

use chrono::Utc;
use serde_json::Value;

use ferret_rules::{ComponentType, Severity, ThreatCategory};

use crate::discovery::DiscoveredFile;
use crate::finding::{ContextLine, Finding};
use crate::matcher::LineIndex;

/// Baseline risk classes for capability tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CapabilityClass {
    /// Command execution, network egress, credential access.
    Exec,
    Network,
    Credentials,
    /// Filesystem mutation, browser automation.
    Write,
    /// Read-only introspection.
    Read,
}

impl CapabilityClass {
    /// Emission severity: the capability-to-severity downgrade mapping.
    fn severity(self) -> Severity {
        match self {
            CapabilityClass::Exec | CapabilityClass::Network | CapabilityClass::Credentials => {
                Severity::High
            }
            CapabilityClass::Write => Severity::Medium,
            CapabilityClass::Read => Severity::Low,
        }
    }

    fn rule(self) -> (&'static str, &'static str) {
        match self {
            CapabilityClass::Exec => ("CAP-001", "Command execution capability granted"),
            CapabilityClass::Network => ("CAP-002", "Network capability granted"),
            CapabilityClass::Credentials => ("CAP-003", "Credential access capability granted"),
            CapabilityClass::Write => ("CAP-004", "Filesystem write capability granted"),
            CapabilityClass::Read => ("CAP-005", "Broad read capability granted"),
        }
    }
}

fn classify_token(token: &str) -> Option<CapabilityClass> {
    let lower = token.to_ascii_lowercase();
    if lower.starts_with("bash") || lower.contains("shell") || lower.contains("exec") {
        return Some(CapabilityClass::Exec);
    }
    if lower.starts_with("webfetch")
        || lower.starts_with("websearch")
        || lower.contains("fetch(")
        || lower.contains("network")
    {
        return Some(CapabilityClass::Network);
    }
    if lower.contains("secret") || lower.contains("credential") || lower.contains("keychain") {
        return Some(CapabilityClass::Credentials);
    }
    if lower.starts_with("write") || lower.starts_with("edit") || lower.contains("browser") {
        return Some(CapabilityClass::Write);
    }
    if lower == "*" {
        return Some(CapabilityClass::Exec);
    }
    if lower.starts_with("read") || lower.starts_with("grep") || lower.starts_with("glob") {
        return Some(CapabilityClass::Read);
    }
    None
}

/// Map granted capabilities out of a settings-like JSON file.
pub fn analyze(file: &DiscoveredFile, content: &str, index: &LineIndex) -> Vec<Finding> {
    if !matches!(
        file.component,
        ComponentType::Settings | ComponentType::Mcp | ComponentType::Plugin
    ) {
        return Vec::new();
    }
    let Ok(root) = serde_json::from_str::<Value>(content) else {
        // Malformed settings are reported by the MCP/validation layer.
        return Vec::new();
    };

    let mut findings = Vec::new();
    let mut seen = std::collections::HashSet::new();

    // permissions.allow / permissions.deny style allowlists
    if let Some(allow) = root
        .pointer("/permissions/allow")
        .and_then(Value::as_array)
    {
        for token in allow.iter().filter_map(Value::as_str) {
            if let Some(class) = classify_token(token) {
                push_capability(
                    &mut findings,
                    &mut seen,
                    file,
                    content,
                    index,
                    class,
                    token,
                    "permissions.allow",
                );
            }
        }
    }

    // allowedTools / tools arrays
    for key in ["allowedTools", "tools"] {
        if let Some(tools) = root.get(key).and_then(Value::as_array) {
            for token in tools.iter().filter_map(Value::as_str) {
                if let Some(class) = classify_token(token) {
                    push_capability(
                        &mut findings, &mut seen, file, content, index, class, token, key,
                    );
                }
            }
        }
    }

    // Hook commands imply exec capability.
    if let Some(hooks) = root.get("hooks").and_then(Value::as_object) {
        for (event, entries) in hooks {
            if collect_commands(entries) {
                push_capability(
                    &mut findings,
                    &mut seen,
                    file,
                    content,
                    index,
                    CapabilityClass::Exec,
                    event,
                    "hooks",
                );
            }
        }
    }

    findings
}

/// Whether any nested hook entry carries a command string.
fn collect_commands(value: &Value) -> bool {
    match value {
        Value::Object(map) => map
            .iter()
            .any(|(k, v)| (k == "command" && v.is_string()) || collect_commands(v)),
        Value::Array(items) => items.iter().any(collect_commands),
        _ => false,
    }
}

#[allow(clippy::too_many_arguments)]
fn push_capability(
    findings: &mut Vec<Finding>,
    seen: &mut std::collections::HashSet<(String, String)>,
    file: &DiscoveredFile,
    content: &str,
    index: &LineIndex,
    class: CapabilityClass,
    token: &str,
    source: &str,
) {
    let (rule_id, rule_name) = class.rule();
    if !seen.insert((rule_id.to_string(), token.to_string())) {
        return;
    }
    let line = content
        .find(token)
        .map(|offset| index.line_col(offset).0)
        .unwrap_or(1);
    let severity = class.severity();
    let mut finding = Finding {
        rule_id: rule_id.to_string(),
        rule_name: rule_name.to_string(),
        severity,
        category: ThreatCategory::Permissions,
        path: file.path.clone(),
        relative_path: file.relative_path.clone(),
        line,
        column: None,
        matched: token.to_string(),
        context: vec![ContextLine {
            line_number: line,
            content: index.line_content(content, line).to_string(),
            is_match: true,
        }],
        remediation: "Confirm the capability is required and scope it as narrowly as possible"
            .to_string(),
        metadata: None,
        timestamp: Utc::now(),
        risk_score: severity.weight() as u8,
    };
    finding.set_metadata("capabilitySource", serde_json::json!(source));
    findings.push(finding);
}
