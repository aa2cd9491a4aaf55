//! Finding and context-line types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use ferret_rules::{Severity, ThreatCategory};

/// One line of context captured around a match. Exactly one context line of
/// a finding has `is_match = true`, at the finding's line number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextLine {
    pub line_number: usize,
    pub content: String,
    pub is_match: bool,
}

/// A reported potential issue linked to a rule and a source location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub rule_id: String,
    pub rule_name: String,
    pub severity: Severity,
    pub category: ThreatCategory,
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Path relative to the scan root, forward-slashed.
    pub relative_path: String,
    /// 1-based line number.
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    /// The matched snippet (possibly redacted by the renderer).
    pub matched: String,
    pub context: Vec<ContextLine>,
    pub remediation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    pub timestamp: DateTime<Utc>,
    /// 0-100.
    pub risk_score: u8,
}

impl Finding {
    /// First 100 characters of the match, the portion that participates in
    /// the stable identity.
    pub fn match_prefix(&self) -> &str {
        match self.matched.char_indices().nth(100) {
            Some((idx, _)) => &self.matched[..idx],
            None => &self.matched,
        }
    }

    /// Stable identity for baseline and ignore bookkeeping:
    /// sha256 over (ruleId, relativePath, line, first 100 chars of match).
    pub fn identity(&self) -> String {
        identity_hash(&self.rule_id, &self.relative_path, self.line, self.match_prefix())
    }

    /// Attach a metadata key. Creates the map on first use.
    pub fn set_metadata(&mut self, key: &str, value: serde_json::Value) {
        self.metadata
            .get_or_insert_with(serde_json::Map::new)
            .insert(key.to_string(), value);
    }

    /// Redacted rendering of the match: first 4 + stars + last 4. Short
    /// matches are fully starred.
    pub fn redacted_match(&self) -> String {
        redact(&self.matched)
    }
}

/// Compute the stable finding identity hash.
pub fn identity_hash(rule_id: &str, relative_path: &str, line: usize, match_prefix: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rule_id.as_bytes());
    hasher.update(b"|");
    hasher.update(relative_path.as_bytes());
    hasher.update(b"|");
    hasher.update(line.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(match_prefix.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// `first4 + '*'*middle + last4`; inputs of 8 chars or fewer are fully
/// starred so nothing useful leaks.
pub fn redact(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - 8))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(rule_id: &str, rel: &str, line: usize, matched: &str) -> Finding {
        Finding {
            rule_id: rule_id.to_string(),
            rule_name: "test".to_string(),
            severity: Severity::High,
            category: ThreatCategory::Credentials,
            path: PathBuf::from(format!("/scan/{rel}")),
            relative_path: rel.to_string(),
            line,
            column: None,
            matched: matched.to_string(),
            context: vec![ContextLine {
                line_number: line,
                content: matched.to_string(),
                is_match: true,
            }],
            remediation: String::new(),
            metadata: None,
            timestamp: Utc::now(),
            risk_score: 75,
        }
    }

    #[test]
    fn identity_stable_across_timestamps() {
        let a = finding("CRED-001", "a/b.md", 3, "sk-ant-xyz");
        let b = finding("CRED-001", "a/b.md", 3, "sk-ant-xyz");
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn identity_changes_with_line() {
        let a = finding("CRED-001", "a/b.md", 3, "sk-ant-xyz");
        let b = finding("CRED-001", "a/b.md", 4, "sk-ant-xyz");
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn identity_uses_only_first_100_chars() {
        let long_a = format!("{}{}", "x".repeat(100), "AAAA");
        let long_b = format!("{}{}", "x".repeat(100), "BBBB");
        let a = finding("CRED-001", "a.md", 1, &long_a);
        let b = finding("CRED-001", "a.md", 1, &long_b);
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn redaction_shape() {
        assert_eq!(
            redact("sk-ant-REDACTED"),
            format!("sk-a{}6789", "*".repeat(18))
        );
        assert_eq!(redact("short"), "*****");
    }

    #[test]
    fn metadata_insertion() {
        let mut f = finding("CRED-001", "a.md", 1, "x".repeat(16).as_str());
        f.set_metadata("dampening", serde_json::json!({"fromSeverity": "critical"}));
        assert!(f.metadata.unwrap().contains_key("dampening"));
    }

    #[test]
    fn serializes_camel_case() {
        let f = finding("CRED-001", "a.md", 1, "abcdefghijklmnop");
        let json = serde_json::to_value(&f).unwrap();
        assert!(json.get("ruleId").is_some());
        assert!(json.get("relativePath").is_some());
        assert!(json.get("riskScore").is_some());
    }
}
