//! Baseline: a persisted snapshot of accepted finding identities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::errors::ScanError;
use crate::finding::{identity_hash, Finding};

pub const BASELINE_VERSION: &str = "1";

/// One accepted finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineEntry {
    pub rule_id: String,
    /// Relative path.
    pub file: String,
    pub line: usize,
    #[serde(rename = "match")]
    pub matched: String,
    /// sha256 over (ruleId, file, line, first 100 chars of match).
    pub hash: String,
    pub accepted_date: DateTime<Utc>,
}

/// Versioned collection of accepted finding identities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    pub version: String,
    pub created_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub findings: Vec<BaselineEntry>,
}

impl Baseline {
    /// Snapshot the given findings as the new accepted set.
    pub fn from_findings(findings: &[Finding], description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            version: BASELINE_VERSION.to_string(),
            created_date: now,
            last_updated: now,
            description,
            findings: findings
                .iter()
                .map(|f| BaselineEntry {
                    rule_id: f.rule_id.clone(),
                    file: f.relative_path.clone(),
                    line: f.line,
                    matched: f.match_prefix().to_string(),
                    hash: f.identity(),
                    accepted_date: now,
                })
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let baseline: Baseline =
            serde_json::from_str(&content).map_err(|e| ScanError::Validation {
                message: format!("invalid baseline: {e}"),
                path: Some(path.to_path_buf()),
            })?;
        if baseline.version != BASELINE_VERSION {
            return Err(ScanError::Validation {
                message: format!("unsupported baseline version '{}'", baseline.version),
                path: Some(path.to_path_buf()),
            });
        }
        Ok(baseline)
    }

    /// Write atomically: serialize to a sibling temp file, then rename.
    pub fn save(&self, path: &Path) -> Result<(), ScanError> {
        let body = serde_json::to_string_pretty(self).map_err(|e| ScanError::Validation {
            message: format!("baseline serialization failed: {e}"),
            path: Some(path.to_path_buf()),
        })?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(|source| ScanError::Read {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, path).map_err(|source| ScanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    fn hashes(&self) -> HashSet<&str> {
        self.findings.iter().map(|e| e.hash.as_str()).collect()
    }

    /// Whether a finding's identity is accepted by this baseline.
    pub fn contains(&self, finding: &Finding) -> bool {
        let identity = finding.identity();
        self.findings.iter().any(|e| {
            e.hash == identity
                || (e.rule_id == finding.rule_id
                    && e.file == finding.relative_path
                    && e.line == finding.line
                    && e.matched == finding.match_prefix())
        })
    }

    /// Subtract accepted findings. Idempotent: filtering a filtered set is
    /// a no-op.
    pub fn filter(&self, findings: Vec<Finding>) -> (Vec<Finding>, usize) {
        let accepted = self.hashes();
        let before = findings.len();
        let kept: Vec<Finding> = findings
            .into_iter()
            .filter(|f| !accepted.contains(f.identity().as_str()))
            .collect();
        let suppressed = before - kept.len();
        (kept, suppressed)
    }

    /// Recompute entry hashes (used after hand-edits to a baseline file).
    pub fn rehash(&mut self) {
        for entry in &mut self.findings {
            entry.hash = identity_hash(&entry.rule_id, &entry.file, entry.line, &entry.matched);
        }
        self.last_updated = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::ContextLine;
    use ferret_rules::{Severity, ThreatCategory};
    use std::path::PathBuf;

    fn finding(rule_id: &str, rel: &str, line: usize, matched: &str) -> Finding {
        Finding {
            rule_id: rule_id.to_string(),
            rule_name: "t".to_string(),
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
    fn snapshot_and_filter() {
        let findings = vec![
            finding("CRED-005", "a.md", 3, "api_key = \"aaaa\""),
            finding("INJ-001", "b.md", 9, "ignore previous instructions"),
        ];
        let baseline = Baseline::from_findings(&findings, Some("accepted".into()));
        assert_eq!(baseline.findings.len(), 2);

        let next_scan = vec![
            finding("CRED-005", "a.md", 3, "api_key = \"aaaa\""),
            finding("CRED-005", "a.md", 12, "api_key = \"bbbb\""),
        ];
        let (kept, suppressed) = baseline.filter(next_scan);
        assert_eq!(suppressed, 1);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].line, 12);
    }

    #[test]
    fn filter_is_idempotent() {
        let accepted = vec![finding("CRED-005", "a.md", 3, "x".repeat(20).as_str())];
        let baseline = Baseline::from_findings(&accepted, None);
        let scan = vec![
            finding("CRED-005", "a.md", 3, "x".repeat(20).as_str()),
            finding("INJ-001", "b.md", 1, "ignore previous instructions"),
        ];
        let (once, n1) = baseline.filter(scan);
        let (twice, n2) = baseline.filter(once.clone());
        assert_eq!(n1, 1);
        assert_eq!(n2, 0);
        assert_eq!(once.len(), twice.len());
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baseline.json");
        let baseline =
            Baseline::from_findings(&[finding("CRED-005", "a.md", 3, "secret-value-here")], None);
        baseline.save(&path).unwrap();
        let loaded = Baseline::load(&path).unwrap();
        assert_eq!(loaded.version, BASELINE_VERSION);
        assert_eq!(loaded.findings.len(), 1);
        assert_eq!(loaded.findings[0].hash, baseline.findings[0].hash);
    }

    #[test]
    fn serialized_entry_uses_match_key() {
        let baseline =
            Baseline::from_findings(&[finding("CRED-005", "a.md", 3, "secret-value-here")], None);
        let json = serde_json::to_value(&baseline).unwrap();
        assert!(json["findings"][0].get("match").is_some());
        assert!(json["findings"][0].get("ruleId").is_some());
        assert!(json["findings"][0].get("acceptedDate").is_some());
    }

    #[test]
    fn rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baseline.json");
        std::fs::write(
            &path,
            r#"{"version":"99","createdDate":"2025-01-01T00:00:00Z","lastUpdated":"2025-01-01T00:00:00Z","findings":[]}"#,
        )
        .unwrap();
        assert!(matches!(
            Baseline::load(&path),
            Err(ScanError::Validation { .. })
        ));
    }

    #[test]
    fn tuple_fallback_matches_hand_edited_entries() {
        let mut baseline = Baseline::from_findings(
            &[finding("CRED-005", "a.md", 3, "secret-value-here")],
            None,
        );
        baseline.findings[0].hash = "stale".to_string();
        assert!(baseline.contains(&finding("CRED-005", "a.md", 3, "secret-value-here")));
        baseline.rehash();
        assert_eq!(
            baseline.findings[0].hash,
            finding("CRED-005", "a.md", 3, "secret-value-here").identity()
        );
    }
}
