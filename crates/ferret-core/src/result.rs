//! Scan result model: summary, groupings, exit-code mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use ferret_rules::{Severity, ThreatCategory};

use crate::errors::ScanIssue;
use crate::finding::Finding;

/// Per-severity counts. The closure invariant holds:
/// `critical + high + medium + low + info == total == findings.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl ScanSummary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = Self {
            total: findings.len(),
            ..Default::default()
        };
        for finding in findings {
            match finding.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
                Severity::Info => summary.info += 1,
            }
        }
        summary
    }
}

/// Result of a complete scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub success: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub scanned_paths: Vec<PathBuf>,
    pub total_files: usize,
    pub analyzed_files: usize,
    pub skipped_files: usize,
    /// Sorted by (severity, risk score desc, relative path).
    pub findings: Vec<Finding>,
    /// Finding counts keyed by severity name.
    pub by_severity: BTreeMap<String, usize>,
    /// Finding counts keyed by category name.
    pub by_category: BTreeMap<String, usize>,
    /// 0-100.
    pub overall_risk_score: u8,
    pub summary: ScanSummary,
    pub errors: Vec<ScanIssue>,
    /// Findings removed by inline ignore directives.
    pub ignored_findings: usize,
    /// Findings removed by the baseline.
    pub baseline_suppressed: usize,
}

impl ScanResult {
    /// Findings grouped by severity, in severity order.
    pub fn group_by_severity(&self) -> BTreeMap<Severity, Vec<&Finding>> {
        let mut groups: BTreeMap<Severity, Vec<&Finding>> = BTreeMap::new();
        for finding in &self.findings {
            groups.entry(finding.severity).or_default().push(finding);
        }
        groups
    }

    /// Findings grouped by category name.
    pub fn group_by_category(&self) -> BTreeMap<ThreatCategory, Vec<&Finding>> {
        let mut groups: BTreeMap<ThreatCategory, Vec<&Finding>> = BTreeMap::new();
        for finding in &self.findings {
            groups.entry(finding.category).or_default().push(finding);
        }
        groups
    }

    /// Exit code for the CLI:
    /// 3 on scan failure, 2 when a critical finding meets the threshold,
    /// 1 when any finding meets the threshold, 0 otherwise.
    pub fn exit_code(&self, fail_on: Severity) -> i32 {
        if !self.success {
            return 3;
        }
        let at_threshold: Vec<&Finding> = self
            .findings
            .iter()
            .filter(|f| f.severity.at_least(fail_on))
            .collect();
        if at_threshold.iter().any(|f| f.severity == Severity::Critical) {
            2
        } else if !at_threshold.is_empty() {
            1
        } else {
            0
        }
    }
}
