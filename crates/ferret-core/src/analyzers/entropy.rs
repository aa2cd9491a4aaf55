//! Shannon-entropy secret detection (ENTROPY-001).

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;

use ferret_rules::{Severity, ThreatCategory};

use crate::discovery::DiscoveredFile;
use crate::finding::{redact, ContextLine, Finding};
use crate::matcher::LineIndex;

pub const RULE_ID: &str = "ENTROPY-001";

/// Lockfiles are machine-generated hash farms; scanning them is pure noise.
const LOCKFILES: &[&str] = &[
    "package-lock.json",
    "pnpm-lock.yaml",
    "yarn.lock",
    "composer.lock",
    "pipfile.lock",
    "npm-shrinkwrap.json",
];

const MIN_CANDIDATE_LEN: usize = 16;
const MAX_CANDIDATE_LEN: usize = 256;

/// Candidate extractors: quoted key:value, secret-named assignments, and
/// UPPER_SNAKE environment assignments.
static EXTRACTORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)[a-z0-9_\-]+["']?\s*:\s*["']([^"'\s]{16,256})["']"#,
        r#"(?i)(?:key|token|secret|password|api[_-]?key|auth|bearer)[a-z0-9_\-]*\s*=\s*["']?([^"'\s]{16,256})"#,
        r#"\b[A-Z][A-Z0-9_]{2,}\s*=\s*([^\s]{16,256})"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("extractor pattern must compile"))
    .collect()
});

/// Values that look high-entropy but are not secrets.
static EXCLUSIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // UUID
        r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$",
        // Bare MD5 / SHA1 / SHA256 digests
        r"(?i)^[0-9a-f]{32}$",
        r"(?i)^[0-9a-f]{40}$",
        r"(?i)^[0-9a-f]{64}$",
        // URLs, pure numbers, ALL_CAPS identifiers
        r"(?i)^https?://",
        r"^\d+$",
        r"^[A-Z][A-Z0-9_]*$",
        // Self-describing placeholders
        r"(?i)(?:example|sample|demo|placeholder|xxx|changeme|replace_me|your_api_key)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("exclusion pattern must compile"))
    .collect()
});

/// Provider key prefixes that are high-confidence on sight.
static KNOWN_PREFIXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^sk-ant-[A-Za-z0-9_\-]{8,}",
        r"^sk-[A-Za-z0-9_\-]{12,}",
        r"^gsk_[A-Za-z0-9]{8,}",
        r"^gh[pousr]_[A-Za-z0-9]{16,}",
        r"^xox[bpars]-",
        r"^eyJ[A-Za-z0-9_\-]+",
        r"^AKIA[0-9A-Z]{12,}",
        r"^AIza[0-9A-Za-z_\-]{8,}",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("prefix pattern must compile"))
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Confidence {
    High,
    Medium,
}

/// Shannon entropy in bits per character.
pub fn shannon_entropy(value: &str) -> f64 {
    let chars: Vec<char> = value.chars().collect();
    if chars.is_empty() {
        return 0.0;
    }
    let mut counts = std::collections::HashMap::new();
    for &c in &chars {
        *counts.entry(c).or_insert(0usize) += 1;
    }
    let len = chars.len() as f64;
    counts
        .values()
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Character-class diversity: one point each for lowercase, uppercase,
/// digits, and specials, plus a half point for length >= 24 (longer blobs
/// with mixed classes are stronger signals).
fn charset_diversity(value: &str) -> f64 {
    let mut score = 0.0;
    if value.chars().any(|c| c.is_ascii_lowercase()) {
        score += 1.0;
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        score += 1.0;
    }
    if value.chars().any(|c| c.is_ascii_digit()) {
        score += 1.0;
    }
    if value.chars().any(|c| !c.is_ascii_alphanumeric()) {
        score += 1.0;
    }
    if value.chars().count() >= 24 {
        score += 0.5;
    }
    score
}

/// A charset that secrets are typically drawn from: base64, base64url,
/// hex, or mixed-case alphanumerics.
fn suspicious_charset(value: &str) -> bool {
    let base64 = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='));
    let base64url = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '='));
    let hex = value.chars().all(|c| c.is_ascii_hexdigit());
    let mixed = value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| c.is_ascii_digit());
    base64 || base64url || hex || mixed
}

fn normalize(candidate: &str) -> &str {
    let mut value = candidate
        .trim()
        .trim_start_matches(|c| matches!(c, '(' | '[' | '{' | '"' | '\''));
    for prefix in ["bearer ", "basic ", "token "] {
        if value.len() >= prefix.len() && value[..prefix.len()].eq_ignore_ascii_case(prefix) {
            value = value[prefix.len()..].trim_start();
            break;
        }
    }
    value.trim_end_matches(|c| matches!(c, ')' | ']' | '}' | '"' | '\'' | ',' | ';'))
}

fn classify(value: &str) -> Option<(Confidence, f64)> {
    let entropy = shannon_entropy(value);
    if KNOWN_PREFIXES.iter().any(|p| p.is_match(value)) {
        return Some((Confidence::High, entropy));
    }
    let diversity = charset_diversity(value);
    let suspicious = suspicious_charset(value);
    if entropy >= 5.5 && diversity >= 2.5 && suspicious {
        return Some((Confidence::High, entropy));
    }
    if entropy >= 4.5 && suspicious {
        return Some((Confidence::Medium, entropy));
    }
    if entropy >= 5.0 && diversity >= 3.0 {
        return Some((Confidence::Medium, entropy));
    }
    None
}

/// Scan content for high-entropy strings that are likely secrets.
pub fn analyze(
    file: &DiscoveredFile,
    content: &str,
    index: &LineIndex,
    context_lines: usize,
) -> Vec<Finding> {
    let file_name = file
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if LOCKFILES.contains(&file_name.as_str()) {
        return Vec::new();
    }

    let mut findings = Vec::new();
    let mut seen: std::collections::HashSet<(usize, String)> = std::collections::HashSet::new();

    for extractor in EXTRACTORS.iter() {
        for captures in extractor.captures_iter(content) {
            let Some(group) = captures.get(1) else {
                continue;
            };
            let candidate = normalize(group.as_str());
            let len = candidate.chars().count();
            if !(MIN_CANDIDATE_LEN..=MAX_CANDIDATE_LEN).contains(&len) {
                continue;
            }
            if EXCLUSIONS.iter().any(|p| p.is_match(candidate)) {
                continue;
            }
            let Some((confidence, entropy)) = classify(candidate) else {
                continue;
            };

            let (line, column) = index.line_col(group.start());
            if !seen.insert((line, candidate.to_string())) {
                continue;
            }

            let severity = match confidence {
                Confidence::High => Severity::High,
                Confidence::Medium => Severity::Medium,
            };
            let mut finding = Finding {
                rule_id: RULE_ID.to_string(),
                rule_name: "High-entropy string".to_string(),
                severity,
                category: ThreatCategory::Credentials,
                path: file.path.clone(),
                relative_path: file.relative_path.clone(),
                line,
                column: Some(column),
                matched: redact(candidate),
                context: build_context(content, index, line, context_lines),
                remediation: "Move the value into an environment variable or secret store and rotate it"
                    .to_string(),
                metadata: None,
                timestamp: Utc::now(),
                risk_score: severity.weight() as u8,
            };
            finding.set_metadata(
                "entropy",
                serde_json::json!((entropy * 100.0).round() / 100.0),
            );
            finding.set_metadata(
                "confidence",
                serde_json::json!(match confidence {
                    Confidence::High => "high",
                    Confidence::Medium => "medium",
                }),
            );
            findings.push(finding);
        }
    }

    findings.sort_by_key(|f| f.line);
    findings
}

fn build_context(
    content: &str,
    index: &LineIndex,
    line: usize,
    context_lines: usize,
) -> Vec<ContextLine> {
    let first = line.saturating_sub(context_lines).max(1);
    let last = (line + context_lines).min(index.line_count());
    (first..=last)
        .map(|n| ContextLine {
            line_number: n,
            content: index.line_content(content, n).to_string(),
            is_match: n == line,
        })
        .collect()
}
