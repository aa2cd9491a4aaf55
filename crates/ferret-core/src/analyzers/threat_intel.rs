//! Threat-indicator matching (THREAT-001 to THREAT-007).
//!
//! Matches content against a pinned table of infrastructure indicators:
//! tunneling services, dead-drop/paste sites, OAST callback domains,
//! raw-IP endpoints, shorteners, mining pools, punycode hosts.

use std::sync::LazyLock;

use chrono::Utc;
use regex::{Regex, RegexBuilder};

use ferret_rules::{Severity, ThreatCategory};

use crate::discovery::DiscoveredFile;
use crate::finding::{ContextLine, Finding};
use crate::matcher::LineIndex;

struct Indicator {
    rule_id: &'static str,
    name: &'static str,
    severity: Severity,
    pattern: &'static str,
}

const INDICATORS: &[Indicator] = &[
    Indicator {
        rule_id: "THREAT-001",
        name: "Tunneling service endpoint",
        severity: Severity::High,
        pattern: r"\b[a-z0-9.-]*(?:ngrok\.io|ngrok-free\.app|localtunnel\.me|loca\.lt|serveo\.net|trycloudflare\.com|bore\.pub|telebit\.cloud)\b",
    },
    Indicator {
        rule_id: "THREAT-002",
        name: "Dead-drop or paste site",
        severity: Severity::High,
        pattern: r"\b(?:pastebin\.com/raw|hastebin\.com|transfer\.sh|file\.io|0x0\.st|anonfiles\.com|temp\.sh|webhook\.site|requestbin\.com|pipedream\.net)\b",
    },
    Indicator {
        rule_id: "THREAT-003",
        name: "Raw-IP URL",
        severity: Severity::Medium,
        pattern: r"https?://\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}(?::\d{2,5})?",
    },
    Indicator {
        rule_id: "THREAT-004",
        name: "URL shortener",
        severity: Severity::Low,
        pattern: r"\b(?:bit\.ly|tinyurl\.com|t\.co|goo\.gl|is\.gd|cutt\.ly|rb\.gy)/[A-Za-z0-9]+",
    },
    Indicator {
        rule_id: "THREAT-005",
        name: "Out-of-band callback domain",
        severity: Severity::High,
        pattern: r"\b[a-z0-9.-]*(?:burpcollaborator\.net|oastify\.com|oast\.pro|oast\.live|interact\.sh|canarytokens\.com)\b",
    },
    Indicator {
        rule_id: "THREAT-006",
        name: "Mining pool endpoint",
        severity: Severity::High,
        pattern: r"\b(?:pool\.minexmr\.com|xmrpool\.eu|supportxmr\.com|stratum\+tcp://)",
    },
    Indicator {
        rule_id: "THREAT-007",
        name: "Punycode hostname",
        severity: Severity::Medium,
        pattern: r"https?://(?:[a-z0-9-]+\.)*xn--[a-z0-9-]+",
    },
];

static COMPILED: LazyLock<Vec<(usize, Regex)>> = LazyLock::new(|| {
    INDICATORS
        .iter()
        .enumerate()
        .map(|(idx, indicator)| {
            let regex = RegexBuilder::new(indicator.pattern)
                .case_insensitive(true)
                .build()
                .expect("indicator pattern must compile");
            (idx, regex)
        })
        .collect()
});

/// Match the pinned indicator table against content. One finding per
/// (indicator, line).
pub fn analyze(
    file: &DiscoveredFile,
    content: &str,
    index: &LineIndex,
    context_lines: usize,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (idx, regex) in COMPILED.iter() {
        let indicator = &INDICATORS[*idx];
        let mut seen_lines = std::collections::HashSet::new();
        for m in regex.find_iter(content) {
            let (line, column) = index.line_col(m.start());
            if !seen_lines.insert(line) {
                continue;
            }
            // localhost exclusion for the raw-IP indicator
            if indicator.rule_id == "THREAT-003"
                && (m.as_str().contains("127.0.0.1") || m.as_str().contains("0.0.0.0"))
            {
                continue;
            }
            let first = line.saturating_sub(context_lines).max(1);
            let last = (line + context_lines).min(index.line_count());
            let context = (first..=last)
                .map(|n| ContextLine {
                    line_number: n,
                    content: index.line_content(content, n).to_string(),
                    is_match: n == line,
                })
                .collect();
            let mut finding = Finding {
                rule_id: indicator.rule_id.to_string(),
                rule_name: indicator.name.to_string(),
                severity: indicator.severity,
                category: ThreatCategory::Exfiltration,
                path: file.path.clone(),
                relative_path: file.relative_path.clone(),
                line,
                column: Some(column),
                matched: m.as_str().to_string(),
                context,
                remediation: "Remove the indicator or justify and allow-list the endpoint"
                    .to_string(),
                metadata: None,
                timestamp: Utc::now(),
                risk_score: indicator.severity.weight() as u8,
            };
            finding.set_metadata("indicator", serde_json::json!(indicator.rule_id));
            findings.push(finding);
        }
    }
    findings.sort_by_key(|f| (f.line, f.rule_id.clone()));
    findings
}
