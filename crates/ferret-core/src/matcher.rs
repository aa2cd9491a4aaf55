//! Pattern matcher: applies one rule to one file's content.
//!
//! Matching is case-insensitive and global. Matches are deduplicated per
//! line (first match wins, extras feed the risk score), then filtered by
//! the rule's false-positive controls before a [`Finding`] is built.

use std::collections::BTreeMap;

use chrono::Utc;

use ferret_rules::Rule;

use crate::discovery::DiscoveredFile;
use crate::finding::{ContextLine, Finding};

/// Byte offset -> (line, column) lookup built once per file.
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(content: &str) -> Self {
        let mut starts = vec![0];
        for (idx, b) in content.bytes().enumerate() {
            if b == b'\n' {
                starts.push(idx + 1);
            }
        }
        Self {
            starts,
            len: content.len(),
        }
    }

    /// 1-based line and column for a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        (line + 1, offset - self.starts[line] + 1)
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Content of the 1-based `line`, without the trailing newline.
    pub fn line_content<'a>(&self, content: &'a str, line: usize) -> &'a str {
        let start = self.starts[line - 1];
        let end = self
            .starts
            .get(line)
            .map(|&next| next.saturating_sub(1))
            .unwrap_or(self.len);
        content[start..end].trim_end_matches('\r')
    }
}

struct LineMatch {
    line: usize,
    column: usize,
    text: String,
    count: usize,
}

/// Run `rule` against `content`, producing findings in line order.
pub fn match_rule(
    rule: &Rule,
    file: &DiscoveredFile,
    content: &str,
    index: &LineIndex,
    context_lines: usize,
) -> Vec<Finding> {
    if !rule.enabled || !rule.applies_to(file.file_type, file.component) {
        return Vec::new();
    }

    // First match per line wins; later matches on the same line (from any
    // pattern) only bump the count used for scoring.
    let mut per_line: BTreeMap<usize, LineMatch> = BTreeMap::new();
    for pattern in &rule.patterns {
        for m in pattern.regex.find_iter(content) {
            let (line, column) = index.line_col(m.start());
            per_line
                .entry(line)
                .and_modify(|existing| existing.count += 1)
                .or_insert_with(|| LineMatch {
                    line,
                    column,
                    text: m.as_str().to_string(),
                    count: 1,
                });
        }
    }

    let mut findings = Vec::new();
    for line_match in per_line.into_values() {
        if line_match.text.chars().count() < rule.min_match_length {
            continue;
        }

        let line_content = index.line_content(content, line_match.line);
        if rule
            .exclude_patterns
            .iter()
            .any(|p| p.regex.is_match(line_content))
        {
            continue;
        }

        let context = build_context(content, index, line_match.line, context_lines);
        let joined: String = context
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if rule.exclude_context.iter().any(|p| p.regex.is_match(&joined)) {
            continue;
        }
        if !rule.require_context.is_empty()
            && !rule.require_context.iter().any(|p| p.regex.is_match(&joined))
        {
            continue;
        }

        findings.push(Finding {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            severity: rule.severity,
            category: rule.category,
            path: file.path.clone(),
            relative_path: file.relative_path.clone(),
            line: line_match.line,
            column: Some(line_match.column),
            matched: line_match.text,
            context,
            remediation: rule.remediation.clone(),
            metadata: None,
            timestamp: Utc::now(),
            risk_score: risk_score(
                rule.severity.weight(),
                line_match.count,
                file.component.is_privileged(),
            ),
        });
    }
    findings
}

/// `round(clamp(weight + log2(count)*10, 0, 100))`, then a 1.2 multiplier
/// (clamped to 100) for privileged components.
pub fn risk_score(severity_weight: u32, match_count: usize, privileged: bool) -> u8 {
    let base = severity_weight as f64 + (match_count.max(1) as f64).log2() * 10.0;
    let mut score = base.clamp(0.0, 100.0).round();
    if privileged {
        score = (score * 1.2).min(100.0).round();
    }
    score as u8
}

/// Context window of `±context_lines` around the matched line. Exactly one
/// entry is the match line.
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

#[cfg(test)]
mod tests {
    use super::*;
    use ferret_rules::{ComponentType, FileType, Severity, ThreatCategory};
    use std::path::PathBuf;

    fn file(file_type: FileType, component: ComponentType) -> DiscoveredFile {
        DiscoveredFile {
            path: PathBuf::from("/scan/target"),
            relative_path: "target".to_string(),
            file_type,
            component,
            size: 0,
            modified: None,
        }
    }

    fn rule(patterns: &[&str]) -> Rule {
        let mut builder = Rule::builder(
            "TEST-001",
            "test rule",
            ThreatCategory::Credentials,
            Severity::High,
        );
        for p in patterns {
            builder = builder.pattern(p);
        }
        builder.remediation("fix it").build()
    }

    #[test]
    fn line_index_maps_offsets() {
        let content = "alpha\nbeta\ngamma";
        let index = LineIndex::new(content);
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(6), (2, 1));
        assert_eq!(index.line_col(8), (2, 3));
        assert_eq!(index.line_content(content, 2), "beta");
        assert_eq!(index.line_count(), 3);
    }

    #[test]
    fn matches_case_insensitive_with_location() {
        let content = "line one\nSECRET here\nline three";
        let index = LineIndex::new(content);
        let findings = match_rule(
            &rule(&["secret"]),
            &file(FileType::Md, ComponentType::Skill),
            content,
            &index,
            2,
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 2);
        assert_eq!(findings[0].column, Some(1));
        assert_eq!(findings[0].matched, "SECRET");
    }

    #[test]
    fn dedup_per_line_counts_extras() {
        let content = "secret secret secret";
        let index = LineIndex::new(content);
        let findings = match_rule(
            &rule(&["secret"]),
            &file(FileType::Md, ComponentType::Skill),
            content,
            &index,
            0,
        );
        assert_eq!(findings.len(), 1);
        // weight 75 + log2(3)*10 ~ 90.8 -> 91
        assert_eq!(findings[0].risk_score, 91);
    }

    #[test]
    fn single_match_risk_is_weight() {
        assert_eq!(risk_score(75, 1, false), 75);
        assert_eq!(risk_score(100, 1, false), 100);
        assert_eq!(risk_score(10, 1, false), 10);
    }

    #[test]
    fn privileged_component_multiplier() {
        assert_eq!(risk_score(75, 1, true), 90);
        assert_eq!(risk_score(100, 1, true), 100);
    }

    #[test]
    fn risk_clamped_at_100() {
        assert_eq!(risk_score(100, 1024, false), 100);
    }

    #[test]
    fn not_applicable_yields_nothing() {
        let content = "secret";
        let index = LineIndex::new(content);
        let mut r = rule(&["secret"]);
        r.file_types = vec![FileType::Sh];
        let findings = match_rule(
            &r,
            &file(FileType::Md, ComponentType::Skill),
            content,
            &index,
            2,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn min_match_length_rejects_short() {
        let content = "key=abc";
        let index = LineIndex::new(content);
        let mut r = rule(&["key=\\w+"]);
        r.min_match_length = 10;
        let findings = match_rule(
            &r,
            &file(FileType::Md, ComponentType::Skill),
            content,
            &index,
            0,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn exclude_pattern_rejects_line() {
        let content = "api_key = \"your-api-key-here\"";
        let index = LineIndex::new(content);
        let mut r = rule(&["api_key\\s*=\\s*\"[^\"]+\""]);
        r.exclude_patterns =
            vec![ferret_rules::CompiledPattern::new("your-api-key").unwrap()];
        let findings = match_rule(
            &r,
            &file(FileType::Md, ComponentType::Skill),
            content,
            &index,
            0,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn require_context_gates_match() {
        let content = "unrelated\nthe-token-value\nunrelated";
        let index = LineIndex::new(content);
        let mut r = rule(&["the-token-value"]);
        r.require_context =
            vec![ferret_rules::CompiledPattern::new("production").unwrap()];
        let findings = match_rule(
            &r,
            &file(FileType::Md, ComponentType::Skill),
            content,
            &index,
            1,
        );
        assert!(findings.is_empty());

        let content2 = "production deploy\nthe-token-value\nunrelated";
        let index2 = LineIndex::new(content2);
        let findings2 = match_rule(
            &r,
            &file(FileType::Md, ComponentType::Skill),
            content2,
            &index2,
            1,
        );
        assert_eq!(findings2.len(), 1);
    }

    #[test]
    fn exclude_context_rejects_window() {
        let content = "documentation example\nthe-token-value";
        let index = LineIndex::new(content);
        let mut r = rule(&["the-token-value"]);
        r.exclude_context = vec![ferret_rules::CompiledPattern::new("example").unwrap()];
        let findings = match_rule(
            &r,
            &file(FileType::Md, ComponentType::Skill),
            content,
            &index,
            1,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn context_window_has_single_match_line() {
        let content = "a\nb\nmatchme\nd\ne";
        let index = LineIndex::new(content);
        let findings = match_rule(
            &rule(&["matchme"]),
            &file(FileType::Md, ComponentType::Skill),
            content,
            &index,
            2,
        );
        let context = &findings[0].context;
        assert_eq!(context.len(), 5);
        assert_eq!(
            context.iter().filter(|c| c.is_match).count(),
            1,
            "exactly one context line is the match"
        );
        let match_line = context.iter().find(|c| c.is_match).unwrap();
        assert_eq!(match_line.line_number, findings[0].line);
    }

    #[test]
    fn pattern_order_keeps_first_match_on_line() {
        // Both patterns hit line 1; the first pattern's match is kept.
        let content = "alpha beta";
        let index = LineIndex::new(content);
        let findings = match_rule(
            &rule(&["beta", "alpha"]),
            &file(FileType::Md, ComponentType::Skill),
            content,
            &index,
            0,
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].matched, "beta");
        assert_eq!(findings[0].risk_score, risk_score(75, 2, false));
    }

    #[test]
    fn multiple_lines_emit_in_order() {
        let content = "secret\nclean\nsecret";
        let index = LineIndex::new(content);
        let findings = match_rule(
            &rule(&["secret"]),
            &file(FileType::Md, ComponentType::Skill),
            content,
            &index,
            0,
        );
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].line, 1);
        assert_eq!(findings[1].line, 3);
    }
}
