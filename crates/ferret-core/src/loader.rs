//! Custom rule loading from files and (optionally) URLs.
//!
//! Rule files are YAML or JSON with the shape
//! `{version?, description?, rules: [CustomRule]}`. Each regex compiles
//! independently: a bad pattern drops just that pattern, a rule with zero
//! surviving patterns is rejected, and the rest of the file still loads.

use serde::{Deserialize, Serialize};
use std::path::Path;

use ferret_rules::{
    ComponentType, CorrelationSpec, FileType, Rule, SemanticPattern, Severity, ThreatCategory,
};

/// Maximum rules accepted per file.
pub const MAX_RULES_PER_FILE: usize = 100;

/// Maximum patterns accepted per rule.
pub const MAX_PATTERNS_PER_RULE: usize = 50;

/// Serialized shape of a custom rule file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomRuleFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub rules: Vec<CustomRule>,
}

/// Serialized shape of one custom rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRule {
    pub id: String,
    pub name: String,
    pub category: ThreatCategory,
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    pub patterns: Vec<String>,
    #[serde(default)]
    pub file_types: Option<Vec<FileType>>,
    #[serde(default)]
    pub components: Option<Vec<ComponentType>>,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    #[serde(default)]
    pub require_context: Vec<String>,
    #[serde(default)]
    pub exclude_context: Vec<String>,
    #[serde(default)]
    pub min_match_length: usize,
    #[serde(default)]
    pub semantic_patterns: Vec<SemanticPattern>,
    #[serde(default)]
    pub correlation_rules: Vec<CorrelationSpec>,
    #[serde(default)]
    pub remediation: String,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Outcome of loading one rule source.
#[derive(Debug)]
pub struct RuleLoadResult {
    pub success: bool,
    pub rules: Vec<Rule>,
    pub errors: Vec<String>,
}

impl CustomRule {
    /// Convert to a compiled [`Rule`], collecting per-pattern errors.
    fn into_rule(self, errors: &mut Vec<String>) -> Option<Rule> {
        if !Rule::id_is_valid(&self.id) {
            errors.push(format!(
                "rule '{}': id must match ^[A-Z]+-\\d{{3}}$",
                self.id
            ));
            return None;
        }
        if self.patterns.is_empty() && self.semantic_patterns.is_empty() {
            errors.push(format!("rule '{}': needs at least one pattern", self.id));
            return None;
        }
        if self.patterns.len() > MAX_PATTERNS_PER_RULE {
            errors.push(format!(
                "rule '{}': at most {MAX_PATTERNS_PER_RULE} patterns allowed",
                self.id
            ));
            return None;
        }

        let mut builder = Rule::builder(&self.id, &self.name, self.category, self.severity)
            .description(&self.description)
            .min_match_length(self.min_match_length)
            .remediation(&self.remediation);
        for pattern in &self.patterns {
            builder = builder.pattern(pattern);
        }
        if let Some(file_types) = &self.file_types {
            builder = builder.file_types(file_types);
        }
        if let Some(components) = &self.components {
            builder = builder.components(components);
        }
        for pattern in &self.exclude_patterns {
            builder = builder.exclude_pattern(pattern);
        }
        for pattern in &self.require_context {
            builder = builder.require_context(pattern);
        }
        for pattern in &self.exclude_context {
            builder = builder.exclude_context(pattern);
        }
        for spec in self.correlation_rules.clone() {
            builder = builder.correlation(spec);
        }
        for reference in &self.references {
            builder = builder.reference(reference);
        }
        if !self.enabled {
            builder = builder.disabled();
        }

        match builder.try_build_lossy() {
            Ok((mut rule, pattern_errors)) => {
                rule.semantic_patterns = self.semantic_patterns;
                for e in pattern_errors {
                    errors.push(format!("rule '{}': dropped pattern {e}", rule.id));
                }
                Some(rule)
            }
            Err(e) => {
                errors.push(e.to_string());
                None
            }
        }
    }
}

/// Parse a rule file body. YAML and JSON are both accepted; JSON is valid
/// YAML, so a single YAML parse covers both, with a JSON fallback kept for
/// clearer error messages on .json sources.
pub fn parse_rules_content(content: &str, source: &str) -> RuleLoadResult {
    let parsed: Result<CustomRuleFile, String> = if source.ends_with(".json") {
        serde_json::from_str(content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    };

    let file = match parsed {
        Ok(file) => file,
        Err(message) => {
            return RuleLoadResult {
                success: false,
                rules: Vec::new(),
                errors: vec![format!("{source}: {message}")],
            }
        }
    };

    let mut errors = Vec::new();
    if file.rules.is_empty() {
        return RuleLoadResult {
            success: false,
            rules: Vec::new(),
            errors: vec![format!("{source}: rule file contains no rules")],
        };
    }
    if file.rules.len() > MAX_RULES_PER_FILE {
        return RuleLoadResult {
            success: false,
            rules: Vec::new(),
            errors: vec![format!(
                "{source}: at most {MAX_RULES_PER_FILE} rules allowed per file"
            )],
        };
    }

    let rules: Vec<Rule> = file
        .rules
        .into_iter()
        .filter_map(|custom| custom.into_rule(&mut errors))
        .collect();

    RuleLoadResult {
        success: !rules.is_empty(),
        rules,
        errors,
    }
}

/// Load a custom rule source: a local file path, or an `http(s)` URL when
/// `allow_remote` is set. Remote sources are refused by default (SSRF
/// guard); enabling them also requires the `remote` build feature.
pub fn load_custom_rules_source(source: &str, allow_remote: bool) -> RuleLoadResult {
    if source.starts_with("http://") || source.starts_with("https://") {
        if !allow_remote {
            return RuleLoadResult {
                success: false,
                rules: Vec::new(),
                errors: vec![format!(
                    "{source}: remote rule sources are disabled; set allow_remote_rules to opt in"
                )],
            };
        }
        return load_remote(source);
    }

    let path = Path::new(source);
    match std::fs::read_to_string(path) {
        Ok(content) => parse_rules_content(&content, source),
        Err(e) => RuleLoadResult {
            success: false,
            rules: Vec::new(),
            errors: vec![format!("{source}: {e}")],
        },
    }
}

#[cfg(feature = "remote")]
fn load_remote(url: &str) -> RuleLoadResult {
    let client = match reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            return RuleLoadResult {
                success: false,
                rules: Vec::new(),
                errors: vec![format!("{url}: {e}")],
            }
        }
    };
    match client.get(url).send().and_then(|r| r.error_for_status()) {
        Ok(response) => match response.text() {
            Ok(content) => parse_rules_content(&content, url),
            Err(e) => RuleLoadResult {
                success: false,
                rules: Vec::new(),
                errors: vec![format!("{url}: {e}")],
            },
        },
        Err(e) => RuleLoadResult {
            success: false,
            rules: Vec::new(),
            errors: vec![format!("{url}: {e}")],
        },
    }
}

#[cfg(not(feature = "remote"))]
fn load_remote(url: &str) -> RuleLoadResult {
    RuleLoadResult {
        success: false,
        rules: Vec::new(),
        errors: vec![format!(
            "{url}: this build has no remote support (enable the 'remote' feature)"
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML_RULES: &str = r#"
version: "1"
description: team rules
rules:
  - id: TEAM-001
    name: Internal endpoint leak
    category: exfiltration
    severity: high
    patterns:
      - 'internal\.corp\.example'
    remediation: Remove internal hostnames
"#;

    #[test]
    fn loads_yaml_rules() {
        let result = parse_rules_content(YAML_RULES, "team.yaml");
        assert!(result.success, "errors: {:?}", result.errors);
        assert_eq!(result.rules.len(), 1);
        assert_eq!(result.rules[0].id, "TEAM-001");
        assert!(result.errors.is_empty());
    }

    #[test]
    fn loads_json_rules() {
        let json = r#"{
            "rules": [{
                "id": "TEAM-002",
                "name": "json rule",
                "category": "injection",
                "severity": "medium",
                "patterns": ["badphrase"],
                "minMatchLength": 4
            }]
        }"#;
        let result = parse_rules_content(json, "team.json");
        assert!(result.success, "errors: {:?}", result.errors);
        assert_eq!(result.rules[0].min_match_length, 4);
    }

    #[test]
    fn invalid_pattern_dropped_rule_kept() {
        let yaml = r#"
rules:
  - id: TEAM-003
    name: partial
    category: backdoors
    severity: high
    patterns:
      - 'good'
      - '(bad'
"#;
        let result = parse_rules_content(yaml, "partial.yaml");
        assert!(result.success);
        assert_eq!(result.rules[0].patterns.len(), 1);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn rule_with_all_bad_patterns_rejected() {
        let yaml = r#"
rules:
  - id: TEAM-004
    name: broken
    category: backdoors
    severity: high
    patterns:
      - '(bad'
"#;
        let result = parse_rules_content(yaml, "broken.yaml");
        assert!(!result.success);
        assert!(result.rules.is_empty());
        assert!(!result.errors.is_empty());
    }

    #[test]
    fn bad_id_rejected() {
        let yaml = r#"
rules:
  - id: lowercase-001
    name: bad id
    category: backdoors
    severity: high
    patterns: ['x']
"#;
        let result = parse_rules_content(yaml, "badid.yaml");
        assert!(!result.success);
        assert!(result.errors[0].contains("id must match"));
    }

    #[test]
    fn remote_refused_without_opt_in() {
        let result = load_custom_rules_source("https://example.com/rules.yaml", false);
        assert!(!result.success);
        assert!(result.errors[0].contains("allow_remote_rules"));
    }

    #[test]
    fn missing_file_reports_error() {
        let result = load_custom_rules_source("/nonexistent/rules.yaml", false);
        assert!(!result.success);
        assert_eq!(result.rules.len(), 0);
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.yaml");
        std::fs::write(&path, YAML_RULES).unwrap();
        let result = load_custom_rules_source(path.to_str().unwrap(), false);
        assert!(result.success);
        assert_eq!(result.rules.len(), 1);
    }
}
