//! SARIF 2.1.0 output.
//!
//! One run, deduplicated rule descriptors, results carrying
//! `properties.category` and `properties.riskScore`.

use serde::Serialize;
use std::collections::BTreeMap;

use ferret_core::{ScanResult, Severity};

const SARIF_SCHEMA: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/main/sarif-2.1/schema/sarif-schema-2.1.0.json";
const SARIF_VERSION: &str = "2.1.0";
const TOOL_NAME: &str = "ferret-scan";
const TOOL_INFO_URI: &str = "https://github.com/fubak/ferret-scan";

#[derive(Debug, Serialize)]
pub struct SarifLog {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub version: String,
    pub runs: Vec<Run>,
}

#[derive(Debug, Serialize)]
pub struct Run {
    pub tool: Tool,
    pub results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
pub struct Tool {
    pub driver: Driver,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub name: String,
    pub version: String,
    pub information_uri: String,
    pub rules: Vec<ReportingDescriptor>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportingDescriptor {
    pub id: String,
    pub short_description: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_description: Option<Message>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResult {
    pub rule_id: String,
    pub level: String,
    pub message: Message,
    pub locations: Vec<Location>,
    pub properties: ResultProperties,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultProperties {
    pub category: String,
    pub risk_score: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub physical_location: PhysicalLocation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalLocation {
    pub artifact_location: ArtifactLocation,
    pub region: Region,
}

#[derive(Debug, Serialize)]
pub struct ArtifactLocation {
    pub uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub start_line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_column: Option<usize>,
}

fn severity_to_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical | Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low => "note",
        Severity::Info => "info",
    }
}

/// Build the SARIF document for a scan result.
pub fn to_sarif(result: &ScanResult, redact: bool) -> SarifLog {
    // Deduplicate descriptors by rule id, keeping first-seen names.
    let mut descriptors: BTreeMap<String, ReportingDescriptor> = BTreeMap::new();
    for finding in &result.findings {
        descriptors
            .entry(finding.rule_id.clone())
            .or_insert_with(|| ReportingDescriptor {
                id: finding.rule_id.clone(),
                short_description: Message {
                    text: finding.rule_name.clone(),
                },
                full_description: (!finding.remediation.is_empty()).then(|| Message {
                    text: finding.remediation.clone(),
                }),
            });
    }

    let results = result
        .findings
        .iter()
        .map(|finding| SarifResult {
            rule_id: finding.rule_id.clone(),
            level: severity_to_level(finding.severity).to_string(),
            message: Message {
                text: format!(
                    "{}: {}",
                    finding.rule_name,
                    super::display_match(finding, redact)
                ),
            },
            locations: vec![Location {
                physical_location: PhysicalLocation {
                    artifact_location: ArtifactLocation {
                        uri: finding.relative_path.replace('\\', "/"),
                    },
                    region: Region {
                        start_line: finding.line,
                        start_column: finding.column,
                    },
                },
            }],
            properties: ResultProperties {
                category: finding.category.to_string(),
                risk_score: finding.risk_score,
            },
        })
        .collect();

    SarifLog {
        schema: SARIF_SCHEMA.to_string(),
        version: SARIF_VERSION.to_string(),
        runs: vec![Run {
            tool: Tool {
                driver: Driver {
                    name: TOOL_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    information_uri: TOOL_INFO_URI.to_string(),
                    rules: descriptors.into_values().collect(),
                },
            },
            results,
        }],
    }
}

/// Render as a JSON string.
pub fn render(result: &ScanResult, redact: bool) -> String {
    serde_json::to_string_pretty(&to_sarif(result, redact)).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ferret_core::{ContextLine, Finding, ScanSummary, ThreatCategory};
    use std::collections::BTreeMap as Map;
    use std::path::PathBuf;

    fn finding(rule_id: &str, line: usize) -> Finding {
        Finding {
            rule_id: rule_id.to_string(),
            rule_name: "Instruction override".to_string(),
            severity: Severity::High,
            category: ThreatCategory::Injection,
            path: PathBuf::from("/scan/a.md"),
            relative_path: "a.md".to_string(),
            line,
            column: Some(1),
            matched: "ignore previous instructions".to_string(),
            context: vec![ContextLine {
                line_number: line,
                content: "ignore previous instructions".to_string(),
                is_match: true,
            }],
            remediation: "remove it".to_string(),
            metadata: None,
            timestamp: Utc::now(),
            risk_score: 75,
        }
    }

    fn result_with(findings: Vec<Finding>) -> ScanResult {
        let summary = ScanSummary::from_findings(&findings);
        ScanResult {
            success: true,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            duration_ms: 10,
            scanned_paths: vec![PathBuf::from(".")],
            total_files: 1,
            analyzed_files: 1,
            skipped_files: 0,
            by_severity: Map::new(),
            by_category: Map::new(),
            overall_risk_score: 50,
            summary,
            errors: vec![],
            ignored_findings: 0,
            baseline_suppressed: 0,
            findings,
        }
    }

    #[test]
    fn duplicate_rule_ids_share_one_descriptor() {
        let result = result_with(vec![finding("INJ-001", 10), finding("INJ-001", 20)]);
        let sarif = to_sarif(&result, true);
        assert_eq!(sarif.version, "2.1.0");
        assert_eq!(sarif.runs.len(), 1);
        let run = &sarif.runs[0];
        assert_eq!(run.tool.driver.name, "ferret-scan");
        assert_eq!(run.tool.driver.rules.len(), 1);
        assert_eq!(run.tool.driver.rules[0].id, "INJ-001");
        assert_eq!(run.results.len(), 2);
        assert_eq!(run.results[0].locations[0].physical_location.region.start_line, 10);
        assert_eq!(run.results[1].locations[0].physical_location.region.start_line, 20);
    }

    #[test]
    fn severity_level_mapping() {
        assert_eq!(severity_to_level(Severity::Critical), "error");
        assert_eq!(severity_to_level(Severity::High), "error");
        assert_eq!(severity_to_level(Severity::Medium), "warning");
        assert_eq!(severity_to_level(Severity::Low), "note");
        assert_eq!(severity_to_level(Severity::Info), "info");
    }

    #[test]
    fn results_carry_category_and_risk() {
        let result = result_with(vec![finding("INJ-001", 10)]);
        let json: serde_json::Value =
            serde_json::from_str(&render(&result, true)).unwrap();
        let sarif_result = &json["runs"][0]["results"][0];
        assert_eq!(sarif_result["properties"]["category"], "injection");
        assert_eq!(sarif_result["properties"]["riskScore"], 75);
        assert_eq!(json["$schema"], SARIF_SCHEMA);
    }
}
