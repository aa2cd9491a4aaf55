//! CSV renderer: one row per finding.

use ferret_core::ScanResult;

const HEADER: &str = "ruleId,severity,category,file,line,column,riskScore,match";

fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn render(result: &ScanResult, redact: bool) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for finding in &result.findings {
        let row = [
            finding.rule_id.clone(),
            finding.severity.to_string(),
            finding.category.to_string(),
            finding.relative_path.clone(),
            finding.line.to_string(),
            finding.column.map(|c| c.to_string()).unwrap_or_default(),
            finding.risk_score.to_string(),
            super::display_match(finding, redact),
        ];
        let escaped: Vec<String> = row.iter().map(|f| escape(f)).collect();
        out.push_str(&escaped.join(","));
        out.push('\n');
    }
    out
}
