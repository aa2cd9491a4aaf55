//! Self-contained HTML report.

use ferret_core::{ScanResult, Severity};

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn severity_class(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "critical",
        Severity::High => "high",
        Severity::Medium => "medium",
        Severity::Low => "low",
        Severity::Info => "info",
    }
}

pub fn render(result: &ScanResult, redact: bool) -> String {
    let mut rows = String::new();
    for finding in &result.findings {
        rows.push_str(&format!(
            "<tr class=\"{class}\"><td>{sev}</td><td>{id}</td><td>{cat}</td>\
             <td>{file}:{line}</td><td>{risk}</td><td><code>{snippet}</code></td></tr>\n",
            class = severity_class(finding.severity),
            sev = finding.severity,
            id = escape(&finding.rule_id),
            cat = finding.category,
            file = escape(&finding.relative_path),
            line = finding.line,
            risk = finding.risk_score,
            snippet = escape(&super::display_match(finding, redact)),
        ));
    }

    let s = &result.summary;
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>ferret-scan report</title>
<style>
body {{ font-family: -apple-system, system-ui, sans-serif; margin: 2rem; color: #1c1c1c; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ text-align: left; padding: 0.4rem 0.7rem; border-bottom: 1px solid #ddd; }}
tr.critical td:first-child {{ color: #b00020; font-weight: 700; }}
tr.high td:first-child {{ color: #d32f2f; }}
tr.medium td:first-child {{ color: #b8860b; }}
tr.low td:first-child {{ color: #0277bd; }}
tr.info td:first-child {{ color: #777; }}
code {{ background: #f5f5f5; padding: 0 0.25rem; }}
.summary {{ margin: 1rem 0; }}
</style>
</head>
<body>
<h1>ferret-scan report</h1>
<p class="summary">{analyzed} files analyzed, {skipped} skipped in {duration}ms.
{total} findings ({critical} critical, {high} high, {medium} medium, {low} low, {info} info).
Overall risk score: {risk}.</p>
<table>
<thead><tr><th>Severity</th><th>Rule</th><th>Category</th><th>Location</th><th>Risk</th><th>Match</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
</body>
</html>
"#,
        analyzed = result.analyzed_files,
        skipped = result.skipped_files,
        duration = result.duration_ms,
        total = s.total,
        critical = s.critical,
        high = s.high,
        medium = s.medium,
        low = s.low,
        info = s.info,
        risk = result.overall_risk_score,
        rows = rows,
    )
}
