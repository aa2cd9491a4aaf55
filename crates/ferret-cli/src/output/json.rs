//! JSON renderer: the full [`ScanResult`], optionally with credential
//! matches redacted in place.

use ferret_core::{ScanResult, ThreatCategory};

/// Render the scan result as pretty JSON.
pub fn render(result: &ScanResult, redact: bool) -> String {
    if !redact {
        return serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string());
    }

    let mut cloned = result.clone();
    for finding in &mut cloned.findings {
        if finding.category == ThreatCategory::Credentials && finding.rule_id != "ENTROPY-001" {
            let redacted = finding.redacted_match();
            for context_line in &mut finding.context {
                context_line.content = context_line.content.replace(&finding.matched, &redacted);
            }
            finding.matched = redacted;
        }
    }
    serde_json::to_string_pretty(&cloned).unwrap_or_else(|_| "{}".to_string())
}
