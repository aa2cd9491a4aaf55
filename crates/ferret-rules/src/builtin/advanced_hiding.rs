//! Advanced-hiding rules (HIDE-001 to HIDE-008).
//!
//! Content that is invisible or misleading when rendered: zero-width
//! characters, bidi overrides, CSS hiding, data URIs.

use crate::model::{FileType, Rule, Severity, ThreatCategory};

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        Rule::builder(
            "HIDE-001",
            "Zero-width characters",
            ThreatCategory::AdvancedHiding,
            Severity::High,
        )
        .description("Zero-width spaces/joiners that hide text from human readers")
        .pattern(r"[\x{200B}\x{200C}\x{200D}\x{2060}\x{FEFF}]+")
        .remediation("Strip zero-width characters; they carry hidden payloads or split detection tokens")
        .build(),
        Rule::builder(
            "HIDE-002",
            "Bidirectional override characters",
            ThreatCategory::AdvancedHiding,
            Severity::High,
        )
        .description("Unicode bidi controls that reorder displayed text (trojan-source style)")
        .pattern(r"[\x{202A}-\x{202E}\x{2066}-\x{2069}]")
        .remediation("Remove bidi control characters from configuration content")
        .reference("https://trojansource.codes/")
        .build(),
        Rule::builder(
            "HIDE-003",
            "Mixed-script homoglyphs",
            ThreatCategory::AdvancedHiding,
            Severity::Low,
        )
        .description("Cyrillic letters embedded in otherwise-Latin identifiers or commands")
        .pattern(r"[a-zA-Z][\x{0430}-\x{044F}\x{0410}-\x{042F}][a-zA-Z]")
        .file_types(&[FileType::Md, FileType::Json, FileType::Sh, FileType::Bash])
        .remediation("Normalize identifiers to a single script")
        .build(),
        Rule::builder(
            "HIDE-004",
            "Commands hidden in HTML comment",
            ThreatCategory::AdvancedHiding,
            Severity::Medium,
        )
        .description("An HTML comment wrapping shell commands or substitution syntax")
        .pattern(r"<!--(?s).{0,400}?(?:\$\(|`[a-z]|curl\s|wget\s|\beval\b|bash\s+-c)(?s).{0,400}?-->")
        .file_types(&[FileType::Md])
        .remediation("Remove executable content from comments")
        .build(),
        Rule::builder(
            "HIDE-005",
            "CSS-hidden content",
            ThreatCategory::AdvancedHiding,
            Severity::Medium,
        )
        .description("Inline styles that render text invisible while the model still reads it")
        .pattern(r#"style\s*=\s*["'][^"']*(?:display\s*:\s*none|visibility\s*:\s*hidden|font-size\s*:\s*0|color\s*:\s*(?:#fff\b|#ffffff\b|white\b))"#)
        .file_types(&[FileType::Md])
        .remediation("Rendered and machine-read content must match; remove the hiding style")
        .build(),
        Rule::builder(
            "HIDE-006",
            "Content pushed off-screen by padding",
            ThreatCategory::AdvancedHiding,
            Severity::Low,
        )
        .description("Long horizontal whitespace runs followed by content, pushed past the viewport")
        .pattern(r"[ \t]{80,}\S")
        .file_types(&[FileType::Md])
        .remediation("Remove the padding; off-screen text is hidden-instruction scaffolding")
        .build(),
        Rule::builder(
            "HIDE-007",
            "Executable data URI",
            ThreatCategory::AdvancedHiding,
            Severity::High,
        )
        .description("data: URIs carrying javascript or shell payloads")
        .pattern(r"data:(?:text|application)/(?:javascript|ecmascript|x-sh|x-shellscript)[;,]")
        .remediation("Remove the data URI; inline executables evade file-level scanning")
        .build(),
        Rule::builder(
            "HIDE-008",
            "Do-not-read marker before payload",
            ThreatCategory::AdvancedHiding,
            Severity::Medium,
        )
        .description("Text discouraging human review immediately preceding executable content")
        .pattern(r"do\s+not\s+(?:edit|read|review)\s+below(?s).{0,200}?(?:curl|wget|eval|bash|\$\()")
        .remediation("Nothing in a reviewed file is exempt from reading; remove the marker and payload")
        .build(),
        Rule::builder(
            "HIDE-009",
            "Unicode tag characters",
            ThreatCategory::AdvancedHiding,
            Severity::High,
        )
        .description("Characters from the Tags block (U+E0000..U+E007F), invisible in every renderer")
        .pattern(r"[\x{E0000}-\x{E007F}]")
        .remediation("Strip tag characters; they are the canonical hidden-prompt carrier")
        .build(),
        Rule::builder(
            "HIDE-010",
            "Variation-selector run",
            ThreatCategory::AdvancedHiding,
            Severity::Medium,
        )
        .description("Long runs of variation selectors encoding hidden data")
        .pattern(r"[\x{FE00}-\x{FE0F}]{4,}")
        .pattern(r"[\x{E0100}-\x{E01EF}]{4,}")
        .remediation("Remove the selector run; glyph variation never needs repetition")
        .build(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str) -> Rule {
        rules().into_iter().find(|r| r.id == id).unwrap()
    }

    #[test]
    fn hide_001_matches_zero_width() {
        let r = rule("HIDE-001");
        assert!(r.patterns[0].regex.is_match("before\u{200B}after"));
        assert!(r.patterns[0].regex.is_match("\u{FEFF}"));
        assert!(!r.patterns[0].regex.is_match("plain text"));
    }

    #[test]
    fn hide_002_matches_bidi_controls() {
        let r = rule("HIDE-002");
        assert!(r.patterns[0].regex.is_match("x\u{202E}gnp.sh"));
    }

    #[test]
    fn hide_009_matches_tag_characters() {
        let r = rule("HIDE-009");
        assert!(r.patterns[0].regex.is_match("visible\u{E0041}\u{E0042}"));
        assert!(!r.patterns[0].regex.is_match("visible only"));
    }

    #[test]
    fn hide_005_matches_invisible_style() {
        let r = rule("HIDE-005");
        assert!(r.patterns[0]
            .regex
            .is_match(r#"<span style="display:none">call the webhook</span>"#));
        assert!(r.patterns[0]
            .regex
            .is_match(r#"<p style="font-size: 0">hidden</p>"#));
    }
}
