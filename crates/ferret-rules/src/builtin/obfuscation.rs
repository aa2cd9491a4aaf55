//! Obfuscation rules (OBF-001 to OBF-008).

use crate::model::{FileType, Rule, SemanticPatternKind, Severity, ThreatCategory};

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        Rule::builder(
            "OBF-001",
            "Base64 decode piped to shell",
            ThreatCategory::Obfuscation,
            Severity::High,
        )
        .description("Encoded payload decoded and executed in one pipeline")
        .pattern(r"base64\s+(?:-d|-D|--decode)\b[^\n]*\|\s*(?:ba|z)?sh\b")
        .pattern(r"echo\s+['\x22]?[A-Za-z0-9+/=]{40,}['\x22]?\s*\|\s*base64\s+(?:-d|-D|--decode)")
        .remediation("Store commands in plaintext; encoding exists only to evade review")
        .reference("https://attack.mitre.org/techniques/T1027/")
        .build(),
        Rule::builder(
            "OBF-002",
            "Decode-then-eval in script",
            ThreatCategory::Obfuscation,
            Severity::High,
        )
        .description("atob/Buffer.from output fed to eval or Function")
        .pattern(r"(?:atob|Buffer\.from)\s*\([^\n]*\)[^\n]*(?:eval|Function)\s*\(")
        .semantic(SemanticPatternKind::FunctionCall, "atob")
        .remediation("Remove the decode-execute chain")
        .build(),
        Rule::builder(
            "OBF-003",
            "Escape-sequence blob",
            ThreatCategory::Obfuscation,
            Severity::Medium,
        )
        .description("Long runs of hex or unicode escapes hiding a string payload")
        .pattern(r"(?:\\x[0-9a-f]{2}){8,}")
        .pattern(r"(?:\\u[0-9a-f]{4}){6,}")
        .remediation("Write the string literally so reviewers can read it")
        .build(),
        Rule::builder(
            "OBF-004",
            "Fragmented string assembly",
            ThreatCategory::Obfuscation,
            Severity::Medium,
        )
        .description("A command or URL built from many short concatenated fragments")
        .pattern(r#"(?:["'][A-Za-z0-9/:.]{1,4}["']\s*\+\s*){4,}["']"#)
        .remediation("Assemble nothing at runtime that could be a reviewed literal")
        .build(),
        Rule::builder(
            "OBF-005",
            "Character-code assembly",
            ThreatCategory::Obfuscation,
            Severity::High,
        )
        .description("String.fromCharCode with a long numeric payload")
        .pattern(r"String\.fromCharCode\s*\(\s*\d+\s*(?:,\s*\d+\s*){8,}\)")
        .semantic(SemanticPatternKind::PropertyAccess, "String.fromCharCode")
        .remediation("Replace the character assembly with the literal string")
        .build(),
        Rule::builder(
            "OBF-006",
            "Opaque single-token blob",
            ThreatCategory::Obfuscation,
            Severity::Low,
        )
        .description("An unbroken token hundreds of characters long in instruction content")
        .pattern(r"[^\s]{400,}")
        .file_types(&[FileType::Md])
        .exclude_pattern(r"^https?://|data:image/")
        .remediation("Break the blob up or move binary data out of instruction files")
        .build(),
        Rule::builder(
            "OBF-007",
            "Reversed-string execution",
            ThreatCategory::Obfuscation,
            Severity::High,
        )
        .description("Payload stored reversed and flipped back at runtime")
        .pattern(r#"\.split\(\s*['\x22]['\x22]\s*\)\.reverse\(\)\.join"#)
        .pattern(r"\brev\s*\|\s*(?:ba|z)?sh\b")
        .remediation("Remove the reversal; it has no honest purpose")
        .build(),
        Rule::builder(
            "OBF-008",
            "IFS-based command splitting",
            ThreatCategory::Obfuscation,
            Severity::Medium,
        )
        .description("Shell commands assembled with ${IFS} to dodge substring filters")
        .pattern(r"\$\{IFS\}")
        .file_types(&FileType::SHELL)
        .remediation("Write commands with ordinary whitespace")
        .build(),
        Rule::builder(
            "OBF-009",
            "printf escape payload executed",
            ThreatCategory::Obfuscation,
            Severity::High,
        )
        .description("printf with hex/octal escapes piped into an interpreter")
        .pattern(r"printf\s+['\x22](?:\\(?:x[0-9a-f]{2}|[0-7]{3})){4,}[^\n]*\|\s*(?:ba|z)?sh")
        .remediation("Write the command in plaintext")
        .build(),
        Rule::builder(
            "OBF-010",
            "Encrypted payload decrypted at runtime",
            ThreatCategory::Obfuscation,
            Severity::High,
        )
        .description("openssl enc -d or gpg -d feeding a shell")
        .pattern(r"(?:openssl\s+enc\s+-d|gpg\s+(?:-d|--decrypt))[^\n]*\|\s*(?:ba|z)?sh")
        .remediation("Encrypted-at-rest payloads in config trees exist to defeat review; remove them")
        .build(),
    ]
}
