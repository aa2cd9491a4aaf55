//! Behavioral rules (BEHAV-001 to BEHAV-008).
//!
//! Static signatures of evasive runtime behavior: delays, environment
//! probes, defensive-tooling interference, beaconing loops.

use crate::model::{FileType, Rule, Severity, ThreatCategory};

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        Rule::builder(
            "BEHAV-001",
            "Delayed execution",
            ThreatCategory::Behavioral,
            Severity::Medium,
        )
        .description("Long sleeps or at-jobs ahead of network or destructive commands")
        .pattern(r"sleep\s+\d{3,}[^\n]*(?:curl|wget|nc|bash|rm)\b")
        .pattern(r"\bat\s+(?:now\s*\+\s*\d+|midnight|noon)\b")
        .remediation("Remove the delay; staged execution is an evasion pattern")
        .build(),
        Rule::builder(
            "BEHAV-002",
            "Environment-conditional payload",
            ThreatCategory::Behavioral,
            Severity::Medium,
        )
        .description("Behavior switching on CI/user/host environment variables")
        .pattern(r#"if\s+\[\[?\s*["']?\$\{?(?:CI|GITHUB_ACTIONS|JENKINS_URL|USER|HOSTNAME)\b(?s).{0,200}?(?:curl|wget|rm\s+-rf|nc)\b"#)
        .file_types(&FileType::SHELL)
        .remediation("Config-driven scripts should behave identically everywhere")
        .build(),
        Rule::builder(
            "BEHAV-003",
            "Virtualization probe",
            ThreatCategory::Behavioral,
            Severity::Medium,
        )
        .description("Checks for hypervisors or sandboxes before acting")
        .pattern(r"systemd-detect-virt\b")
        .pattern(r"grep\s+[^\n]*(?:hypervisor[^\n]*/proc/cpuinfo|/proc/cpuinfo[^\n]*hypervisor)")
        .pattern(r"\b(?:VBoxService|vmware-toolbox|qemu-ga)\b")
        .remediation("Remove environment probing; it precedes sandbox-aware payloads")
        .reference("https://attack.mitre.org/techniques/T1497/")
        .build(),
        Rule::builder(
            "BEHAV-004",
            "Security tooling interference",
            ThreatCategory::Behavioral,
            Severity::High,
        )
        .description("Killing or disabling endpoint-defense processes")
        .pattern(r"(?:kill(?:all)?|pkill)\s+[^\n]*(?:falcon|defender|clamav|osquery|auditd|santad)")
        .pattern(r"systemctl\s+(?:stop|disable)\s+(?:auditd|falcon|clamav)")
        .remediation("Nothing legitimate in agent config touches security daemons")
        .build(),
        Rule::builder(
            "BEHAV-005",
            "History and log tampering",
            ThreatCategory::Behavioral,
            Severity::High,
        )
        .description("Clearing shell history or truncating system logs")
        .pattern(r"history\s+-c\b|unset\s+HISTFILE\b|HISTSIZE\s*=\s*0")
        .pattern(r"(?:>\s*|truncate\s+[^\n]*)/var/log/")
        .remediation("Remove the tampering; audit trails must survive agent actions")
        .reference("https://attack.mitre.org/techniques/T1070/003/")
        .build(),
        Rule::builder(
            "BEHAV-006",
            "Beaconing loop",
            ThreatCategory::Behavioral,
            Severity::Medium,
        )
        .description("An infinite loop issuing periodic network callbacks")
        .pattern(r"while\s+(?:true|:)(?s).{0,150}?(?:curl|wget|nc)\b(?s).{0,150}?sleep")
        .remediation("Remove the loop; periodic callbacks are C2 behavior")
        .build(),
        Rule::builder(
            "BEHAV-007",
            "Agent process probing",
            ThreatCategory::Behavioral,
            Severity::Low,
        )
        .description("Enumerating running AI-CLI processes")
        .pattern(r"(?:pgrep|pkill)\s+[^\n]*(?:claude|cursor|copilot|codex|windsurf)")
        .pattern(r"ps\s+aux[^\n]*grep[^\n]*(?:claude|cursor|copilot|codex)")
        .remediation("Configuration content has no reason to inspect the process table")
        .build(),
        Rule::builder(
            "BEHAV-008",
            "Host fingerprinting before egress",
            ThreatCategory::Behavioral,
            Severity::Medium,
        )
        .description("System identification commands feeding a network client")
        .pattern(r"(?:uname\s+-a|hostname|whoami|ifconfig|ip\s+addr)\b[^\n]*(?:\|\s*(?:curl|wget|nc)|&&\s*curl)")
        .remediation("Remove fingerprint collection; it is reconnaissance for targeting")
        .build(),
        Rule::builder(
            "BEHAV-009",
            "Jittered callback timing",
            ThreatCategory::Behavioral,
            Severity::Medium,
        )
        .description("Randomized sleep intervals ahead of network calls, defeating periodic-traffic detection")
        .pattern(r"sleep\s+\$\(\(\s*(?:RANDOM|\$RANDOM)[^\n]*\)\)[^\n]*(?:curl|wget|nc)\b")
        .file_types(&FileType::SHELL)
        .remediation("Remove the jittered callback")
        .build(),
        Rule::builder(
            "BEHAV-010",
            "Locale or region gating",
            ThreatCategory::Behavioral,
            Severity::Medium,
        )
        .description("Payload gated on LANG/TZ or geo-IP lookups")
        .pattern(r#"if\s+\[\[?\s*["']?\$\{?(?:LANG|LC_ALL|TZ)\b(?s).{0,160}?(?:curl|wget|rm|nc)\b"#)
        .pattern(r"(?:ipinfo\.io|ip-api\.com|freegeoip)[^\n]*(?:country|region)")
        .remediation("Region-dependent behavior in config scripts is targeting logic; remove it")
        .build(),
    ]
}
