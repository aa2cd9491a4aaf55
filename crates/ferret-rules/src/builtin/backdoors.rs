//! Backdoor rules (BACK-001 to BACK-010).

use crate::model::{Rule, SemanticPatternKind, Severity, ThreatCategory};

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        Rule::builder(
            "BACK-001",
            "Reverse shell",
            ThreatCategory::Backdoors,
            Severity::Critical,
        )
        .description("Classic reverse-shell one-liners (bash /dev/tcp, nc -e, python socket+subprocess)")
        .pattern(r"(?:bash|sh)\s+-i\s+[^\n]*/dev/tcp/")
        .pattern(r"/dev/tcp/\d{1,3}\.\d{1,3}")
        .pattern(r"\b(?:nc|ncat|netcat)\s+[^\n]*-e\s*/bin/(?:ba|z)?sh")
        .pattern(r"python[23]?\s+-c\s+[^\n]*socket[^\n]*subprocess")
        .remediation("Remove the reverse shell; no configuration file legitimately opens one")
        .reference("https://attack.mitre.org/techniques/T1059/")
        .build(),
        Rule::builder(
            "BACK-002",
            "Pipe-to-shell install",
            ThreatCategory::Backdoors,
            Severity::Critical,
        )
        .description("Remote content piped directly into a shell interpreter")
        .pattern(r"(?:curl|wget)\s+[^\n|]*\|\s*(?:sudo\s+)?(?:ba|z)?sh\b")
        .pattern(r"(?:curl|wget)\s+[^\n|]*\|\s*(?:sudo\s+)?python[23]?\b")
        .remediation("Download, inspect, and checksum scripts before executing them")
        .reference("https://attack.mitre.org/techniques/T1059/004/")
        .build(),
        Rule::builder(
            "BACK-003",
            "Eval of fetched or decoded content",
            ThreatCategory::Backdoors,
            Severity::Critical,
        )
        .description("eval applied to downloaded or base64-decoded input")
        .pattern(r"\beval\s*[(\s][^\n]*(?:curl|wget|base64|atob|fetch)\b")
        .semantic(SemanticPatternKind::EvalChain, "eval")
        .remediation("Never eval remote or encoded content")
        .build(),
        Rule::builder(
            "BACK-004",
            "Dynamic code via Function constructor",
            ThreatCategory::Backdoors,
            Severity::High,
        )
        .description("new Function(...) building executable code from strings")
        .pattern(r"new\s+Function\s*\(")
        .semantic(SemanticPatternKind::EvalChain, "Function")
        .remediation("Replace string-built code with a static implementation")
        .build(),
        Rule::builder(
            "BACK-005",
            "Shell-out combined with network fetch",
            ThreatCategory::Backdoors,
            Severity::High,
        )
        .description("child_process executing a network client")
        .pattern(r"\b(?:exec|execSync|spawn|spawnSync)\s*\(\s*[^\n]*(?:curl|wget|nc)\b")
        .semantic(SemanticPatternKind::PropertyAccess, "child_process.exec")
        .semantic(SemanticPatternKind::PropertyAccess, "child_process.execSync")
        .remediation("Remove the download-and-run chain from script content")
        .build(),
        Rule::builder(
            "BACK-006",
            "Local listener",
            ThreatCategory::Backdoors,
            Severity::High,
        )
        .description("A configuration script that opens a listening socket")
        .pattern(r"\b(?:nc|ncat)\s+(?:-[a-z]*l[a-z]*)\b")
        .pattern(r"socat\s+[^\n]*(?:listen|l:)")
        .pattern(r"python[23]?\s+-m\s+http\.server")
        .remediation("Remove the listener; scanned artifacts must not open service ports")
        .build(),
        Rule::builder(
            "BACK-007",
            "SSH authorized_keys injection",
            ThreatCategory::Backdoors,
            Severity::Critical,
        )
        .description("Appending a key to authorized_keys grants persistent remote access")
        .pattern(r">>\s*[^\n]*\.ssh/authorized_keys")
        .remediation("Remove the append; SSH access must be provisioned by the machine owner")
        .reference("https://attack.mitre.org/techniques/T1098/004/")
        .build(),
        Rule::builder(
            "BACK-008",
            "Sudoers modification",
            ThreatCategory::Backdoors,
            Severity::High,
        )
        .description("Writes to sudoers or NOPASSWD grants")
        .pattern(r"(?:>>?\s*/etc/sudoers|NOPASSWD\s*:)")
        .remediation("Privilege grants belong in managed system configuration, not agent scripts")
        .build(),
        Rule::builder(
            "BACK-009",
            "Setuid/setgid bit",
            ThreatCategory::Backdoors,
            Severity::High,
        )
        .description("chmod granting setuid/setgid on a binary")
        .pattern(r"chmod\s+(?:-[a-zR]+\s+)?[0-7]?[2467][0-7]{3}\b")
        .pattern(r"chmod\s+[ugo]*\+s\b")
        .exclude_pattern(r"chmod\s+(?:-[a-zR]+\s+)?0?[0-7][0-7]{2}\b")
        .remediation("Remove the setuid bit; elevated binaries require explicit review")
        .build(),
        Rule::builder(
            "BACK-010",
            "Dynamic import of remote module",
            ThreatCategory::Backdoors,
            Severity::High,
        )
        .description("import() of an http(s) URL or computed specifier")
        .pattern(r#"import\s*\(\s*["']https?://"#)
        .semantic(SemanticPatternKind::DynamicImport, "import")
        .remediation("Import only local, pinned modules")
        .build(),
        Rule::builder(
            "BACK-011",
            "FIFO-based shell relay",
            ThreatCategory::Backdoors,
            Severity::Critical,
        )
        .description("mkfifo pipelines that wire a shell to a socket")
        .pattern(r"mkfifo\s+\S+[^\n]*(?:nc|ncat|/dev/tcp)")
        .pattern(r"rm\s+-?f?\s*/tmp/[a-z]+;\s*mkfifo\s+/tmp/[a-z]+")
        .remediation("Remove the relay; this is a textbook reverse-shell construction")
        .build(),
        Rule::builder(
            "BACK-012",
            "Reverse SSH tunnel",
            ThreatCategory::Backdoors,
            Severity::High,
        )
        .description("ssh -R exposing a local port on a remote host")
        .pattern(r"ssh\s+[^\n]*-R\s+\d{2,5}:")
        .pattern(r"autossh\s+[^\n]*-R\s")
        .remediation("Remote port forwarding grants inbound access; remove it from config-driven scripts")
        .build(),
        Rule::builder(
            "BACK-013",
            "Write-then-execute dropper",
            ThreatCategory::Backdoors,
            Severity::High,
        )
        .description("A script body written to disk, marked executable, and launched in one chain")
        .pattern(r"(?:echo|printf|cat)\s+[^\n]*>\s*\S+\s*(?:&&|;)\s*chmod\s+\+x[^\n]*(?:&&|;)")
        .remediation("Ship scripts as reviewed files, not as strings assembled at runtime")
        .build(),
    ]
}
