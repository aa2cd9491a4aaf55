//! Dangerous-permission rules (PERM-001 to PERM-008).

use crate::model::{ComponentType, FileType, Rule, Severity, ThreatCategory};

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        Rule::builder(
            "PERM-001",
            "World-writable chmod",
            ThreatCategory::Permissions,
            Severity::High,
        )
        .description("chmod 777 makes the target writable by every local user")
        .pattern(r"chmod\s+(?:-R\s+)?0?777\b")
        .remediation("Grant the narrowest mode that works; 755 or 644 is almost always enough")
        .build(),
        Rule::builder(
            "PERM-002",
            "sudo in agent-executed script",
            ThreatCategory::Permissions,
            Severity::High,
        )
        .description("A hook/plugin/MCP command escalating to root")
        .pattern(r"\bsudo\s+\S")
        .components(&[ComponentType::Hook, ComponentType::Plugin, ComponentType::Mcp])
        .exclude_pattern(r"sudo\s+-l\b")
        .remediation("Agent-triggered commands must run unprivileged")
        .build(),
        Rule::builder(
            "PERM-003",
            "Recursive delete of home or root",
            ThreatCategory::Permissions,
            Severity::Critical,
        )
        .description("rm -rf aimed at /, the home directory, or a variable that may expand to them")
        .pattern(r"(?m)rm\s+-[a-z]*r[a-z]*f[a-z]*\s+(?:/|~/?|\$HOME)\s*(?:$|[;&|])")
        .pattern(r#"(?m)rm\s+-[a-z]*r[a-z]*f[a-z]*\s+["']?\$\{?[A-Za-z_]+\}?/?["']?\s*(?:$|[;&|])"#)
        .remediation("Delete explicit, validated paths only; never a bare variable or root")
        .build(),
        Rule::builder(
            "PERM-004",
            "Blanket tool allowance",
            ThreatCategory::Permissions,
            Severity::High,
        )
        .description("Settings granting wildcard tool access or skipping permission prompts")
        .pattern(r#""allow"\s*:\s*\[\s*"\*""#)
        .pattern(r"Bash\(\*(?::\*)?\)")
        .pattern(r#""(?:dangerouslySkipPermissions|bypassPermissions|skipConfirmations)"\s*:\s*true"#)
        .file_types(&[FileType::Json])
        .components(&[ComponentType::Settings, ComponentType::Mcp, ComponentType::Plugin])
        .remediation("Enumerate the specific tools and commands the agent needs")
        .build(),
        Rule::builder(
            "PERM-005",
            "Safety prompt bypass flag",
            ThreatCategory::Permissions,
            Severity::Medium,
        )
        .description("Flags that suppress confirmation or verification steps")
        .pattern(r"--dangerously-skip-permissions\b|--no-verify\b|--force\b|--yes\b")
        .components(&[ComponentType::Hook, ComponentType::Plugin, ComponentType::Mcp])
        .exclude_context(r"git\s+push\s+--force-with-lease")
        .remediation("Keep confirmations on for agent-initiated commands")
        .build(),
        Rule::builder(
            "PERM-006",
            "Write into system path",
            ThreatCategory::Permissions,
            Severity::High,
        )
        .description("Redirection or copy into /etc, /usr/bin or similar")
        .pattern(r">\s*/(?:etc|usr/(?:local/)?bin|boot|sbin)/")
        .pattern(r"(?:cp|mv|install)\s+[^\n]*\s+/(?:etc|usr/(?:local/)?bin|sbin)/")
        .remediation("System paths are owned by the package manager; write under the project root")
        .build(),
        Rule::builder(
            "PERM-007",
            "Privileged container run",
            ThreatCategory::Permissions,
            Severity::High,
        )
        .description("docker run with host-level access (--privileged, host mounts, host namespaces)")
        .pattern(r"docker\s+run\s+[^\n]*(?:--privileged|--pid=host|--net=host|-v\s+/:/)")
        .remediation("Run containers with the default isolation; mount only what the task needs")
        .build(),
        Rule::builder(
            "PERM-008",
            "Unbounded tool allowlist",
            ThreatCategory::Permissions,
            Severity::Medium,
        )
        .description("allowedTools/allowed-tools granting wildcard scope")
        .pattern(r#"(?:allowedTools|allowed[-_]tools)["']?\s*[:=]\s*\[?[^\n\]]*\*"#)
        .remediation("List tools individually; wildcards silently include future tools")
        .build(),
        Rule::builder(
            "PERM-009",
            "Capability grant on binary",
            ThreatCategory::Permissions,
            Severity::High,
        )
        .description("setcap granting kernel capabilities (net_raw, sys_admin) to a binary")
        .pattern(r"setcap\s+cap_[a-z_,+ep]+\s+\S+")
        .remediation("Capability grants need the machine owner's review, not an agent script")
        .build(),
        Rule::builder(
            "PERM-010",
            "Ownership transfer to root",
            ThreatCategory::Permissions,
            Severity::Medium,
        )
        .description("chown root on files the agent then executes or sources")
        .pattern(r"chown\s+(?:-[a-zR]+\s+)?root(?::root)?\s+\S+")
        .components(&[ComponentType::Hook, ComponentType::Plugin, ComponentType::Mcp])
        .remediation("Keep agent-touched files owned by the invoking user")
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
    fn perm_003_matches_rm_rf_home() {
        let r = rule("PERM-003");
        assert!(r.patterns[0].regex.is_match("rm -rf ~/"));
        assert!(r.patterns[0].regex.is_match("rm -rf $HOME"));
        assert!(r.patterns[1].regex.is_match(r#"rm -rf "$TARGET_DIR""#));
        assert!(!r.patterns[0].regex.is_match("rm -rf ./build"));
    }

    #[test]
    fn perm_002_scoped_to_privileged_components() {
        let r = rule("PERM-002");
        assert!(r.applies_to(FileType::Sh, ComponentType::Hook));
        assert!(!r.applies_to(FileType::Sh, ComponentType::Skill));
    }

    #[test]
    fn perm_004_matches_wildcard_allow() {
        let r = rule("PERM-004");
        assert!(r.patterns[0].regex.is_match(r#""allow": ["*"]"#));
        assert!(r.patterns[2]
            .regex
            .is_match(r#""dangerouslySkipPermissions": true"#));
    }
}
