//! File discovery: path walking, filtering, and component classification.
//!
//! Classification is purely path-based (no content sniffing). The walk
//! collects per-entry errors instead of aborting, and emits files sorted by
//! (component, relative path) for deterministic downstream processing.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use ignore::WalkBuilder;
use serde::Serialize;

use ferret_rules::{ComponentType, FileType};

use crate::config::{MarketplaceMode, ScannerConfig};
use crate::errors::{IssueKind, ScanIssue};

/// Low-signal documentation filenames dropped from marketplace trees in
/// "configs" mode. Matching is case-insensitive on the stem.
const LOW_SIGNAL_DOC_STEMS: &[&str] = &["readme", "changelog", "license", "contributing"];

/// Marketplace subtrees that stay in "configs" mode.
const HIGH_SIGNAL_DIRS: &[&str] = &["agents", "skills", "hooks", "commands"];

/// Marketplace filenames that stay in "configs" mode regardless of subtree.
const HIGH_SIGNAL_FILES: &[&str] = &[
    "skill.md",
    "plugin.json",
    ".mcp.json",
    "mcp.json",
    "settings.json",
    "settings.local.json",
];

/// A file that passed every discovery filter. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Relative to the scan root, forward-slashed.
    pub relative_path: String,
    pub file_type: FileType,
    pub component: ComponentType,
    pub size: u64,
    #[serde(skip)]
    pub modified: Option<SystemTime>,
}

/// Walk counters surfaced in the scan result.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoveryCounts {
    /// Regular files seen by the walker.
    pub total_files: usize,
    /// Files that passed all filters.
    pub analyzed_files: usize,
    /// total - analyzed.
    pub skipped_files: usize,
}

/// One user ignore pattern; `!`-prefixed patterns re-include.
struct IgnorePattern {
    pattern: glob::Pattern,
    negated: bool,
}

fn compile_ignores(patterns: &[String]) -> (Vec<IgnorePattern>, Vec<ScanIssue>) {
    let mut compiled = Vec::new();
    let mut issues = Vec::new();
    for raw in patterns {
        let (negated, body) = match raw.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, raw.as_str()),
        };
        match glob::Pattern::new(body) {
            Ok(pattern) => compiled.push(IgnorePattern { pattern, negated }),
            Err(e) => issues.push(ScanIssue::new(
                IssueKind::Config,
                format!("invalid ignore pattern '{raw}': {e}"),
            )),
        }
    }
    (compiled, issues)
}

const IGNORE_MATCH_OPTIONS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Decide whether `rel` is excluded. Built-in exclusions run first; user
/// patterns are applied in order and the last match wins, so a trailing
/// `!pattern` re-includes what a built-in exclusion dropped.
fn is_excluded(rel: &str, file_name: &str, config: &ScannerConfig, ignores: &[IgnorePattern]) -> bool {
    let mut excluded = builtin_exclusion(rel, file_name, config.marketplace_mode);
    for entry in ignores {
        if entry.pattern.matches_with(rel, IGNORE_MATCH_OPTIONS) {
            excluded = !entry.negated;
        }
    }
    excluded
}

fn path_segments(rel: &str) -> impl Iterator<Item = &str> {
    rel.split('/').filter(|s| !s.is_empty())
}

fn has_subpath(rel: &str, needle: &[&str]) -> bool {
    let segments: Vec<&str> = path_segments(rel).collect();
    segments
        .windows(needle.len())
        .any(|window| window == needle)
}

/// Built-in tree exclusions for plugin caches, marketplaces, and the Cursor
/// and OpenClaw runtime caches.
fn builtin_exclusion(rel: &str, file_name: &str, mode: MarketplaceMode) -> bool {
    if has_subpath(rel, &[".claude", "plugins", "cache"]) {
        return true;
    }
    if has_subpath(rel, &[".cursor", "cache"])
        || has_subpath(rel, &[".cursor", "extensions"])
        || has_subpath(rel, &[".openclaw", "cache"])
        || has_subpath(rel, &[".openclaw", "runtime"])
    {
        return mode != MarketplaceMode::All;
    }
    if has_subpath(rel, &[".claude", "plugins", "marketplaces"]) {
        return match mode {
            MarketplaceMode::Off => true,
            MarketplaceMode::All => false,
            MarketplaceMode::Configs => !marketplace_high_signal(rel, file_name),
        };
    }
    false
}

/// In "configs" marketplace mode, keep only high-signal content: the
/// agents/skills/hooks/commands subtrees and known configuration filenames.
/// references/ subtrees and low-signal docs are dropped.
fn marketplace_high_signal(rel: &str, file_name: &str) -> bool {
    if path_segments(rel).any(|s| s == "references") {
        return false;
    }
    let lower = file_name.to_ascii_lowercase();
    let stem = lower.split('.').next().unwrap_or("");
    if LOW_SIGNAL_DOC_STEMS.contains(&stem) {
        return false;
    }
    if HIGH_SIGNAL_FILES.contains(&lower.as_str()) || lower.contains("hook") {
        return true;
    }
    path_segments(rel).any(|s| HIGH_SIGNAL_DIRS.contains(&s))
}

/// Dotenv-style filenames (classified as shell for pattern purposes).
fn is_dotenv_name(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    lower == ".env"
        || lower.ends_with(".env")
        || lower.starts_with(".env.")
        || lower.contains(".env.")
}

/// Resolve the [`FileType`] for a filename, honoring the dotenv rule.
pub fn resolve_file_type(file_name: &str) -> Option<FileType> {
    if is_dotenv_name(file_name) {
        return Some(FileType::Sh);
    }
    let ext = file_name.rsplit_once('.').map(|(_, ext)| ext)?;
    FileType::from_extension(&ext.to_ascii_lowercase())
}

/// Component classification, first match wins. Returns the component and
/// whether it came from the extension fallback (used by `config_only`).
pub fn classify_component(rel: &str, file_name: &str, file_type: FileType) -> (ComponentType, bool) {
    let lower_name = file_name.to_ascii_lowercase();
    let segments: Vec<&str> = path_segments(rel).collect();
    let dirs = &segments[..segments.len().saturating_sub(1)];

    if dirs.iter().any(|s| *s == "skills") {
        return (ComponentType::Skill, false);
    }
    if dirs.iter().any(|s| *s == "agents") {
        return (ComponentType::Agent, false);
    }
    if dirs.iter().any(|s| *s == "hooks") || lower_name.contains("hook") {
        return (ComponentType::Hook, false);
    }
    if dirs.iter().any(|s| *s == "plugins") {
        return (ComponentType::Plugin, false);
    }
    if lower_name == ".mcp.json" || lower_name == "mcp.json" {
        return (ComponentType::Mcp, false);
    }
    if matches!(
        lower_name.as_str(),
        ".cursorrules" | ".windsurfrules" | ".clinerules"
    ) {
        return (ComponentType::RulesFile, false);
    }
    if lower_name == "settings.json"
        || lower_name == "settings.local.json"
        || lower_name.contains("config")
    {
        return (ComponentType::Settings, false);
    }
    if matches!(
        file_name,
        "CLAUDE.md" | "AI.md" | "AGENT.md" | "AGENTS.md"
    ) || lower_name.starts_with("claude")
    {
        return (ComponentType::AiConfigMd, false);
    }

    let fallback = match file_type {
        FileType::Json => ComponentType::Settings,
        FileType::Md => ComponentType::AiConfigMd,
        _ => ComponentType::Settings,
    };
    (fallback, true)
}

fn normalize_rel_path(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let rel = rel.to_string_lossy().replace('\\', "/");
    rel.strip_prefix("./").unwrap_or(&rel).to_string()
}

/// Discover all scannable files under the given input paths.
pub fn discover_files(
    paths: &[PathBuf],
    config: &ScannerConfig,
) -> (Vec<DiscoveredFile>, Vec<ScanIssue>, DiscoveryCounts) {
    let (ignores, mut issues) = compile_ignores(&config.ignore);
    let mut files = Vec::new();
    let mut counts = DiscoveryCounts::default();

    for input in paths {
        if !input.exists() {
            issues.push(
                ScanIssue::new(IssueKind::Discovery, "path does not exist")
                    .with_path(input.to_string_lossy()),
            );
            continue;
        }

        // Walk the canonical path so entry paths strip cleanly against the
        // root. Canonicalization failure falls back to the path as given.
        let walk_target = std::fs::canonicalize(input).unwrap_or_else(|_| input.clone());
        let root = if walk_target.is_file() {
            walk_target
                .parent()
                .unwrap_or(Path::new("."))
                .to_path_buf()
        } else {
            walk_target.clone()
        };

        let walker = WalkBuilder::new(&walk_target)
            .hidden(false)
            .git_ignore(true)
            .git_exclude(false)
            .follow_links(false)
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    issues.push(ScanIssue::new(IssueKind::Discovery, e.to_string()));
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            counts.total_files += 1;

            let path = entry.path();
            let rel = normalize_rel_path(path, &root);
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();

            if is_excluded(&rel, &file_name, config, &ignores) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    issues.push(
                        ScanIssue::new(IssueKind::Read, e.to_string())
                            .with_path(path.to_string_lossy()),
                    );
                    continue;
                }
            };
            if metadata.len() > config.max_file_size {
                tracing::debug!(path = %path.display(), size = metadata.len(), "file exceeds max_file_size");
                continue;
            }

            let Some(file_type) = resolve_file_type(&file_name) else {
                continue;
            };

            let (component, via_fallback) = classify_component(&rel, &file_name, file_type);
            if config.config_only && via_fallback {
                continue;
            }

            files.push(DiscoveredFile {
                path: path.to_path_buf(),
                relative_path: rel,
                file_type,
                component,
                size: metadata.len(),
                modified: metadata.modified().ok(),
            });
        }
    }

    files.sort_by(|a, b| {
        a.component
            .cmp(&b.component)
            .then_with(|| a.relative_path.cmp(&b.relative_path))
    });
    counts.analyzed_files = files.len();
    counts.skipped_files = counts.total_files.saturating_sub(counts.analyzed_files);

    (files, issues, counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn classify(rel: &str) -> ComponentType {
        let file_name = rel.rsplit('/').next().unwrap();
        let file_type = resolve_file_type(file_name).unwrap_or(FileType::Md);
        classify_component(rel, file_name, file_type).0
    }

    #[test]
    fn classification_first_match_wins() {
        assert_eq!(classify(".claude/skills/deploy/SKILL.md"), ComponentType::Skill);
        assert_eq!(classify(".claude/agents/reviewer.md"), ComponentType::Agent);
        assert_eq!(classify(".claude/hooks/pre-commit.sh"), ComponentType::Hook);
        assert_eq!(classify("scripts/post-hook.sh"), ComponentType::Hook);
        assert_eq!(classify("vendor/plugins/thing/index.js"), ComponentType::Plugin);
        assert_eq!(classify(".mcp.json"), ComponentType::Mcp);
        assert_eq!(classify("project/mcp.json"), ComponentType::Mcp);
        assert_eq!(classify(".cursorrules"), ComponentType::RulesFile);
        assert_eq!(classify(".windsurfrules"), ComponentType::RulesFile);
        assert_eq!(classify(".claude/settings.json"), ComponentType::Settings);
        assert_eq!(classify("app.config.json"), ComponentType::Settings);
        assert_eq!(classify("CLAUDE.md"), ComponentType::AiConfigMd);
        assert_eq!(classify("AGENTS.md"), ComponentType::AiConfigMd);
        assert_eq!(classify("claude-tips.md"), ComponentType::AiConfigMd);
    }

    #[test]
    fn skills_dir_beats_mcp_filename() {
        // Path checks run before filename checks.
        assert_eq!(classify(".claude/skills/x/mcp.json"), ComponentType::Skill);
    }

    #[test]
    fn fallback_classification() {
        assert_eq!(classify("notes/setup.md"), ComponentType::AiConfigMd);
        assert_eq!(classify("data/values.json"), ComponentType::Settings);
        assert_eq!(classify("run.sh"), ComponentType::Settings);
    }

    #[test]
    fn dotenv_files_are_shell() {
        assert_eq!(resolve_file_type(".env"), Some(FileType::Sh));
        assert_eq!(resolve_file_type("prod.env"), Some(FileType::Sh));
        assert_eq!(resolve_file_type(".env.local"), Some(FileType::Sh));
        assert_eq!(resolve_file_type("app.env.backup"), Some(FileType::Sh));
        assert_eq!(resolve_file_type("script.sh"), Some(FileType::Sh));
        assert_eq!(resolve_file_type("binary.exe"), None);
        assert_eq!(resolve_file_type("noextension"), None);
    }

    #[test]
    fn plugin_cache_always_excluded() {
        assert!(builtin_exclusion(
            ".claude/plugins/cache/pkg/index.js",
            "index.js",
            MarketplaceMode::All
        ));
    }

    #[test]
    fn marketplace_modes() {
        let rel = ".claude/plugins/marketplaces/shop/widget/README.md";
        assert!(builtin_exclusion(rel, "README.md", MarketplaceMode::Off));
        assert!(builtin_exclusion(rel, "README.md", MarketplaceMode::Configs));
        assert!(!builtin_exclusion(rel, "README.md", MarketplaceMode::All));

        let skill = ".claude/plugins/marketplaces/shop/widget/skills/go/SKILL.md";
        assert!(!builtin_exclusion(skill, "SKILL.md", MarketplaceMode::Configs));
        assert!(builtin_exclusion(skill, "SKILL.md", MarketplaceMode::Off));

        let reference = ".claude/plugins/marketplaces/shop/widget/references/api.md";
        assert!(builtin_exclusion(reference, "api.md", MarketplaceMode::Configs));
    }

    #[test]
    fn negated_user_ignore_overrides_builtin() {
        let config = ScannerConfig {
            ignore: vec!["!.claude/plugins/cache/keep/**".to_string()],
            ..Default::default()
        };
        let (ignores, issues) = compile_ignores(&config.ignore);
        assert!(issues.is_empty());
        assert!(!is_excluded(
            ".claude/plugins/cache/keep/hook.sh",
            "hook.sh",
            &config,
            &ignores
        ));
        assert!(is_excluded(
            ".claude/plugins/cache/other/hook.sh",
            "hook.sh",
            &config,
            &ignores
        ));
    }

    #[test]
    fn walk_discovers_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".claude/hooks")).unwrap();
        fs::create_dir_all(dir.path().join(".claude/skills/demo")).unwrap();
        fs::write(dir.path().join("CLAUDE.md"), "# memory").unwrap();
        fs::write(dir.path().join(".claude/hooks/run.sh"), "echo hi").unwrap();
        fs::write(dir.path().join(".claude/skills/demo/SKILL.md"), "---\n---").unwrap();
        fs::write(dir.path().join("ignore.bin"), [0u8; 4]).unwrap();

        let config = ScannerConfig::default();
        let (files, issues, counts) = discover_files(&[dir.path().to_path_buf()], &config);
        assert!(issues.is_empty());
        assert_eq!(files.len(), 3);
        assert_eq!(counts.total_files, 4);
        assert_eq!(counts.skipped_files, 1);
        // Sorted by component: Skill < Agent < Hook < ... < AiConfigMd.
        assert_eq!(files[0].component, ComponentType::Skill);
        assert_eq!(files[1].component, ComponentType::Hook);
        assert_eq!(files[2].component, ComponentType::AiConfigMd);
    }

    #[test]
    fn oversized_files_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("big.md"), "x".repeat(64)).unwrap();
        let config = ScannerConfig {
            max_file_size: 16,
            ..Default::default()
        };
        let (files, _, counts) = discover_files(&[dir.path().to_path_buf()], &config);
        assert!(files.is_empty());
        assert_eq!(counts.skipped_files, 1);
    }

    #[test]
    fn missing_path_is_nonfatal() {
        let config = ScannerConfig::default();
        let (files, issues, _) =
            discover_files(&[PathBuf::from("/definitely/not/here")], &config);
        assert!(files.is_empty());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Discovery);
    }
}
