//! Scanner configuration.
//!
//! Loaded from `.ferret.toml` / `ferret.toml` (TOML) or a JSON config file.
//! Field names accept both the native snake_case and the camelCase spelling
//! used by earlier JSON-based configurations.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use ferret_rules::{Severity, ThreatCategory};

use crate::errors::ScanError;

/// Default per-file size cap: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default number of context lines captured around a match.
pub const DEFAULT_CONTEXT_LINES: usize = 2;

/// Config filenames probed (in order) when no explicit path is given.
pub const CONFIG_FILENAMES: &[&str] = &[".ferret.toml", "ferret.toml", ".ferret.json"];

/// How marketplace/cache trees under `.claude/plugins/marketplaces/` are
/// treated during discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarketplaceMode {
    /// Skip marketplace trees entirely.
    Off,
    /// Keep only high-signal configuration (agents/skills/hooks/commands,
    /// manifests); drop reference docs and low-signal documentation.
    #[default]
    Configs,
    /// Scan everything.
    All,
}

impl std::fmt::Display for MarketplaceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MarketplaceMode::Off => "off",
            MarketplaceMode::Configs => "configs",
            MarketplaceMode::All => "all",
        })
    }
}

/// MITRE ATLAS catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasCatalogConfig {
    pub enabled: bool,
    #[serde(alias = "autoUpdate")]
    pub auto_update: bool,
    #[serde(alias = "sourceUrl")]
    pub source_url: Option<String>,
    #[serde(alias = "cachePath")]
    pub cache_path: Option<PathBuf>,
    #[serde(alias = "cacheTtlHours")]
    pub cache_ttl_hours: u64,
    #[serde(alias = "timeoutMs")]
    pub timeout_ms: u64,
    #[serde(alias = "forceRefresh")]
    pub force_refresh: bool,
}

impl Default for AtlasCatalogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_update: false,
            source_url: None,
            cache_path: None,
            cache_ttl_hours: 24 * 7,
            timeout_ms: 10_000,
            force_refresh: false,
        }
    }
}

/// LLM-assisted analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    #[serde(alias = "baseUrl")]
    pub base_url: Option<String>,
    pub model: String,
    #[serde(alias = "apiKeyEnv")]
    pub api_key_env: String,
    #[serde(alias = "timeoutMs")]
    pub timeout_ms: u64,
    #[serde(alias = "jsonMode")]
    pub json_mode: bool,
    #[serde(alias = "maxInputChars")]
    pub max_input_chars: usize,
    #[serde(alias = "maxOutputTokens")]
    pub max_output_tokens: u32,
    pub temperature: f32,
    #[serde(alias = "cacheDir")]
    pub cache_dir: Option<PathBuf>,
    #[serde(alias = "cacheTtlHours")]
    pub cache_ttl_hours: u64,
    #[serde(alias = "maxRetries")]
    pub max_retries: u32,
    #[serde(alias = "retryBackoffMs")]
    pub retry_backoff_ms: u64,
    #[serde(alias = "retryMaxBackoffMs")]
    pub retry_max_backoff_ms: u64,
    #[serde(alias = "minRequestIntervalMs")]
    pub min_request_interval_ms: u64,
    #[serde(alias = "onlyIfFindings")]
    pub only_if_findings: bool,
    #[serde(alias = "maxFindingsPerFile")]
    pub max_findings_per_file: usize,
    #[serde(alias = "maxFiles")]
    pub max_files: usize,
    #[serde(alias = "minConfidence")]
    pub min_confidence: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai-compatible".to_string(),
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            api_key_env: "FERRET_LLM_API_KEY".to_string(),
            timeout_ms: 30_000,
            json_mode: true,
            max_input_chars: 24_000,
            max_output_tokens: 1024,
            temperature: 0.0,
            cache_dir: None,
            cache_ttl_hours: 24 * 14,
            max_retries: 2,
            retry_backoff_ms: 1_000,
            retry_max_backoff_ms: 15_000,
            min_request_interval_ms: 500,
            only_if_findings: true,
            max_findings_per_file: 10,
            max_files: 25,
            min_confidence: 0.5,
        }
    }
}

/// Scanner configuration. All fields have working defaults; a missing config
/// file is not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Severities to report; `None` reports everything.
    pub severity: Option<Vec<Severity>>,
    /// Categories to scan; `None` scans everything.
    pub categories: Option<Vec<ThreatCategory>>,
    /// Glob patterns excluded from discovery. `!`-prefixed patterns negate
    /// earlier exclusions (including the built-in cache exclusions).
    pub ignore: Vec<String>,
    /// Severity threshold for a non-zero exit code.
    #[serde(alias = "failOn")]
    pub fail_on: Severity,
    /// Restrict discovery to configuration components (skip plain md files
    /// that only classify by extension fallback).
    #[serde(alias = "configOnly")]
    pub config_only: bool,
    #[serde(alias = "marketplaceMode")]
    pub marketplace_mode: MarketplaceMode,
    /// Downgrade lone CRED-001 criticals in documentation paths.
    #[serde(alias = "docDampening")]
    pub doc_dampening: bool,
    /// Redact matched secrets in reports.
    pub redact: bool,
    /// Custom rule sources: file paths, or http(s) URLs when
    /// `allow_remote_rules` is set.
    #[serde(alias = "customRules")]
    pub custom_rules: Vec<String>,
    #[serde(alias = "allowRemoteRules")]
    pub allow_remote_rules: bool,
    #[serde(alias = "maxFileSize")]
    pub max_file_size: u64,
    #[serde(alias = "contextLines")]
    pub context_lines: usize,

    // Feature toggles.
    #[serde(alias = "threatIntel")]
    pub threat_intel: bool,
    #[serde(alias = "semanticAnalysis")]
    pub semantic_analysis: bool,
    #[serde(alias = "correlationAnalysis")]
    pub correlation_analysis: bool,
    #[serde(alias = "entropyAnalysis")]
    pub entropy_analysis: bool,
    #[serde(alias = "mcpValidation")]
    pub mcp_validation: bool,
    #[serde(alias = "dependencyAnalysis")]
    pub dependency_analysis: bool,
    #[serde(alias = "dependencyAudit")]
    pub dependency_audit: bool,
    #[serde(alias = "capabilityMapping")]
    pub capability_mapping: bool,
    #[serde(alias = "ignoreComments")]
    pub ignore_comments: bool,
    #[serde(alias = "mitreAtlas")]
    pub mitre_atlas: bool,
    #[serde(alias = "llmAnalysis")]
    pub llm_analysis: bool,
    /// Recognized for config compatibility; remediation is handled by the
    /// CLI layer and is a no-op in the core.
    #[serde(alias = "autoRemediation")]
    pub auto_remediation: bool,

    #[serde(alias = "mitreAtlasCatalog")]
    pub mitre_atlas_catalog: AtlasCatalogConfig,
    pub llm: LlmConfig,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            severity: None,
            categories: None,
            ignore: Vec::new(),
            fail_on: Severity::High,
            config_only: false,
            marketplace_mode: MarketplaceMode::Configs,
            doc_dampening: true,
            redact: true,
            custom_rules: Vec::new(),
            allow_remote_rules: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            context_lines: DEFAULT_CONTEXT_LINES,
            threat_intel: true,
            semantic_analysis: true,
            correlation_analysis: true,
            entropy_analysis: true,
            mcp_validation: true,
            dependency_analysis: true,
            dependency_audit: false,
            capability_mapping: true,
            ignore_comments: true,
            mitre_atlas: false,
            llm_analysis: false,
            auto_remediation: false,
            mitre_atlas_catalog: AtlasCatalogConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl ScannerConfig {
    /// Load configuration from an explicit file. Format is chosen by
    /// extension: `.json` parses as JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ScannerConfig = if path.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::from_str(&content).map_err(|e| ScanError::Config {
                message: format!("{}: {e}", path.display()),
            })?
        } else {
            toml::from_str(&content).map_err(|e| ScanError::Config {
                message: format!("{}: {e}", path.display()),
            })?
        };
        config.validate()?;
        Ok(config)
    }

    /// Probe `root` for a config file ([`CONFIG_FILENAMES`]); returns the
    /// default configuration when none exists.
    pub fn discover(root: &Path) -> Result<Self, ScanError> {
        for name in CONFIG_FILENAMES {
            let candidate = root.join(name);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "loading config file");
                return Self::load(&candidate);
            }
        }
        Ok(Self::default())
    }

    /// Structural sanity checks beyond what serde enforces.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.max_file_size == 0 {
            return Err(ScanError::Config {
                message: "max_file_size must be positive".to_string(),
            });
        }
        if self.context_lines > 20 {
            return Err(ScanError::Config {
                message: "context_lines must be 20 or fewer".to_string(),
            });
        }
        for pattern in &self.ignore {
            let trimmed = pattern.strip_prefix('!').unwrap_or(pattern);
            if let Err(e) = glob::Pattern::new(trimmed) {
                return Err(ScanError::Config {
                    message: format!("invalid ignore pattern '{pattern}': {e}"),
                });
            }
        }
        Ok(())
    }

    /// Whether a severity passes the report filter.
    pub fn severity_selected(&self, severity: Severity) -> bool {
        self.severity
            .as_ref()
            .map_or(true, |list| list.contains(&severity))
    }

    /// Whether a category passes the category filter.
    pub fn category_selected(&self, category: ThreatCategory) -> bool {
        self.categories
            .as_ref()
            .map_or(true, |list| list.contains(&category))
    }
}
