//! Core rule model: severities, categories, component/file types, and the
//! [`Rule`] struct with its builder.
//!
//! Everything in this module is plain data. Rules own their compiled
//! regexes; compilation happens once, at registry build time or custom-rule
//! load time.

use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Finding severity.
///
/// Variants are declared most-severe-first so that the derived [`Ord`] sorts
/// critical findings ahead of informational ones, the same way the scanner
/// reports them. Use [`Severity::at_least`] for threshold comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Fixed weight used for risk scoring.
    pub fn weight(self) -> u32 {
        match self {
            Severity::Critical => 100,
            Severity::High => 75,
            Severity::Medium => 50,
            Severity::Low => 25,
            Severity::Info => 10,
        }
    }

    /// Whether this severity meets or exceeds `threshold`.
    ///
    /// `Critical.at_least(High)` is true; `Low.at_least(High)` is false.
    pub fn at_least(self, threshold: Severity) -> bool {
        self <= threshold
    }

    /// All severities, most severe first.
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        })
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            "info" => Ok(Severity::Info),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// Threat category of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThreatCategory {
    Exfiltration,
    Credentials,
    Injection,
    Backdoors,
    SupplyChain,
    Permissions,
    Persistence,
    Obfuscation,
    AiSpecific,
    AdvancedHiding,
    Behavioral,
}

impl ThreatCategory {
    pub const ALL: [ThreatCategory; 11] = [
        ThreatCategory::Exfiltration,
        ThreatCategory::Credentials,
        ThreatCategory::Injection,
        ThreatCategory::Backdoors,
        ThreatCategory::SupplyChain,
        ThreatCategory::Permissions,
        ThreatCategory::Persistence,
        ThreatCategory::Obfuscation,
        ThreatCategory::AiSpecific,
        ThreatCategory::AdvancedHiding,
        ThreatCategory::Behavioral,
    ];
}

impl fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ThreatCategory::Exfiltration => "exfiltration",
            ThreatCategory::Credentials => "credentials",
            ThreatCategory::Injection => "injection",
            ThreatCategory::Backdoors => "backdoors",
            ThreatCategory::SupplyChain => "supply-chain",
            ThreatCategory::Permissions => "permissions",
            ThreatCategory::Persistence => "persistence",
            ThreatCategory::Obfuscation => "obfuscation",
            ThreatCategory::AiSpecific => "ai-specific",
            ThreatCategory::AdvancedHiding => "advanced-hiding",
            ThreatCategory::Behavioral => "behavioral",
        })
    }
}

impl FromStr for ThreatCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exfiltration" => Ok(ThreatCategory::Exfiltration),
            "credentials" => Ok(ThreatCategory::Credentials),
            "injection" => Ok(ThreatCategory::Injection),
            "backdoors" => Ok(ThreatCategory::Backdoors),
            "supply-chain" => Ok(ThreatCategory::SupplyChain),
            "permissions" => Ok(ThreatCategory::Permissions),
            "persistence" => Ok(ThreatCategory::Persistence),
            "obfuscation" => Ok(ThreatCategory::Obfuscation),
            "ai-specific" => Ok(ThreatCategory::AiSpecific),
            "advanced-hiding" => Ok(ThreatCategory::AdvancedHiding),
            "behavioral" => Ok(ThreatCategory::Behavioral),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// Semantic role of a configuration file within an AI-CLI ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentType {
    Skill,
    Agent,
    Hook,
    Plugin,
    Mcp,
    Settings,
    AiConfigMd,
    RulesFile,
}

impl ComponentType {
    pub const ALL: [ComponentType; 8] = [
        ComponentType::Skill,
        ComponentType::Agent,
        ComponentType::Hook,
        ComponentType::Plugin,
        ComponentType::Mcp,
        ComponentType::Settings,
        ComponentType::AiConfigMd,
        ComponentType::RulesFile,
    ];

    /// Components that execute with elevated trust (hooks run shell commands,
    /// plugins and MCP servers run arbitrary processes). Findings in these
    /// components receive a risk-score multiplier.
    pub fn is_privileged(self) -> bool {
        matches!(
            self,
            ComponentType::Hook | ComponentType::Plugin | ComponentType::Mcp
        )
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComponentType::Skill => "skill",
            ComponentType::Agent => "agent",
            ComponentType::Hook => "hook",
            ComponentType::Plugin => "plugin",
            ComponentType::Mcp => "mcp",
            ComponentType::Settings => "settings",
            ComponentType::AiConfigMd => "ai-config-md",
            ComponentType::RulesFile => "rules-file",
        })
    }
}

/// Recognized file extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Md,
    Sh,
    Bash,
    Zsh,
    Json,
    Yaml,
    Yml,
    Ts,
    Js,
    Tsx,
    Jsx,
}

impl FileType {
    pub const ALL: [FileType; 11] = [
        FileType::Md,
        FileType::Sh,
        FileType::Bash,
        FileType::Zsh,
        FileType::Json,
        FileType::Yaml,
        FileType::Yml,
        FileType::Ts,
        FileType::Js,
        FileType::Tsx,
        FileType::Jsx,
    ];

    /// Shell script types.
    pub const SHELL: [FileType; 3] = [FileType::Sh, FileType::Bash, FileType::Zsh];

    /// Script types handled by the AST analyzer.
    pub const SCRIPT: [FileType; 4] = [FileType::Ts, FileType::Js, FileType::Tsx, FileType::Jsx];

    /// Map a lowercase file extension to a [`FileType`].
    pub fn from_extension(ext: &str) -> Option<FileType> {
        match ext {
            "md" => Some(FileType::Md),
            "sh" => Some(FileType::Sh),
            "bash" => Some(FileType::Bash),
            "zsh" => Some(FileType::Zsh),
            "json" => Some(FileType::Json),
            "yaml" => Some(FileType::Yaml),
            "yml" => Some(FileType::Yml),
            "ts" => Some(FileType::Ts),
            "js" => Some(FileType::Js),
            "tsx" => Some(FileType::Tsx),
            "jsx" => Some(FileType::Jsx),
            _ => None,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileType::Md => "md",
            FileType::Sh => "sh",
            FileType::Bash => "bash",
            FileType::Zsh => "zsh",
            FileType::Json => "json",
            FileType::Yaml => "yaml",
            FileType::Yml => "yml",
            FileType::Ts => "ts",
            FileType::Js => "js",
            FileType::Tsx => "tsx",
            FileType::Jsx => "jsx",
        })
    }
}

/// Kind of structural pattern the AST analyzer evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SemanticPatternKind {
    FunctionCall,
    PropertyAccess,
    DynamicImport,
    EvalChain,
    ObjectStructure,
}

/// A structural pattern matched against parsed code blocks.
///
/// The `pattern` is a dotted-chain symbol: `axios` matches `axios(...)`,
/// `axios.get`, and `foo.axios.get`, but never `myaxios`. Dotted patterns
/// like `child_process.exec` match the full chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticPattern {
    #[serde(rename = "type")]
    pub kind: SemanticPatternKind,
    pub pattern: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A cross-file correlation declared on a rule.
///
/// The correlation fires when every entry of `file_patterns` matches at
/// least one scanned file, every entry of `content_patterns` appears in
/// those files, and the matched files lie within `max_distance` directory
/// levels of each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationSpec {
    pub file_patterns: Vec<String>,
    pub content_patterns: Vec<String>,
    #[serde(default = "default_max_distance")]
    pub max_distance: u32,
    pub attack_pattern: String,
}

fn default_max_distance() -> u32 {
    3
}

/// A compiled pattern together with its source text.
///
/// The source is kept for display (`rules show`) and serialization of
/// custom rules; the regex is what the matcher runs.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub source: String,
    pub regex: Regex,
}

impl CompiledPattern {
    /// Compile `source` case-insensitively.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(source).case_insensitive(true).build()?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }
}

/// A named detector: regex patterns plus applicability and false-positive
/// filters, with optional semantic and correlation extensions.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub category: ThreatCategory,
    pub severity: Severity,
    pub description: String,
    pub patterns: Vec<CompiledPattern>,
    pub file_types: Vec<FileType>,
    pub components: Vec<ComponentType>,
    pub exclude_patterns: Vec<CompiledPattern>,
    pub require_context: Vec<CompiledPattern>,
    pub exclude_context: Vec<CompiledPattern>,
    pub min_match_length: usize,
    pub semantic_patterns: Vec<SemanticPattern>,
    pub correlation_rules: Vec<CorrelationSpec>,
    pub remediation: String,
    pub references: Vec<String>,
    pub enabled: bool,
}

impl Rule {
    /// Start building a rule. Applicability defaults to all file types and
    /// all components; override with [`RuleBuilder::file_types`] /
    /// [`RuleBuilder::components`].
    pub fn builder(
        id: &str,
        name: &str,
        category: ThreatCategory,
        severity: Severity,
    ) -> RuleBuilder {
        RuleBuilder {
            id: id.to_string(),
            name: name.to_string(),
            category,
            severity,
            description: String::new(),
            patterns: Vec::new(),
            file_types: FileType::ALL.to_vec(),
            components: ComponentType::ALL.to_vec(),
            exclude_patterns: Vec::new(),
            require_context: Vec::new(),
            exclude_context: Vec::new(),
            min_match_length: 0,
            semantic_patterns: Vec::new(),
            correlation_rules: Vec::new(),
            remediation: String::new(),
            references: Vec::new(),
            enabled: true,
        }
    }

    /// Whether this rule applies to a file of the given type and component.
    pub fn applies_to(&self, file_type: FileType, component: ComponentType) -> bool {
        self.file_types.contains(&file_type) && self.components.contains(&component)
    }

    /// Whether the rule id matches the `^[A-Z]+-\d{3}$` shape.
    pub fn id_is_valid(id: &str) -> bool {
        let Some((prefix, digits)) = id.split_once('-') else {
            return false;
        };
        !prefix.is_empty()
            && prefix.bytes().all(|b| b.is_ascii_uppercase())
            && digits.len() == 3
            && digits.bytes().all(|b| b.is_ascii_digit())
    }
}

/// Builder for [`Rule`].
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    id: String,
    name: String,
    category: ThreatCategory,
    severity: Severity,
    description: String,
    patterns: Vec<String>,
    file_types: Vec<FileType>,
    components: Vec<ComponentType>,
    exclude_patterns: Vec<String>,
    require_context: Vec<String>,
    exclude_context: Vec<String>,
    min_match_length: usize,
    semantic_patterns: Vec<SemanticPattern>,
    correlation_rules: Vec<CorrelationSpec>,
    remediation: String,
    references: Vec<String>,
    enabled: bool,
}

/// Error produced when a rule fails to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleBuildError {
    /// Rule id does not match `^[A-Z]+-\d{3}$`.
    InvalidId(String),
    /// No pattern compiled successfully (pattern-based rule is unusable).
    NoValidPatterns { id: String, errors: Vec<String> },
}

impl fmt::Display for RuleBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleBuildError::InvalidId(id) => write!(f, "invalid rule id: {id}"),
            RuleBuildError::NoValidPatterns { id, errors } => {
                write!(f, "rule {id} has no valid patterns: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for RuleBuildError {}

impl RuleBuilder {
    pub fn description(mut self, text: &str) -> Self {
        self.description = text.to_string();
        self
    }

    pub fn pattern(mut self, re: &str) -> Self {
        self.patterns.push(re.to_string());
        self
    }

    pub fn file_types(mut self, types: &[FileType]) -> Self {
        self.file_types = types.to_vec();
        self
    }

    pub fn components(mut self, components: &[ComponentType]) -> Self {
        self.components = components.to_vec();
        self
    }

    pub fn exclude_pattern(mut self, re: &str) -> Self {
        self.exclude_patterns.push(re.to_string());
        self
    }

    pub fn require_context(mut self, re: &str) -> Self {
        self.require_context.push(re.to_string());
        self
    }

    pub fn exclude_context(mut self, re: &str) -> Self {
        self.exclude_context.push(re.to_string());
        self
    }

    pub fn min_match_length(mut self, len: usize) -> Self {
        self.min_match_length = len;
        self
    }

    pub fn semantic(mut self, kind: SemanticPatternKind, pattern: &str) -> Self {
        self.semantic_patterns.push(SemanticPattern {
            kind,
            pattern: pattern.to_string(),
            description: None,
        });
        self
    }

    pub fn correlation(mut self, spec: CorrelationSpec) -> Self {
        self.correlation_rules.push(spec);
        self
    }

    pub fn remediation(mut self, text: &str) -> Self {
        self.remediation = text.to_string();
        self
    }

    pub fn reference(mut self, url: &str) -> Self {
        self.references.push(url.to_string());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Build, compiling each pattern independently. An invalid pattern is
    /// dropped; a rule whose every pattern failed is rejected, unless the
    /// rule is semantic-only or correlation-only. Use
    /// [`RuleBuilder::try_build_lossy`] to observe dropped patterns.
    pub fn try_build(self) -> Result<Rule, RuleBuildError> {
        let (rule, _dropped) = self.try_build_lossy()?;
        Ok(rule)
    }

    /// Build, returning the rule plus per-pattern compilation errors.
    pub fn try_build_lossy(self) -> Result<(Rule, Vec<String>), RuleBuildError> {
        if !Rule::id_is_valid(&self.id) {
            return Err(RuleBuildError::InvalidId(self.id));
        }

        let mut compiled = Vec::with_capacity(self.patterns.len());
        let mut errors = Vec::new();
        for source in &self.patterns {
            match CompiledPattern::new(source) {
                Ok(p) => compiled.push(p),
                Err(e) => errors.push(format!("{source}: {e}")),
            }
        }

        let structural_only = self.patterns.is_empty()
            && (!self.semantic_patterns.is_empty() || !self.correlation_rules.is_empty());
        if compiled.is_empty() && !structural_only {
            return Err(RuleBuildError::NoValidPatterns {
                id: self.id,
                errors,
            });
        }

        let exclude_patterns = compile_all(&self.exclude_patterns, &mut errors);
        let require_context = compile_all(&self.require_context, &mut errors);
        let exclude_context = compile_all(&self.exclude_context, &mut errors);

        Ok((
            Rule {
                id: self.id,
                name: self.name,
                category: self.category,
                severity: self.severity,
                description: self.description,
                patterns: compiled,
                file_types: self.file_types,
                components: self.components,
                exclude_patterns,
                require_context,
                exclude_context,
                min_match_length: self.min_match_length,
                semantic_patterns: self.semantic_patterns,
                correlation_rules: self.correlation_rules,
                remediation: self.remediation,
                references: self.references,
                enabled: self.enabled,
            },
            errors,
        ))
    }

    /// Build a built-in rule. Built-in patterns are fixed at compile time;
    /// a failure here is a defect in the rule table, so this panics with
    /// the offending rule id.
    pub fn build(self) -> Rule {
        let id = self.id.clone();
        match self.try_build_lossy() {
            Ok((rule, errors)) if errors.is_empty() => rule,
            Ok((_, errors)) => panic!("builtin rule {id} has invalid patterns: {errors:?}"),
            Err(e) => panic!("builtin rule {id} failed to build: {e}"),
        }
    }
}

fn compile_all(sources: &[String], errors: &mut Vec<String>) -> Vec<CompiledPattern> {
    sources
        .iter()
        .filter_map(|s| match CompiledPattern::new(s) {
            Ok(p) => Some(p),
            Err(e) => {
                errors.push(format!("{s}: {e}"));
                None
            }
        })
        .collect()
}
