//! # ferret-core
//!
//! Detection pipeline for ferret-scan, the static security scanner for
//! AI-assistant tooling configuration (instruction files, tool manifests,
//! shell hooks, dependency specs).
//!
//! The pipeline: file discovery with component classification, rule-driven
//! pattern matching with false-positive suppression, specialized analyzers
//! (entropy, MCP, dependency, capability, AST semantic, threat indicators),
//! cross-file correlation, suppression layers (inline ignores, baseline,
//! documentation dampening, MITRE ATLAS annotation), and deterministic
//! aggregation with risk scoring and exit-code mapping.
//!
//! ```no_run
//! use std::path::PathBuf;
//! use ferret_core::{Scanner, ScannerConfig};
//!
//! let scanner = Scanner::new(ScannerConfig::default());
//! let result = scanner.scan(&[PathBuf::from(".")]);
//! println!("{} findings", result.findings.len());
//! ```

pub mod aggregate;
pub mod analyzers;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod finding;
pub mod llm;
pub mod loader;
pub mod matcher;
pub mod registry;
pub mod result;
pub mod scanner;
pub mod suppress;

pub use config::{AtlasCatalogConfig, LlmConfig, MarketplaceMode, ScannerConfig};
pub use discovery::{DiscoveredFile, DiscoveryCounts};
pub use errors::{IssueKind, ScanError, ScanIssue};
pub use finding::{ContextLine, Finding};
pub use loader::{load_custom_rules_source, CustomRule, CustomRuleFile, RuleLoadResult};
pub use registry::{RegistryStats, RuleRegistry};
pub use result::{ScanResult, ScanSummary};
pub use scanner::Scanner;
pub use suppress::baseline::Baseline;

// Re-export the rule model so downstream crates depend on one surface.
pub use ferret_rules::{
    ComponentType, CorrelationSpec, FileType, Rule, SemanticPattern, SemanticPatternKind,
    Severity, ThreatCategory,
};
