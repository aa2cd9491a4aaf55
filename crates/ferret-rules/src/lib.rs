//! # ferret-rules
//!
//! Detection rules for ferret-scan, the static security scanner for
//! AI-assistant tooling configuration.
//!
//! This crate carries the rule model and the built-in rule set:
//!
//! - **EXFIL-xxx**: data exfiltration
//! - **CRED-xxx**: credential leaks
//! - **INJ-xxx**: prompt injection
//! - **BACK-xxx**: backdoors
//! - **SUPPLY-xxx**: supply-chain hazards
//! - **PERM-xxx**: dangerous permissions
//! - **PERSIST-xxx**: persistence mechanisms
//! - **OBF-xxx**: obfuscation
//! - **AI-xxx**: AI-tooling-specific risks
//! - **HIDE-xxx**: hidden/invisible content
//! - **BEHAV-xxx**: evasive behavior signatures
//!
//! # Usage
//!
//! ```
//! use ferret_rules::builtin_rules;
//!
//! let rules = builtin_rules();
//! assert!(rules.iter().any(|r| r.id == "CRED-001"));
//! ```

mod builtin;
pub mod model;

pub use builtin::builtin_rules;
pub use model::{
    CompiledPattern, ComponentType, CorrelationSpec, FileType, Rule, RuleBuildError, RuleBuilder,
    SemanticPattern, SemanticPatternKind, Severity, ThreatCategory,
};

/// Returns the total number of built-in rules.
pub fn rule_count() -> usize {
    builtin_rules().len()
}

/// Looks up a built-in rule by id.
pub fn find_rule(id: &str) -> Option<Rule> {
    builtin_rules().into_iter().find(|r| r.id == id)
}
