//! Rule registry: owns the built-in set, merges user rules, serves lookups.

use std::collections::{BTreeMap, HashMap};

use ferret_rules::{builtin_rules, Rule, Severity, ThreatCategory};

/// Registry statistics for `rules stats`.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub enabled: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_severity: BTreeMap<String, usize>,
}

/// Immutable-after-init collection of rules, indexed by id.
pub struct RuleRegistry {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

impl RuleRegistry {
    /// Registry holding only the built-in rules.
    pub fn with_builtin() -> Self {
        Self::from_rules(builtin_rules())
    }

    /// Registry from an explicit rule list. Later duplicates override
    /// earlier entries (last-wins, mirroring the merge policy).
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        let mut registry = Self {
            rules: Vec::with_capacity(rules.len()),
            index: HashMap::with_capacity(rules.len()),
        };
        for rule in rules {
            registry.insert(rule);
        }
        registry
    }

    fn insert(&mut self, rule: Rule) -> bool {
        match self.index.get(&rule.id) {
            Some(&slot) => {
                self.rules[slot] = rule;
                true
            }
            None => {
                self.index.insert(rule.id.clone(), self.rules.len());
                self.rules.push(rule);
                false
            }
        }
    }

    /// Merge user-loaded rules. A user rule whose id collides with an
    /// existing rule overrides it; each override is logged and reported.
    pub fn merge(&mut self, rules: Vec<Rule>) -> Vec<String> {
        let mut overridden = Vec::new();
        for rule in rules {
            let id = rule.id.clone();
            if self.insert(rule) {
                tracing::warn!(rule_id = %id, "user rule overrides built-in rule");
                overridden.push(id);
            }
        }
        overridden
    }

    pub fn all(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.index.get(id).map(|&slot| &self.rules[slot])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Enabled rules matching the category and severity filters (`None`
    /// means no filter).
    pub fn filtered(
        &self,
        categories: Option<&[ThreatCategory]>,
        severities: Option<&[Severity]>,
    ) -> Vec<&Rule> {
        self.rules
            .iter()
            .filter(|r| r.enabled)
            .filter(|r| categories.map_or(true, |cats| cats.contains(&r.category)))
            .filter(|r| severities.map_or(true, |sevs| sevs.contains(&r.severity)))
            .collect()
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            total: self.rules.len(),
            ..Default::default()
        };
        for rule in &self.rules {
            if rule.enabled {
                stats.enabled += 1;
            }
            *stats
                .by_category
                .entry(rule.category.to_string())
                .or_default() += 1;
            *stats
                .by_severity
                .entry(rule.severity.to_string())
                .or_default() += 1;
        }
        stats
    }
}
