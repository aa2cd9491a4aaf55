//! Built-in rule set, one module per threat category.

mod advanced_hiding;
mod ai_specific;
mod backdoors;
mod behavioral;
mod credentials;
mod exfiltration;
mod injection;
mod obfuscation;
mod permissions;
mod persistence;
mod supply_chain;

use crate::model::Rule;

/// All built-in rules, in category order, rule-id order within a category.
pub fn builtin_rules() -> Vec<Rule> {
    let mut rules = Vec::new();
    rules.extend(exfiltration::rules());
    rules.extend(credentials::rules());
    rules.extend(injection::rules());
    rules.extend(backdoors::rules());
    rules.extend(supply_chain::rules());
    rules.extend(permissions::rules());
    rules.extend(persistence::rules());
    rules.extend(obfuscation::rules());
    rules.extend(ai_specific::rules());
    rules.extend(advanced_hiding::rules());
    rules.extend(behavioral::rules());
    rules
}
