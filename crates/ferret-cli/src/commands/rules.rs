//! `ferret-scan rules list|show|stats` — registry introspection.

use anyhow::{bail, Result};
use colored::Colorize;
use std::str::FromStr;

use ferret_core::{Scanner, ScannerConfig, ThreatCategory};

use crate::args::RulesCommand;

pub fn run(command: RulesCommand) -> Result<i32> {
    let config = ScannerConfig::discover(std::path::Path::new("."))?;
    let scanner = Scanner::new(config);
    let registry = scanner.registry();

    match command {
        RulesCommand::List { category } => {
            let filter = match &category {
                Some(raw) => {
                    Some(ThreatCategory::from_str(raw).map_err(anyhow::Error::msg)?)
                }
                None => None,
            };
            let mut rules: Vec<_> = registry
                .all()
                .iter()
                .filter(|r| filter.map_or(true, |c| r.category == c))
                .collect();
            rules.sort_by(|a, b| a.id.cmp(&b.id));
            for rule in &rules {
                let status = if rule.enabled { " " } else { "-" };
                println!(
                    "{status} {:<12} {:<8} {:<15} {}",
                    rule.id.as_str().bold(),
                    rule.severity,
                    rule.category,
                    rule.name
                );
            }
            println!("\n{} rules", rules.len());
        }
        RulesCommand::Show { id } => {
            let Some(rule) = registry.get(&id) else {
                bail!("no rule with id {id}");
            };
            println!("{} {}", rule.id.as_str().bold(), rule.name);
            println!("severity:    {}", rule.severity);
            println!("category:    {}", rule.category);
            println!("enabled:     {}", rule.enabled);
            println!("description: {}", rule.description);
            println!(
                "applies to:  types [{}], components [{}]",
                join_display(&rule.file_types),
                join_display(&rule.components)
            );
            if !rule.patterns.is_empty() {
                println!("patterns:");
                for pattern in &rule.patterns {
                    println!("  - {}", pattern.source);
                }
            }
            if !rule.exclude_patterns.is_empty() {
                println!("exclude patterns:");
                for pattern in &rule.exclude_patterns {
                    println!("  - {}", pattern.source);
                }
            }
            if !rule.semantic_patterns.is_empty() {
                println!("semantic patterns:");
                for pattern in &rule.semantic_patterns {
                    println!("  - {:?}: {}", pattern.kind, pattern.pattern);
                }
            }
            if !rule.correlation_rules.is_empty() {
                println!("correlations:");
                for spec in &rule.correlation_rules {
                    println!(
                        "  - {} (files: {}, distance <= {})",
                        spec.attack_pattern,
                        spec.file_patterns.join(", "),
                        spec.max_distance
                    );
                }
            }
            if !rule.remediation.is_empty() {
                println!("remediation: {}", rule.remediation);
            }
            for reference in &rule.references {
                println!("reference:   {reference}");
            }
        }
        RulesCommand::Stats => {
            let stats = registry.stats();
            println!("total rules:   {}", stats.total);
            println!("enabled rules: {}", stats.enabled);
            println!("\nby category:");
            for (category, count) in &stats.by_category {
                println!("  {category:<16} {count}");
            }
            println!("\nby severity:");
            for (severity, count) in &stats.by_severity {
                println!("  {severity:<16} {count}");
            }
        }
    }
    Ok(0)
}

fn join_display<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
