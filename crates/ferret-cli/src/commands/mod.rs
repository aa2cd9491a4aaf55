//! Command implementations. Each returns the process exit code.

pub mod baseline;
pub mod check;
pub mod rules;
pub mod scan;

use anyhow::{bail, Result};
use std::str::FromStr;

use ferret_core::{Severity, ThreatCategory};

/// Parse a comma-separated severity list.
pub fn parse_severities(list: &str) -> Result<Vec<Severity>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Severity::from_str(s).map_err(anyhow::Error::msg))
        .collect()
}

/// Parse a comma-separated category list.
pub fn parse_categories(list: &str) -> Result<Vec<ThreatCategory>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| ThreatCategory::from_str(s).map_err(anyhow::Error::msg))
        .collect()
}

/// Parse a single severity flag value.
pub fn parse_severity(value: &str) -> Result<Severity> {
    match Severity::from_str(value.trim()) {
        Ok(severity) => Ok(severity),
        Err(e) => bail!("{e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_list_parses() {
        let parsed = parse_severities("critical, high").unwrap();
        assert_eq!(parsed, vec![Severity::Critical, Severity::High]);
    }

    #[test]
    fn bad_severity_rejected() {
        assert!(parse_severities("critical,bogus").is_err());
    }

    #[test]
    fn category_list_parses() {
        let parsed = parse_categories("exfiltration,supply-chain").unwrap();
        assert_eq!(
            parsed,
            vec![ThreatCategory::Exfiltration, ThreatCategory::SupplyChain]
        );
    }
}
