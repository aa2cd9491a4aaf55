//! Scanner error taxonomy.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the detection pipeline.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Path not found or not accessible: {path}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid pattern in rule {rule_id}: {message}")]
    RuleCompilation { rule_id: String, message: String },

    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        path: Option<PathBuf>,
    },

    #[error("Network request failed: {url}")]
    Network { url: String, message: String },

    #[error("Rate limited: {message}")]
    RateLimit { message: String },

    #[error("Threat catalog unavailable: {message}")]
    Catalog { message: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Lightweight, serializable record of a non-fatal error collected during a
/// scan. These land in `ScanResult.errors` and never abort the scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanIssue {
    pub kind: IssueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    Discovery,
    Read,
    RuleCompilation,
    Validation,
    Network,
    RateLimit,
    Catalog,
    Config,
    Other,
}

impl ScanIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: None,
            message: message.into(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl From<&ScanError> for ScanIssue {
    fn from(err: &ScanError) -> Self {
        let kind = match err {
            ScanError::Discovery { .. } => IssueKind::Discovery,
            ScanError::Read { .. } => IssueKind::Read,
            ScanError::RuleCompilation { .. } => IssueKind::RuleCompilation,
            ScanError::Validation { .. } => IssueKind::Validation,
            ScanError::Network { .. } => IssueKind::Network,
            ScanError::RateLimit { .. } => IssueKind::RateLimit,
            ScanError::Catalog { .. } => IssueKind::Catalog,
            ScanError::Config { .. } => IssueKind::Config,
            ScanError::Other(_) => IssueKind::Other,
        };
        let path = match err {
            ScanError::Discovery { path, .. } | ScanError::Read { path, .. } => {
                Some(path.to_string_lossy().into_owned())
            }
            ScanError::Validation { path, .. } => {
                path.as_ref().map(|p| p.to_string_lossy().into_owned())
            }
            _ => None,
        };
        Self {
            kind,
            path,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_from_read_error_carries_path() {
        let err = ScanError::Read {
            path: PathBuf::from("/tmp/x.md"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let issue = ScanIssue::from(&err);
        assert_eq!(issue.kind, IssueKind::Read);
        assert_eq!(issue.path.as_deref(), Some("/tmp/x.md"));
    }

    #[test]
    fn issue_serializes_kebab_kinds() {
        let issue = ScanIssue::new(IssueKind::RuleCompilation, "bad regex");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "rule-compilation");
    }

    #[test]
    fn rate_limit_maps_to_kind() {
        let err = ScanError::RateLimit {
            message: "429".into(),
        };
        assert_eq!(ScanIssue::from(&err).kind, IssueKind::RateLimit);
    }
}
