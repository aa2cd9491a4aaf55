//! MITRE ATLAS technique annotation.
//!
//! Findings are tagged with adversarial-ML technique ids from a pinned
//! catalog. The catalog can optionally refresh from a remote JSON source
//! with a TTL-bound on-disk cache (atomic write-then-rename).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use ferret_rules::ThreatCategory;

use crate::config::AtlasCatalogConfig;
use crate::errors::{IssueKind, ScanIssue};
use crate::finding::Finding;

/// One ATLAS technique reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AtlasTechnique {
    pub id: String,
    pub name: String,
}

/// Category -> technique mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasCatalog {
    pub fetched_at: Option<DateTime<Utc>>,
    pub techniques: HashMap<ThreatCategory, Vec<AtlasTechnique>>,
}

fn technique(id: &str, name: &str) -> AtlasTechnique {
    AtlasTechnique {
        id: id.to_string(),
        name: name.to_string(),
    }
}

impl AtlasCatalog {
    /// The pinned catalog shipped with the scanner.
    pub fn pinned() -> Self {
        let mut techniques = HashMap::new();
        techniques.insert(
            ThreatCategory::Injection,
            vec![
                technique("AML.T0051", "LLM Prompt Injection"),
                technique("AML.T0054", "LLM Jailbreak"),
            ],
        );
        techniques.insert(
            ThreatCategory::AiSpecific,
            vec![
                technique("AML.T0051", "LLM Prompt Injection"),
                technique("AML.T0053", "LLM Plugin Compromise"),
            ],
        );
        techniques.insert(
            ThreatCategory::Exfiltration,
            vec![technique("AML.T0057", "LLM Data Leakage")],
        );
        techniques.insert(
            ThreatCategory::Credentials,
            vec![technique("AML.T0055", "Unsecured Credentials")],
        );
        techniques.insert(
            ThreatCategory::SupplyChain,
            vec![technique("AML.T0010", "ML Supply Chain Compromise")],
        );
        techniques.insert(
            ThreatCategory::Backdoors,
            vec![technique("AML.T0018", "Backdoor ML Model")],
        );
        techniques.insert(
            ThreatCategory::Persistence,
            vec![technique("AML.T0020", "Poison Training Data")],
        );
        techniques.insert(
            ThreatCategory::Obfuscation,
            vec![technique("AML.T0043", "Craft Adversarial Data")],
        );
        techniques.insert(
            ThreatCategory::AdvancedHiding,
            vec![technique("AML.T0051.001", "Indirect Prompt Injection")],
        );
        Self {
            fetched_at: None,
            techniques,
        }
    }

    /// Load the catalog per config: a fresh on-disk cache wins, then a
    /// remote refresh (when enabled and the build has `remote`), then the
    /// pinned fallback. All failures degrade to the pinned catalog.
    pub fn load(config: &AtlasCatalogConfig) -> (Self, Vec<ScanIssue>) {
        let mut issues = Vec::new();
        if !config.enabled {
            return (Self::pinned(), issues);
        }

        let cache_path = config
            .cache_path
            .clone()
            .or_else(default_cache_path)
            .unwrap_or_else(|| PathBuf::from(".ferret-atlas-cache.json"));

        if !config.force_refresh {
            if let Some(cached) = Self::read_cache(&cache_path, config.cache_ttl_hours) {
                return (cached, issues);
            }
        }

        if config.auto_update || config.force_refresh {
            match Self::fetch_remote(config) {
                Ok(catalog) => {
                    if let Err(e) = catalog.write_cache(&cache_path) {
                        issues.push(ScanIssue::new(
                            IssueKind::Catalog,
                            format!("failed to cache ATLAS catalog: {e}"),
                        ));
                    }
                    return (catalog, issues);
                }
                Err(message) => {
                    issues.push(ScanIssue::new(
                        IssueKind::Catalog,
                        format!("ATLAS refresh failed, using pinned catalog: {message}"),
                    ));
                }
            }
        }

        (Self::pinned(), issues)
    }

    fn read_cache(path: &std::path::Path, ttl_hours: u64) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        let catalog: AtlasCatalog = serde_json::from_str(&content).ok()?;
        let fetched_at = catalog.fetched_at?;
        let age = Utc::now().signed_duration_since(fetched_at);
        if age > Duration::hours(ttl_hours as i64) {
            return None;
        }
        Some(catalog)
    }

    fn write_cache(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_string(self).unwrap_or_default())?;
        std::fs::rename(&tmp, path)
    }

    #[cfg(feature = "remote")]
    fn fetch_remote(config: &AtlasCatalogConfig) -> Result<Self, String> {
        let url = config
            .source_url
            .as_deref()
            .ok_or_else(|| "no source_url configured".to_string())?;
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| e.to_string())?;
        let response = client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?;
        let techniques: HashMap<ThreatCategory, Vec<AtlasTechnique>> =
            response.json().map_err(|e| e.to_string())?;
        Ok(Self {
            fetched_at: Some(Utc::now()),
            techniques,
        })
    }

    #[cfg(not(feature = "remote"))]
    fn fetch_remote(_config: &AtlasCatalogConfig) -> Result<Self, String> {
        Err("this build has no remote support (enable the 'remote' feature)".to_string())
    }

    pub fn techniques_for(&self, category: ThreatCategory) -> &[AtlasTechnique] {
        self.techniques
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn default_cache_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("ferret-scan").join("atlas-catalog.json"))
}

/// Tag findings with `metadata.atlas.techniques`.
pub fn annotate(findings: &mut [Finding], catalog: &AtlasCatalog) {
    for finding in findings.iter_mut() {
        let techniques = catalog.techniques_for(finding.category);
        if techniques.is_empty() {
            continue;
        }
        let ids: Vec<&str> = techniques.iter().map(|t| t.id.as_str()).collect();
        let names: Vec<&str> = techniques.iter().map(|t| t.name.as_str()).collect();
        finding.set_metadata(
            "atlas",
            serde_json::json!({ "techniques": ids, "names": names }),
        );
    }
}
