//! Optional LLM-assisted analysis.
//!
//! The provider is a capability plugin behind the [`LlmClient`] trait. The
//! analyzer wraps it with a token-per-minute bucket, a minimum
//! inter-request delay, retry with backoff, a content-hash disk cache, and
//! a hard disable on HTTP 429 for the remainder of the scan.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use ferret_rules::{Severity, ThreatCategory};

use crate::config::LlmConfig;
use crate::discovery::DiscoveredFile;
use crate::errors::{IssueKind, ScanError, ScanIssue};
use crate::finding::{ContextLine, Finding};

pub const RULE_ID: &str = "LLM-001";

/// Rough chars-per-token estimate for the budget bucket.
const CHARS_PER_TOKEN: usize = 4;

/// Token budget refilled per minute.
const TOKENS_PER_MINUTE: usize = 60_000;

/// Provider abstraction: send a prompt, get text back.
pub trait LlmClient: Send + Sync {
    fn analyze(&self, prompt: &str) -> Result<String, ScanError>;
}

/// One structured verdict parsed from the provider response.
#[derive(Debug, Deserialize)]
struct LlmVerdict {
    line: Option<usize>,
    title: String,
    #[serde(default)]
    description: String,
    confidence: f32,
    #[serde(default)]
    severity: Option<Severity>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    created_at: chrono::DateTime<Utc>,
    response: String,
}

struct Throttle {
    last_request: Option<Instant>,
    window_start: Instant,
    tokens_spent: usize,
}

/// LLM analysis layer. One instance per scan; internal counters are
/// thread-safe so parallel per-file tasks can share it.
pub struct LlmAnalyzer {
    client: Box<dyn LlmClient>,
    config: LlmConfig,
    throttle: Mutex<Throttle>,
    disabled: AtomicBool,
    files_analyzed: AtomicUsize,
    cache_dir: Option<PathBuf>,
}

impl LlmAnalyzer {
    pub fn new(client: Box<dyn LlmClient>, config: LlmConfig) -> Self {
        let cache_dir = config.cache_dir.clone().or_else(|| {
            dirs::cache_dir().map(|dir| dir.join("ferret-scan").join("llm"))
        });
        Self {
            client,
            config,
            throttle: Mutex::new(Throttle {
                last_request: None,
                window_start: Instant::now(),
                tokens_spent: 0,
            }),
            disabled: AtomicBool::new(false),
            files_analyzed: AtomicUsize::new(0),
            cache_dir,
        }
    }

    /// Whether the analyzer shut itself off (rate limit).
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    /// Analyze one file, seeing the findings produced so far for it.
    pub fn analyze_file(
        &self,
        file: &DiscoveredFile,
        content: &str,
        existing: &[Finding],
    ) -> (Vec<Finding>, Vec<ScanIssue>) {
        let mut issues = Vec::new();
        if self.is_disabled() {
            return (Vec::new(), issues);
        }
        if self.config.only_if_findings && existing.is_empty() {
            return (Vec::new(), issues);
        }
        if self.files_analyzed.fetch_add(1, Ordering::SeqCst) >= self.config.max_files {
            return (Vec::new(), issues);
        }

        let prompt = self.build_prompt(file, content, existing);
        let response = match self.cached_response(&prompt) {
            Some(response) => response,
            None => {
                match self.request_with_retries(&prompt) {
                    Ok(response) => {
                        self.store_cache(&prompt, &response);
                        response
                    }
                    Err(ScanError::RateLimit { message }) => {
                        self.disabled.store(true, Ordering::SeqCst);
                        tracing::warn!("LLM rate limited; disabling for the rest of the scan");
                        issues.push(ScanIssue::new(IssueKind::RateLimit, message));
                        return (Vec::new(), issues);
                    }
                    Err(e) => {
                        issues.push(
                            ScanIssue::from(&e).with_path(file.relative_path.clone()),
                        );
                        return (Vec::new(), issues);
                    }
                }
            }
        };

        (self.parse_response(&response, file, content), issues)
    }

    fn build_prompt(&self, file: &DiscoveredFile, content: &str, existing: &[Finding]) -> String {
        let truncated: String = content.chars().take(self.config.max_input_chars).collect();
        let known: Vec<String> = existing
            .iter()
            .map(|f| format!("- line {}: {} ({})", f.line, f.rule_name, f.rule_id))
            .collect();
        format!(
            "You review AI-assistant configuration files for security risks.\n\
             File: {} (component: {}, type: {})\n\
             Known findings:\n{}\n\
             Respond with a JSON array of objects {{line, title, description, confidence, severity}} \
             describing additional risks, or [] when there are none.\n\
             ---\n{}",
            file.relative_path,
            file.component,
            file.file_type,
            if known.is_empty() {
                "(none)".to_string()
            } else {
                known.join("\n")
            },
            truncated
        )
    }

    fn request_with_retries(&self, prompt: &str) -> Result<String, ScanError> {
        let mut backoff = self.config.retry_backoff_ms;
        let mut attempt = 0;
        loop {
            self.wait_for_budget(prompt.len());
            match self.client.analyze(prompt) {
                Ok(response) => return Ok(response),
                Err(e @ ScanError::RateLimit { .. }) => return Err(e),
                Err(e) => {
                    if attempt >= self.config.max_retries {
                        return Err(e);
                    }
                    attempt += 1;
                    std::thread::sleep(Duration::from_millis(backoff));
                    backoff = (backoff * 2).min(self.config.retry_max_backoff_ms);
                }
            }
        }
    }

    /// Enforce the min inter-request delay and the token-per-minute bucket.
    fn wait_for_budget(&self, prompt_chars: usize) {
        let tokens = prompt_chars / CHARS_PER_TOKEN + 1;
        let mut sleep_needed = Duration::ZERO;
        {
            let mut throttle = self.throttle.lock().unwrap_or_else(|e| e.into_inner());
            if throttle.window_start.elapsed() >= Duration::from_secs(60) {
                throttle.window_start = Instant::now();
                throttle.tokens_spent = 0;
            }
            if throttle.tokens_spent + tokens > TOKENS_PER_MINUTE {
                sleep_needed = Duration::from_secs(60)
                    .saturating_sub(throttle.window_start.elapsed());
                throttle.window_start = Instant::now() + sleep_needed;
                throttle.tokens_spent = 0;
            }
            if let Some(last) = throttle.last_request {
                let since = last.elapsed();
                let min_interval = Duration::from_millis(self.config.min_request_interval_ms);
                if since < min_interval {
                    sleep_needed = sleep_needed.max(min_interval - since);
                }
            }
            throttle.tokens_spent += tokens;
            throttle.last_request = Some(Instant::now() + sleep_needed);
        }
        if !sleep_needed.is_zero() {
            std::thread::sleep(sleep_needed);
        }
    }

    fn cache_key(&self, prompt: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.config.model.as_bytes());
        hasher.update(b"|");
        hasher.update(prompt.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn cached_response(&self, prompt: &str) -> Option<String> {
        let dir = self.cache_dir.as_ref()?;
        let path = dir.join(format!("{}.json", self.cache_key(prompt)));
        let content = std::fs::read_to_string(path).ok()?;
        let entry: CacheEntry = serde_json::from_str(&content).ok()?;
        let age = Utc::now().signed_duration_since(entry.created_at);
        if age > chrono::Duration::hours(self.config.cache_ttl_hours as i64) {
            return None;
        }
        Some(entry.response)
    }

    fn store_cache(&self, prompt: &str, response: &str) {
        let Some(dir) = self.cache_dir.as_ref() else {
            return;
        };
        if std::fs::create_dir_all(dir).is_err() {
            return;
        }
        let entry = CacheEntry {
            created_at: Utc::now(),
            response: response.to_string(),
        };
        let path = dir.join(format!("{}.json", self.cache_key(prompt)));
        let tmp = path.with_extension("tmp");
        if std::fs::write(&tmp, serde_json::to_string(&entry).unwrap_or_default()).is_ok() {
            let _ = std::fs::rename(&tmp, &path);
        }
    }

    fn parse_response(&self, response: &str, file: &DiscoveredFile, content: &str) -> Vec<Finding> {
        // Providers wrap JSON in prose or fences often enough to be worth
        // trimming for.
        let trimmed = response
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();
        let verdicts: Vec<LlmVerdict> = match serde_json::from_str(trimmed) {
            Ok(verdicts) => verdicts,
            Err(e) => {
                tracing::debug!(error = %e, "unparseable LLM response");
                return Vec::new();
            }
        };

        let line_count = content.lines().count().max(1);
        verdicts
            .into_iter()
            .filter(|v| v.confidence >= self.config.min_confidence)
            .take(self.config.max_findings_per_file)
            .map(|verdict| {
                let line = verdict.line.unwrap_or(1).clamp(1, line_count);
                let line_content = content.lines().nth(line - 1).unwrap_or_default();
                let severity = verdict.severity.unwrap_or(Severity::Medium);
                let mut finding = Finding {
                    rule_id: RULE_ID.to_string(),
                    rule_name: "LLM-flagged risk".to_string(),
                    severity,
                    category: ThreatCategory::Behavioral,
                    path: file.path.clone(),
                    relative_path: file.relative_path.clone(),
                    line,
                    column: None,
                    matched: verdict.title.clone(),
                    context: vec![ContextLine {
                        line_number: line,
                        content: line_content.to_string(),
                        is_match: true,
                    }],
                    remediation: verdict.description.clone(),
                    metadata: None,
                    timestamp: Utc::now(),
                    risk_score: severity.weight() as u8,
                };
                finding.set_metadata("confidence", serde_json::json!(verdict.confidence));
                finding.set_metadata("source", serde_json::json!("llm"));
                finding
            })
            .collect()
    }
}

/// HTTP client for OpenAI-compatible chat-completions endpoints.
#[cfg(feature = "remote")]
pub struct HttpLlmClient {
    config: LlmConfig,
    client: reqwest::blocking::Client,
    api_key: String,
}

#[cfg(feature = "remote")]
impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, ScanError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| ScanError::Config {
            message: format!("LLM API key env var {} is not set", config.api_key_env),
        })?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ScanError::Network {
                url: config.base_url.clone().unwrap_or_default(),
                message: e.to_string(),
            })?;
        Ok(Self {
            config: config.clone(),
            client,
            api_key,
        })
    }
}

#[cfg(feature = "remote")]
impl LlmClient for HttpLlmClient {
    fn analyze(&self, prompt: &str) -> Result<String, ScanError> {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or("https://api.openai.com/v1");
        let url = format!("{}/chat/completions", base.trim_end_matches('/'));
        let mut body = serde_json::json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_output_tokens,
        });
        if self.config.json_mode {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| ScanError::Network {
                url: url.clone(),
                message: e.to_string(),
            })?;

        if response.status().as_u16() == 429 {
            return Err(ScanError::RateLimit {
                message: "provider returned HTTP 429".to_string(),
            });
        }
        let response = response.error_for_status().map_err(|e| ScanError::Network {
            url: url.clone(),
            message: e.to_string(),
        })?;
        let parsed: serde_json::Value = response.json().map_err(|e| ScanError::Network {
            url,
            message: e.to_string(),
        })?;
        Ok(parsed
            .pointer("/choices/0/message/content")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferret_rules::{ComponentType, FileType};
    use std::sync::atomic::AtomicUsize as TestCounter;

    struct FakeClient {
        responses: Vec<Result<String, ScanError>>,
        calls: TestCounter,
    }

    impl LlmClient for FakeClient {
        fn analyze(&self, _prompt: &str) -> Result<String, ScanError> {
            let idx = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.responses.get(idx.min(self.responses.len() - 1)) {
                Some(Ok(s)) => Ok(s.clone()),
                Some(Err(ScanError::RateLimit { message })) => Err(ScanError::RateLimit {
                    message: message.clone(),
                }),
                _ => Err(ScanError::Network {
                    url: "fake".to_string(),
                    message: "boom".to_string(),
                }),
            }
        }
    }

    fn test_config(cache: &tempfile::TempDir) -> LlmConfig {
        LlmConfig {
            cache_dir: Some(cache.path().to_path_buf()),
            min_request_interval_ms: 0,
            retry_backoff_ms: 1,
            retry_max_backoff_ms: 2,
            only_if_findings: false,
            ..Default::default()
        }
    }

    fn file() -> DiscoveredFile {
        DiscoveredFile {
            path: std::path::PathBuf::from("/scan/hook.sh"),
            relative_path: "hook.sh".to_string(),
            file_type: FileType::Sh,
            component: ComponentType::Hook,
            size: 0,
            modified: None,
        }
    }

    fn analyzer_with(
        responses: Vec<Result<String, ScanError>>,
    ) -> (LlmAnalyzer, tempfile::TempDir) {
        let cache = tempfile::tempdir().unwrap();
        let analyzer = LlmAnalyzer::new(
            Box::new(FakeClient {
                responses,
                calls: TestCounter::new(0),
            }),
            test_config(&cache),
        );
        (analyzer, cache)
    }

    #[test]
    fn parses_verdicts_above_confidence() {
        let response = r#"[
            {"line": 1, "title": "beacon loop", "description": "loop posts home", "confidence": 0.9},
            {"line": 2, "title": "weak hunch", "description": "", "confidence": 0.2}
        ]"#;
        let (analyzer, _cache) = analyzer_with(vec![Ok(response.to_string())]);
        let (findings, issues) =
            analyzer.analyze_file(&file(), "while true; do curl; done\necho hi", &[]);
        assert!(issues.is_empty());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, RULE_ID);
        assert_eq!(findings[0].matched, "beacon loop");
    }

    #[test]
    fn rate_limit_disables_analyzer() {
        let (analyzer, _cache) = analyzer_with(vec![Err(ScanError::RateLimit {
            message: "429".to_string(),
        })]);
        let (findings, issues) = analyzer.analyze_file(&file(), "content", &[]);
        assert!(findings.is_empty());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::RateLimit);
        assert!(analyzer.is_disabled());

        // Subsequent calls are no-ops.
        let (findings2, issues2) = analyzer.analyze_file(&file(), "content2", &[]);
        assert!(findings2.is_empty());
        assert!(issues2.is_empty());
    }

    #[test]
    fn fenced_json_response_parses() {
        let response = "```json\n[{\"line\": 1, \"title\": \"x\", \"confidence\": 0.8}]\n```";
        let (analyzer, _cache) = analyzer_with(vec![Ok(response.to_string())]);
        let (findings, _) = analyzer.analyze_file(&file(), "line", &[]);
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn garbage_response_yields_nothing() {
        let (analyzer, _cache) = analyzer_with(vec![Ok("I found nothing of note.".to_string())]);
        let (findings, issues) = analyzer.analyze_file(&file(), "line", &[]);
        assert!(findings.is_empty());
        assert!(issues.is_empty());
    }

    #[test]
    fn max_files_cap_enforced() {
        let cache = tempfile::tempdir().unwrap();
        let mut config = test_config(&cache);
        config.max_files = 1;
        let analyzer = LlmAnalyzer::new(
            Box::new(FakeClient {
                responses: vec![Ok("[]".to_string())],
                calls: TestCounter::new(0),
            }),
            config,
        );
        let (_, _) = analyzer.analyze_file(&file(), "a", &[]);
        let (findings, issues) = analyzer.analyze_file(&file(), "b", &[]);
        assert!(findings.is_empty());
        assert!(issues.is_empty());
    }
}
