//! `ferret-scan scan` — the primary entrypoint.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::atomic::Ordering;

use ferret_core::suppress::baseline::Baseline;
use ferret_core::{ScannerConfig, Scanner, ScanResult};

use crate::args::{OutputFormat, ScanArgs};
use crate::output;
use crate::watch;

const DEFAULT_BASELINE: &str = ".ferret-baseline.json";

/// Resolve the effective configuration: file (explicit or discovered at the
/// scan root) plus CLI overrides.
pub fn effective_config(args: &ScanArgs) -> Result<ScannerConfig> {
    let mut config = match &args.config {
        Some(path) => ScannerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ScannerConfig::discover(&args.path).context("discovering config")?,
    };

    if let Some(list) = &args.severity {
        config.severity = Some(super::parse_severities(list)?);
    }
    if let Some(list) = &args.categories {
        config.categories = Some(super::parse_categories(list)?);
    }
    if let Some(value) = &args.fail_on {
        config.fail_on = super::parse_severity(value)?;
    }
    Ok(config)
}

fn load_baseline(args: &ScanArgs) -> Result<Option<Baseline>> {
    if args.ignore_baseline {
        return Ok(None);
    }
    match &args.baseline {
        Some(path) => {
            let baseline = Baseline::load(path)
                .with_context(|| format!("loading baseline {}", path.display()))?;
            Ok(Some(baseline))
        }
        None => {
            let default = args.path.join(DEFAULT_BASELINE);
            if default.is_file() {
                let baseline = Baseline::load(&default)
                    .with_context(|| format!("loading baseline {}", default.display()))?;
                Ok(Some(baseline))
            } else {
                Ok(None)
            }
        }
    }
}

/// Render a result in the requested format.
pub fn render(result: &ScanResult, format: OutputFormat, redact: bool, color: bool) -> String {
    match format {
        OutputFormat::Console => output::console::render(result, redact, color),
        OutputFormat::Json => output::json::render(result, redact),
        OutputFormat::Sarif => output::sarif::render(result, redact),
        OutputFormat::Html => output::html::render(result, redact),
        OutputFormat::Csv => output::csv::render(result, redact),
    }
}

fn emit(args: &ScanArgs, rendered: &str) -> Result<()> {
    match &args.output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("writing report to {}", path.display())),
        None => {
            print!("{rendered}");
            Ok(())
        }
    }
}

pub fn run(args: ScanArgs) -> Result<i32> {
    if args.ci {
        colored::control::set_override(false);
    }
    let config = effective_config(&args)?;
    let fail_on = config.fail_on;
    let redact = config.redact;
    #[cfg(feature = "remote")]
    let llm_config = config.llm_analysis.then(|| config.llm.clone());

    let mut scanner = Scanner::new(config);
    if let Some(baseline) = load_baseline(&args)? {
        scanner.set_baseline(baseline);
    }

    #[cfg(feature = "remote")]
    if let Some(llm_config) = llm_config {
        use ferret_core::llm::{HttpLlmClient, LlmAnalyzer};
        match HttpLlmClient::from_config(&llm_config) {
            Ok(client) => {
                scanner.set_llm(LlmAnalyzer::new(Box::new(client), llm_config));
            }
            Err(e) => tracing::warn!(error = %e, "LLM analysis requested but unavailable"),
        }
    }

    let cancel = scanner.cancel_token();
    // A second Ctrl-C while cancelling kills the process the normal way.
    let handler_cancel = cancel.clone();
    let _ = ctrlc::set_handler(move || {
        handler_cancel.store(true, Ordering::SeqCst);
    });

    if args.watch {
        return watch::run(&scanner, &args, redact, cancel);
    }

    let result = scanner.scan(&[args.path.clone()]);
    let rendered = render(&result, args.format, redact, should_color(&args));
    emit(&args, &rendered)?;
    Ok(result.exit_code(fail_on))
}

pub fn should_color(args: &ScanArgs) -> bool {
    !args.ci && args.output.is_none()
}

/// Exists for the watch loop, which re-renders per iteration.
pub fn scan_once(scanner: &Scanner, path: &Path) -> ScanResult {
    scanner.scan(&[path.to_path_buf()])
}
