//! `ferret-scan check <file>` — single-file scan with console output.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use ferret_core::{Scanner, ScannerConfig};

use crate::output;

pub fn run(file: PathBuf, fail_on: Option<String>) -> Result<i32> {
    if !file.is_file() {
        bail!("{} is not a file", file.display());
    }
    let root = file.parent().unwrap_or(std::path::Path::new("."));
    let mut config = ScannerConfig::discover(root).context("discovering config")?;
    if let Some(value) = &fail_on {
        config.fail_on = super::parse_severity(value)?;
    }
    let fail_on = config.fail_on;
    let redact = config.redact;

    let scanner = Scanner::new(config);
    let result = scanner.scan(&[file]);
    print!("{}", output::console::render(&result, redact, true));
    Ok(result.exit_code(fail_on))
}
