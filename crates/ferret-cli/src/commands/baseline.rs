//! `ferret-scan baseline create|show|remove`.

use anyhow::{Context, Result};

use ferret_core::suppress::baseline::Baseline;
use ferret_core::{Scanner, ScannerConfig};

use crate::args::BaselineCommand;

pub fn run(command: BaselineCommand) -> Result<i32> {
    match command {
        BaselineCommand::Create {
            path,
            output,
            description,
        } => {
            let config = ScannerConfig::discover(&path).context("discovering config")?;
            let scanner = Scanner::new(config);
            let result = scanner.scan(&[path]);
            if !result.success {
                anyhow::bail!("scan failed; not writing a baseline");
            }
            let baseline = Baseline::from_findings(&result.findings, description);
            baseline
                .save(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            println!(
                "baseline written to {} ({} accepted findings)",
                output.display(),
                baseline.findings.len()
            );
            Ok(0)
        }
        BaselineCommand::Show { path } => {
            let baseline = Baseline::load(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            println!(
                "baseline {} (version {}, created {}, updated {})",
                path.display(),
                baseline.version,
                baseline.created_date.format("%Y-%m-%d"),
                baseline.last_updated.format("%Y-%m-%d"),
            );
            if let Some(description) = &baseline.description {
                println!("description: {description}");
            }
            for entry in &baseline.findings {
                println!(
                    "  {} {}:{} {}",
                    entry.rule_id, entry.file, entry.line, entry.matched
                );
            }
            println!("{} accepted findings", baseline.findings.len());
            Ok(0)
        }
        BaselineCommand::Remove { path } => {
            if path.is_file() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("removing {}", path.display()))?;
                println!("removed {}", path.display());
            } else {
                println!("no baseline at {}", path.display());
            }
            Ok(0)
        }
    }
}
