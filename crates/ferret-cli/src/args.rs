//! Command-line argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ferret-scan",
    version,
    about = "Static security scanner for AI-assistant tooling configuration",
    long_about = "Scans instruction files, tool manifests, shell hooks, and dependency \
                  specs for prompt injection, credential leaks, exfiltration scaffolding, \
                  backdoors, dangerous permissions, and supply-chain hazards."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scan a directory tree (default: current directory)
    Scan(ScanArgs),
    /// Scan a single file with console output
    Check {
        /// File to scan
        file: PathBuf,
        /// Severity threshold for a non-zero exit code
        #[arg(long, value_name = "SEVERITY")]
        fail_on: Option<String>,
        /// Emit debug logs
        #[arg(short, long)]
        verbose: bool,
    },
    /// Inspect the rule registry
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },
    /// Maintain the accepted-findings baseline
    Baseline {
        #[command(subcommand)]
        command: BaselineCommand,
    },
}

#[derive(clap::Args)]
pub struct ScanArgs {
    /// Path to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,

    /// Comma-separated severities to report (critical,high,medium,low,info)
    #[arg(long, value_name = "LIST")]
    pub severity: Option<String>,

    /// Comma-separated categories to scan
    #[arg(long, value_name = "LIST")]
    pub categories: Option<String>,

    /// Severity threshold for a non-zero exit code
    #[arg(long, value_name = "SEVERITY")]
    pub fail_on: Option<String>,

    /// Write the report to a file instead of stdout
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Re-run the scan when files change
    #[arg(long)]
    pub watch: bool,

    /// CI mode: no colors, no interactive elements
    #[arg(long)]
    pub ci: bool,

    /// Emit debug logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file (default: .ferret.toml / ferret.toml at the scan root)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Baseline file to subtract (default: .ferret-baseline.json when present)
    #[arg(long, value_name = "FILE")]
    pub baseline: Option<PathBuf>,

    /// Skip baseline subtraction entirely
    #[arg(long)]
    pub ignore_baseline: bool,
}

#[derive(Subcommand)]
pub enum RulesCommand {
    /// List all rules
    List {
        /// Restrict to one category
        #[arg(long)]
        category: Option<String>,
    },
    /// Show one rule in full
    Show {
        /// Rule id, e.g. CRED-001
        id: String,
    },
    /// Registry statistics
    Stats,
}

#[derive(Subcommand)]
pub enum BaselineCommand {
    /// Scan and accept all current findings into a baseline
    Create {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Baseline file to write
        #[arg(long, short, default_value = ".ferret-baseline.json")]
        output: PathBuf,
        /// Free-form note stored in the baseline
        #[arg(long)]
        description: Option<String>,
    },
    /// Print the baseline contents
    Show {
        /// Baseline file
        #[arg(default_value = ".ferret-baseline.json")]
        path: PathBuf,
    },
    /// Delete the baseline file
    Remove {
        /// Baseline file
        #[arg(default_value = ".ferret-baseline.json")]
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Console,
    Json,
    Sarif,
    Html,
    Csv,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scan_defaults() {
        let cli = Cli::try_parse_from(["ferret-scan", "scan"]).unwrap();
        let Command::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.path, PathBuf::from("."));
        assert_eq!(args.format, OutputFormat::Console);
        assert!(!args.watch);
        assert!(!args.ignore_baseline);
    }

    #[test]
    fn scan_flags_parse() {
        let cli = Cli::try_parse_from([
            "ferret-scan",
            "scan",
            "target",
            "--format",
            "sarif",
            "--severity",
            "critical,high",
            "--fail-on",
            "medium",
            "--ci",
        ])
        .unwrap();
        let Command::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.format, OutputFormat::Sarif);
        assert_eq!(args.severity.as_deref(), Some("critical,high"));
        assert_eq!(args.fail_on.as_deref(), Some("medium"));
        assert!(args.ci);
    }

    #[test]
    fn rules_subcommands_parse() {
        assert!(Cli::try_parse_from(["ferret-scan", "rules", "list"]).is_ok());
        assert!(Cli::try_parse_from(["ferret-scan", "rules", "show", "CRED-001"]).is_ok());
        assert!(Cli::try_parse_from(["ferret-scan", "rules", "stats"]).is_ok());
    }

    #[test]
    fn baseline_subcommands_parse() {
        assert!(Cli::try_parse_from(["ferret-scan", "baseline", "create"]).is_ok());
        assert!(Cli::try_parse_from(["ferret-scan", "baseline", "show"]).is_ok());
        assert!(Cli::try_parse_from(["ferret-scan", "baseline", "remove"]).is_ok());
    }
}
