//! ferret-scan: static security scanner for AI-assistant tooling
//! configuration.

mod args;
mod commands;
mod output;
mod watch;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use args::{Cli, Command};

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "ferret_cli=debug,ferret_core=debug,ferret_rules=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Command::Scan(scan_args) => {
            init_tracing(scan_args.verbose);
            commands::scan::run(scan_args)
        }
        Command::Check {
            file,
            fail_on,
            verbose,
        } => {
            init_tracing(verbose);
            commands::check::run(file, fail_on)
        }
        Command::Rules { command } => {
            init_tracing(false);
            commands::rules::run(command)
        }
        Command::Baseline { command } => {
            init_tracing(false);
            commands::baseline::run(command)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            3
        }
    };
    std::process::exit(code);
}
