//! Watch mode: re-run the scan when files under the target change.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};

use ferret_core::Scanner;

use crate::args::ScanArgs;
use crate::commands::scan::{render, scan_once, should_color};

const DEBOUNCE: Duration = Duration::from_millis(400);
const POLL: Duration = Duration::from_millis(250);

/// Loop: scan, render, wait for a change (or Ctrl-C), repeat. Returns the
/// exit code of the final scan.
pub fn run(
    scanner: &Scanner,
    args: &ScanArgs,
    redact: bool,
    cancel: Arc<AtomicBool>,
) -> Result<i32> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(DEBOUNCE, move |events| {
        let _ = tx.send(events);
    })
    .context("starting file watcher")?;
    debouncer
        .watcher()
        .watch(&args.path, RecursiveMode::Recursive)
        .with_context(|| format!("watching {}", args.path.display()))?;

    let fail_on = scanner.config().fail_on;
    let mut exit_code;
    loop {
        let result = scan_once(scanner, &args.path);
        exit_code = result.exit_code(fail_on);
        println!("{}", render(&result, args.format, redact, should_color(args)));
        tracing::info!("watching {} for changes", args.path.display());

        // Block until something changes, polling the cancel flag.
        loop {
            if cancel.load(Ordering::SeqCst) {
                return Ok(exit_code);
            }
            match rx.recv_timeout(POLL) {
                Ok(_) => break,
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => return Ok(exit_code),
            }
        }
        // Drain queued events so one edit burst triggers one rescan.
        while rx.try_recv().is_ok() {}
    }
}
