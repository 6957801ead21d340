//! Error log commands and failure recording.

use std::error::Error;
use std::path::PathBuf;

use axis_core::{Config, ErrorLog, ErrorLogEntry, KvStorage};
use clap::Subcommand;

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum LogAction {
    /// Print recorded errors, newest first
    List {
        /// Show at most this many entries
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Remove every entry
    Clear,
    /// Export the log as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn open_log() -> Result<ErrorLog<KvStorage>, Box<dyn Error>> {
    let limit = Config::load_or_default().storage.error_log_limit;
    Ok(ErrorLog::new(KvStorage::open()?).with_limit(limit))
}

pub fn run(action: LogAction) -> CmdResult {
    let log = open_log()?;

    match action {
        LogAction::List { limit } => {
            let mut entries = log.read();
            if let Some(limit) = limit {
                entries.truncate(limit);
            }
            print_json(&entries)?;
        }
        LogAction::Clear => {
            log.clear();
            println!("error log cleared");
        }
        LogAction::Export { output } => {
            let json = log.export_json()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("exported to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
    }
    Ok(())
}

/// Append a failed command's error and its source chain to the log.
pub fn record_failure(error: &dyn Error) {
    let mut chain = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    let mut entry = ErrorLogEntry::new(error.to_string()).with_source("command");
    if !chain.is_empty() {
        entry = entry.with_stack(chain.join("\n"));
    }
    append(entry);
}

/// Record panics in the error log, then defer to the default hook.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let message = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic".to_string());
        let backtrace = std::backtrace::Backtrace::force_capture();
        append(
            ErrorLogEntry::new(message)
                .with_source(format!("panic at {location}"))
                .with_stack(backtrace.to_string()),
        );
        default_hook(info);
    }));
}

fn append(entry: ErrorLogEntry) {
    match open_log() {
        Ok(log) => log.append(entry),
        Err(e) => tracing::warn!(error = %e, "error log unavailable"),
    }
}
