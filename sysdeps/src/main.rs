// sysdeps/src/main.rs
use std::path::Path;
use std::process;

use clap::Parser;
use colored::Colorize;
use sysdeps_common::config::Config;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::CliArgs;

const LOG_ENV: &str = "SYSDEPS_LOG";

/// Installs the stderr subscriber, plus a file writer when `log_file` is set.
/// The returned guard must live until exit so buffered lines are flushed.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let level_filter = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let Some(path) = log_file else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .without_time()
            .try_init();
        return None;
    };

    let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = path.file_name().map_or_else(|| "sysdeps.log".into(), |n| n.to_os_string());
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!(
            "{} Failed to create log directory {}: {}",
            "Error:".red().bold(),
            dir.display(),
            e
        );
    }
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr.and(non_blocking_appender))
        .with_ansi(false)
        .without_time()
        .try_init();
    debug!("Writing logs to {}", path.display());
    Some(guard)
}

fn main() {
    let cli_args = CliArgs::parse();
    let guard = init_logging(cli_args.verbose, cli_args.log_file.as_deref());

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: Could not load config: {:#}", "Error".red().bold(), e);
            process::exit(1);
        }
    };

    if let Err(e) = cli_args.command.run(config) {
        error!("Command failed: {:#}", e);
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        drop(guard);
        process::exit(1);
    }

    debug!("Command completed successfully.");
}
