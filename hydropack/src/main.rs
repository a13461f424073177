// hydropack/src/main.rs
use std::fs;
use std::process;
use std::time::{Duration, Instant};

use clap::Parser;
use colored::Colorize;
use hydropack_common::config::Config;
use hydropack_common::error::{HydroError, Result as HydroResult};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::CliArgs;

const LOG_FILE_NAME: &str = "hydropack.log";

fn init_stderr_logging(env_filter: EnvFilter) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .without_time()
        .try_init();
}

fn init_logging(config: &Config, verbose: u8) {
    let level_filter = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let max_log_level = level_filter.into_level().unwrap_or(tracing::Level::INFO);

    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("HYDROPACK_LOG")
        .from_env_lossy();

    if verbose == 0 {
        init_stderr_logging(env_filter);
        return;
    }

    let log_dir = config.logs_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!(
            "{} Failed to create log directory {}: {}",
            "Error:".red().bold(),
            log_dir.display(),
            e
        );
        init_stderr_logging(env_filter);
        return;
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_NAME);
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);
    let stderr_writer = std::io::stderr.with_max_level(max_log_level);
    let file_writer = non_blocking_appender.with_max_level(max_log_level);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(stderr_writer.and(file_writer))
        .with_ansi(true)
        .without_time()
        .try_init();

    // The writer thread must outlive main.
    Box::leak(Box::new(guard));

    debug!(
        "Verbose logging enabled. Writing logs to: {}/{}",
        log_dir.display(),
        LOG_FILE_NAME
    );
}

#[tokio::main]
async fn main() -> HydroResult<()> {
    let cli_args = CliArgs::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            let e = HydroError::Config(format!("Could not load config: {e}"));
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            process::exit(1);
        }
    };
    init_logging(&config, cli_args.verbose);

    let command = cli_args.command();
    debug!("Running {:?} in {}", command, config.root().display());
    let started = Instant::now();

    if let Err(e) = command.run(&config).await {
        error!("Command failed: {:#}", e);
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        process::exit(1);
    }

    let elapsed = Duration::from_secs(started.elapsed().as_secs());
    info!("Done in {}.", humantime::format_duration(elapsed));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_logging_tolerates_an_existing_subscriber() {
        init_stderr_logging(EnvFilter::new("info"));
        init_stderr_logging(EnvFilter::new("debug"));
    }

    #[test]
    fn quiet_logging_does_not_create_the_log_dir() {
        let dir = std::env::temp_dir().join(format!("hydropack-log-{}", process::id()));
        let config = Config::with_root(&dir);
        init_logging(&config, 0);
        assert!(!config.logs_dir().exists());
    }
}
