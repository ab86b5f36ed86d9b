//! # boq
//!
//! Command-line front end for `boq_core`: every editing command locks the
//! estimate file, applies one ledger command, and saves atomically.

use clap::Parser;
use tracing::Level;

use boq_cli::cli::{Cli, LogFormatArg, LogLevelArg};
use boq_cli::commands;
use boq_cli::logging::{init_logging, LogConfig, LogFormat};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(&log_config_from_cli(&cli)) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    if let Err(error) = commands::run(&cli.command) {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

/// `--log-level` wins over `-v`.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig::from_verbosity(cli.verbose);
    if let Some(level) = cli.log_level {
        config = config.with_level(match level {
            LogLevelArg::Error => Level::ERROR,
            LogLevelArg::Warn => Level::WARN,
            LogLevelArg::Info => Level::INFO,
            LogLevelArg::Debug => Level::DEBUG,
            LogLevelArg::Trace => Level::TRACE,
        });
    }
    config
        .with_format(match cli.log_format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        })
        .with_log_file(cli.log_file.clone())
}
