//! hashdb CLI Binary
//!
//! Command-line interface for persistent SHA-512 directory manifests.

use clap::Parser;
use hashdb::cli::{Cli, RunContext};
use hashdb::config::ConfigLoader;
use hashdb::logging::{init_logging, resolve_log_file_path, LoggingConfig};
use std::process;
use tracing::{debug, error};

fn main() {
    let cli = Cli::parse();

    // Build logging config from CLI args, env vars, and config file
    let logging_config = build_logging_config(&cli);

    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    debug!(command = cli.command.name(), "hashdb starting");

    let context = match RunContext::from_cli(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error opening root: {}", e);
            eprintln!("{}", hashdb::cli::map_error(&e));
            process::exit(1);
        }
    };

    let outcome = match context.execute(&cli.command) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", hashdb::cli::map_error(&e));
            process::exit(1);
        }
    };

    match context.render(&outcome) {
        Ok(output) if output.ends_with('\n') => print!("{}", output),
        Ok(output) if output.is_empty() => {}
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}", hashdb::cli::map_error(&e));
            process::exit(1);
        }
    }

    if !outcome.is_success() {
        process::exit(1);
    }
}

/// Build logging configuration from CLI args, environment, and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = if let Some(ref config_path) = cli.config {
        ConfigLoader::load_from_file(config_path)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    } else {
        ConfigLoader::load(&cli.root)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    };

    if cli.quiet {
        config.enabled = false;
    }
    if cli.verbose {
        config.level = "debug".to_string();
        // Mirror file logs to the terminal; an explicit --log-output still wins below
        if config.output == "file" {
            config.output = "file+stderr".to_string();
        }
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }

    let output_uses_file = config.output == "file" || config.output == "file+stderr";
    if config.enabled && output_uses_file {
        config.file = Some(resolve_log_file_path(
            cli.log_file.clone(),
            config.file.clone(),
            std::env::current_dir().ok().as_deref(),
        ));
    } else if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
    }

    config
}
