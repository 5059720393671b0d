//! tmplmerge - template corpus merger
//!
//! Collects template files from several source trees, moves one copy of each
//! distinct (name, content) pair into a flat corpus directory, and splits that
//! directory into numbered chunk directories of bounded size.

pub mod chunk;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;

use cli::{Cli, Commands, OutputFormat};
use config::Config;
use error::ExitCode;
use output::{HumanOutput, JsonOutput};
use pipeline::Pipeline;
use progress::Progress;

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error for fatal conditions: invalid configuration, a target
/// directory that cannot be created, or a chunk step that cannot list the
/// target or create a chunk directory.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet, cli.no_color);
    let shutdown = signal::install_handler();

    let overrides = cli.command.overrides();
    let config = Config::load_with(cli.config.as_deref(), &overrides)
        .context("Failed to load configuration")?;
    if log::log_enabled!(log::Level::Debug) {
        match config.to_toml() {
            Ok(rendered) => log::debug!("Effective configuration:\n{rendered}"),
            Err(e) => log::debug!("Effective configuration: {config:?} ({e})"),
        }
    }

    let format = cli.command.target_args().output;
    let mut pipeline = Pipeline::new(config).with_shutdown_flag(shutdown.get_flag());
    if !cli.quiet && format == OutputFormat::Human {
        pipeline = pipeline.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let report = match cli.command {
        Commands::Run(_) => pipeline.run(),
        Commands::Merge(_) => pipeline.merge_only(),
        Commands::Chunk(_) => pipeline.chunk_only(),
    }
    .context("Pipeline failed")?;

    let exit_code = if shutdown.is_shutdown_requested() {
        ExitCode::Interrupted
    } else {
        ExitCode::from_report(&report)
    };

    let mut stdout = std::io::stdout().lock();
    match format {
        OutputFormat::Json => JsonOutput::new(&report, exit_code)
            .write_to(&mut stdout, true)
            .context("Failed to write JSON report")?,
        OutputFormat::Human if !cli.quiet => HumanOutput::new(&report)
            .write_to(&mut stdout)
            .context("Failed to write summary")?,
        OutputFormat::Human => {}
    }
    stdout.flush().ok();

    Ok(exit_code)
}
