//! Command-line interface definitions for tmplmerge.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options (verbosity, color, config file) apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Merge the configured sources and chunk the result
//! tmplmerge run
//!
//! # Merge two explicit trees into ./master, 50 files per chunk
//! tmplmerge run -s ./a -s ./b -t ./master -c 50
//!
//! # Only chunk an existing flat directory
//! tmplmerge chunk -t ./master -c 200
//!
//! # JSON summary for scripting
//! tmplmerge run --output json
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::ConfigOverrides;

/// Merge template files from many source trees into one deduplicated, chunked corpus.
#[derive(Debug, Parser)]
#[command(name = "tmplmerge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Path to a TOML config file
    ///
    /// If not specified, a default platform-specific path is used.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Merge all sources into the target, then split it into chunks
    Run(RunArgs),
    /// Merge all sources into the flat target directory without chunking
    Merge(MergeArgs),
    /// Split an existing flat target directory into chunks
    Chunk(ChunkArgs),
}

/// Options selecting and filtering source trees.
#[derive(Debug, Args, Default)]
pub struct SourceArgs {
    /// Source directory to scan (repeatable; replaces the configured list)
    #[arg(short = 's', long = "source", value_name = "PATH")]
    pub sources: Vec<PathBuf>,

    /// Accepted file extension (repeatable; replaces the configured list)
    #[arg(short = 'e', long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Number of threads used for fingerprinting
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Follow symbolic links during collection
    ///
    /// Warning: May cause infinite loops if symlinks form cycles.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,
}

/// Options for the chunk step.
#[derive(Debug, Args, Default)]
pub struct ChunkingArgs {
    /// Maximum number of files per chunk directory
    #[arg(short = 'c', long, value_name = "N", value_parser = parse_chunk_size)]
    pub chunk_size: Option<usize>,

    /// Name prefix for chunk directories
    #[arg(long, value_name = "PREFIX")]
    pub chunk_prefix: Option<String>,
}

/// Options shared by every subcommand.
#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Flat corpus directory
    #[arg(short = 't', long, value_name = "PATH")]
    pub target: Option<PathBuf>,

    /// Summary format
    #[arg(short, long, value_enum, default_value = "human")]
    pub output: OutputFormat,
}

/// Arguments for the run subcommand.
#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub chunking: ChunkingArgs,
}

/// Arguments for the merge subcommand.
#[derive(Debug, Args)]
pub struct MergeArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    #[command(flatten)]
    pub source: SourceArgs,
}

/// Arguments for the chunk subcommand.
#[derive(Debug, Args)]
pub struct ChunkArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    #[command(flatten)]
    pub chunking: ChunkingArgs,
}

/// Output format for the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Human,
    /// JSON report for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Human => write!(f, "human"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl Commands {
    /// Shared target/output options.
    #[must_use]
    pub fn target_args(&self) -> &TargetArgs {
        match self {
            Commands::Run(args) => &args.target,
            Commands::Merge(args) => &args.target,
            Commands::Chunk(args) => &args.target,
        }
    }

    /// Config values given on the command line.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides {
            target: self.target_args().target.clone(),
            ..ConfigOverrides::default()
        };

        let (source, chunking) = match self {
            Commands::Run(args) => (Some(&args.source), Some(&args.chunking)),
            Commands::Merge(args) => (Some(&args.source), None),
            Commands::Chunk(args) => (None, Some(&args.chunking)),
        };

        if let Some(source) = source {
            if !source.sources.is_empty() {
                overrides.sources = Some(source.sources.clone());
            }
            if !source.extensions.is_empty() {
                overrides.extensions = Some(source.extensions.clone());
            }
            overrides.io_threads = source.io_threads;
            // Flags only ever switch behaviour on
            overrides.follow_symlinks = source.follow_symlinks.then_some(true);
            overrides.skip_hidden = source.skip_hidden.then_some(true);
        }
        if let Some(chunking) = chunking {
            overrides.chunk_size = chunking.chunk_size;
            overrides.chunk_prefix = chunking.chunk_prefix.clone();
        }

        overrides
    }
}

/// Parse a positive chunk size.
///
/// # Examples
///
/// ```
/// use tmplmerge::cli::parse_chunk_size;
///
/// assert_eq!(parse_chunk_size("100").unwrap(), 100);
/// assert!(parse_chunk_size("0").is_err());
/// ```
///
/// # Errors
///
/// Returns an error if the value is not an integer or is zero.
pub fn parse_chunk_size(s: &str) -> Result<usize, String> {
    let n: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: '{}'", s.trim()))?;
    if n == 0 {
        return Err("Chunk size must be at least 1".to_string());
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chunk_size() {
        assert_eq!(parse_chunk_size("1").unwrap(), 1);
        assert_eq!(parse_chunk_size(" 250 ").unwrap(), 250);
        assert!(parse_chunk_size("0").is_err());
        assert!(parse_chunk_size("-5").is_err());
        assert!(parse_chunk_size("ten").is_err());
    }

    #[test]
    fn test_cli_parse_help() {
        let result = Cli::try_parse_from(["tmplmerge", "--help"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_run_basic() {
        let cli = Cli::try_parse_from(["tmplmerge", "run"]).unwrap();
        assert_eq!(cli.verbose, 0);
        match cli.command {
            Commands::Run(args) => {
                assert!(args.source.sources.is_empty());
                assert_eq!(args.target.target, None);
                assert_eq!(args.target.output, OutputFormat::Human);
                assert_eq!(args.chunking.chunk_size, None);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_with_options() {
        let cli = Cli::try_parse_from([
            "tmplmerge",
            "-v",
            "run",
            "-s",
            "/a",
            "--source",
            "/b",
            "-t",
            "/master",
            "-e",
            "yaml",
            "--ext",
            "json",
            "-c",
            "50",
            "--chunk-prefix",
            "part_",
            "--output",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(
                    args.source.sources,
                    vec![PathBuf::from("/a"), PathBuf::from("/b")]
                );
                assert_eq!(args.target.target, Some(PathBuf::from("/master")));
                assert_eq!(args.source.extensions, vec!["yaml", "json"]);
                assert_eq!(args.chunking.chunk_size, Some(50));
                assert_eq!(args.chunking.chunk_prefix.as_deref(), Some("part_"));
                assert_eq!(args.target.output, OutputFormat::Json);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_rejects_zero_chunk_size() {
        let result = Cli::try_parse_from(["tmplmerge", "chunk", "-c", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_chunk_has_no_source_flag() {
        let result = Cli::try_parse_from(["tmplmerge", "chunk", "-s", "/a"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_merge_has_no_chunk_size() {
        let result = Cli::try_parse_from(["tmplmerge", "merge", "-c", "10"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["tmplmerge", "-v", "-q", "run"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_global_config_after_subcommand() {
        let cli =
            Cli::try_parse_from(["tmplmerge", "merge", "--config", "/etc/tm.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/tm.toml")));
    }

    #[test]
    fn test_overrides_from_run() {
        let cli = Cli::try_parse_from([
            "tmplmerge",
            "run",
            "-s",
            "/a",
            "-c",
            "3",
            "--skip-hidden",
        ])
        .unwrap();
        let overrides = cli.command.overrides();

        assert_eq!(overrides.sources, Some(vec![PathBuf::from("/a")]));
        assert_eq!(overrides.chunk_size, Some(3));
        assert_eq!(overrides.skip_hidden, Some(true));
        assert_eq!(overrides.follow_symlinks, None);
        assert_eq!(overrides.extensions, None);
        assert_eq!(overrides.target, None);
    }

    #[test]
    fn test_overrides_from_chunk() {
        let cli = Cli::try_parse_from(["tmplmerge", "chunk", "-t", "/m"]).unwrap();
        let overrides = cli.command.overrides();

        assert_eq!(overrides.target, Some(PathBuf::from("/m")));
        assert_eq!(overrides.sources, None);
        assert_eq!(overrides.chunk_size, None);
    }

    #[test]
    fn test_cli_invalid_subcommand() {
        let result = Cli::try_parse_from(["tmplmerge", "clone"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_version_flag() {
        let result = Cli::try_parse_from(["tmplmerge", "--version"]);
        assert!(result.is_err());
    }
}
