//! CLI parse: clap types for hashdb. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// hashdb - persistent SHA-512 manifests for directory trees
#[derive(Parser, Debug)]
#[command(name = "hashdb", version)]
#[command(about = "Track a directory tree with a persistent manifest of SHA-512 hashes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Root directory of the tracked tree
    #[arg(long, short = 'r', global = true, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Report what would change without writing anything
    #[arg(long, short = 'n', global = true)]
    pub pretend: bool,

    /// Print the reason next to every failed path
    #[arg(long, global = true)]
    pub verbose_failures: bool,

    /// Disable colored report output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Report format (text or json)
    #[arg(long, global = true, default_value = "text")]
    pub format: String,

    /// Enable verbose logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stderr, stdout, file, file+stderr)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create a manifest for the root, hashing every file
    Init,
    /// Hash new and changed files and record them in the manifest
    Update,
    /// Show what changed since the last update, without hashing
    Status,
    /// Re-hash every tracked file and report content drift
    Verify {
        /// Refresh stored metadata of files whose content still matches
        #[arg(long)]
        update_mtimes: bool,
    },
    /// Build a manifest from sha512sum listings instead of hashing
    Import {
        /// Listing files; defaults to every SHA512SUM / SHA512SUM.asc under the root
        listings: Vec<PathBuf>,
    },
    /// Write the entries under a subdirectory as its own manifest
    Split {
        /// Subdirectory, relative to the root
        subdir: PathBuf,
    },
    /// Write the manifest as a sha512sum listing
    Export {
        /// Destination file, or `-` for stdout (default: <root>/SHA512SUM)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Init => "init",
            Commands::Update => "update",
            Commands::Status => "status",
            Commands::Verify { .. } => "verify",
            Commands::Import { .. } => "import",
            Commands::Split { .. } => "split",
            Commands::Export { .. } => "export",
        }
    }
}
