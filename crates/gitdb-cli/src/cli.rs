use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "gitdb",
    about = "Versioned file store with a git-like revision history",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine config file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Store directory, created if missing
    #[arg(long, global = true, default_value = ".")]
    pub store: PathBuf,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the store if needed and show its state
    Init,
    /// Record a new revision with one file replaced
    Save(SaveArgs),
    /// Print a file from the head or an earlier revision
    Read(ReadArgs),
    /// Print the head revision id
    Version,
    /// Show revision history
    Log(LogArgs),
    /// Check every object and parent link
    Verify,
    /// List files in the head revision
    Files,
}

#[derive(Args)]
pub struct SaveArgs {
    /// Path inside the store
    pub path: String,
    /// Read content from this file instead of stdin
    #[arg(long, conflicts_with = "data")]
    pub from: Option<PathBuf>,
    /// Literal content
    #[arg(long)]
    pub data: Option<String>,
    #[arg(short, long, default_value = "")]
    pub message: String,
}

#[derive(Args)]
pub struct ReadArgs {
    pub path: String,
    /// Revision id to read from (defaults to head)
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    #[arg(long)]
    pub oneline: bool,
}
