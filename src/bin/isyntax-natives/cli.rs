//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;
use isyntax_natives::util::shell::ColorChoice;

/// isyntax-natives - fetch, build and package the libisyntax native library
#[derive(Parser)]
#[command(name = "isyntax-natives")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Never touch the network
    #[arg(long, global = true, env = "ISYNTAX_NATIVES_OFFLINE")]
    pub offline: bool,

    /// Target platform classifier (e.g. linux-x86_64, darwin-arm64)
    #[arg(long, global = true, value_name = "ID")]
    pub platform: Option<String>,

    /// Coloring: auto, always, never
    #[arg(long, global = true, default_value = "auto", value_name = "WHEN")]
    pub color: ColorChoice,

    /// Run as if started in this directory
    #[arg(short = 'C', global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the native sources if they are missing
    Fetch,

    /// Build the native library
    Build(BuildArgs),

    /// Stage built libraries under their platform classifier
    Package,

    /// Write the distribution archives
    Assemble,

    /// Fetch, build, package and assemble
    Run(BuildArgs),

    /// Show the detected platform classifier
    Platform,

    /// Remove generated files
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Rebuild even if nothing changed
    #[arg(long)]
    pub force: bool,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Also remove the fetched sources
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}
