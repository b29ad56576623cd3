//! isyntax-natives CLI

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::Global;
use isyntax_natives::util::Shell;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("isyntax_natives=debug")
    } else if cli.quiet {
        EnvFilter::new("isyntax_natives=error")
    } else {
        EnvFilter::new("isyntax_natives=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let root = match cli.directory {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to determine current directory")?,
    };

    let global = Global {
        root,
        shell: Shell::from_flags(cli.quiet, cli.verbose, cli.color),
        offline: cli.offline,
        platform: cli.platform,
    };

    // Execute command
    match cli.command {
        Commands::Fetch => commands::fetch::execute(&global),
        Commands::Build(args) => commands::build::execute(&global, args),
        Commands::Package => commands::package::execute(&global),
        Commands::Assemble => commands::assemble::execute(&global),
        Commands::Run(args) => commands::run::execute(&global, args),
        Commands::Platform => commands::platform::execute(&global),
        Commands::Clean(args) => commands::clean::execute(&global, args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
