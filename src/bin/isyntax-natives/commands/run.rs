//! `isyntax-natives run` command
//!
//! Runs the whole pipeline: fetch, build, package and assemble.

use anyhow::Result;

use super::Global;
use crate::cli::BuildArgs;
use isyntax_natives::builder::CMake;
use isyntax_natives::ops::{self, RunOptions};

pub fn execute(global: &Global, args: BuildArgs) -> Result<()> {
    let ctx = global.context(args.jobs)?;
    let client = global.http_client(&ctx)?;
    // Fail before fetching if the build can't happen anyway.
    let cmake = CMake::locate()?;

    ops::run(
        &ctx,
        &global.shell,
        client,
        &cmake,
        RunOptions { force: args.force },
    )?;
    Ok(())
}
