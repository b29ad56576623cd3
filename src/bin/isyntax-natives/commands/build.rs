//! `isyntax-natives build` command

use anyhow::Result;

use super::Global;
use crate::cli::BuildArgs;
use isyntax_natives::builder::{require_sources, CMake};
use isyntax_natives::ops::{self, RunOptions};

pub fn execute(global: &Global, args: BuildArgs) -> Result<()> {
    let ctx = global.context(args.jobs)?;
    require_sources(&ctx)?;
    let cmake = CMake::locate()?;
    ops::build(&ctx, &global.shell, &cmake, RunOptions { force: args.force })?;
    Ok(())
}
