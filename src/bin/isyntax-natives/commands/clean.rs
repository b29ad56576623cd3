//! `isyntax-natives clean` command

use anyhow::Result;

use super::Global;
use crate::cli::CleanArgs;
use isyntax_natives::ops;
use isyntax_natives::util::fs::relative_path;
use isyntax_natives::util::shell::Status;

pub fn execute(global: &Global, args: CleanArgs) -> Result<()> {
    let ctx = global.context(None)?;

    let removed = ops::clean(&ctx, args.all)?;
    if removed.is_empty() {
        global.shell.note("nothing to clean");
    }
    for dir in removed {
        global
            .shell
            .status(Status::Removed, relative_path(&ctx.root, &dir).display());
    }

    Ok(())
}
