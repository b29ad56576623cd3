//! `isyntax-natives assemble` command

use anyhow::Result;

use super::Global;
use isyntax_natives::ops;

pub fn execute(global: &Global) -> Result<()> {
    let ctx = global.context(None)?;
    ops::assemble(&ctx, &global.shell)?;
    Ok(())
}
