//! `isyntax-natives fetch` command

use anyhow::Result;

use super::Global;
use isyntax_natives::ops;

pub fn execute(global: &Global) -> Result<()> {
    let ctx = global.context(None)?;
    let client = global.http_client(&ctx)?;
    ops::fetch(&ctx, &global.shell, client)?;
    Ok(())
}
