//! Removal of generated files.

use std::path::PathBuf;

use anyhow::Result;

use crate::util::context::PipelineContext;
use crate::util::fs::remove_dir_all_if_exists;

/// Delete build, staging and distribution directories. With `all`, the
/// fetched source tree goes too.
///
/// Returns the directories that existed and were removed.
pub fn clean(ctx: &PipelineContext, all: bool) -> Result<Vec<PathBuf>> {
    let mut targets = vec![
        ctx.build.dir.clone(),
        ctx.package.staging_dir.clone(),
        ctx.package.dist_dir.clone(),
    ];
    if all {
        targets.push(ctx.source.dir.clone());
    }

    let mut removed = Vec::new();
    for dir in targets {
        if dir.exists() {
            remove_dir_all_if_exists(&dir)?;
            tracing::debug!("Removed {}", dir.display());
            removed.push(dir);
        }
    }
    Ok(removed)
}
