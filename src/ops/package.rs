//! Artifact packaging: stage built libraries under their platform classifier.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::builder::native::find_libraries;
use crate::util::context::PipelineContext;
use crate::util::fs::recreate_dir;

/// A library copied into the staging tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifact {
    /// Where the library was found.
    pub origin: PathBuf,
    /// Where it was copied to.
    pub staged: PathBuf,
}

/// Copies built libraries into `<staging>/natives/<classifier>/`.
pub struct ArtifactPackager<'a> {
    ctx: &'a PipelineContext,
}

impl<'a> ArtifactPackager<'a> {
    pub fn new(ctx: &'a PipelineContext) -> Self {
        ArtifactPackager { ctx }
    }

    /// Directories searched for libraries, in priority order.
    ///
    /// The source tree comes last so libraries built outside the pipeline
    /// can be dropped there by hand.
    pub fn search_roots(&self) -> Vec<PathBuf> {
        vec![self.ctx.build.dir.clone(), self.ctx.source.dir.clone()]
    }

    /// Stage every matching library. Finding none is not an error.
    pub fn package(&self) -> Result<Vec<StagedArtifact>> {
        let names = self
            .ctx
            .platform
            .shared_library_names(&self.ctx.package.library);
        let dest = self.ctx.natives_dir();

        recreate_dir(&dest)?;

        let mut chosen: HashMap<String, PathBuf> = HashMap::new();
        let mut staged = Vec::new();

        for root in self.search_roots() {
            for origin in find_libraries(&root, &names)? {
                let Some(file_name) = origin.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };

                if let Some(winner) = chosen.get(file_name) {
                    tracing::warn!(
                        "{} is shadowed by {}",
                        origin.display(),
                        winner.display()
                    );
                    continue;
                }

                let target = dest.join(file_name);
                std::fs::copy(&origin, &target).with_context(|| {
                    format!(
                        "failed to copy {} to {}",
                        origin.display(),
                        target.display()
                    )
                })?;
                tracing::debug!("Staged {} -> {}", origin.display(), target.display());

                chosen.insert(file_name.to_string(), origin.clone());
                staged.push(StagedArtifact {
                    origin,
                    staged: target,
                });
            }
        }

        if staged.is_empty() {
            tracing::warn!(
                "No {} found for {}",
                names.join(" or "),
                self.ctx.platform.classifier()
            );
        }

        Ok(staged)
    }
}
