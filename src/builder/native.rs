//! Native library build stage.
//!
//! Turns the fetched source tree into a shared library for the pipeline's
//! platform:
//!
//! 1. Refuse to run without a source tree.
//! 2. On Unix, strip host CPU flags from the descriptor.
//! 3. Fingerprint the descriptor, the CMake arguments and the classifier. If
//!    the fingerprint matches the last successful build and a library is
//!    present, nothing is rebuilt.
//! 4. Configure and build. The fingerprint is only recorded on success.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::cmake::{build_args, configure_args, BuildSystem};
use crate::builder::patch::{strip_native_cpu_flags, PatchOutcome};
use crate::util::context::PipelineContext;
use crate::util::errors::ProvisionError;
use crate::util::fs::{ensure_dir, walk_files, write_string};
use crate::util::hash::Fingerprint;

/// File in the build directory holding the last successful fingerprint.
pub const FINGERPRINT_FILE: &str = ".fingerprint";

/// What [`NativeBuilder::build`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Inputs were unchanged and a library was already built.
    Fresh,
    /// The build system ran.
    Built,
}

/// Fail with [`ProvisionError::SourceMissing`] unless the source tree's
/// descriptor is on disk. A build never fetches.
pub fn require_sources(ctx: &PipelineContext) -> Result<()> {
    if !ctx.source.descriptor_path().is_file() {
        return Err(ProvisionError::SourceMissing {
            path: ctx.source.dir.clone(),
        }
        .into());
    }
    Ok(())
}

/// Builds the native library with a [`BuildSystem`].
pub struct NativeBuilder<'a> {
    ctx: &'a PipelineContext,
    system: &'a dyn BuildSystem,
    force: bool,
}

impl<'a> NativeBuilder<'a> {
    pub fn new(ctx: &'a PipelineContext, system: &'a dyn BuildSystem) -> Self {
        NativeBuilder {
            ctx,
            system,
            force: false,
        }
    }

    /// Rebuild even if the fingerprint is unchanged.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn build(&self) -> Result<BuildOutcome> {
        let source_dir = &self.ctx.source.dir;
        let descriptor = self.ctx.source.descriptor_path();
        let build_dir = &self.ctx.build.dir;

        require_sources(self.ctx)?;

        if self.ctx.platform.os.is_unix() {
            match strip_native_cpu_flags(&descriptor)? {
                PatchOutcome::Patched(n) => tracing::debug!("Patched {} flag(s)", n),
                PatchOutcome::AlreadyClean | PatchOutcome::Missing => {}
            }
        }

        let configure = configure_args(&self.ctx.platform, &self.ctx.build.cmake_args);
        let build = build_args(&self.ctx.build.target, self.ctx.build.jobs);
        let fingerprint = self.fingerprint(&descriptor, &configure)?;
        let fingerprint_path = build_dir.join(FINGERPRINT_FILE);

        if !self.force && self.is_fresh(&fingerprint_path, &fingerprint)? {
            tracing::debug!("Native build is up to date ({})", short(&fingerprint));
            return Ok(BuildOutcome::Fresh);
        }

        ensure_dir(build_dir)?;
        // Invalidate before running so a failed build is never considered fresh.
        if fingerprint_path.exists() {
            std::fs::remove_file(&fingerprint_path)?;
        }

        self.system.configure(source_dir, build_dir, &configure)?;
        self.system.build(build_dir, &build)?;

        write_string(&fingerprint_path, &fingerprint)?;
        tracing::debug!("Recorded build fingerprint {}", short(&fingerprint));

        Ok(BuildOutcome::Built)
    }

    fn fingerprint(&self, descriptor: &Path, configure: &[String]) -> Result<String> {
        let contents = std::fs::read(descriptor)?;

        let mut fp = Fingerprint::new();
        fp.update_bytes(&contents)
            .update_strs(configure.iter().map(String::as_str))
            .update_str(&self.ctx.build.target)
            .update_str(&self.ctx.platform.classifier());
        Ok(fp.finish())
    }

    fn is_fresh(&self, path: &Path, fingerprint: &str) -> Result<bool> {
        let Ok(stored) = std::fs::read_to_string(path) else {
            return Ok(false);
        };
        if stored.trim() != fingerprint {
            tracing::debug!("Build inputs changed");
            return Ok(false);
        }

        let names = self
            .ctx
            .platform
            .shared_library_names(&self.ctx.package.library);
        Ok(!find_libraries(&self.ctx.build.dir, &names)?.is_empty())
    }
}

/// Recursively find files below `root` whose name is one of `names`.
///
/// Results are in walk order, which is sorted by file name at each level.
pub fn find_libraries(root: &Path, names: &[String]) -> Result<Vec<PathBuf>> {
    Ok(walk_files(root)?
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| names.iter().any(|name| name == n))
        })
        .collect())
}

fn short(fingerprint: &str) -> &str {
    &fingerprint[..fingerprint.len().min(12)]
}
