//! Pipeline stages as user-facing operations.
//!
//! Each stage reports progress through the [`Shell`] and returns what it did.
//! [`run`] chains all four with one [`PipelineContext`].

use std::sync::Arc;

use anyhow::Result;

use crate::builder::cmake::BuildSystem;
use crate::builder::native::{BuildOutcome, NativeBuilder};
use crate::ops::assemble::{Assembly, ResourceAssembler};
use crate::ops::package::{ArtifactPackager, StagedArtifact};
use crate::sources::{HttpClient, Resolution, SourceResolver};
use crate::util::context::PipelineContext;
use crate::util::fs::relative_path;
use crate::util::shell::{Shell, Status};

/// Options for [`run`] and [`build`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Rebuild even when the build fingerprint is unchanged.
    pub force: bool,
}

/// Outcome of a complete pipeline run.
#[derive(Debug)]
pub struct RunReport {
    pub resolution: Resolution,
    pub build: BuildOutcome,
    pub staged: Vec<StagedArtifact>,
    pub assembly: Assembly,
}

/// Ensure the native sources are present.
pub fn fetch(
    ctx: &PipelineContext,
    shell: &Shell,
    client: Arc<dyn HttpClient>,
) -> Result<Resolution> {
    let resolver = SourceResolver::from_context(ctx, client)?;
    let shown = relative_path(&ctx.root, resolver.dest());

    if resolver.is_populated() {
        shell.status(Status::Fresh, format!("sources at {}", shown.display()));
        return Ok(Resolution::AlreadyPresent);
    }

    shell.status(
        Status::Fetching,
        format!("{} into {}", ctx.source.git_url, shown.display()),
    );
    let resolution = resolver.resolve()?;
    if let Resolution::Fetched { strategy } = &resolution {
        shell.status(Status::Finished, format!("fetch via {}", strategy));
    }
    Ok(resolution)
}

/// Build the native library.
pub fn build(
    ctx: &PipelineContext,
    shell: &Shell,
    system: &dyn BuildSystem,
    opts: RunOptions,
) -> Result<BuildOutcome> {
    shell.status(
        Status::Building,
        format!(
            "{} for {} with {}",
            ctx.build.target,
            ctx.platform,
            system.name()
        ),
    );
    let span = shell.span(format!("{} build", ctx.build.target));

    let outcome = NativeBuilder::new(ctx, system).force(opts.force).build()?;
    match outcome {
        BuildOutcome::Fresh => shell.status(Status::Fresh, "native build is up to date"),
        BuildOutcome::Built => span.finish(),
    }
    Ok(outcome)
}

/// Stage built libraries under the platform classifier.
pub fn package(ctx: &PipelineContext, shell: &Shell) -> Result<Vec<StagedArtifact>> {
    let staged = ArtifactPackager::new(ctx).package()?;

    if staged.is_empty() {
        shell.warn(format!(
            "no {} library found for {}",
            ctx.package.library,
            ctx.platform.classifier()
        ));
    }
    for artifact in &staged {
        shell.status(
            Status::Staged,
            relative_path(&ctx.root, &artifact.staged).display(),
        );
    }
    Ok(staged)
}

/// Write the distribution archives.
pub fn assemble(ctx: &PipelineContext, shell: &Shell) -> Result<Assembly> {
    shell.status(
        Status::Assembling,
        format!("{} v{}", ctx.package.name, ctx.package.version),
    );

    let assembly = ResourceAssembler::new(ctx).assemble()?;

    for dup in &assembly.duplicates {
        shell.warn(format!("duplicate resource `{}` kept", dup));
    }
    for path in [&assembly.package, &assembly.sources] {
        shell.status(Status::Packaged, relative_path(&ctx.root, path).display());
    }
    Ok(assembly)
}

/// Run every stage in order.
pub fn run(
    ctx: &PipelineContext,
    shell: &Shell,
    client: Arc<dyn HttpClient>,
    system: &dyn BuildSystem,
    opts: RunOptions,
) -> Result<RunReport> {
    let span = shell.span(format!("natives for {}", ctx.platform));

    let resolution = fetch(ctx, shell, client)?;
    let outcome = build(ctx, shell, system, opts)?;
    let staged = package(ctx, shell)?;
    let assembly = assemble(ctx, shell)?;

    span.finish();

    Ok(RunReport {
        resolution,
        build: outcome,
        staged,
        assembly,
    })
}
