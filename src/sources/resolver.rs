//! Source resolution: make sure the native source tree is on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::sources::{ArchiveDownload, FetchStrategy, GitClone, HttpClient, RefKind};
use crate::util::context::PipelineContext;
use crate::util::errors::{FailedAttempt, ProvisionError};
use crate::util::fs::ensure_dir;

/// What [`SourceResolver::resolve`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The directory already held a source tree; nothing was fetched.
    AlreadyPresent,
    /// A strategy populated the directory.
    Fetched { strategy: String },
}

/// Ordered fallback chain of [`FetchStrategy`]s for one target directory.
pub struct SourceResolver {
    dest: PathBuf,
    descriptor: String,
    strategies: Vec<Box<dyn FetchStrategy>>,
    offline: bool,
}

impl SourceResolver {
    /// Create a resolver with an empty chain.
    pub fn new(dest: impl Into<PathBuf>, descriptor: impl Into<String>) -> Self {
        SourceResolver {
            dest: dest.into(),
            descriptor: descriptor.into(),
            strategies: Vec::new(),
            offline: false,
        }
    }

    /// Build the standard chain: clone, then each branch archive, then each
    /// pinned tag archive.
    pub fn from_context(ctx: &PipelineContext, client: Arc<dyn HttpClient>) -> Result<Self> {
        let source = &ctx.source;
        let mut resolver = SourceResolver::new(&source.dir, &source.descriptor)
            .offline(ctx.net.offline)
            .with_strategy(GitClone::new(source.git_url.clone(), source.shallow));

        match &source.archive_base {
            Some(base) => {
                for branch in &source.branches {
                    resolver = resolver.with_strategy(ArchiveDownload::new(
                        client.clone(),
                        base,
                        RefKind::Branch,
                        branch,
                    )?);
                }
                for tag in &source.tags {
                    resolver = resolver.with_strategy(ArchiveDownload::new(
                        client.clone(),
                        base,
                        RefKind::Tag,
                        tag,
                    )?);
                }
            }
            None => tracing::debug!(
                "No archive base for {}; archive fallbacks disabled",
                source.git_url
            ),
        }

        Ok(resolver)
    }

    /// Append a strategy to the chain.
    pub fn with_strategy(mut self, strategy: impl FetchStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Skip strategies that need the network.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Descriptions of the chain, in order.
    pub fn strategies(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.describe()).collect()
    }

    /// Whether the target directory holds a complete source tree.
    pub fn is_populated(&self) -> bool {
        self.dest.join(&self.descriptor).is_file()
    }

    /// Ensure the target directory holds a source tree.
    ///
    /// Returns immediately, without touching the network, if the descriptor
    /// is already present. Otherwise strategies run in order until one
    /// produces a tree containing the descriptor. Each strategy fetches into
    /// a scratch directory next to the target, and only a complete tree is
    /// moved into place. A target that holds files but no descriptor is
    /// refused and left as it is.
    pub fn resolve(&self) -> Result<Resolution> {
        if self.is_populated() {
            tracing::debug!("Source tree present at {}", self.dest.display());
            return Ok(Resolution::AlreadyPresent);
        }

        self.check_target_vacant()?;

        let mut attempts = Vec::new();

        for strategy in &self.strategies {
            let name = strategy.describe();

            if self.offline && strategy.requires_network() {
                attempts.push(FailedAttempt {
                    strategy: name,
                    reason: "skipped in offline mode".to_string(),
                });
                continue;
            }

            let scratch = self.scratch_dir()?;
            let tree = scratch.path().join("tree");

            match strategy.fetch(&tree) {
                Ok(()) if tree.join(&self.descriptor).is_file() => {
                    self.install(&tree)?;
                    tracing::debug!("Fetched sources via {}", name);
                    return Ok(Resolution::Fetched { strategy: name });
                }
                Ok(()) => {
                    tracing::warn!("{} produced no {}", name, self.descriptor);
                    attempts.push(FailedAttempt {
                        strategy: name,
                        reason: format!("fetched tree has no {}", self.descriptor),
                    });
                }
                Err(e) => {
                    tracing::warn!("{} failed: {:#}", name, e);
                    attempts.push(FailedAttempt {
                        strategy: name,
                        reason: format!("{:#}", e),
                    });
                }
            }
        }

        Err(ProvisionError::FetchFailed {
            target: self.dest.clone(),
            attempts,
        }
        .into())
    }

    /// Fail unless the target is missing or an empty directory.
    fn check_target_vacant(&self) -> Result<()> {
        if !self.dest.exists() {
            return Ok(());
        }

        let occupied = !self.dest.is_dir()
            || fs::read_dir(&self.dest)
                .with_context(|| format!("failed to read directory: {}", self.dest.display()))?
                .next()
                .is_some();

        if occupied {
            return Err(ProvisionError::TargetOccupied {
                path: self.dest.clone(),
                descriptor: self.descriptor.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// A scratch directory beside the target, so the final move is a rename
    /// on the same filesystem. Removed when dropped.
    fn scratch_dir(&self) -> Result<TempDir> {
        let parent = match self.dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        ensure_dir(parent)?;

        tempfile::Builder::new()
            .prefix(".isyntax-fetch-")
            .tempdir_in(parent)
            .with_context(|| format!("failed to create scratch directory in {}", parent.display()))
    }

    fn install(&self, tree: &Path) -> Result<()> {
        if self.dest.is_dir() {
            // Vacant by `check_target_vacant`.
            fs::remove_dir(&self.dest)
                .with_context(|| format!("failed to remove directory: {}", self.dest.display()))?;
        }
        fs::rename(tree, &self.dest).with_context(|| {
            format!(
                "failed to move fetched sources into {}",
                self.dest.display()
            )
        })
    }
}
