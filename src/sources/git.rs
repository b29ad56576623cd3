//! Git clone strategy.

use std::path::Path;

use anyhow::{Context, Result};
use git2::build::RepoBuilder;
use git2::FetchOptions;
use url::Url;

use crate::sources::FetchStrategy;

/// Clone the default branch of a remote repository.
pub struct GitClone {
    /// Remote repository URL
    remote: Url,

    /// Fetch only the latest revision
    shallow: bool,
}

impl GitClone {
    pub fn new(remote: Url, shallow: bool) -> Self {
        GitClone { remote, shallow }
    }

    /// libgit2's local transport can't do shallow fetches, so depth is only
    /// requested for network remotes.
    fn depth(&self) -> Option<i32> {
        if self.shallow && self.remote.scheme() != "file" {
            Some(1)
        } else {
            None
        }
    }
}

impl FetchStrategy for GitClone {
    fn describe(&self) -> String {
        match self.depth() {
            Some(_) => format!("shallow clone of {}", self.remote),
            None => format!("clone of {}", self.remote),
        }
    }

    fn requires_network(&self) -> bool {
        self.remote.scheme() != "file"
    }

    fn fetch(&self, dest: &Path) -> Result<()> {
        tracing::debug!("Cloning {}", self.remote);

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        let mut fetch = FetchOptions::new();
        if let Some(depth) = self.depth() {
            fetch.depth(depth);
        }

        let repo = RepoBuilder::new()
            .fetch_options(fetch)
            .clone(self.remote.as_str(), dest)
            .with_context(|| format!("failed to clone {}", self.remote))?;

        if let Ok(commit) = repo.head().and_then(|h| h.peel_to_commit()) {
            tracing::debug!("Checked out {}", commit.id());
        }

        Ok(())
    }
}
