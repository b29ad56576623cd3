//! Resource assembly and distribution archives.
//!
//! The staged natives and the static resource directories are merged into a
//! single ordered [`ResourceSet`]. Two trees may provide the same logical
//! path; both entries are kept, in order, and a warning is logged. The set is
//! then written out as:
//!
//! - `<dist>/<name>-<version>.tar.gz`, the runtime package
//! - `<dist>/<name>-<version>.json`, a manifest of the package entries
//! - `<dist>/<name>-<version>-sources.tar.gz`, sources and resources without
//!   any staged binaries

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::util::context::PipelineContext;
use crate::util::fs::{ensure_dir, relative_path, to_slash, walk_files, write_string};
use crate::util::hash::sha256_file;

/// Logical paths never shipped in the sources archive.
pub const SOURCES_EXCLUDE: &str = "natives/**";

/// One file in a [`ResourceSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    /// Forward-slash path inside the archive.
    pub logical: String,
    /// File on disk.
    pub path: PathBuf,
}

/// Ordered collection of archive entries. Duplicate logical paths are kept.
#[derive(Debug, Clone, Default)]
pub struct ResourceSet {
    entries: Vec<ResourceEntry>,
}

impl ResourceSet {
    pub fn new() -> Self {
        ResourceSet::default()
    }

    pub fn push(&mut self, logical: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries.push(ResourceEntry {
            logical: logical.into(),
            path: path.into(),
        });
    }

    /// Add every file below `root`, keyed by its path relative to `root`.
    /// A missing root adds nothing.
    pub fn add_tree(&mut self, root: &Path) -> Result<usize> {
        let files = walk_files(root)?;
        let count = files.len();
        for path in files {
            let logical = to_slash(&relative_path(root, &path));
            self.push(logical, path);
        }
        Ok(count)
    }

    /// Like [`ResourceSet::add_tree`], keeping only files for which
    /// `keep(logical, path)` holds.
    pub fn add_tree_filtered<F>(&mut self, root: &Path, keep: F) -> Result<usize>
    where
        F: Fn(&str, &Path) -> bool,
    {
        let mut count = 0;
        for path in walk_files(root)? {
            let logical = to_slash(&relative_path(root, &path));
            if !keep(&logical, &path) {
                tracing::debug!("Excluding {}", path.display());
                continue;
            }
            self.push(logical, path);
            count += 1;
        }
        Ok(count)
    }

    pub fn entries(&self) -> &[ResourceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Logical paths that occur more than once, in first-seen order.
    pub fn duplicates(&self) -> Vec<String> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut dups = Vec::new();
        for entry in &self.entries {
            let count = seen.entry(entry.logical.as_str()).or_insert(0);
            *count += 1;
            if *count == 2 {
                dups.push(entry.logical.clone());
            }
        }
        dups
    }

    /// Write all entries, duplicates included, to a gzipped tarball.
    pub fn write_tar_gz(&self, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            ensure_dir(parent)?;
        }

        let file = File::create(dest)
            .with_context(|| format!("failed to create archive: {}", dest.display()))?;
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

        for entry in &self.entries {
            builder
                .append_path_with_name(&entry.path, &entry.logical)
                .with_context(|| format!("failed to add {} to archive", entry.path.display()))?;
        }

        builder
            .into_inner()
            .and_then(|gz| gz.finish())
            .with_context(|| format!("failed to finish archive: {}", dest.display()))?;
        Ok(())
    }
}

/// Package manifest written next to the runtime archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    pub version: String,
    pub platform: String,
    pub entries: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub size: u64,
    pub sha256: String,
}

impl PackageManifest {
    pub fn from_set(name: &str, version: &str, platform: &str, set: &ResourceSet) -> Result<Self> {
        let mut entries = Vec::with_capacity(set.len());
        for entry in set.entries() {
            let size = std::fs::metadata(&entry.path)
                .with_context(|| format!("failed to stat {}", entry.path.display()))?
                .len();
            entries.push(ManifestEntry {
                path: entry.logical.clone(),
                size,
                sha256: sha256_file(&entry.path)?,
            });
        }

        Ok(PackageManifest {
            name: name.to_string(),
            version: version.to_string(),
            platform: platform.to_string(),
            entries,
        })
    }
}

/// Files produced by [`ResourceAssembler::assemble`].
#[derive(Debug, Clone)]
pub struct Assembly {
    pub package: PathBuf,
    pub manifest: PathBuf,
    pub sources: PathBuf,
    pub entries: usize,
    pub duplicates: Vec<String>,
}

/// Builds the distribution archives from the staging tree and resources.
pub struct ResourceAssembler<'a> {
    ctx: &'a PipelineContext,
}

impl<'a> ResourceAssembler<'a> {
    pub fn new(ctx: &'a PipelineContext) -> Self {
        ResourceAssembler { ctx }
    }

    fn artifact_stem(&self) -> String {
        format!("{}-{}", self.ctx.package.name, self.ctx.package.version)
    }

    /// Merge the staging tree with each resource directory, in that order.
    pub fn collect_resources(&self) -> Result<ResourceSet> {
        let mut set = ResourceSet::new();
        set.add_tree(&self.ctx.package.staging_dir)?;
        for dir in &self.ctx.package.resources {
            let added = set.add_tree(dir)?;
            tracing::debug!("Added {} resource(s) from {}", added, dir.display());
        }

        for logical in set.duplicates() {
            tracing::warn!("{} is provided more than once; keeping every copy", logical);
        }

        Ok(set)
    }

    /// Source directories and resources, without any native binaries.
    ///
    /// Skipped: logical paths under `natives/`, anything inside the staging,
    /// build or distribution directories, and files named like the native
    /// library.
    pub fn collect_sources(&self) -> Result<ResourceSet> {
        let exclude = Pattern::new(SOURCES_EXCLUDE)?;
        let package = &self.ctx.package;
        let fenced = [&package.staging_dir, &self.ctx.build.dir, &package.dist_dir];
        let libraries = self.ctx.platform.shared_library_names(&package.library);

        let keep = |logical: &str, path: &Path| {
            let is_library = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| libraries.iter().any(|lib| lib == n));
            !exclude.matches(logical)
                && !fenced.iter().any(|dir| path.starts_with(dir))
                && !is_library
        };

        let mut set = ResourceSet::new();
        for dir in package.sources.iter().chain(&package.resources) {
            set.add_tree_filtered(dir, &keep)?;
        }
        Ok(set)
    }

    pub fn assemble(&self) -> Result<Assembly> {
        let dist = &self.ctx.package.dist_dir;
        let stem = self.artifact_stem();

        let resources = self.collect_resources()?;
        let package = dist.join(format!("{}.tar.gz", stem));
        resources.write_tar_gz(&package)?;
        tracing::debug!("Wrote {} ({} entries)", package.display(), resources.len());

        let manifest = PackageManifest::from_set(
            &self.ctx.package.name,
            &self.ctx.package.version,
            &self.ctx.platform.classifier(),
            &resources,
        )?;
        let manifest_path = dist.join(format!("{}.json", stem));
        let json = serde_json::to_string_pretty(&manifest)
            .context("failed to serialize package manifest")?;
        write_string(&manifest_path, &json)?;

        let sources = self.collect_sources()?;
        if sources.is_empty() {
            tracing::debug!("No sources or resources to archive");
        }
        let sources_path = dist.join(format!("{}-sources.tar.gz", stem));
        sources.write_tar_gz(&sources_path)?;
        tracing::debug!("Wrote {} ({} entries)", sources_path.display(), sources.len());

        Ok(Assembly {
            package,
            manifest: manifest_path,
            sources: sources_path,
            entries: resources.len(),
            duplicates: resources.duplicates(),
        })
    }
}
