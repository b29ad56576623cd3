//! Resolved, immutable settings for one pipeline run.
//!
//! [`PipelineContext`] is computed once from the merged [`Config`], CLI
//! overrides and host detection, then passed by reference to every stage.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use url::Url;

use crate::core::platform::Platform;
use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Default upstream repository of the native library.
pub const DEFAULT_GIT_URL: &str = "https://github.com/amspath/libisyntax.git";

/// Branch archives tried when the clone fails, in order.
pub const DEFAULT_BRANCHES: &[&str] = &["main", "master"];

pub const DEFAULT_SOURCE_DIR: &str = "third_party/libisyntax";
pub const DEFAULT_DESCRIPTOR: &str = "CMakeLists.txt";
pub const DEFAULT_BUILD_DIR: &str = "build/libisyntax-build";
pub const DEFAULT_CMAKE_TARGET: &str = "isyntax";
pub const DEFAULT_LIBRARY: &str = "isyntax";
pub const DEFAULT_STAGING_DIR: &str = "build/packaged-natives";
pub const DEFAULT_DIST_DIR: &str = "build/distributions";
pub const DEFAULT_RESOURCES_DIR: &str = "src/main/resources";
pub const DEFAULT_SOURCES_DIR: &str = "src/main/java";
pub const DEFAULT_VERSION: &str = "0.1.0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Values given on the command line, which beat every config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Platform identifier to stage for instead of the host
    pub platform: Option<String>,

    /// Disable network access
    pub offline: bool,

    /// Parallel build jobs
    pub jobs: Option<usize>,
}

/// Where the native source tree comes from.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub git_url: Url,
    pub archive_base: Option<Url>,
    pub branches: Vec<String>,
    pub tags: Vec<String>,
    pub dir: PathBuf,
    pub descriptor: String,
    pub shallow: bool,
}

impl SourceSettings {
    /// Path of the build descriptor inside the source tree.
    pub fn descriptor_path(&self) -> PathBuf {
        self.dir.join(&self.descriptor)
    }
}

#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub dir: PathBuf,
    pub target: String,
    pub jobs: Option<usize>,
    pub cmake_args: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PackageSettings {
    pub staging_dir: PathBuf,
    pub library: String,
    pub name: String,
    pub version: String,
    pub resources: Vec<PathBuf>,
    pub sources: Vec<PathBuf>,
    pub dist_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct NetSettings {
    pub timeout: Duration,
    pub offline: bool,
}

/// Everything a pipeline stage needs to know.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub root: PathBuf,
    pub platform: Platform,
    pub source: SourceSettings,
    pub build: BuildSettings,
    pub package: PackageSettings,
    pub net: NetSettings,
}

impl PipelineContext {
    /// Load config files for the project at `root` and resolve them.
    pub fn load(root: &Path, overrides: &Overrides) -> Result<Self> {
        let global = global_config_path();
        let config = load_config(global.as_deref(), &project_config_path(root))?;
        Self::from_config(root, config, overrides)
    }

    /// Resolve a merged config into absolute paths and concrete values.
    pub fn from_config(root: &Path, config: Config, overrides: &Overrides) -> Result<Self> {
        let root = root.to_path_buf();

        let platform = match &overrides.platform {
            Some(id) => Platform::parse(id)?,
            None => Platform::detect(),
        };

        let git = config
            .source
            .git
            .unwrap_or_else(|| DEFAULT_GIT_URL.to_string());
        let git_url = parse_url(&root, &git)
            .with_context(|| format!("invalid source git URL `{}`", git))?;

        let archive_base = match config.source.archive_base {
            Some(base) => Some(
                Url::parse(&base)
                    .with_context(|| format!("invalid source archive-base `{}`", base))?,
            ),
            None => derive_archive_base(&git_url),
        };

        let branches = if config.source.branches.is_empty() {
            DEFAULT_BRANCHES.iter().map(|b| b.to_string()).collect()
        } else {
            config.source.branches
        };

        let source = SourceSettings {
            git_url,
            archive_base,
            branches,
            tags: config.source.tags,
            dir: root.join(
                config
                    .source
                    .dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_DIR)),
            ),
            descriptor: config
                .source
                .descriptor
                .unwrap_or_else(|| DEFAULT_DESCRIPTOR.to_string()),
            shallow: config.source.shallow.unwrap_or(true),
        };

        let build = BuildSettings {
            dir: root.join(
                config
                    .build
                    .dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR)),
            ),
            target: config
                .build
                .target
                .unwrap_or_else(|| DEFAULT_CMAKE_TARGET.to_string()),
            jobs: overrides.jobs.or(config.build.jobs),
            cmake_args: config.build.cmake_args,
        };

        if build.jobs == Some(0) {
            bail!("build jobs must be at least 1");
        }

        let name = match config.package.name {
            Some(name) => name,
            None => default_package_name(&root),
        };

        let resources = if config.package.resources.is_empty() {
            vec![PathBuf::from(DEFAULT_RESOURCES_DIR)]
        } else {
            config.package.resources
        };

        let sources = if config.package.sources.is_empty() {
            vec![PathBuf::from(DEFAULT_SOURCES_DIR)]
        } else {
            config.package.sources
        };

        let package = PackageSettings {
            staging_dir: root.join(
                config
                    .package
                    .staging_dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_STAGING_DIR)),
            ),
            library: config
                .package
                .library
                .unwrap_or_else(|| DEFAULT_LIBRARY.to_string()),
            name,
            version: config
                .package
                .version
                .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            resources: resources.into_iter().map(|p| root.join(p)).collect(),
            sources: sources.into_iter().map(|p| root.join(p)).collect(),
            dist_dir: root.join(
                config
                    .package
                    .dist_dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DIST_DIR)),
            ),
        };

        let net = NetSettings {
            timeout: Duration::from_secs(config.net.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            offline: overrides.offline || config.net.offline,
        };

        Ok(PipelineContext {
            root,
            platform,
            source,
            build,
            package,
            net,
        })
    }

    /// Directory natives for the current platform are staged into.
    pub fn natives_dir(&self) -> PathBuf {
        self.package
            .staging_dir
            .join("natives")
            .join(self.platform.classifier())
    }
}

/// Parse a git location: a URL, or a filesystem path relative to the root.
fn parse_url(root: &Path, location: &str) -> Result<Url> {
    if let Ok(url) = Url::parse(location) {
        // Windows drive letters parse as a one-letter scheme.
        if url.scheme().len() > 1 {
            return Ok(url);
        }
    }

    let path = root.join(location);
    let path = path.canonicalize().unwrap_or(path);
    Url::from_file_path(&path)
        .map_err(|_| anyhow::anyhow!("not an absolute path: {}", path.display()))
}

/// Derive the web base archives are served from: the git URL minus `.git`.
///
/// Only http(s) remotes have archive endpoints.
fn derive_archive_base(git_url: &Url) -> Option<Url> {
    if !matches!(git_url.scheme(), "http" | "https") {
        return None;
    }

    let mut base = git_url.clone();
    let path = base.path().trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path).to_string();
    base.set_path(&path);
    base.set_query(None);
    base.set_fragment(None);
    Some(base)
}

fn default_package_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .or_else(|| root.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "natives".to_string())
}
