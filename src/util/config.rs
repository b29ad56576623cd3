//! Configuration file support.
//!
//! Two configuration files are read and merged:
//! - Global: `~/.isyntax-natives/config.toml` - user-wide defaults
//! - Project: `natives.toml` in the project root - project-specific overrides
//!
//! Project config takes precedence over global config. Every field is
//! optional; [`crate::util::context::PipelineContext`] fills in defaults.
//!
//! ```toml
//! [source]
//! git = "https://github.com/amspath/libisyntax.git"
//! branches = ["main", "master"]
//! tags = ["v1.0.0"]
//! dir = "third_party/libisyntax"
//!
//! [build]
//! target = "isyntax"
//! cmake-args = ["-DCMAKE_VERBOSE_MAKEFILE=ON"]
//!
//! [package]
//! name = "qupath-extension-isyntax"
//! version = "0.1.0"
//! resources = ["src/main/resources"]
//!
//! [net]
//! timeout = 300
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File name of the project configuration.
pub const PROJECT_CONFIG_FILE: &str = "natives.toml";

/// Provisioning configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the native source tree comes from
    pub source: SourceConfig,

    /// Native build settings
    pub build: BuildConfig,

    /// Staging and distribution settings
    pub package: PackageConfig,

    /// Network settings
    pub net: NetConfig,
}

/// Source acquisition settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SourceConfig {
    /// Git URL for the shallow clone
    pub git: Option<String>,

    /// Web base URL archives are downloaded from; derived from `git` if unset
    pub archive_base: Option<String>,

    /// Branch archives to try, in order, when the clone fails
    pub branches: Vec<String>,

    /// Pinned release tags to try after the branches
    pub tags: Vec<String>,

    /// Checkout directory, relative to the project root
    pub dir: Option<PathBuf>,

    /// File that marks a complete source tree
    pub descriptor: Option<String>,

    /// Clone with depth 1
    pub shallow: Option<bool>,
}

/// Native build settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Build output directory, relative to the project root
    pub dir: Option<PathBuf>,

    /// CMake target to build
    pub target: Option<String>,

    /// Parallel jobs passed to `cmake --build` (None = CMake default)
    pub jobs: Option<usize>,

    /// Extra arguments appended to the configure step
    pub cmake_args: Vec<String>,
}

/// Staging and distribution settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PackageConfig {
    /// Staging root; natives land in `<staging-dir>/natives/<classifier>/`
    pub staging_dir: Option<PathBuf>,

    /// Base name of the shared library (`isyntax` -> `libisyntax.so`)
    pub library: Option<String>,

    /// Distribution name
    pub name: Option<String>,

    /// Distribution version
    pub version: Option<String>,

    /// Static resource directories merged into the package
    pub resources: Vec<PathBuf>,

    /// Source directories for the source-only distribution
    pub sources: Vec<PathBuf>,

    /// Output directory for distribution archives
    pub dist_dir: Option<PathBuf>,
}

/// Network-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// HTTP timeout in seconds
    pub timeout: Option<u64>,

    /// Offline mode (don't fetch from network)
    pub offline: bool,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        let Config {
            source,
            build,
            package,
            net,
        } = other;

        // Source settings
        merge_opt(&mut self.source.git, source.git);
        merge_opt(&mut self.source.archive_base, source.archive_base);
        merge_vec(&mut self.source.branches, source.branches);
        merge_vec(&mut self.source.tags, source.tags);
        merge_opt(&mut self.source.dir, source.dir);
        merge_opt(&mut self.source.descriptor, source.descriptor);
        merge_opt(&mut self.source.shallow, source.shallow);

        // Build settings
        merge_opt(&mut self.build.dir, build.dir);
        merge_opt(&mut self.build.target, build.target);
        merge_opt(&mut self.build.jobs, build.jobs);
        merge_vec(&mut self.build.cmake_args, build.cmake_args);

        // Package settings
        merge_opt(&mut self.package.staging_dir, package.staging_dir);
        merge_opt(&mut self.package.library, package.library);
        merge_opt(&mut self.package.name, package.name);
        merge_opt(&mut self.package.version, package.version);
        merge_vec(&mut self.package.resources, package.resources);
        merge_vec(&mut self.package.sources, package.sources);
        merge_opt(&mut self.package.dist_dir, package.dist_dir);

        // Net settings
        merge_opt(&mut self.net.timeout, net.timeout);
        if net.offline {
            self.net.offline = true;
        }
    }
}

fn merge_opt<T>(base: &mut Option<T>, other: Option<T>) {
    if other.is_some() {
        *base = other;
    }
}

fn merge_vec<T>(base: &mut Vec<T>, other: Vec<T>) {
    if !other.is_empty() {
        *base = other;
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (`natives.toml`)
/// 2. Global config (`~/.isyntax-natives/config.toml`)
/// 3. Defaults
///
/// A global file that fails to parse is skipped with a warning; a broken
/// project file is an error, since it is part of the build.
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_path.filter(|p| p.exists()) {
        match Config::load(global_path) {
            Ok(global) => config.merge(global),
            Err(e) => tracing::warn!("Ignoring global config: {:#}", e),
        }
    }

    if project_path.exists() {
        config.merge(Config::load(project_path)?);
    }

    Ok(config)
}

/// Get the global config directory (`~/.isyntax-natives`).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".isyntax-natives"))
}

/// Get the global config path (`~/.isyntax-natives/config.toml`).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path.
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_CONFIG_FILE)
}
