//! High-level operations.
//!
//! This module contains the implementation of the pipeline stages and the
//! commands built on them.

pub mod assemble;
pub mod clean;
pub mod package;
pub mod pipeline;

pub use assemble::{Assembly, PackageManifest, ResourceAssembler, ResourceSet};
pub use clean::clean;
pub use package::{ArtifactPackager, StagedArtifact};
pub use pipeline::{assemble, build, fetch, package, run, RunOptions, RunReport};
