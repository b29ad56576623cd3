//! Native library build.
//!
//! This module patches the fetched descriptor and drives CMake to produce the
//! shared library for the pipeline's platform.

pub mod cmake;
pub mod native;
pub mod patch;

pub use cmake::{BuildSystem, CMake};
pub use native::{require_sources, BuildOutcome, NativeBuilder};
pub use patch::{strip_native_cpu_flags, PatchOutcome};
