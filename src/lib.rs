//! isyntax-natives - fetch, build and package the libisyntax native library
//!
//! This crate provides the provisioning pipeline: resolving the upstream
//! sources, building the shared library with CMake, staging it under a
//! platform classifier and assembling distribution archives.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities and mocks for unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a mock HTTP client, a fake build system and
/// fixture builders.
#[cfg(test)]
pub mod test_support;

pub use crate::core::platform::Platform;
pub use util::context::PipelineContext;
pub use util::errors::ProvisionError;
