//! Core data structures.
//!
//! The [`Platform`] a pipeline targets, and the classifier scheme used to
//! namespace natives on disk.

pub mod platform;

pub use platform::{normalize_classifier, Arch, OsFamily, Platform};
