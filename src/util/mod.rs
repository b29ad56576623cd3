//! Shared utilities

pub mod config;
pub mod context;
pub mod errors;
pub mod fs;
pub mod hash;
pub mod process;
pub mod shell;

pub use config::Config;
pub use context::{Overrides, PipelineContext};
pub use errors::ProvisionError;
pub use shell::Shell;
