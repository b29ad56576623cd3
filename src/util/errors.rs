//! Provisioning error taxonomy.
//!
//! Only the fatal cases live here. "No artifact found" and "descriptor
//! missing at patch time" are not errors and are reported through logging.

use std::path::PathBuf;

use thiserror::Error;

/// A fatal error that aborts the provisioning pipeline.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Every strategy in the fallback chain failed.
    #[error("unable to fetch sources into {}\n{}", .target.display(), format_attempts(.attempts))]
    FetchFailed {
        target: PathBuf,
        attempts: Vec<FailedAttempt>,
    },

    /// The fetch target holds files but no source tree. It is never cleared.
    #[error(
        "{} is not empty and has no {descriptor}\n\
         help: move its contents aside or point `source.dir` elsewhere",
        .path.display()
    )]
    TargetOccupied { path: PathBuf, descriptor: String },

    /// The builder was asked to run against a directory with no source tree.
    #[error(
        "native source tree missing at {}\n\
         help: run `isyntax-natives fetch` first",
        .path.display()
    )]
    SourceMissing { path: PathBuf },

    /// A required external tool could not be located.
    #[error("`{tool}` not found in PATH\n{hint}")]
    ToolNotFound { tool: String, hint: String },

    /// The external build system exited unsuccessfully.
    #[error("{step} failed with exit code {}\n{stderr}", .code.map_or_else(|| "<signal>".to_string(), |c| c.to_string()))]
    BuildFailed {
        step: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// One failed strategy in the fetch chain.
#[derive(Debug, Clone)]
pub struct FailedAttempt {
    /// Human-readable description of the strategy (e.g. `archive main`).
    pub strategy: String,
    /// Why it failed.
    pub reason: String,
}

fn format_attempts(attempts: &[FailedAttempt]) -> String {
    if attempts.is_empty() {
        return "  (no fetch strategies configured)".to_string();
    }

    attempts
        .iter()
        .map(|a| format!("  - {}: {}", a.strategy, a.reason))
        .collect::<Vec<_>>()
        .join("\n")
}
