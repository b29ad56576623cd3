//! Command implementations

pub mod assemble;
pub mod build;
pub mod clean;
pub mod completions;
pub mod fetch;
pub mod package;
pub mod platform;
pub mod run;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use isyntax_natives::sources::{HttpClient, ReqwestClient};
use isyntax_natives::util::{Overrides, PipelineContext, Shell};

/// Settings shared by every command.
pub struct Global {
    pub root: PathBuf,
    pub shell: Shell,
    pub offline: bool,
    pub platform: Option<String>,
}

impl Global {
    /// Load configuration for the project and apply command-line overrides.
    pub fn context(&self, jobs: Option<usize>) -> Result<PipelineContext> {
        PipelineContext::load(
            &self.root,
            &Overrides {
                platform: self.platform.clone(),
                offline: self.offline,
                jobs,
            },
        )
    }

    pub fn http_client(&self, ctx: &PipelineContext) -> Result<Arc<dyn HttpClient>> {
        let client = ReqwestClient::new(ctx.net.timeout)?.with_progress(!self.shell.is_quiet());
        Ok(Arc::new(client))
    }
}
