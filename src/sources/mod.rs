//! Native sources.
//!
//! Sources are fetched into the project's third-party directory by trying a
//! chain of strategies (git clone, branch archives, tag archives) until one
//! produces a usable tree.

pub mod archive;
pub mod git;
pub mod http;
pub mod resolver;
pub mod strategy;

pub use archive::{ArchiveDownload, RefKind};
pub use git::GitClone;
pub use http::{HttpClient, ReqwestClient};
pub use resolver::{Resolution, SourceResolver};
pub use strategy::FetchStrategy;
