//! The fetch strategy interface.

use std::path::Path;

use anyhow::Result;

/// One way of populating a source directory.
///
/// Strategies are tried in order by [`crate::sources::SourceResolver`];
/// the first that succeeds wins.
pub trait FetchStrategy {
    /// Short description for status lines and error reports.
    fn describe(&self) -> String;

    /// Whether this strategy needs network access.
    fn requires_network(&self) -> bool {
        true
    }

    /// Populate `dest`, which does not exist when this is called.
    fn fetch(&self, dest: &Path) -> Result<()>;
}
