//! Archive download strategy.
//!
//! Forges such as GitHub serve a zip of any branch or tag at a predictable
//! URL:
//!
//! ```text
//! <repository>/archive/refs/heads/<branch>.zip
//! <repository>/archive/refs/tags/<tag>.zip
//! ```
//!
//! Those archives wrap everything in a single `<project>-<ref>/` directory,
//! which is flattened away on extraction.

use std::fs;
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use url::Url;
use zip::ZipArchive;

use crate::sources::{FetchStrategy, HttpClient};
use crate::util::fs::copy_dir_all;

/// Which kind of git reference an archive is cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Branch,
    Tag,
}

impl RefKind {
    fn url_segment(&self) -> &'static str {
        match self {
            RefKind::Branch => "heads",
            RefKind::Tag => "tags",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            RefKind::Branch => "branch",
            RefKind::Tag => "tag",
        }
    }
}

/// Download and unpack the archive of one branch or tag.
pub struct ArchiveDownload {
    client: Arc<dyn HttpClient>,
    kind: RefKind,
    name: String,
    url: Url,
}

impl ArchiveDownload {
    pub fn new(
        client: Arc<dyn HttpClient>,
        base: &Url,
        kind: RefKind,
        name: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let url = archive_url(base, kind, &name)?;
        Ok(ArchiveDownload {
            client,
            kind,
            name,
            url,
        })
    }

    pub fn branch(client: Arc<dyn HttpClient>, base: &Url, name: impl Into<String>) -> Result<Self> {
        Self::new(client, base, RefKind::Branch, name)
    }

    pub fn tag(client: Arc<dyn HttpClient>, base: &Url, name: impl Into<String>) -> Result<Self> {
        Self::new(client, base, RefKind::Tag, name)
    }
}

impl FetchStrategy for ArchiveDownload {
    fn describe(&self) -> String {
        format!("archive of {} `{}`", self.kind.as_str(), self.name)
    }

    fn fetch(&self, dest: &Path) -> Result<()> {
        tracing::debug!("Downloading {}", self.url);

        // Deleted on drop, whichever way this function exits.
        let mut archive = tempfile::Builder::new()
            .prefix("isyntax-natives-")
            .suffix(".zip")
            .tempfile()
            .context("failed to create temporary archive file")?;

        let size = self.client.download(&self.url, archive.as_file_mut())?;
        archive.as_file_mut().flush()?;
        tracing::debug!("Downloaded {} bytes to {}", size, archive.path().display());

        let file = archive
            .reopen()
            .context("failed to reopen downloaded archive")?;
        extract_zip(file, dest).with_context(|| format!("failed to extract {}", self.url))
    }
}

/// Build the archive URL for a branch or tag below `base`.
pub fn archive_url(base: &Url, kind: RefKind, name: &str) -> Result<Url> {
    if name.is_empty() {
        bail!("empty {} name", kind.as_str());
    }

    let raw = format!(
        "{}/archive/refs/{}/{}.zip",
        base.as_str().trim_end_matches('/'),
        kind.url_segment(),
        name
    );
    Url::parse(&raw).with_context(|| format!("invalid archive URL `{}`", raw))
}

/// Extract a zip archive into `dest`.
///
/// The archive is unpacked into a scratch directory first. If it holds a
/// single top-level directory, that directory's children are copied into
/// `dest`; otherwise everything is copied as-is.
pub fn extract_zip<R: Read + Seek>(reader: R, dest: &Path) -> Result<()> {
    let scratch = tempfile::Builder::new()
        .prefix("isyntax-natives-extract-")
        .tempdir()
        .context("failed to create extraction directory")?;

    let mut zip = ZipArchive::new(reader).context("not a valid zip archive")?;

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .with_context(|| format!("failed to read archive entry {}", i))?;

        let Some(relative) = entry.enclosed_name() else {
            bail!("archive entry escapes destination directory: {}", entry.name());
        };
        let out_path = scratch.path().join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .with_context(|| format!("failed to create directory: {}", out_path.display()))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        let mut out = fs::File::create(&out_path)
            .with_context(|| format!("failed to create file: {}", out_path.display()))?;
        io::copy(&mut entry, &mut out)
            .with_context(|| format!("failed to extract file: {}", out_path.display()))?;

        #[cfg(unix)]
        {
            if let Some(mode) = entry.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&out_path, fs::Permissions::from_mode(mode & 0o777))?;
            }
        }
    }

    let root = unwrap_single_dir(scratch.path())?;
    copy_dir_all(&root, dest)
}

/// Return the sole child of `dir` if it is a directory, else `dir` itself.
fn unwrap_single_dir(dir: &Path) -> Result<PathBuf> {
    let entries: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<io::Result<_>>()?;

    match entries.as_slice() {
        [only] if only.file_type()?.is_dir() => Ok(only.path()),
        _ => Ok(dir.to_path_buf()),
    }
}
