//! Test fixtures for common test scenarios.
//!
//! This module builds the upstream inputs the pipeline consumes: zip
//! archives shaped like forge downloads and local git repositories.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use git2::{Repository, Signature};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Build an in-memory zip archive.
///
/// Each entry is `(name, Some(contents))` for a file or `(name, None)` for
/// a directory entry.
pub fn zip_bytes(entries: &[(&str, Option<&str>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for (name, contents) in entries {
        match contents {
            Some(contents) => {
                writer.start_file(*name, options).unwrap();
                writer.write_all(contents.as_bytes()).unwrap();
            }
            None => {
                writer.add_directory(*name, options).unwrap();
            }
        }
    }

    writer.finish().unwrap().into_inner()
}

/// Create a git repository at `path` with one commit holding `files`.
///
/// Returns the repository's working directory.
pub fn git_repo_with(path: &Path, files: &[(&str, &str)]) -> PathBuf {
    std::fs::create_dir_all(path).unwrap();
    let repo = Repository::init(path).unwrap();

    for (name, contents) in files {
        let file = path.join(name);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&file, contents).unwrap();
    }

    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let sig = Signature::now("Fixture", "fixture@example.com").unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "Initial import", &tree, &[])
        .unwrap();

    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_bytes_roundtrip_names() {
        let data = zip_bytes(&[("dir/", None), ("dir/a.txt", Some("a"))]);
        let archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();
        let names: Vec<_> = archive.file_names().map(str::to_string).collect();
        assert!(names.contains(&"dir/a.txt".to_string()));
    }

    #[test]
    fn test_git_repo_with_commits_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = git_repo_with(&tmp.path().join("repo"), &[("src/x.c", "int x;")]);

        let repo = Repository::open(&path).unwrap();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert!(head.tree().unwrap().get_path(Path::new("src/x.c")).is_ok());
    }
}
