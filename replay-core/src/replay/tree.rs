//! Replacing a working tree with the contents of a commit

use std::fs;
use std::path::Path;

use git2::{FileMode, ObjectType, Repository, Tree, TreeWalkMode, TreeWalkResult};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Remove everything in `dir` except the `.git` entry
///
/// Symlinks are removed themselves, never followed.
pub fn clear_worktree(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name() == ".git" {
            continue;
        }

        let path = entry.path();
        let file_type = fs::symlink_metadata(&path)?.file_type();
        if file_type.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }

    Ok(())
}

/// Write every blob of `tree` (read from `repo`) under `dir`
///
/// Returns the number of files written. Submodule entries are skipped.
pub fn export_tree(repo: &Repository, tree: &Tree<'_>, dir: &Path) -> Result<usize> {
    let mut written = 0;
    let mut failure: Option<Error> = None;

    let walked = tree.walk(TreeWalkMode::PreOrder, |root, entry| {
        let Some(name) = entry.name() else {
            failure = Some(Error::Other(format!(
                "Tree entry {} under '{}' has a non UTF-8 name",
                entry.id(),
                root
            )));
            return TreeWalkResult::Abort;
        };

        let path = dir.join(root).join(name);
        let result = match entry.kind() {
            Some(ObjectType::Tree) => fs::create_dir_all(&path).map_err(Error::from),
            Some(ObjectType::Blob) => {
                written += 1;
                write_blob(repo, entry.id(), entry.filemode(), &path)
            }
            Some(ObjectType::Commit) => {
                warn!(path = %path.display(), commit = %entry.id(), "Skipping submodule entry");
                Ok(())
            }
            other => Err(Error::Other(format!(
                "Unexpected {:?} entry at {}",
                other,
                path.display()
            ))),
        };

        match result {
            Ok(()) => TreeWalkResult::Ok,
            Err(e) => {
                failure = Some(e);
                TreeWalkResult::Abort
            }
        }
    });

    if let Some(e) = failure {
        return Err(e);
    }
    walked?;

    debug!(files = written, dir = %dir.display(), "Exported tree");
    Ok(written)
}

fn write_blob(repo: &Repository, id: git2::Oid, mode: i32, path: &Path) -> Result<()> {
    let blob = repo.find_blob(id)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    if mode == i32::from(FileMode::Link) {
        return write_symlink(blob.content(), path);
    }

    fs::write(path, blob.content())?;

    #[cfg(unix)]
    if mode == i32::from(FileMode::BlobExecutable) {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }

    Ok(())
}

#[cfg(unix)]
fn write_symlink(target: &[u8], path: &Path) -> Result<()> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    std::os::unix::fs::symlink(OsStr::from_bytes(target), path)?;
    Ok(())
}

#[cfg(not(unix))]
fn write_symlink(target: &[u8], path: &Path) -> Result<()> {
    // Same fallback git uses with core.symlinks=false
    fs::write(path, target)?;
    Ok(())
}

/// Rebuild `tree` of `source` inside `target`, byte for byte
///
/// Blobs are copied as stored, so no clean filter (`.gitattributes`,
/// `core.autocrlf`) touches them. Gitlinks are dropped, and so are
/// directories left empty by dropping them. Returns the new tree id, or
/// `None` when nothing remains.
pub fn copy_tree(source: &Repository, target: &Repository, tree: &Tree<'_>) -> Result<Option<git2::Oid>> {
    let odb = target.odb()?;
    let mut builder = target.treebuilder(None)?;

    for entry in tree.iter() {
        let name = entry.name_bytes().to_vec();
        match entry.kind() {
            Some(ObjectType::Blob) => {
                if !odb.exists(entry.id()) {
                    let blob = source.find_blob(entry.id())?;
                    odb.write(ObjectType::Blob, blob.content())?;
                }
                builder.insert(name, entry.id(), entry.filemode())?;
            }
            Some(ObjectType::Tree) => {
                let subtree = source.find_tree(entry.id())?;
                if let Some(id) = copy_tree(source, target, &subtree)? {
                    builder.insert(name, id, entry.filemode())?;
                }
            }
            Some(ObjectType::Commit) => {
                debug!(commit = %entry.id(), "Dropping gitlink from mirrored tree");
            }
            other => {
                return Err(Error::Other(format!(
                    "Unexpected {:?} entry {} in tree {}",
                    other,
                    entry.id(),
                    tree.id()
                )))
            }
        }
    }

    if builder.len() == 0 && tree.len() > 0 {
        return Ok(None);
    }
    Ok(Some(builder.write()?))
}

/// Make `dir` hold exactly the tree of `commit_id`
pub fn replace_worktree(repo: &Repository, commit_id: git2::Oid, dir: &Path) -> Result<usize> {
    let tree = repo.find_commit(commit_id)?.tree()?;
    clear_worktree(dir)?;
    export_tree(repo, &tree, dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{commit_files, init_repo, remove_files};
    use tempfile::TempDir;

    #[test]
    fn test_clear_keeps_git_dir() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".git/objects")).unwrap();
        fs::create_dir_all(temp.path().join("src/nested")).unwrap();
        fs::write(temp.path().join("src/nested/file.rs"), "x").unwrap();
        fs::write(temp.path().join(".gitignore"), "target").unwrap();

        clear_worktree(temp.path()).unwrap();

        let remaining: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(remaining, vec![std::ffi::OsString::from(".git")]);
        assert!(temp.path().join(".git/objects").exists());
    }

    #[test]
    fn test_replace_worktree_follows_commits() {
        let temp = TempDir::new().unwrap();
        let repo = init_repo(&temp.path().join("source"));
        let first = commit_files(
            &repo,
            "first",
            &[("README.md", "one"), ("src/main.rs", "fn main() {}"), (".hidden", "h")],
        );
        let second = remove_files(&repo, "drop main", &["src/main.rs"]);

        let out = temp.path().join("out");
        fs::create_dir_all(out.join(".git")).unwrap();
        fs::write(out.join("stale.txt"), "stale").unwrap();

        assert_eq!(replace_worktree(&repo, first, &out).unwrap(), 3);
        assert!(!out.join("stale.txt").exists());
        assert_eq!(fs::read_to_string(out.join("src/main.rs")).unwrap(), "fn main() {}");
        assert_eq!(fs::read_to_string(out.join(".hidden")).unwrap(), "h");

        assert_eq!(replace_worktree(&repo, second, &out).unwrap(), 2);
        assert!(!out.join("src").exists());
        assert!(out.join(".git").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_export_modes() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let repo = init_repo(&temp.path().join("source"));

        let script = repo.blob(b"#!/bin/sh\necho hi\n").unwrap();
        let link = repo.blob(b"run.sh").unwrap();
        let mut builder = repo.treebuilder(None).unwrap();
        builder.insert("run.sh", script, 0o100755).unwrap();
        builder.insert("latest", link, 0o120000).unwrap();
        let tree = repo.find_tree(builder.write().unwrap()).unwrap();

        let out = temp.path().join("out");
        fs::create_dir_all(&out).unwrap();
        assert_eq!(export_tree(&repo, &tree, &out).unwrap(), 2);

        let mode = fs::metadata(out.join("run.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);

        let target = fs::read_link(out.join("latest")).unwrap();
        assert_eq!(target, Path::new("run.sh"));
    }

    /// Tree with a file, a gitlink, and a directory holding only a gitlink
    fn tree_with_gitlinks(repo: &Repository) -> (Tree<'_>, git2::Oid) {
        let head = commit_files(repo, "base", &[("base.txt", "base")]);
        let file = repo.blob(b"one\r\ntwo\r\n").unwrap();

        let mut nested = repo.treebuilder(None).unwrap();
        nested.insert("inner", head, 0o160000).unwrap();
        let nested = nested.write().unwrap();

        let mut builder = repo.treebuilder(None).unwrap();
        builder.insert("win.txt", file, 0o100644).unwrap();
        builder.insert("vendor", head, 0o160000).unwrap();
        builder.insert("deps", nested, 0o040000).unwrap();
        let tree = repo.find_tree(builder.write().unwrap()).unwrap();
        (tree, file)
    }

    #[test]
    fn test_export_skips_gitlinks() {
        let temp = TempDir::new().unwrap();
        let repo = init_repo(&temp.path().join("source"));
        let (tree, _) = tree_with_gitlinks(&repo);

        let out = temp.path().join("out");
        fs::create_dir_all(&out).unwrap();
        assert_eq!(export_tree(&repo, &tree, &out).unwrap(), 1);

        assert_eq!(fs::read(out.join("win.txt")).unwrap(), b"one\r\ntwo\r\n");
        assert!(!out.join("vendor").exists());
        assert!(!out.join("deps/inner").exists());
    }

    #[test]
    fn test_copy_tree_keeps_blobs_and_drops_gitlinks() {
        let temp = TempDir::new().unwrap();
        let source = init_repo(&temp.path().join("source"));
        let target = init_repo(&temp.path().join("target"));
        let (tree, file) = tree_with_gitlinks(&source);

        let copied = copy_tree(&source, &target, &tree).unwrap().unwrap();
        let copied = target.find_tree(copied).unwrap();

        assert_eq!(copied.len(), 1);
        let entry = copied.get_name("win.txt").unwrap();
        assert_eq!(entry.id(), file);
        assert_eq!(target.find_blob(file).unwrap().content(), b"one\r\ntwo\r\n");
    }

    #[test]
    fn test_copy_tree_matches_plain_source_tree() {
        let temp = TempDir::new().unwrap();
        let source = init_repo(&temp.path().join("source"));
        let target = init_repo(&temp.path().join("target"));
        let id = commit_files(
            &source,
            "files",
            &[("README.md", "r"), ("src/lib.rs", "pub fn f() {}"), ("src/deep/x.txt", "x")],
        );
        let tree = source.find_commit(id).unwrap().tree().unwrap();

        assert_eq!(copy_tree(&source, &target, &tree).unwrap(), Some(tree.id()));
    }

    #[cfg(unix)]
    #[test]
    fn test_clear_does_not_follow_symlinks() {
        let temp = TempDir::new().unwrap();
        let outside = temp.path().join("outside");
        fs::create_dir_all(&outside).unwrap();
        fs::write(outside.join("precious.txt"), "keep").unwrap();

        let work = temp.path().join("work");
        fs::create_dir_all(work.join(".git")).unwrap();
        std::os::unix::fs::symlink(&outside, work.join("linked-dir")).unwrap();
        std::os::unix::fs::symlink(outside.join("precious.txt"), work.join("linked-file")).unwrap();

        clear_worktree(&work).unwrap();

        assert!(fs::symlink_metadata(work.join("linked-dir")).is_err());
        assert!(fs::symlink_metadata(work.join("linked-file")).is_err());
        assert_eq!(fs::read_to_string(outside.join("precious.txt")).unwrap(), "keep");
    }
}
