//! Repository fixtures shared by unit tests

use std::path::Path;

use git2::build::CheckoutBuilder;
use git2::{Oid, Repository, Signature, Time};

pub const AUTHOR_NAME: &str = "Test Author";
pub const AUTHOR_EMAIL: &str = "test@example.com";
pub const BASE_TIME: i64 = 1_700_000_000;

pub fn init_repo(path: &Path) -> Repository {
    let repo = Repository::init(path).unwrap();
    repo.set_head("refs/heads/master").unwrap();
    repo
}

pub fn signature_at(seconds: i64) -> Signature<'static> {
    Signature::new(AUTHOR_NAME, AUTHOR_EMAIL, &Time::new(seconds, 0)).unwrap()
}

fn head_commit(repo: &Repository) -> Option<git2::Commit<'_>> {
    repo.head().ok().and_then(|h| h.peel_to_commit().ok())
}

fn write_commit(repo: &Repository, message: &str, seconds: i64, extra_parent: Option<Oid>) -> Oid {
    let mut index = repo.index().unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = signature_at(seconds);

    let mut parents = Vec::new();
    if let Some(head) = head_commit(repo) {
        parents.push(head);
    }
    if let Some(other) = extra_parent {
        parents.push(repo.find_commit(other).unwrap());
    }
    let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        .unwrap()
}

/// Write files into the working tree and commit them on HEAD
pub fn commit_files(repo: &Repository, message: &str, files: &[(&str, &str)]) -> Oid {
    let seconds = BASE_TIME + count_commits(repo) as i64 * 60;
    commit_files_at(repo, message, files, seconds)
}

pub fn commit_files_at(repo: &Repository, message: &str, files: &[(&str, &str)], seconds: i64) -> Oid {
    let workdir = repo.workdir().unwrap().to_path_buf();
    let mut index = repo.index().unwrap();

    for (path, contents) in files {
        let full = workdir.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&full, contents).unwrap();
        index.add_path(Path::new(path)).unwrap();
    }
    index.write().unwrap();

    write_commit(repo, message, seconds, None)
}

/// Delete files from the working tree and commit the removal
pub fn remove_files(repo: &Repository, message: &str, paths: &[&str]) -> Oid {
    let workdir = repo.workdir().unwrap().to_path_buf();
    let mut index = repo.index().unwrap();

    for path in paths {
        std::fs::remove_file(workdir.join(path)).unwrap();
        index.remove_path(Path::new(path)).unwrap();
    }
    index.write().unwrap();

    let seconds = BASE_TIME + count_commits(repo) as i64 * 60;
    write_commit(repo, message, seconds, None)
}

/// Point HEAD at a branch and force the working tree to match it
pub fn checkout(repo: &Repository, branch: &str) {
    repo.set_head(&format!("refs/heads/{}", branch)).unwrap();
    repo.checkout_head(Some(CheckoutBuilder::new().force()))
        .unwrap();
}

/// Create `branch` at HEAD and switch to it
pub fn start_branch(repo: &Repository, branch: &str) {
    let head = head_commit(repo).unwrap();
    repo.branch(branch, &head, false).unwrap();
    checkout(repo, branch);
}

/// Merge the tip of `branch` into HEAD with a real two-parent commit
pub fn merge_branch(repo: &Repository, branch: &str, message: &str) -> Oid {
    let ours = head_commit(repo).unwrap();
    let theirs = repo
        .find_branch(branch, git2::BranchType::Local)
        .unwrap()
        .get()
        .peel_to_commit()
        .unwrap();

    let mut merged = repo.merge_commits(&ours, &theirs, None).unwrap();
    assert!(!merged.has_conflicts(), "fixture merge must be clean");
    let tree_id = merged.write_tree_to(repo).unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let seconds = BASE_TIME + count_commits(repo) as i64 * 60;
    let sig = signature_at(seconds);
    let oid = repo
        .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&ours, &theirs])
        .unwrap();

    repo.checkout_head(Some(CheckoutBuilder::new().force()))
        .unwrap();
    oid
}

/// Number of commits reachable from HEAD
pub fn count_commits(repo: &Repository) -> usize {
    let mut walk = repo.revwalk().unwrap();
    if walk.push_head().is_err() {
        return 0;
    }
    walk.count()
}

/// Commits on the first-parent chain of `reference`, newest first
pub fn first_parent_log<'r>(repo: &'r Repository, reference: &str) -> Vec<git2::Commit<'r>> {
    let mut commit = repo
        .find_reference(reference)
        .unwrap()
        .peel_to_commit()
        .unwrap();
    let mut out = vec![commit.clone()];
    while let Ok(parent) = commit.parent(0) {
        out.push(parent.clone());
        commit = parent;
    }
    out
}
