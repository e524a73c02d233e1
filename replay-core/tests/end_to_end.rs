//! Mirroring between local repositories, no network involved

use std::path::Path;

use git2::{Oid, Repository, Signature, Time};
use replay_core::{Config, Mirror, Overrides, ReplayPolicy, RunOptions};
use tempfile::TempDir;

const BASE_TIME: i64 = 1_700_000_000;

fn signature(offset: i64) -> Signature<'static> {
    Signature::new("Ada Lovelace", "ada@example.com", &Time::new(BASE_TIME + offset, 0)).unwrap()
}

/// Commit a flat tree holding exactly `files` onto `reference`
fn commit(
    repo: &Repository,
    reference: &str,
    parents: &[Oid],
    files: &[(&str, &str)],
    message: &str,
    offset: i64,
) -> Oid {
    let mut builder = repo.treebuilder(None).unwrap();
    for (name, content) in files {
        let blob = repo.blob(content.as_bytes()).unwrap();
        builder.insert(name, blob, 0o100644).unwrap();
    }
    let tree = repo.find_tree(builder.write().unwrap()).unwrap();
    let parents: Vec<_> = parents.iter().map(|id| repo.find_commit(*id).unwrap()).collect();
    let parent_refs: Vec<_> = parents.iter().collect();
    let sig = signature(offset);

    repo.commit(Some(reference), &sig, &sig, message, &tree, &parent_refs)
        .unwrap()
}

/// Bare source with `main`: two commits, a merged feature branch, one more commit
struct Source {
    repo: Repository,
    tip: Oid,
}

fn build_source(path: &Path) -> Source {
    let repo = Repository::init_bare(path).unwrap();
    repo.set_head("refs/heads/main").unwrap();

    let main = "refs/heads/main";
    let feature = "refs/heads/feature";

    let c1 = commit(&repo, main, &[], &[("README.md", "hello")], "Initial commit", 0);
    let c2 = commit(&repo, main, &[c1], &[("README.md", "hello\nworld")], "Expand readme", 10);
    let f1 = commit(
        &repo,
        feature,
        &[c2],
        &[("README.md", "hello\nworld"), ("lib.rs", "pub fn a() {}")],
        "Add library",
        20,
    );
    let f2 = commit(
        &repo,
        feature,
        &[f1],
        &[("README.md", "hello\nworld"), ("lib.rs", "pub fn a() {}\npub fn b() {}")],
        "Add second function",
        30,
    );
    let m = commit(
        &repo,
        main,
        &[c2, f2],
        &[("README.md", "hello\nworld"), ("lib.rs", "pub fn a() {}\npub fn b() {}")],
        "Merge branch 'feature'",
        40,
    );
    let tip = commit(
        &repo,
        main,
        &[m],
        &[("README.md", "hello\nworld\n!"), ("lib.rs", "pub fn a() {}\npub fn b() {}")],
        "Polish readme",
        50,
    );

    Source { repo, tip }
}

/// Empty bare target whose HEAD names the branch the test publishes
fn init_target(path: &Path, branch: &str) {
    let repo = Repository::init_bare(path).unwrap();
    repo.set_head(&format!("refs/heads/{}", branch)).unwrap();
}

fn config(source: &Path, target: &Path, policy: ReplayPolicy, target_branch: &str) -> Config {
    Config::default().with_cli_overrides(Overrides {
        source: Some(source.to_str().unwrap().to_string()),
        target: Some(target.to_str().unwrap().to_string()),
        source_branch: Some("main".to_string()),
        target_branch: Some(target_branch.to_string()),
        policy: Some(policy),
        ..Default::default()
    })
}

/// First-parent history of `reference`, newest first
fn history<'r>(repo: &'r Repository, reference: &str) -> Vec<git2::Commit<'r>> {
    let mut out = Vec::new();
    let mut current = repo.find_reference(reference).ok().and_then(|r| r.peel_to_commit().ok());
    while let Some(commit) = current {
        current = commit.parent(0).ok();
        out.push(commit);
    }
    out
}

fn marker(commit: &git2::Commit<'_>) -> Option<String> {
    commit
        .message()
        .unwrap()
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix("Mirrored-From: "))
        .map(str::to_string)
}

#[test]
fn full_mirror_is_idempotent_and_incremental() {
    let temp = TempDir::new().unwrap();
    let source_path = temp.path().join("source.git");
    let target_path = temp.path().join("target.git");
    let source = build_source(&source_path);
    init_target(&target_path, "main");

    let mirror = Mirror::new(
        config(&source_path, &target_path, ReplayPolicy::Full, "main"),
        None,
    )
    .unwrap();

    // c1, c2, merge, tip; the feature commits are off the first-parent chain
    let first = mirror.run(RunOptions::default(), |_| {}).unwrap();
    assert_eq!(first.selected, 4);
    assert_eq!(first.created_count(), 4);
    assert!(first.pushed);

    let again = mirror.run(RunOptions::default(), |_| {}).unwrap();
    assert_eq!(again.created_count(), 0);
    assert_eq!(again.already_mirrored, 4);
    assert!(!again.pushed);

    let newer = commit(
        &source.repo,
        "refs/heads/main",
        &[source.tip],
        &[("README.md", "final"), ("lib.rs", "pub fn a() {}\npub fn b() {}")],
        "Final touches",
        60,
    );
    let third = mirror.run(RunOptions::default(), |_| {}).unwrap();
    assert_eq!(third.created_count(), 1);
    assert_eq!(third.created[0].source, newer.to_string());

    let target = Repository::open_bare(&target_path).unwrap();
    let mirrored = history(&target, "refs/heads/main");
    let original = history(&source.repo, "refs/heads/main");
    assert_eq!(mirrored.len(), original.len());

    for (copy, orig) in mirrored.iter().zip(&original) {
        assert_eq!(copy.tree_id(), orig.tree_id());
        assert!(copy.parent_count() <= 1);
        assert_eq!(copy.author().name(), Some("Ada Lovelace"));
        assert_eq!(copy.author().when().seconds(), orig.author().when().seconds());
        assert_eq!(marker(copy), Some(orig.id().to_string()));
    }
}

#[test]
fn merges_with_message_lists_merged_commits() {
    let temp = TempDir::new().unwrap();
    let source_path = temp.path().join("source.git");
    let target_path = temp.path().join("target.git");
    let source = build_source(&source_path);
    init_target(&target_path, "releases");

    let mirror = Mirror::new(
        config(
            &source_path,
            &target_path,
            ReplayPolicy::MergesWithMessage,
            "releases",
        ),
        None,
    )
    .unwrap();

    let report = mirror.run(RunOptions::default(), |_| {}).unwrap();
    assert_eq!(report.created_count(), 1);
    assert_eq!(report.target_branch, "releases");

    let target = Repository::open_bare(&target_path).unwrap();
    let mirrored = history(&target, "refs/heads/releases");
    assert_eq!(mirrored.len(), 1);

    let message = mirrored[0].message().unwrap();
    assert!(message.starts_with("Merge branch 'feature'\n\nIncludes:\n"));
    assert!(message.contains("Add library (Ada Lovelace)"));
    assert!(message.contains("Add second function (Ada Lovelace)"));

    let merge = source
        .repo
        .find_commit(source.tip)
        .unwrap()
        .parent(0)
        .unwrap();
    assert_eq!(mirrored[0].tree_id(), merge.tree_id());
    assert_eq!(marker(&mirrored[0]), Some(merge.id().to_string()));
}

#[test]
fn snapshot_then_full_on_separate_branches() {
    let temp = TempDir::new().unwrap();
    let source_path = temp.path().join("source.git");
    let target_path = temp.path().join("target.git");
    let source = build_source(&source_path);
    init_target(&target_path, "snapshot");

    let snapshot = Mirror::new(
        config(&source_path, &target_path, ReplayPolicy::Snapshot, "snapshot"),
        None,
    )
    .unwrap();
    assert_eq!(snapshot.run(RunOptions::default(), |_| {}).unwrap().created_count(), 1);
    assert_eq!(snapshot.run(RunOptions::default(), |_| {}).unwrap().created_count(), 0);

    let plan = Mirror::new(
        config(&source_path, &target_path, ReplayPolicy::Full, "main"),
        None,
    )
    .unwrap()
    .plan()
    .unwrap();
    assert_eq!(plan.pending.len(), 4);
    assert_eq!(plan.pending[3].id, source.tip.to_string());

    let target = Repository::open_bare(&target_path).unwrap();
    let snap = history(&target, "refs/heads/snapshot");
    assert_eq!(snap.len(), 1);
    assert!(snap[0].message().unwrap().starts_with("Snapshot of main at "));
    assert!(target.find_reference("refs/heads/main").is_err());
}
