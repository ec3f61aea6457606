// tests/git_history.rs

use git2::{Oid, Repository, Signature, Time};
use git_regress::history::short_hash;
use git_regress::{CommitHistory, GitHistory};
use tempfile::TempDir;

/// Creates a repository with `count` empty commits one minute apart, oldest first.
fn linear_repo(count: usize) -> (TempDir, Vec<Oid>) {
    repo_with_times(&(0..count as i64).map(|i| 1_700_000_000 + 60 * i).collect::<Vec<_>>())
}

/// Creates a repository with one empty commit per entry of `seconds`, oldest first.
fn repo_with_times(seconds: &[i64]) -> (TempDir, Vec<Oid>) {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let tree_id = repo.index().unwrap().write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let mut oids: Vec<Oid> = Vec::new();
    for (i, &time) in seconds.iter().enumerate() {
        let sig = Signature::new("bench", "bench@example.com", &Time::new(time, 0)).unwrap();
        let parent = oids.last().map(|oid| repo.find_commit(*oid).unwrap());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, &format!("commit {i}"), &tree, &parents)
            .unwrap();
        oids.push(oid);
    }
    (dir, oids)
}

#[test]
fn commit_dates_cover_the_default_branch() {
    let (dir, oids) = linear_repo(4);
    let history = GitHistory::open(dir.path()).unwrap();
    let dates = history.commit_dates(&[None], 8).unwrap();

    assert_eq!(dates.len(), 4);
    for (i, oid) in oids.iter().enumerate() {
        let hash = oid.to_string();
        assert_eq!(dates[short_hash(&hash, 8)], (1_700_000_000 + 60 * i as i64) * 1000);
    }
}

#[test]
fn ranges_exclude_the_start_and_list_newest_first() {
    let (dir, oids) = linear_repo(5);
    let history = GitHistory::open(dir.path()).unwrap();

    let spec = history.new_range_spec(&oids[1].to_string(), None);
    assert_eq!(spec.to.as_str(), "HEAD");
    let hashes = history.hashes_in_range(&spec).unwrap();
    let expected: Vec<String> = oids[2..].iter().rev().map(|o| o.to_string()).collect();
    assert_eq!(hashes, expected);
}

#[test]
fn short_hashes_resolve() {
    let (dir, oids) = linear_repo(3);
    let history = GitHistory::open(dir.path()).unwrap();

    let full = oids[1].to_string();
    assert_eq!(history.hash_from_name(short_hash(&full, 10)).unwrap(), full);

    let spec = history.range_spec(short_hash(&oids[1].to_string(), 8), short_hash(&oids[2].to_string(), 8));
    assert_eq!(history.hashes_in_range(&spec).unwrap(), vec![oids[2].to_string()]);
}

#[test]
fn unknown_names_are_errors() {
    let (dir, _) = linear_repo(2);
    let history = GitHistory::open(dir.path()).unwrap();
    assert!(history.hash_from_name("no-such-branch").is_err());
}

#[test]
fn time_span_covers_all_commits() {
    let (dir, _) = linear_repo(3);
    let history = GitHistory::open(dir.path()).unwrap();
    assert_eq!(history.time_span().unwrap(), Some((1_700_000_000, 1_700_000_120)));
}

#[test]
fn commits_in_the_same_second_get_distinct_increasing_dates() {
    let (dir, oids) = repo_with_times(&[1_700_000_000, 1_700_000_000, 1_700_000_000, 1_700_000_001]);
    let history = GitHistory::open(dir.path()).unwrap();
    let dates = history.commit_dates(&[None], 8).unwrap();

    let ordered: Vec<i64> = oids.iter().map(|oid| dates[short_hash(&oid.to_string(), 8)]).collect();
    assert_eq!(ordered, vec![1_700_000_000_000, 1_700_000_000_001, 1_700_000_000_002, 1_700_000_001_000]);
}
