// src/history.rs

use crate::error::{Error, Result};
use crate::model::Time;
use git2::{Oid, Repository, Sort};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// A `from..to` commit range: commits reachable from `to` but not from `from`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeSpec {
    pub from: String,
    pub to: String,
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.from, self.to)
    }
}

/// Commit history queries needed to attribute regressions to commits
pub trait CommitHistory {
    fn range_spec(&self, from: &str, to: &str) -> RangeSpec {
        RangeSpec {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Range from `start_commit` up to the tip of `branch` (default branch if `None`)
    fn new_range_spec(&self, start_commit: &str, branch: Option<&str>) -> RangeSpec;

    /// Full hashes in the range, newest first
    fn hashes_in_range(&self, spec: &RangeSpec) -> Result<Vec<String>>;

    fn hash_from_name(&self, name: &str) -> Result<String>;
}

/// Truncates a hex hash to `len` characters
pub fn short_hash(hash: &str, len: usize) -> &str {
    hash.get(..len).unwrap_or(hash)
}

/// Commit history backed by a git repository
pub struct GitHistory {
    repo: Repository,
}

impl GitHistory {
    pub fn open(repo_path: &Path) -> Result<Self> {
        Ok(Self {
            repo: Repository::open(repo_path)?,
        })
    }

    /// Maps truncated commit hashes to their commit time in milliseconds,
    /// for every commit reachable from the given branches. Dates are unique
    /// and increase along the history, so a child never dates before its parent.
    pub fn commit_dates(
        &self,
        branches: &[Option<String>],
        hash_length: usize,
    ) -> Result<HashMap<String, Time>> {
        let mut revwalk = self.repo.revwalk()?;
        for branch in branches {
            match branch {
                Some(name) => {
                    let oid = self.repo.revparse_single(name)?.peel_to_commit()?.id();
                    revwalk.push(oid)?;
                }
                None => revwalk.push_head()?,
            }
        }
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)?;

        // Oldest first; commits sharing a second are spread one millisecond apart
        let mut dates = HashMap::new();
        let mut last: Option<Time> = None;
        for oid in revwalk {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;
            let mut date = commit.time().seconds() * 1000;
            if let Some(last) = last {
                date = date.max(last + 1);
            }
            last = Some(date);
            let hash = oid.to_string();
            dates.insert(short_hash(&hash, hash_length).to_string(), date);
        }
        Ok(dates)
    }

    /// Time span of the default branch history, in seconds since the epoch
    pub fn time_span(&self) -> Result<Option<(i64, i64)>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(Sort::TIME)?;

        let mut span: Option<(i64, i64)> = None;
        for oid in revwalk {
            let seconds = self.repo.find_commit(oid?)?.time().seconds();
            span = Some(match span {
                Some((first, last)) => (first.min(seconds), last.max(seconds)),
                None => (seconds, seconds),
            });
        }
        Ok(span)
    }

    fn resolve(&self, name: &str) -> Result<Oid> {
        Ok(self.repo.revparse_single(name)?.peel_to_commit()?.id())
    }
}

impl CommitHistory for GitHistory {
    fn new_range_spec(&self, start_commit: &str, branch: Option<&str>) -> RangeSpec {
        self.range_spec(start_commit, branch.unwrap_or("HEAD"))
    }

    fn hashes_in_range(&self, spec: &RangeSpec) -> Result<Vec<String>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(self.resolve(&spec.to)?)?;
        revwalk.hide(self.resolve(&spec.from)?)?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        let mut hashes = Vec::new();
        for oid in revwalk {
            hashes.push(oid?.to_string());
        }
        Ok(hashes)
    }

    fn hash_from_name(&self, name: &str) -> Result<String> {
        Ok(self.resolve(name)?.to_string())
    }
}

/// In-memory linear history `c0000000`, `c0000001`, ... oldest first.
/// Names that are not commit prefixes resolve to the tip.
pub struct MemoryHistory {
    pub commits: Vec<String>,
    range_calls: Cell<usize>,
    range_requests: RefCell<Vec<(String, Option<String>)>>,
}

impl MemoryHistory {
    pub fn new(len: usize) -> Self {
        Self {
            commits: (0..len).map(|i| format!("c{i:07}")).collect(),
            range_calls: Cell::new(0),
            range_requests: RefCell::new(Vec::new()),
        }
    }

    /// Dates `1, 2, ...` for every `step`-th commit
    pub fn dates_every(&self, step: usize) -> HashMap<String, Time> {
        self.commits
            .iter()
            .step_by(step.max(1))
            .enumerate()
            .map(|(i, hash)| (hash.clone(), i as Time + 1))
            .collect()
    }

    /// Number of `hashes_in_range` calls so far
    pub fn range_calls(&self) -> usize {
        self.range_calls.get()
    }

    /// `(start_commit, branch)` of every `new_range_spec` call so far
    pub fn range_requests(&self) -> Vec<(String, Option<String>)> {
        self.range_requests.borrow().clone()
    }

    fn position(&self, name: &str) -> usize {
        self.commits
            .iter()
            .position(|c| c.starts_with(name))
            .unwrap_or(self.commits.len().saturating_sub(1))
    }
}

impl CommitHistory for MemoryHistory {
    fn new_range_spec(&self, start_commit: &str, branch: Option<&str>) -> RangeSpec {
        self.range_requests
            .borrow_mut()
            .push((start_commit.to_string(), branch.map(String::from)));
        self.range_spec(start_commit, branch.unwrap_or("HEAD"))
    }

    fn hashes_in_range(&self, spec: &RangeSpec) -> Result<Vec<String>> {
        self.range_calls.set(self.range_calls.get() + 1);
        let (from, to) = (self.position(&spec.from), self.position(&spec.to));
        if to <= from {
            return Ok(Vec::new());
        }
        Ok(self.commits[from + 1..=to].iter().rev().cloned().collect())
    }

    fn hash_from_name(&self, name: &str) -> Result<String> {
        self.commits
            .get(self.position(name))
            .cloned()
            .ok_or_else(|| Error::UnknownCommit(name.to_string()))
    }
}
