// src/time_filter.rs

use crate::config::{Config, EntryPattern, FirstCommitRule, DEFAULT_THRESHOLD};
use crate::error::Result;
use crate::history::{short_hash, CommitHistory};
use crate::model::Time;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Decides which sample times of a series take part in regression analysis,
/// following the configured first-commit rules.
pub struct TimeRangeFilter<'a, H: CommitHistory> {
    history: &'a H,
    hash_to_date: &'a HashMap<String, Time>,
    rules: Vec<FirstCommitRule>,
    thresholds: Vec<(EntryPattern, f64)>,
    default_branch_only: bool,
    hash_length: usize,
    /// Eligible times per `(start_commit, branch)`
    time_sets: HashMap<(String, Option<String>), HashSet<Time>>,
}

impl<'a, H: CommitHistory> TimeRangeFilter<'a, H> {
    pub fn new(config: &Config, history: &'a H, hash_to_date: &'a HashMap<String, Time>) -> Result<Self> {
        Ok(Self {
            history,
            hash_to_date,
            rules: config.first_commit_rules()?,
            thresholds: config.threshold_rules()?,
            default_branch_only: config.default_branch_only(),
            hash_length: config.hash_length,
            time_sets: HashMap::new(),
        })
    }

    /// Times allowed for `entry_name` on a graph of the given branch.
    /// Every matching rule narrows the set; a rule without a start commit empties it.
    pub fn allowed_times(&mut self, branch: Option<&str>, entry_name: &str) -> Result<HashSet<Time>> {
        let mut time_set: HashSet<Time> = self.hash_to_date.values().copied().collect();
        let key = match_key(entry_name, branch);

        for i in 0..self.rules.len() {
            if !self.rules[i].pattern.matches(&key) {
                continue;
            }
            let Some(start_commit) = self.rules[i].start_commit.clone() else {
                debug!(entry = entry_name, rule = self.rules[i].pattern.as_str(), "regression detection disabled");
                return Ok(HashSet::new());
            };

            let cache_key = if self.default_branch_only {
                (start_commit, None)
            } else {
                (start_commit, branch.map(String::from))
            };
            let range_times = self.range_times(cache_key)?;
            time_set.retain(|t| range_times.contains(t));
        }

        Ok(time_set)
    }

    /// Relative threshold for `entry_name`: the largest of all matching rules.
    pub fn threshold(&self, branch: Option<&str>, entry_name: &str) -> f64 {
        let key = match_key(entry_name, branch);
        self.thresholds
            .iter()
            .filter(|(pattern, _)| pattern.matches(&key))
            .map(|&(_, threshold)| threshold)
            .reduce(f64::max)
            .unwrap_or(DEFAULT_THRESHOLD)
    }

    fn range_times(&mut self, key: (String, Option<String>)) -> Result<&HashSet<Time>> {
        if !self.time_sets.contains_key(&key) {
            let (start_commit, branch) = &key;
            let spec = self.history.new_range_spec(start_commit, branch.as_deref());
            let start_hash = self.history.hash_from_name(start_commit)?;
            let hashes = self.history.hashes_in_range(&spec)?;

            let mut times = HashSet::new();
            for hash in std::iter::once(&start_hash).chain(hashes.iter()) {
                match self.hash_to_date.get(short_hash(hash, self.hash_length)) {
                    Some(&time) => {
                        times.insert(time);
                    }
                    None => debug!(commit = hash.as_str(), "no date known for commit"),
                }
            }
            debug!(range = %spec, commits = times.len(), "resolved first-commit range");
            self.time_sets.insert(key.clone(), times);
        }
        Ok(&self.time_sets[&key])
    }
}

fn match_key(entry_name: &str, branch: Option<&str>) -> String {
    match branch {
        Some(branch) if !branch.is_empty() => format!("{entry_name}@{branch}"),
        _ => entry_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistory;

    fn dates(history: &MemoryHistory) -> HashMap<String, Time> {
        history
            .commits
            .iter()
            .enumerate()
            .map(|(i, hash)| (hash.clone(), i as Time + 1))
            .collect()
    }

    fn config(rules: &[(&str, Option<&str>)]) -> Config {
        Config {
            regressions_first_commits: rules
                .iter()
                .map(|(p, c)| (p.to_string(), c.map(String::from)))
                .collect(),
            ..Config::default()
        }
    }

    fn sorted(set: HashSet<Time>) -> Vec<Time> {
        let mut v: Vec<Time> = set.into_iter().collect();
        v.sort();
        v
    }

    #[test]
    fn no_rules_allows_every_known_date() {
        let history = MemoryHistory::new(5);
        let dates = dates(&history);
        let mut filter = TimeRangeFilter::new(&config(&[]), &history, &dates).unwrap();
        assert_eq!(sorted(filter.allowed_times(None, "time_foo").unwrap()), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn start_commit_limits_to_range_including_start() {
        let history = MemoryHistory::new(6);
        let dates = dates(&history);
        let start = history.commits[2].clone();
        let cfg = config(&[("time_", Some(start.as_str()))]);
        let mut filter = TimeRangeFilter::new(&cfg, &history, &dates).unwrap();
        assert_eq!(sorted(filter.allowed_times(None, "time_foo").unwrap()), vec![3, 4, 5, 6]);
        assert_eq!(sorted(filter.allowed_times(None, "mem_foo").unwrap()), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn all_matching_rules_intersect() {
        let history = MemoryHistory::new(6);
        let dates = dates(&history);
        let (c1, c3) = (history.commits[1].clone(), history.commits[3].clone());
        let cfg = config(&[("time_.*", Some(c1.as_str())), ("time_foo", Some(c3.as_str()))]);
        let mut filter = TimeRangeFilter::new(&cfg, &history, &dates).unwrap();
        assert_eq!(sorted(filter.allowed_times(None, "time_foo").unwrap()), vec![4, 5, 6]);
        assert_eq!(sorted(filter.allowed_times(None, "time_bar").unwrap()), vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn null_start_commit_disables_entry() {
        let history = MemoryHistory::new(4);
        let dates = dates(&history);
        let first = history.commits[0].clone();
        let cfg = config(&[("time_foo", None), (".*", Some(first.as_str()))]);
        let mut filter = TimeRangeFilter::new(&cfg, &history, &dates).unwrap();
        assert!(filter.allowed_times(None, "time_foo").unwrap().is_empty());
    }

    #[test]
    fn branch_suffix_takes_part_in_matching() {
        let history = MemoryHistory::new(3);
        let dates = dates(&history);
        let cfg = config(&[(".*@stable", None)]);
        let mut filter = TimeRangeFilter::new(&cfg, &history, &dates).unwrap();
        assert!(filter.allowed_times(Some("stable"), "time_foo").unwrap().is_empty());
        assert_eq!(filter.allowed_times(Some("main"), "time_foo").unwrap().len(), 3);
        assert_eq!(filter.allowed_times(None, "time_foo").unwrap().len(), 3);
    }

    #[test]
    fn commits_without_dates_are_dropped() {
        let history = MemoryHistory::new(5);
        let mut dates = dates(&history);
        dates.remove(&history.commits[3]);
        let start = history.commits[1].clone();
        let cfg = config(&[(".*", Some(start.as_str()))]);
        let mut filter = TimeRangeFilter::new(&cfg, &history, &dates).unwrap();
        assert_eq!(sorted(filter.allowed_times(None, "x").unwrap()), vec![2, 3, 5]);
    }

    #[test]
    fn range_lookups_are_cached_per_start_commit() {
        let history = MemoryHistory::new(5);
        let dates = dates(&history);
        let start = history.commits[1].clone();
        let cfg = config(&[(".*", Some(start.as_str()))]);
        let mut filter = TimeRangeFilter::new(&cfg, &history, &dates).unwrap();
        for name in ["a", "b", "c"] {
            filter.allowed_times(None, name).unwrap();
        }
        assert_eq!(history.range_calls(), 1);
    }

    #[test]
    fn range_lookups_are_per_branch_when_several_branches_are_tracked() {
        let history = MemoryHistory::new(5);
        let dates = dates(&history);
        let start = history.commits[1].clone();
        let mut cfg = config(&[(".*", Some(start.as_str()))]);
        cfg.branches = vec![Some("main".to_string()), Some("dev".to_string())];
        let mut filter = TimeRangeFilter::new(&cfg, &history, &dates).unwrap();
        for branch in ["main", "dev", "main", "dev"] {
            for name in ["time_foo", "time_bar"] {
                assert_eq!(sorted(filter.allowed_times(Some(branch), name).unwrap()), vec![2, 3, 4, 5]);
            }
        }
        assert_eq!(
            history.range_requests(),
            vec![
                (start.clone(), Some("main".to_string())),
                (start.clone(), Some("dev".to_string())),
            ]
        );
        assert_eq!(history.range_calls(), 2);
    }

    #[test]
    fn default_branch_only_shares_one_range_across_branches() {
        let history = MemoryHistory::new(5);
        let dates = dates(&history);
        let start = history.commits[1].clone();
        let cfg = config(&[(".*", Some(start.as_str()))]);
        let mut filter = TimeRangeFilter::new(&cfg, &history, &dates).unwrap();
        for branch in [Some("main"), Some("dev"), None] {
            filter.allowed_times(branch, "time_foo").unwrap();
        }
        assert_eq!(history.range_requests(), vec![(start, None)]);
        assert_eq!(history.range_calls(), 1);
    }

    #[test]
    fn threshold_takes_largest_matching_rule() {
        let history = MemoryHistory::new(1);
        let dates = dates(&history);
        let cfg = Config {
            regressions_thresholds: vec![
                ("time_".to_string(), 0.2),
                (".*".to_string(), 0.1),
                ("mem_".to_string(), 0.9),
            ],
            ..Config::default()
        };
        let filter = TimeRangeFilter::new(&cfg, &history, &dates).unwrap();
        assert_eq!(filter.threshold(None, "time_foo"), 0.2);
        assert_eq!(filter.threshold(None, "track_foo"), 0.1);

        let plain = TimeRangeFilter::new(&Config::default(), &history, &dates).unwrap();
        assert_eq!(plain.threshold(None, "time_foo"), DEFAULT_THRESHOLD);
    }
}
