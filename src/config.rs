// src/config.rs

use crate::error::{Error, Result};
use regex::Regex;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

pub const DEFAULT_THRESHOLD: f64 = 0.05;

/// Settings read from the JSON configuration file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the git repository holding the benchmarked project
    pub repo: PathBuf,
    /// Directory holding `graphs/` and receiving `regressions.json`
    pub html_dir: PathBuf,
    /// Directory holding `benchmarks.json`
    pub results_dir: PathBuf,
    /// Branches analyzed; `null` stands for the default branch
    pub branches: Vec<Option<String>>,
    /// Number of hex digits commit hashes are truncated to
    pub hash_length: usize,
    /// Entry regex -> first commit to analyze, `null` disables detection
    #[serde(deserialize_with = "ordered_rules")]
    pub regressions_first_commits: Vec<(String, Option<String>)>,
    /// Entry regex -> relative regression threshold
    #[serde(deserialize_with = "ordered_rules")]
    pub regressions_thresholds: Vec<(String, f64)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo: PathBuf::from("."),
            html_dir: PathBuf::from("html"),
            results_dir: PathBuf::from("results"),
            branches: vec![None],
            hash_length: 8,
            regressions_first_commits: Vec::new(),
            regressions_thresholds: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// True when only the default branch is analyzed
    pub fn default_branch_only(&self) -> bool {
        self.branches.len() == 1 && self.branches[0].is_none()
    }

    pub fn first_commit_rules(&self) -> Result<Vec<FirstCommitRule>> {
        self.regressions_first_commits
            .iter()
            .map(|(pattern, start_commit)| {
                Ok(FirstCommitRule {
                    pattern: EntryPattern::new(pattern)?,
                    start_commit: start_commit.clone(),
                })
            })
            .collect()
    }

    pub fn threshold_rules(&self) -> Result<Vec<(EntryPattern, f64)>> {
        self.regressions_thresholds
            .iter()
            .map(|(pattern, threshold)| {
                if !threshold.is_finite() || *threshold < 0.0 {
                    return Err(Error::InvalidThreshold {
                        pattern: pattern.clone(),
                        value: *threshold,
                    });
                }
                Ok((EntryPattern::new(pattern)?, *threshold))
            })
            .collect()
    }
}

/// Regex matched against the start of `entry_name + "@" + branch`
#[derive(Debug, Clone)]
pub struct EntryPattern {
    source: String,
    regex: Regex,
}

impl EntryPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|source| Error::Regex {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}

#[derive(Debug, Clone)]
pub struct FirstCommitRule {
    pub pattern: EntryPattern,
    /// `None` disables regression detection for matching entries
    pub start_commit: Option<String>,
}

/// Reads a JSON object into a list of pairs, keeping the file's key order.
fn ordered_rules<'de, D, V>(deserializer: D) -> std::result::Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct RulesVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for RulesVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an object mapping entry regexes to values")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
            let mut rules = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, V>()? {
                rules.push((key, value));
            }
            Ok(rules)
        }
    }

    deserializer.deserialize_map(RulesVisitor(PhantomData))
}
