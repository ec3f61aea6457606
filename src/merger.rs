// src/merger.rs

use crate::error::Result;
use crate::history::CommitHistory;
use crate::model::{GraphParams, JumpResult, RegressionRecord, Report, TaskOutput, Time};
use crate::store::GraphProvider;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Values observed for each graph parameter across the whole collection
pub type ObservedParams = HashMap<String, BTreeSet<String>>;

/// Collects parameter values over every graph, summary graphs included.
pub fn observe_params<'g, G: GraphProvider + 'g>(graphs: impl IntoIterator<Item = &'g G>) -> ObservedParams {
    let mut observed = ObservedParams::new();
    for graph in graphs {
        for (key, value) in graph.params() {
            let values = observed.entry(key.clone()).or_default();
            if !value.is_empty() {
                values.insert(value.clone());
            }
        }
    }
    observed
}

/// True when `new` is a worse regression than `old`, comparing
/// `new.current / new.best` against `old.current / old.best` without dividing.
pub fn is_worse(old: &JumpResult, new: &JumpResult) -> bool {
    (old.current_value * new.best_value).abs() < (new.current_value * old.best_value).abs()
}

/// Maps each date back to its commit. Of several hashes sharing a date the
/// lexicographically smallest one is kept, so the choice is the same on every run.
fn invert_dates(hash_to_date: &HashMap<String, Time>) -> HashMap<Time, String> {
    let mut date_to_hash: HashMap<Time, String> = HashMap::with_capacity(hash_to_date.len());
    for (hash, &date) in hash_to_date {
        date_to_hash
            .entry(date)
            .and_modify(|kept| {
                if hash.as_str() < kept.as_str() {
                    kept.clone_from(hash);
                }
            })
            .or_insert_with(|| hash.clone());
    }
    date_to_hash
}

/// Builds the report, keeping only the worst regression per entry and branch.
pub struct RegressionMerger<'a, H: CommitHistory> {
    history: &'a H,
    date_to_hash: HashMap<Time, String>,
    observed: ObservedParams,
    regressions: Vec<RegressionRecord>,
    /// `(entry_name, branch)` -> position in `regressions`
    seen: HashMap<(String, Option<String>), usize>,
}

impl<'a, H: CommitHistory> RegressionMerger<'a, H> {
    pub fn new(history: &'a H, hash_to_date: &HashMap<String, Time>, observed: ObservedParams) -> Self {
        Self {
            history,
            date_to_hash: invert_dates(hash_to_date),
            observed,
            regressions: Vec::new(),
            seen: HashMap::new(),
        }
    }

    pub fn insert<G: GraphProvider>(&mut self, output: TaskOutput, graph: &G) -> Result<()> {
        let Some(mut result) = output.result else {
            return Ok(());
        };
        self.mark_single_commit_jumps(&mut result)?;

        let graph_params: GraphParams = graph
            .params()
            .iter()
            .filter(|(key, _)| self.observed.get(*key).is_some_and(|values| values.len() > 1))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let key = (output.id.entry_name.clone(), graph_params.get("branch").cloned());

        let record = RegressionRecord {
            entry_name: output.id.entry_name,
            graph_path: format!("{}.json", graph.path()),
            graph_params,
            param_index: output.id.param_index,
            result,
        };

        match self.seen.get(&key) {
            None => {
                self.seen.insert(key, self.regressions.len());
                self.regressions.push(record);
            }
            Some(&slot) => {
                if is_worse(&self.regressions[slot].result, &record.result) {
                    debug!(entry = record.entry_name.as_str(), "replacing regression with a worse one");
                    self.regressions[slot] = record;
                }
            }
        }
        Ok(())
    }

    pub fn finish(self) -> Report {
        Report {
            regressions: self.regressions,
        }
    }

    /// Drops the lower bound of jumps whose range holds a single commit.
    fn mark_single_commit_jumps(&self, result: &mut JumpResult) -> Result<()> {
        for jump in &mut result.jumps {
            let Some(before) = jump.before else {
                continue;
            };
            let (Some(commit_a), Some(commit_b)) = (self.date_to_hash.get(&before), self.date_to_hash.get(&jump.after))
            else {
                debug!(before, after = jump.after, "jump times without a known commit");
                continue;
            };
            let spec = self.history.range_spec(commit_a, commit_b);
            if self.history.hashes_in_range(&spec)?.len() == 1 {
                jump.before = None;
            }
        }
        Ok(())
    }
}
