// src/analyzer.rs

use crate::config::Config;
use crate::dataset::GraphDataSets;
use crate::error::{AnalysisFailure, Result};
use crate::history::CommitHistory;
use crate::merger::{observe_params, RegressionMerger};
use crate::model::{Benchmark, DataSet, Jump, JumpResult, Report, TaskOutput, Time};
use crate::pool::{TaskHandle, WorkerPool};
use crate::progress::{ProgressSink, Throttle};
use crate::step_detect::StepDetector;
use crate::store::GraphProvider;
use crate::time_filter::TimeRangeFilter;
use std::backtrace::Backtrace;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// Runs change-point detection over every graph and merges the results.
pub struct Analyzer<'a, H: CommitHistory> {
    pub config: &'a Config,
    pub history: &'a H,
    /// Truncated commit hash -> commit-order key
    pub hash_to_date: &'a HashMap<String, Time>,
    pub detector: Arc<dyn StepDetector>,
    /// Number of worker threads
    pub jobs: usize,
}

impl<'a, H: CommitHistory> Analyzer<'a, H> {
    pub fn analyze<G: GraphProvider>(
        &self,
        graphs: &[G],
        benchmarks: &BTreeMap<String, Benchmark>,
        progress: &mut dyn ProgressSink,
    ) -> Result<Report> {
        let mut filter = TimeRangeFilter::new(self.config, self.history, self.hash_to_date)?;
        let mut merger = RegressionMerger::new(self.history, self.hash_to_date, observe_params(graphs));
        let mut throttle = Throttle::new(progress, PROGRESS_INTERVAL);

        let pool = WorkerPool::new(self.jobs)?;
        let mut pending: VecDeque<(TaskHandle<TaskOutput>, &G)> = VecDeque::new();
        let mut submitted = 0usize;

        // 1. Submit one task per data set, collecting the oldest once the pool is saturated
        for (j, graph) in graphs.iter().enumerate() {
            if graph.params().contains_key("summary") {
                continue;
            }
            throttle.visit(j, graphs.len());

            let Some(benchmark) = benchmarks.get(graph.benchmark_name()) else {
                debug!(graph = graph.path(), "no benchmark registered for graph");
                continue;
            };

            for data_set in GraphDataSets::new(&mut filter, graph, benchmark)? {
                let data_set = data_set?;
                let entry_name = data_set.id.entry_name.clone();
                let detector = Arc::clone(&self.detector);
                let handle = pool.submit(&entry_name, move || analyze_data_set(detector.as_ref(), data_set));
                pending.push_back((handle, graph));
                submitted += 1;

                while pending.len() > pool.size() {
                    if let Some((handle, graph)) = pending.pop_front() {
                        merger.insert(handle.wait()?, graph)?;
                    }
                }
            }
        }

        // 2. Collect whatever is still in flight
        while let Some((handle, graph)) = pending.pop_front() {
            merger.insert(handle.wait()?, graph)?;
        }

        let report = merger.finish();
        info!(series = submitted, regressions = report.regressions.len(), "analysis finished");
        Ok(report)
    }
}

/// Turns detected step positions into `(time before, time after)` pairs.
/// The time after a step is the next sample that has a value.
pub fn analyze_data_set(detector: &dyn StepDetector, data: DataSet) -> std::result::Result<TaskOutput, AnalysisFailure> {
    let failure = |message: String, category: &str| AnalysisFailure {
        entry_name: data.id.entry_name.clone(),
        message,
        category: category.to_string(),
        trace: Backtrace::force_capture().to_string(),
    };

    let detection = detector
        .detect(&data.values, data.threshold)
        .map_err(|err| failure(err.to_string(), err.category()))?;
    let Some(current_value) = detection.current else {
        return Ok(TaskOutput {
            id: data.id,
            result: None,
        });
    };

    let mut jumps = Vec::with_capacity(detection.jumps.len());
    for &r in &detection.jumps {
        let next = (r + 1..data.values.len())
            .find(|&k| data.values[k].is_some())
            .unwrap_or(r + 1);
        match (data.times.get(r), data.times.get(next)) {
            (Some(&before), Some(&after)) => jumps.push(Jump {
                before: Some(before),
                after,
            }),
            _ => {
                return Err(failure(
                    format!("jump position {r} outside series of length {}", data.times.len()),
                    "InvalidJumpPosition",
                ))
            }
        }
    }

    Ok(TaskOutput {
        id: data.id,
        result: Some(JumpResult {
            jumps,
            current_value,
            best_value: detection.best,
        }),
    })
}
