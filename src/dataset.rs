// src/dataset.rs

use crate::error::Result;
use crate::history::CommitHistory;
use crate::model::{Benchmark, DataSet, Sample, SeriesId};
use crate::store::GraphProvider;
use crate::time_filter::TimeRangeFilter;

/// Cartesian product of parameter axes, first axis varying slowest
pub struct Permutations<'a> {
    axes: &'a [Vec<String>],
    counters: Vec<usize>,
    done: bool,
}

impl<'a> Permutations<'a> {
    pub fn new(axes: &'a [Vec<String>]) -> Self {
        Self {
            axes,
            counters: vec![0; axes.len()],
            done: axes.iter().any(Vec::is_empty),
        }
    }
}

impl<'a> Iterator for Permutations<'a> {
    type Item = Vec<&'a str>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self
            .axes
            .iter()
            .zip(&self.counters)
            .map(|(axis, &i)| axis[i].as_str())
            .collect();

        // Advance like an odometer, rightmost axis first
        self.done = true;
        for (axis, counter) in self.axes.iter().zip(self.counters.iter_mut()).rev() {
            *counter += 1;
            if *counter < axis.len() {
                self.done = false;
                break;
            }
            *counter = 0;
        }
        Some(item)
    }
}

/// Data sets of one graph, one per parameter combination of its benchmark.
pub struct GraphDataSets<'f, 'h, H: CommitHistory> {
    filter: &'f mut TimeRangeFilter<'h, H>,
    branch: Option<&'f str>,
    series: Vec<Sample>,
    entries: Box<dyn Iterator<Item = (Option<usize>, String)> + 'f>,
}

impl<'f, 'h, H: CommitHistory> GraphDataSets<'f, 'h, H> {
    pub fn new<G: GraphProvider>(
        filter: &'f mut TimeRangeFilter<'h, H>,
        graph: &'f G,
        benchmark: &'f Benchmark,
    ) -> Result<Self> {
        let entries: Box<dyn Iterator<Item = (Option<usize>, String)> + 'f> = if benchmark.is_parameterized() {
            Box::new(
                Permutations::new(&benchmark.params)
                    .enumerate()
                    .map(move |(j, values)| (Some(j), format!("{}({})", benchmark.name, values.join(", ")))),
            )
        } else {
            Box::new(std::iter::once((None, benchmark.name.clone())))
        };

        Ok(Self {
            filter,
            branch: graph.params().get("branch").map(String::as_str),
            series: graph.series()?,
            entries,
        })
    }

    fn data_set(&mut self, param_index: Option<usize>, entry_name: String) -> Result<DataSet> {
        let allowed = self.filter.allowed_times(self.branch, &entry_name)?;
        let (times, values) = self
            .series
            .iter()
            .filter(|(time, _)| allowed.contains(time))
            .map(|(time, value)| (*time, value.value_for(param_index)))
            .unzip();

        Ok(DataSet {
            threshold: self.filter.threshold(self.branch, &entry_name),
            id: SeriesId {
                param_index,
                entry_name,
            },
            times,
            values,
        })
    }
}

impl<'f, 'h, H: CommitHistory> Iterator for GraphDataSets<'f, 'h, H> {
    type Item = Result<DataSet>;

    fn next(&mut self) -> Option<Self::Item> {
        let (param_index, entry_name) = self.entries.next()?;
        Some(self.data_set(param_index, entry_name))
    }
}
