// tests/common/mod.rs

#![allow(dead_code)]

use git_regress::model::{GraphParams, SampleValue, Time};
use git_regress::progress::ProgressSink;
use git_regress::MemoryGraph;

pub fn graph(path: &str, params: &[(&str, &str)], samples: Vec<(Time, SampleValue)>) -> MemoryGraph {
    MemoryGraph {
        path: path.to_string(),
        params: params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<GraphParams>(),
        samples,
    }
}

pub fn scalar_series(times: &[Time], values: &[f64]) -> Vec<(Time, SampleValue)> {
    times
        .iter()
        .zip(values)
        .map(|(&t, &v)| (t, SampleValue::Scalar(Some(v))))
        .collect()
}

#[derive(Default)]
pub struct CountingProgress {
    pub chars: usize,
}

impl ProgressSink for CountingProgress {
    fn add_char(&mut self, _c: char) {
        self.chars += 1;
    }

    fn add_percentage(&mut self, _percent: f64) {}
}
