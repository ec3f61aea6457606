// src/model.rs

use serde::ser::{SerializeTuple, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Commit-order key of a sample point
pub type Time = i64;

/// Graph parameters, e.g. `branch -> main`, `machine -> ci-1`
pub type GraphParams = BTreeMap<String, String>;

/// Identifies one series within a benchmark
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesId {
    /// Flat index into the parameter cartesian product, `None` when not parameterized
    pub param_index: Option<usize>,
    pub entry_name: String,
}

/// Raw value stored at a sample point of a graph
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    Scalar(Option<f64>),
    /// One value per parameter combination
    PerParam(Vec<Option<f64>>),
}

impl SampleValue {
    /// Value for one series of this sample point. A missing or mismatched
    /// shape reads as a missing value.
    pub fn value_for(&self, param_index: Option<usize>) -> Option<f64> {
        match (self, param_index) {
            (SampleValue::Scalar(v), None) => *v,
            (SampleValue::PerParam(values), Some(j)) => values.get(j).copied().flatten(),
            _ => None,
        }
    }
}

/// One `(time, value)` point of a raw graph series
pub type Sample = (Time, SampleValue);

/// Benchmark registry entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Benchmark {
    pub name: String,
    /// One axis of values per parameter; empty for non-parameterized benchmarks
    #[serde(default)]
    pub params: Vec<Vec<String>>,
}

impl Benchmark {
    pub fn is_parameterized(&self) -> bool {
        !self.params.is_empty()
    }
}

/// Aligned series handed to a worker for analysis
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    pub id: SeriesId,
    pub times: Vec<Time>,
    pub values: Vec<Option<f64>>,
    /// Minimum relative step size treated as a regression
    pub threshold: f64,
}

/// Upward step between two sample times. `before` is `None` when the
/// step is attributable to a single commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jump {
    pub before: Option<Time>,
    pub after: Time,
}

impl Serialize for Jump {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tup = serializer.serialize_tuple(2)?;
        tup.serialize_element(&self.before)?;
        tup.serialize_element(&self.after)?;
        tup.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JumpResult {
    pub jumps: Vec<Jump>,
    /// Most recent value
    pub current_value: f64,
    /// Best value seen in the history
    pub best_value: f64,
}

impl Serialize for JumpResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tup = serializer.serialize_tuple(3)?;
        tup.serialize_element(&self.jumps)?;
        tup.serialize_element(&self.current_value)?;
        tup.serialize_element(&self.best_value)?;
        tup.end()
    }
}

/// Output of one worker task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutput {
    pub id: SeriesId,
    pub result: Option<JumpResult>,
}

/// A reported regression, serialized positionally as
/// `[entry_name, graph_path, graph_params, param_index, result]`
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionRecord {
    pub entry_name: String,
    /// Graph path including the `.json` suffix
    pub graph_path: String,
    pub graph_params: GraphParams,
    pub param_index: Option<usize>,
    pub result: JumpResult,
}

impl Serialize for RegressionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tup = serializer.serialize_tuple(5)?;
        tup.serialize_element(&self.entry_name)?;
        tup.serialize_element(&self.graph_path)?;
        tup.serialize_element(&self.graph_params)?;
        tup.serialize_element(&self.param_index)?;
        tup.serialize_element(&self.result)?;
        tup.end()
    }
}

/// The complete results of the regression analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub regressions: Vec<RegressionRecord>,
}
