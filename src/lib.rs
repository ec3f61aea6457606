// src/lib.rs

pub mod analyzer;
pub mod config;
pub mod dataset;
pub mod error;
pub mod history;
pub mod merger;
pub mod model;
pub mod pool;
pub mod progress;
pub mod report;
pub mod step_detect;
pub mod store;
pub mod time_filter;

pub use analyzer::Analyzer;
pub use config::Config;
pub use error::{AnalysisFailure, Error, Result};
pub use history::{CommitHistory, GitHistory, MemoryHistory, RangeSpec};
pub use model::{Report, RegressionRecord};
pub use step_detect::{PiecewiseStepDetector, StepDetector};
pub use store::{GraphProvider, MemoryGraph};
