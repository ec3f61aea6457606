// src/step_detect.rs

use thiserror::Error;

/// Outcome of change-point detection on one series
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Most recent level, `None` when the series has no regression
    pub current: Option<f64>,
    /// Index of the last present sample before each upward step
    pub jumps: Vec<usize>,
    /// Lowest level reached in the history
    pub best: f64,
}

impl Detection {
    fn none(best: f64) -> Self {
        Self {
            current: None,
            jumps: Vec::new(),
            best,
        }
    }
}

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("non-finite value {value} at index {index}")]
    NonFiniteValue { index: usize, value: f64 },
}

impl DetectError {
    /// Short name of the failure kind
    pub fn category(&self) -> &'static str {
        match self {
            DetectError::NonFiniteValue { .. } => "NonFiniteValue",
        }
    }
}

/// Change-point detection run on worker threads
pub trait StepDetector: Send + Sync {
    /// Finds upward steps in `values`, ignoring missing entries. Steps smaller
    /// than `threshold` relative to the level before them are not reported.
    fn detect(&self, values: &[Option<f64>], threshold: f64) -> Result<Detection, DetectError>;
}

/// Fits a piecewise-constant model by optimal partitioning and reports the
/// upward steps that were never recovered from.
#[derive(Debug, Clone)]
pub struct PiecewiseStepDetector {
    /// Multiplier of the `sigma^2 * ln(n)` cost charged per extra segment
    pub penalty_factor: f64,
}

impl Default for PiecewiseStepDetector {
    fn default() -> Self {
        Self { penalty_factor: 2.0 }
    }
}

impl StepDetector for PiecewiseStepDetector {
    fn detect(&self, values: &[Option<f64>], threshold: f64) -> Result<Detection, DetectError> {
        let mut points = Vec::with_capacity(values.len());
        for (index, value) in values.iter().enumerate() {
            if let Some(value) = *value {
                if !value.is_finite() {
                    return Err(DetectError::NonFiniteValue { index, value });
                }
                points.push((index, value));
            }
        }
        if points.len() < 2 {
            return Ok(Detection::none(points.first().map_or(0.0, |p| p.1)));
        }

        let y: Vec<f64> = points.iter().map(|p| p.1).collect();
        let segments = self.segment(&y);
        let levels: Vec<f64> = segments.iter().map(|&(l, r)| mean(&y[l..r])).collect();
        let best = levels.iter().copied().fold(f64::INFINITY, f64::min);

        // Lowest level from each segment onwards
        let mut min_after = levels.clone();
        for k in (0..levels.len().saturating_sub(1)).rev() {
            min_after[k] = min_after[k].min(min_after[k + 1]);
        }

        let mut jumps = Vec::new();
        for k in 0..levels.len() - 1 {
            let rise = min_after[k + 1] - levels[k];
            if rise > 0.0 && rise > threshold * levels[k].abs() {
                let last_point = segments[k].1 - 1;
                jumps.push(points[last_point].0);
            }
        }

        if jumps.is_empty() {
            return Ok(Detection::none(best));
        }
        Ok(Detection {
            current: levels.last().copied(),
            jumps,
            best,
        })
    }
}

impl PiecewiseStepDetector {
    /// Returns `[start, end)` index ranges of the best-fitting segmentation.
    fn segment(&self, y: &[f64]) -> Vec<(usize, usize)> {
        let n = y.len();
        let mut sum = vec![0.0; n + 1];
        let mut sum_sq = vec![0.0; n + 1];
        for (i, v) in y.iter().enumerate() {
            sum[i + 1] = sum[i] + v;
            sum_sq[i + 1] = sum_sq[i] + v * v;
        }
        let cost = |l: usize, r: usize| {
            let s = sum[r] - sum[l];
            (sum_sq[r] - sum_sq[l] - s * s / (r - l) as f64).max(0.0)
        };

        let sigma = noise_level(y);
        let scale = 1.0 + mean(y).powi(2);
        let penalty = (self.penalty_factor * sigma * sigma * (n as f64).ln()).max(1e-12 * scale);

        let mut best = vec![0.0; n + 1];
        let mut split = vec![0usize; n + 1];
        best[0] = -penalty;
        for r in 1..=n {
            let mut min = f64::INFINITY;
            for l in 0..r {
                let total = best[l] + cost(l, r) + penalty;
                if total < min {
                    min = total;
                    split[r] = l;
                }
            }
            best[r] = min;
        }

        let mut segments = Vec::new();
        let mut r = n;
        while r > 0 {
            let l = split[r];
            segments.push((l, r));
            r = l;
        }
        segments.reverse();
        segments
    }
}

/// Robust standard deviation estimate from successive differences.
fn noise_level(y: &[f64]) -> f64 {
    let mut diffs: Vec<f64> = y.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    if diffs.is_empty() {
        return 0.0;
    }
    diffs.sort_by(f64::total_cmp);
    let median = diffs[diffs.len() / 2];
    median / (0.6745 * std::f64::consts::SQRT_2)
}

fn mean(y: &[f64]) -> f64 {
    y.iter().sum::<f64>() / y.len() as f64
}
