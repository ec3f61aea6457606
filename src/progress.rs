// src/progress.rs

use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// Receives progress updates from the analysis coordinator
pub trait ProgressSink {
    /// One more graph was visited
    fn add_char(&mut self, c: char);

    /// Fraction of the graph collection visited so far, in percent
    fn add_percentage(&mut self, percent: f64);
}

/// Discards all progress
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn add_char(&mut self, _c: char) {}

    fn add_percentage(&mut self, _percent: f64) {}
}

/// Progress bar over the graph collection
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(total_graphs: usize) -> Self {
        let bar = ProgressBar::new(total_graphs as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}") {
            bar.set_style(style);
        }
        bar.set_message("Analyzing graphs");
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Analysis complete");
    }
}

impl ProgressSink for BarProgress {
    fn add_char(&mut self, _c: char) {
        self.bar.inc(1);
    }

    fn add_percentage(&mut self, percent: f64) {
        self.bar.set_message(format!("Analyzing graphs ({percent:.0}%)"));
    }
}

/// Forwards every tick to a sink, and the percentage at most once per interval.
pub struct Throttle<'a, P: ProgressSink + ?Sized> {
    sink: &'a mut P,
    interval: Duration,
    last_report: Instant,
}

impl<'a, P: ProgressSink + ?Sized> Throttle<'a, P> {
    pub fn new(sink: &'a mut P, interval: Duration) -> Self {
        Self {
            sink,
            interval,
            last_report: Instant::now(),
        }
    }

    /// Reports that graph `index` of `total` is being visited.
    pub fn visit(&mut self, index: usize, total: usize) {
        self.sink.add_char('.');
        if self.last_report.elapsed() > self.interval {
            self.sink.add_percentage(100.0 * index as f64 / total.max(1) as f64);
            self.last_report = Instant::now();
        }
    }
}
