//! Stage stopwatch for pipeline runs.
//!
//! A [`StageTimer`] wraps each stage of a run with wall-clock capture and
//! produces a [`BenchmarkRecord`] mapping stage names to elapsed seconds,
//! plus a `total` entry spanning the whole timer lifetime.
//!
//! # Example
//!
//! ```ignore
//! use bench_harness::StageTimer;
//!
//! let mut timer = StageTimer::new(true);
//! let batch = timer.time("build", || build_batch());
//! let output = timer.time("predict", || run(&batch));
//! let record = timer.finish().unwrap();
//! println!("{:.3}s total", record.total());
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Name of the entry holding the wall-clock span of the whole run.
pub const TOTAL: &str = "total";

/// Elapsed seconds per pipeline stage, in the order stages first ran.
///
/// Always contains a [`TOTAL`] entry as its last key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BenchmarkRecord {
    entries: IndexMap<String, f64>,
}

impl BenchmarkRecord {
    fn from_parts(mut stages: IndexMap<String, f64>, total: Duration) -> Self {
        stages.shift_remove(TOTAL);
        stages.insert(TOTAL.to_string(), total.as_secs_f64());
        Self { entries: stages }
    }

    /// Wall-clock span of the whole run in seconds.
    pub fn total(&self) -> f64 {
        self.entries.get(TOTAL).copied().unwrap_or_default()
    }

    /// Elapsed seconds for a stage (or `total`).
    pub fn get(&self, stage: &str) -> Option<f64> {
        self.entries.get(stage).copied()
    }

    /// Stage entries in execution order, excluding `total`.
    pub fn stages(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries
            .iter()
            .filter(|(name, _)| name.as_str() != TOTAL)
            .map(|(name, secs)| (name.as_str(), *secs))
    }

    /// Sum of all stage entries, excluding `total`.
    pub fn stage_sum(&self) -> f64 {
        self.stages().map(|(_, secs)| secs).sum()
    }

    /// All entries including `total`.
    pub fn entries(&self) -> &IndexMap<String, f64> {
        &self.entries
    }

    /// Format the record as table rows, one per entry.
    pub fn as_rows(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(name, secs)| format!("{:30} {:>10.4}s", name, secs))
            .collect()
    }
}

/// Wall-clock capture for named pipeline stages.
///
/// A disabled timer runs closures without measuring them and finishes
/// with no record, so callers can thread one through unconditionally.
#[derive(Debug)]
pub struct StageTimer {
    enabled: bool,
    started: Instant,
    stages: IndexMap<String, f64>,
}

impl StageTimer {
    /// Start a timer. The `total` span starts now.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            started: Instant::now(),
            stages: IndexMap::new(),
        }
    }

    /// A timer that records nothing.
    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Run `f` as stage `stage`, adding its elapsed time to that stage.
    ///
    /// Repeated stages accumulate. The closure's return value is passed
    /// through untouched.
    pub fn time<F, R>(&mut self, stage: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }
        let start = Instant::now();
        let result = f();
        self.record(stage, start.elapsed());
        result
    }

    /// Add an externally measured duration to a stage.
    pub fn record(&mut self, stage: &str, elapsed: Duration) {
        if !self.enabled {
            return;
        }
        tracing::trace!(stage, secs = elapsed.as_secs_f64(), "stage finished");
        *self.stages.entry(stage.to_string()).or_insert(0.0) += elapsed.as_secs_f64();
    }

    /// Stop the timer. Returns `None` when disabled.
    pub fn finish(self) -> Option<BenchmarkRecord> {
        if !self.enabled {
            return None;
        }
        Some(BenchmarkRecord::from_parts(self.stages, self.started.elapsed()))
    }
}

impl Default for StageTimer {
    fn default() -> Self {
        Self::disabled()
    }
}
