//! Piecewise-linear lookup curves shared by the reference tables.

use emulator_spi::{EmulatorError, Result};
use std::path::Path;

/// A validated curve `y = f(x)` sampled at strictly ascending `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupCurve {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl LookupCurve {
    /// Validate sample points. `source` names the table for error messages.
    pub fn new(source: &Path, name: &str, x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        let invalid = |reason: String| EmulatorError::InvalidArtifact {
            path: source.to_path_buf(),
            reason: format!("{name}: {reason}"),
        };
        if x.len() < 2 {
            return Err(invalid(format!("need at least 2 points, got {}", x.len())));
        }
        if x.len() != y.len() {
            return Err(invalid(format!(
                "{} sample points but {} values",
                x.len(),
                y.len()
            )));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(invalid("contains non-finite values".to_string()));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(invalid("sample points must be strictly ascending".to_string()));
        }
        Ok(Self { x, y })
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    /// Linear interpolation; `None` outside the sampled domain.
    pub fn at(&self, x: f64) -> Option<f64> {
        let (lo, hi) = self.domain();
        if !(lo..=hi).contains(&x) {
            return None;
        }
        // First sample point >= x
        let idx = self.x.partition_point(|&p| p < x);
        if idx == 0 {
            return Some(self.y[0]);
        }
        let (x0, x1) = (self.x[idx - 1], self.x[idx]);
        let (y0, y1) = (self.y[idx - 1], self.y[idx]);
        Some(y0 + (y1 - y0) * (x - x0) / (x1 - x0))
    }
}
