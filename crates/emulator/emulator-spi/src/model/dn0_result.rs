//! Aggregated net efficacy.

use serde::{Deserialize, Serialize};

/// Combined insecticide efficacy and net usage for one period.
///
/// Fields are read through accessors so a result cannot be altered after
/// aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DN0Result {
    dn0: f64,
    itn_use: f64,
}

impl DN0Result {
    pub fn new(dn0: f64, itn_use: f64) -> Self {
        Self { dn0, itn_use }
    }

    /// Usage-weighted insecticide-discriminating concentration in [0, 1].
    pub fn dn0(&self) -> f64 {
        self.dn0
    }

    /// Fraction of the population using any net.
    pub fn itn_use(&self) -> f64 {
        self.itn_use
    }
}
