//! Pretrained time-series model contract

use crate::error::Result;
use crate::model::{ModelKey, ScenarioRecord};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A pretrained predictor treated as a black box.
pub trait TimeSeriesModel: Send + Sync {
    /// Key this model was loaded for
    fn key(&self) -> ModelKey;

    /// Produce exactly `time_steps` values for one scenario, time ascending
    fn predict(&self, scenario: &ScenarioRecord, time_steps: usize) -> Result<Vec<f64>>;
}

/// Shared read-only reference to a loaded model.
///
/// Cloning is cheap and keeps pointing at the same model, so two handles
/// can be compared for identity with [`ModelHandle::ptr_eq`].
#[derive(Clone)]
pub struct ModelHandle(Arc<dyn TimeSeriesModel>);

impl ModelHandle {
    pub fn new<M: TimeSeriesModel + 'static>(model: M) -> Self {
        Self(Arc::new(model))
    }

    /// True when both handles point at the same loaded model.
    pub fn ptr_eq(a: &ModelHandle, b: &ModelHandle) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl Deref for ModelHandle {
    type Target = dyn TimeSeriesModel;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModelHandle").field(&self.0.key()).finish()
    }
}
