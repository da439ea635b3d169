//! Model artifact loader contract

use super::ModelHandle;
use crate::error::Result;
use crate::model::ModelKey;

/// Source of pretrained models.
///
/// Called by the model cache at most once per key; implementations need not
/// cache on their own.
pub trait ModelLoader: Send + Sync {
    /// Load the model for `key`, failing with `ArtifactNotFound` when no
    /// artifact exists for it
    fn load(&self, key: ModelKey) -> Result<ModelHandle>;

    /// Human-readable description of where artifacts are looked up
    fn location(&self) -> String;
}
