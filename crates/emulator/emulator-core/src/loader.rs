//! Filesystem model loader.

use crate::artifact::RecurrentModel;
use emulator_api::{EmulatorConfig, MODELS_DIR_ENV};
use emulator_spi::{EmulatorError, ModelHandle, ModelKey, ModelLoader, Result, TimeSeriesModel};
use std::path::{Path, PathBuf};
use tracing::info;

/// Loads `<models_dir>/<predictor>_<model type>.json` artifacts.
#[derive(Debug, Clone)]
pub struct FileModelLoader {
    models_dir: PathBuf,
}

impl FileModelLoader {
    pub fn new<P: Into<PathBuf>>(models_dir: P) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    pub fn from_config(config: &EmulatorConfig) -> Self {
        Self::new(config.models_dir.clone())
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Where the artifact for `key` is expected.
    pub fn artifact_path(&self, key: ModelKey) -> PathBuf {
        self.models_dir.join(key.artifact_file_name())
    }
}

impl ModelLoader for FileModelLoader {
    fn load(&self, key: ModelKey) -> Result<ModelHandle> {
        let path = self.artifact_path(key);
        if !path.is_file() {
            return Err(EmulatorError::ArtifactNotFound {
                what: format!("Model artifact for {key}"),
                path,
                hint: format!(
                    "Set {MODELS_DIR_ENV} or `models_dir` in the emulator configuration to the directory holding the pretrained models."
                ),
            });
        }

        let model = RecurrentModel::from_path(&path)?;
        if model.key() != key {
            return Err(EmulatorError::InvalidArtifact {
                path,
                reason: format!("artifact is for {}, expected {key}", model.key()),
            });
        }
        info!(
            model = %key,
            path = %path.display(),
            hidden_size = model.artifact().hidden_size,
            "loaded model artifact"
        );
        Ok(ModelHandle::new(model))
    }

    fn location(&self) -> String {
        self.models_dir.display().to_string()
    }
}
