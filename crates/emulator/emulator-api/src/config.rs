//! Emulator configuration types.

use emulator_spi::{EmulatorError, ModelType, Predictor, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the model artifact directory.
pub const MODELS_DIR_ENV: &str = "MINTER_MODELS_DIR";

/// Artifact directory used when nothing else is configured.
pub const DEFAULT_MODELS_DIR: &str = "models";

/// Default prediction horizon: six years of daily steps.
pub const DEFAULT_TIME_STEPS: usize = 2190;

/// Where artifacts and reference tables live, and how warm-up behaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Directory holding one artifact per (predictor, model type)
    pub models_dir: PathBuf,
    /// External net-efficacy table; the built-in table is used when unset
    pub net_efficacy_table: Option<PathBuf>,
    /// External prevalence-to-EIR calibration; built-in when unset
    pub eir_calibration: Option<PathBuf>,
    /// Fail warm-up on the first missing artifact
    pub strict_warm_up: bool,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            net_efficacy_table: None,
            eir_calibration: None,
            strict_warm_up: false,
        }
    }
}

impl EmulatorConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load a JSON configuration file. Missing keys take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| EmulatorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|e| EmulatorError::InvalidArtifact {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Replace `models_dir` with `MINTER_MODELS_DIR` when it is set and non-empty.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(dir) = std::env::var_os(MODELS_DIR_ENV).filter(|v| !v.is_empty()) {
            self.models_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn with_models_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.models_dir = dir.into();
        self
    }

    pub fn with_net_efficacy_table<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.net_efficacy_table = Some(path.into());
        self
    }

    pub fn with_eir_calibration<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.eir_calibration = Some(path.into());
        self
    }

    pub fn with_strict_warm_up(mut self, strict: bool) -> Self {
        self.strict_warm_up = strict;
        self
    }
}

/// What to predict for a batch and whether to time it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Outcomes to forecast
    pub predictors: Vec<Predictor>,
    /// Model architectures to run for each predictor
    pub model_types: Vec<ModelType>,
    /// Number of daily steps per trajectory
    pub time_steps: usize,
    /// Record per-stage wall-clock timings
    pub benchmark: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            predictors: vec![Predictor::Prevalence],
            model_types: vec![ModelType::Lstm],
            time_steps: DEFAULT_TIME_STEPS,
            benchmark: false,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn predictors<I: IntoIterator<Item = Predictor>>(mut self, predictors: I) -> Self {
        self.predictors = predictors.into_iter().collect();
        self
    }

    pub fn model_types<I: IntoIterator<Item = ModelType>>(mut self, model_types: I) -> Self {
        self.model_types = model_types.into_iter().collect();
        self
    }

    pub fn time_steps(mut self, time_steps: usize) -> Self {
        self.time_steps = time_steps;
        self
    }

    pub fn benchmark(mut self, benchmark: bool) -> Self {
        self.benchmark = benchmark;
        self
    }

    /// Reject requests that could never produce output.
    pub fn validate(&self) -> Result<()> {
        if self.time_steps == 0 {
            return Err(EmulatorError::InvalidTimeSteps(self.time_steps));
        }
        if self.predictors.is_empty() {
            return Err(EmulatorError::invalid_parameter(
                "predictor",
                "at least one predictor is required",
            ));
        }
        if self.model_types.is_empty() {
            return Err(EmulatorError::invalid_parameter(
                "model_types",
                "at least one model type is required",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = EmulatorConfig::default();
        assert_eq!(config.models_dir, PathBuf::from("models"));
        assert!(config.net_efficacy_table.is_none());
        assert!(!config.strict_warm_up);
    }

    #[test]
    fn test_config_builders() {
        let config = EmulatorConfig::default()
            .with_models_dir("/srv/models")
            .with_net_efficacy_table("/srv/itn.json")
            .with_strict_warm_up(true);
        assert_eq!(config.models_dir, PathBuf::from("/srv/models"));
        assert_eq!(config.net_efficacy_table, Some(PathBuf::from("/srv/itn.json")));
        assert!(config.strict_warm_up);
    }

    #[test]
    fn test_config_from_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"models_dir": "/data/minte"}}"#).unwrap();
        let config = EmulatorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.models_dir, PathBuf::from("/data/minte"));
        assert!(config.eir_calibration.is_none());
    }

    #[test]
    fn test_config_from_missing_file() {
        let err = EmulatorConfig::from_file("/nonexistent/minte.json").unwrap_err();
        assert!(matches!(err, EmulatorError::Io { .. }));
    }

    #[test]
    fn test_config_from_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        let err = EmulatorConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, EmulatorError::InvalidArtifact { .. }));
    }

    #[test]
    fn test_run_options_default() {
        let options = RunOptions::default();
        assert_eq!(options.predictors, vec![Predictor::Prevalence]);
        assert_eq!(options.model_types, vec![ModelType::Lstm]);
        assert_eq!(options.time_steps, 2190);
        assert!(!options.benchmark);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_run_options_rejects_zero_steps() {
        let err = RunOptions::new().time_steps(0).validate().unwrap_err();
        assert!(matches!(err, EmulatorError::InvalidTimeSteps(0)));
    }

    #[test]
    fn test_run_options_rejects_empty_predictors() {
        let err = RunOptions::new().predictors(Vec::new()).validate().unwrap_err();
        assert!(err.to_string().contains("predictor"));
    }

    #[test]
    fn test_run_options_deserialize_partial() {
        let options: RunOptions =
            serde_json::from_str(r#"{"predictors": ["prevalence", "cases"], "benchmark": true}"#)
                .unwrap();
        assert_eq!(options.predictors.len(), 2);
        assert_eq!(options.time_steps, DEFAULT_TIME_STEPS);
        assert!(options.benchmark);
    }
}
