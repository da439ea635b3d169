//! Predictor and model-architecture identifiers.

use crate::error::{EmulatorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome variable a pretrained model forecasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predictor {
    /// Parasite prevalence, a fraction in [0, 1]
    Prevalence,
    /// Clinical cases per person
    Cases,
}

impl Predictor {
    pub const ALL: [Predictor; 2] = [Predictor::Prevalence, Predictor::Cases];

    pub fn as_str(self) -> &'static str {
        match self {
            Predictor::Prevalence => "prevalence",
            Predictor::Cases => "cases",
        }
    }
}

impl FromStr for Predictor {
    type Err = EmulatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prevalence" => Ok(Predictor::Prevalence),
            "cases" => Ok(Predictor::Cases),
            _ => Err(EmulatorError::UnknownPredictor(s.to_string())),
        }
    }
}

impl fmt::Display for Predictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Architecture tag of a pretrained time-series model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelType {
    #[serde(rename = "LSTM", alias = "lstm")]
    Lstm,
    #[serde(rename = "GRU", alias = "gru")]
    Gru,
}

impl ModelType {
    pub const ALL: [ModelType; 2] = [ModelType::Lstm, ModelType::Gru];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelType::Lstm => "LSTM",
            ModelType::Gru => "GRU",
        }
    }

    /// Number of stacked gate blocks in the recurrent cell.
    pub fn gate_count(self) -> usize {
        match self {
            ModelType::Lstm => 4,
            ModelType::Gru => 3,
        }
    }
}

impl FromStr for ModelType {
    type Err = EmulatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LSTM" => Ok(ModelType::Lstm),
            "GRU" => Ok(ModelType::Gru),
            _ => Err(EmulatorError::UnknownModelType(s.to_string())),
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache key identifying one pretrained artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelKey {
    pub predictor: Predictor,
    pub model_type: ModelType,
}

impl ModelKey {
    /// Size of the closed key set.
    pub const COUNT: usize = Predictor::ALL.len() * ModelType::ALL.len();

    pub fn new(predictor: Predictor, model_type: ModelType) -> Self {
        Self {
            predictor,
            model_type,
        }
    }

    /// Every known (predictor, model type) combination.
    pub fn all() -> Vec<ModelKey> {
        Predictor::ALL
            .iter()
            .flat_map(|&p| ModelType::ALL.iter().map(move |&m| ModelKey::new(p, m)))
            .collect()
    }

    /// Dense position of this key in `0..COUNT`, following [`Self::all`].
    pub fn index(self) -> usize {
        let predictor = match self.predictor {
            Predictor::Prevalence => 0,
            Predictor::Cases => 1,
        };
        let model_type = match self.model_type {
            ModelType::Lstm => 0,
            ModelType::Gru => 1,
        };
        predictor * ModelType::ALL.len() + model_type
    }

    /// Deterministic artifact file name, e.g. `prevalence_lstm.json`.
    pub fn artifact_file_name(&self) -> String {
        format!(
            "{}_{}.json",
            self.predictor.as_str(),
            self.model_type.as_str().to_ascii_lowercase()
        )
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.predictor, self.model_type)
    }
}
