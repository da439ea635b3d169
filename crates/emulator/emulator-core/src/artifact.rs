//! Pretrained recurrent model artifacts
//!
//! An artifact is a JSON document holding the weights of a single-layer
//! LSTM or GRU cell, a linear head and an output transform. Gate blocks are
//! stacked in the usual order: input, forget, cell, output for LSTM and
//! reset, update, new for GRU.
//!
//! The model is run step by step over the prediction horizon. At each step
//! the input vector is built from the scenario according to the artifact's
//! `features` list; period features switch from current to future values at
//! `intervention_day`.

use emulator_spi::{
    EmulatorError, ModelKey, ModelType, Predictor, Result, ScenarioRecord, TimeSeriesModel,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Days per model year.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Three years of baseline before interventions switch to future values.
pub const DEFAULT_INTERVENTION_DAY: usize = 3 * 365;

fn default_output_scale() -> f64 {
    1.0
}

fn default_intervention_day() -> usize {
    DEFAULT_INTERVENTION_DAY
}

// ============================================================================
// Artifact document
// ============================================================================

/// Model input derived from a scenario at one time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Eir,
    /// `dn0_use` before the intervention day, `dn0_future` after
    Dn0,
    ItnUse,
    IrsUse,
    /// Zero before the intervention day
    Lsm,
    Q0,
    PhiBednets,
    Seasonal,
    Routine,
    DaySin,
    DayCos,
    Years,
}

impl Feature {
    /// Raw (unscaled) value for `scenario` at day `t`.
    pub fn value(self, scenario: &ScenarioRecord, t: usize, intervention_day: usize) -> f64 {
        let after = t >= intervention_day;
        let period = |current: f64, future: f64| if after { future } else { current };
        let day = t as f64;
        match self {
            Feature::Eir => scenario.eir,
            Feature::Dn0 => period(scenario.dn0_use, scenario.dn0_future),
            Feature::ItnUse => period(scenario.itn_use, scenario.itn_future),
            Feature::IrsUse => period(scenario.irs_use, scenario.irs_future),
            Feature::Lsm => period(0.0, scenario.lsm),
            Feature::Q0 => scenario.q0,
            Feature::PhiBednets => scenario.phi_bednets,
            Feature::Seasonal => scenario.seasonal,
            Feature::Routine => scenario.routine,
            Feature::DaySin => (TAU * day / DAYS_PER_YEAR).sin(),
            Feature::DayCos => (TAU * day / DAYS_PER_YEAR).cos(),
            Feature::Years => day / DAYS_PER_YEAR,
        }
    }
}

/// Link applied to the head output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputTransform {
    /// Bounded to (0, 1), for fractions
    Sigmoid,
    /// Non-negative, for counts and rates
    Softplus,
    Exp,
    Identity,
}

impl OutputTransform {
    pub fn apply(self, x: f64) -> f64 {
        match self {
            OutputTransform::Sigmoid => sigmoid(x),
            // ln(1 + e^x) without overflow for large x
            OutputTransform::Softplus => x.max(0.0) + (-x.abs()).exp().ln_1p(),
            OutputTransform::Exp => x.exp(),
            OutputTransform::Identity => x,
        }
    }
}

/// Per-feature standardisation applied before the cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputScaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

/// Recurrent cell weights with gate blocks stacked row-wise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellWeights {
    /// `gates * hidden_size` rows of `features.len()` columns
    pub w_ih: Vec<Vec<f64>>,
    /// `gates * hidden_size` rows of `hidden_size` columns
    pub w_hh: Vec<Vec<f64>>,
    pub b_ih: Vec<f64>,
    pub b_hh: Vec<f64>,
}

/// Linear read-out from the hidden state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearHead {
    pub weight: Vec<f64>,
    pub bias: f64,
}

/// On-disk form of a pretrained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub predictor: Predictor,
    pub model_type: ModelType,
    pub features: Vec<Feature>,
    pub input_scaler: InputScaler,
    pub hidden_size: usize,
    pub cell: CellWeights,
    pub head: LinearHead,
    pub output: OutputTransform,
    #[serde(default = "default_output_scale")]
    pub output_scale: f64,
    #[serde(default = "default_intervention_day")]
    pub intervention_day: usize,
}

impl ModelArtifact {
    pub fn key(&self) -> ModelKey {
        ModelKey::new(self.predictor, self.model_type)
    }

    /// Read an artifact. Shapes are not checked here; see [`Self::validate`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| EmulatorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| EmulatorError::InvalidArtifact {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Write the artifact as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let io_error = |source| EmulatorError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
        serde_json::to_writer(&mut writer, self).map_err(|e| io_error(std::io::Error::from(e)))?;
        writer.flush().map_err(io_error)
    }

    /// Check weight shapes against `features`, `hidden_size` and the gate
    /// count of `model_type`. `source` is used in error messages.
    pub fn validate(&self, source: &Path) -> Result<()> {
        let invalid = |reason: String| EmulatorError::InvalidArtifact {
            path: source.to_path_buf(),
            reason,
        };
        let inputs = self.features.len();
        let hidden = self.hidden_size;
        let rows = self.model_type.gate_count() * hidden;

        if inputs == 0 {
            return Err(invalid("features must not be empty".to_string()));
        }
        if hidden == 0 {
            return Err(invalid("hidden_size must be positive".to_string()));
        }
        check_len(&invalid, "input_scaler.mean", self.input_scaler.mean.len(), inputs)?;
        check_len(&invalid, "input_scaler.std", self.input_scaler.std.len(), inputs)?;
        if self.input_scaler.std.iter().any(|&s| !(s > 0.0) || !s.is_finite()) {
            return Err(invalid("input_scaler.std must be positive".to_string()));
        }
        check_matrix(&invalid, "cell.w_ih", &self.cell.w_ih, rows, inputs)?;
        check_matrix(&invalid, "cell.w_hh", &self.cell.w_hh, rows, hidden)?;
        check_len(&invalid, "cell.b_ih", self.cell.b_ih.len(), rows)?;
        check_len(&invalid, "cell.b_hh", self.cell.b_hh.len(), rows)?;
        check_len(&invalid, "head.weight", self.head.weight.len(), hidden)?;
        if !(self.output_scale > 0.0) || !self.output_scale.is_finite() {
            return Err(invalid(format!(
                "output_scale must be positive, got {}",
                self.output_scale
            )));
        }
        if self.predictor == Predictor::Prevalence
            && (self.output != OutputTransform::Sigmoid || self.output_scale > 1.0)
        {
            return Err(invalid(format!(
                "prevalence models need a sigmoid output with output_scale <= 1, got {:?} scaled by {}",
                self.output, self.output_scale
            )));
        }

        let all_finite = self
            .input_scaler
            .mean
            .iter()
            .chain(self.cell.w_ih.iter().flatten())
            .chain(self.cell.w_hh.iter().flatten())
            .chain(&self.cell.b_ih)
            .chain(&self.cell.b_hh)
            .chain(&self.head.weight)
            .chain(std::iter::once(&self.head.bias))
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(invalid("weights contain non-finite values".to_string()));
        }
        Ok(())
    }
}

fn check_len<F>(invalid: &F, name: &str, len: usize, expected: usize) -> Result<()>
where
    F: Fn(String) -> EmulatorError,
{
    if len != expected {
        return Err(invalid(format!("{name} has length {len}, expected {expected}")));
    }
    Ok(())
}

fn check_matrix<F>(
    invalid: &F,
    name: &str,
    matrix: &[Vec<f64>],
    rows: usize,
    cols: usize,
) -> Result<()>
where
    F: Fn(String) -> EmulatorError,
{
    check_len(invalid, name, matrix.len(), rows)?;
    if let Some((i, row)) = matrix.iter().enumerate().find(|(_, r)| r.len() != cols) {
        return Err(invalid(format!(
            "{name}[{i}] has length {}, expected {cols}",
            row.len()
        )));
    }
    Ok(())
}

// ============================================================================
// Recurrent model
// ============================================================================

/// A validated artifact ready to run.
#[derive(Debug, Clone)]
pub struct RecurrentModel {
    artifact: ModelArtifact,
    source: PathBuf,
}

impl RecurrentModel {
    /// Validate `artifact` and wrap it. `source` is kept for diagnostics.
    pub fn new(artifact: ModelArtifact, source: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();
        artifact.validate(&source)?;
        Ok(Self { artifact, source })
    }

    /// Read and validate an artifact file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        Self::new(ModelArtifact::from_path(path)?, path)
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    fn invocation_error(&self, scenario: &ScenarioRecord, reason: String) -> EmulatorError {
        EmulatorError::ModelInvocation {
            model: self.artifact.key().to_string(),
            scenario_tag: scenario.scenario_tag.clone(),
            reason,
        }
    }
}

impl TimeSeriesModel for RecurrentModel {
    fn key(&self) -> ModelKey {
        self.artifact.key()
    }

    fn predict(&self, scenario: &ScenarioRecord, time_steps: usize) -> Result<Vec<f64>> {
        if time_steps == 0 {
            return Err(EmulatorError::InvalidTimeSteps(time_steps));
        }
        let a = &self.artifact;
        let hidden = a.hidden_size;
        let rows = a.model_type.gate_count() * hidden;

        let mut x = vec![0.0; a.features.len()];
        let mut h = vec![0.0; hidden];
        let mut c = vec![0.0; hidden];
        let mut gi = vec![0.0; rows];
        let mut gh = vec![0.0; rows];
        let mut output = Vec::with_capacity(time_steps);

        for t in 0..time_steps {
            for (i, feature) in a.features.iter().enumerate() {
                let raw = feature.value(scenario, t, a.intervention_day);
                x[i] = (raw - a.input_scaler.mean[i]) / a.input_scaler.std[i];
            }
            affine(&a.cell.w_ih, &x, &a.cell.b_ih, &mut gi);
            affine(&a.cell.w_hh, &h, &a.cell.b_hh, &mut gh);
            match a.model_type {
                ModelType::Lstm => lstm_step(&gi, &gh, &mut h, &mut c),
                ModelType::Gru => gru_step(&gi, &gh, &mut h),
            }

            let logit = dot(&a.head.weight, &h) + a.head.bias;
            let value = a.output.apply(logit) * a.output_scale;
            if !value.is_finite() {
                return Err(self.invocation_error(scenario, format!("non-finite output at step {t}")));
            }
            output.push(value);
        }
        Ok(output)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// `out = w · x + b`
fn affine(w: &[Vec<f64>], x: &[f64], b: &[f64], out: &mut [f64]) {
    for ((o, row), bias) in out.iter_mut().zip(w).zip(b) {
        *o = dot(row, x) + bias;
    }
}

fn lstm_step(gi: &[f64], gh: &[f64], h: &mut [f64], c: &mut [f64]) {
    let n = h.len();
    for j in 0..n {
        let gate = |k: usize| gi[k * n + j] + gh[k * n + j];
        let input = sigmoid(gate(0));
        let forget = sigmoid(gate(1));
        let candidate = gate(2).tanh();
        let out = sigmoid(gate(3));
        c[j] = forget * c[j] + input * candidate;
        h[j] = out * c[j].tanh();
    }
}

fn gru_step(gi: &[f64], gh: &[f64], h: &mut [f64]) {
    let n = h.len();
    for j in 0..n {
        let reset = sigmoid(gi[j] + gh[j]);
        let update = sigmoid(gi[n + j] + gh[n + j]);
        let candidate = (gi[2 * n + j] + reset * gh[2 * n + j]).tanh();
        h[j] = (1.0 - update) * candidate + update * h[j];
    }
}
