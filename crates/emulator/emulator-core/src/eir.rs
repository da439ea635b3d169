//! Prevalence to EIR calibration.

use crate::lookup::LookupCurve;
use emulator_spi::{EmulatorError, Result};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

const BUILTIN_CALIBRATION: &str = include_str!("../data/eir_calibration.json");
const BUILTIN_SOURCE: &str = "<builtin>/eir_calibration.json";

static BUILTIN: OnceCell<Arc<EirCalibration>> = OnceCell::new();

#[derive(Deserialize)]
struct CalibrationDocument {
    prevalence: Vec<f64>,
    eir: Vec<f64>,
}

/// Monotone mapping from baseline prevalence to annual EIR.
#[derive(Debug, Clone, PartialEq)]
pub struct EirCalibration {
    curve: LookupCurve,
}

impl EirCalibration {
    /// The embedded calibration, parsed once per process.
    pub fn builtin() -> Result<Arc<Self>> {
        BUILTIN
            .get_or_try_init(|| {
                Self::from_json(Path::new(BUILTIN_SOURCE), BUILTIN_CALIBRATION).map(Arc::new)
            })
            .cloned()
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EmulatorError::ArtifactNotFound {
                what: "EIR calibration table".to_string(),
                path: path.to_path_buf(),
                hint: "Check `eir_calibration` in the emulator configuration, or unset it to use the built-in calibration.".to_string(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| EmulatorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(path, &text)
    }

    pub fn from_json(source: &Path, text: &str) -> Result<Self> {
        let document: CalibrationDocument =
            serde_json::from_str(text).map_err(|e| EmulatorError::InvalidArtifact {
                path: source.to_path_buf(),
                reason: e.to_string(),
            })?;
        if document.eir.windows(2).any(|w| w[1] <= w[0]) {
            return Err(EmulatorError::InvalidArtifact {
                path: source.to_path_buf(),
                reason: "eir values must be strictly ascending".to_string(),
            });
        }
        if document.eir.iter().any(|&e| e < 0.0) {
            return Err(EmulatorError::InvalidArtifact {
                path: source.to_path_buf(),
                reason: "eir values must be non-negative".to_string(),
            });
        }
        let curve = LookupCurve::new(source, "prevalence", document.prevalence, document.eir)?;
        Ok(Self { curve })
    }

    /// Calibrated prevalence range.
    pub fn prevalence_range(&self) -> (f64, f64) {
        self.curve.domain()
    }

    /// EIR reproducing baseline prevalence `prevalence`.
    pub fn eir_for_prevalence(&self, prevalence: f64) -> Result<f64> {
        self.curve.at(prevalence).ok_or_else(|| {
            let (min, max) = self.prevalence_range();
            EmulatorError::OutOfRange {
                field: "prev".to_string(),
                value: prevalence,
                min,
                max,
            }
        })
    }
}
