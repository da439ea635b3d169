//! Emulator Service Provider Interface
//!
//! Defines the data model, model contracts and error type shared by the
//! scenario-to-prediction pipeline:
//! - Net types and aggregated net efficacy
//! - Scenario records and batches
//! - Model keys, handles and the traits model providers implement
//! - Prediction tables and run results

pub mod contract;
pub mod error;
pub mod model;

// Re-export all public items at crate root for convenience
pub use contract::{ModelHandle, ModelLoader, TimeSeriesModel};
pub use error::{EmulatorError, ErrorKind, Result};
pub use model::{
    BenchmarkRecord, DN0Result, EmulatorResults, ModelKey, ModelType, NetType, PredictionPoint,
    PredictionRow, PredictionTable, Predictor, ScenarioBatch, ScenarioRecord, ScenarioSummary,
};
