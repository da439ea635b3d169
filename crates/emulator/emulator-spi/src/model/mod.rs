//! Model module containing emulator data structures
//!
//! - [`NetType`] and [`DN0Result`] - net categories and their aggregate efficacy
//! - [`ScenarioRecord`] and [`ScenarioBatch`] - resolved model inputs
//! - [`Predictor`], [`ModelType`] and [`ModelKey`] - artifact identifiers
//! - [`PredictionTable`] and [`EmulatorResults`] - joined outputs

mod dn0_result;
mod model_key;
mod net_type;
mod prediction;
mod scenario;

pub use bench_harness::BenchmarkRecord;
pub use dn0_result::DN0Result;
pub use model_key::{ModelKey, ModelType, Predictor};
pub use net_type::NetType;
pub use prediction::{
    EmulatorResults, PredictionPoint, PredictionRow, PredictionTable, ScenarioSummary,
};
pub use scenario::{ScenarioBatch, ScenarioRecord};
