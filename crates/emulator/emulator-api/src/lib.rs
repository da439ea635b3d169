//! Emulator Consumer API
//!
//! Consumer configuration and input DTOs for the emulator pipeline.
//!
//! This crate provides:
//! - [`EmulatorConfig`] - artifact locations and warm-up policy
//! - [`RunOptions`] - predictors, model types, horizon and benchmarking
//! - [`ScenarioParameters`] - raw or pre-aggregated scenario inputs
//! - Re-exports from the SPI for convenience

mod config;
mod parameters;

pub use config::{EmulatorConfig, RunOptions, DEFAULT_MODELS_DIR, DEFAULT_TIME_STEPS, MODELS_DIR_ENV};
pub use parameters::{AggregatedParameters, Param, RawNetParameters, ScenarioParameters};

// Re-export SPI types
pub use emulator_spi::{
    BenchmarkRecord, DN0Result, EmulatorError, EmulatorResults, ErrorKind, ModelHandle, ModelKey,
    ModelLoader, ModelType, NetType, PredictionPoint, PredictionRow, PredictionTable, Predictor,
    Result, ScenarioBatch, ScenarioRecord, ScenarioSummary, TimeSeriesModel,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AggregatedParameters, EmulatorConfig, Param, RawNetParameters, RunOptions,
        ScenarioParameters,
    };
    pub use emulator_spi::{
        DN0Result, EmulatorError, EmulatorResults, ModelKey, ModelType, NetType, PredictionTable,
        Predictor, Result, ScenarioBatch, ScenarioRecord,
    };
}
