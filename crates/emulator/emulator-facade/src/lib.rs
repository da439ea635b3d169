//! Emulator Facade
//!
//! High-level API for running malaria intervention scenarios through
//! pretrained time-series emulators. Re-exports all public types from the
//! emulator stack for convenient usage.

// Re-export everything from API (which includes SPI)
pub use emulator_api::*;

// Core implementations
pub use emulator_core::{
    calculate_overall_dn0, CellWeights, EirCalibration, Emulator, EmulatorRunner,
    Feature, FileModelLoader, InputScaler, LinearHead, ModelArtifact, ModelCache,
    NetEfficacyAggregator, NetEfficacyTable, OutputTransform, RecurrentModel, ResultAggregator,
    RunOutput, ScenarioBuilder, WarmUp, WarmUpOptions, WarmUpReport,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use emulator_api::prelude::*;
    pub use emulator_core::{Emulator, ModelCache, NetEfficacyAggregator, ScenarioBuilder, WarmUp};
}
