//! Emulator core implementations
//!
//! - [`net_efficacy`] - usage-weighted net efficacy (`dn0`) aggregation
//! - [`eir`] - prevalence to EIR calibration
//! - [`scenario`] - scenario batch building with broadcasting
//! - [`artifact`] - recurrent model artifacts and their forward pass
//! - [`loader`] - filesystem artifact loader
//! - [`model_cache`] - lazy shared model registry
//! - [`runner`] - batch execution over scenarios
//! - [`results`] - joining predictions with scenarios
//! - [`pipeline`] - the [`Emulator`] entry point

pub mod artifact;
pub mod eir;
mod lookup;
pub mod loader;
pub mod model_cache;
pub mod net_efficacy;
pub mod pipeline;
pub mod results;
pub mod runner;
pub mod scenario;

pub use artifact::{
    CellWeights, Feature, InputScaler, LinearHead, ModelArtifact, OutputTransform,
    RecurrentModel,
};
pub use eir::EirCalibration;
pub use loader::FileModelLoader;
pub use model_cache::{ModelCache, WarmUp, WarmUpOptions, WarmUpReport};
pub use net_efficacy::{calculate_overall_dn0, NetEfficacyAggregator, NetEfficacyTable};
pub use pipeline::Emulator;
pub use results::ResultAggregator;
pub use runner::{EmulatorRunner, RunOutput};
pub use scenario::ScenarioBuilder;
