//! End-to-end entry points: build, run, aggregate.

use crate::loader::FileModelLoader;
use crate::model_cache::{ModelCache, WarmUp, WarmUpOptions, WarmUpReport};
use crate::results::ResultAggregator;
use crate::runner::EmulatorRunner;
use crate::scenario::ScenarioBuilder;
use bench_harness::StageTimer;
use emulator_api::{EmulatorConfig, RunOptions, ScenarioParameters};
use emulator_spi::{EmulatorResults, ModelLoader, Result, ScenarioBatch};
use std::sync::Arc;
use tracing::info;

/// Scenario builder, model cache and runner wired together.
///
/// The cache lives as long as the emulator, so models loaded by one call
/// are reused by the next.
#[derive(Debug, Clone)]
pub struct Emulator {
    config: EmulatorConfig,
    builder: ScenarioBuilder,
    runner: EmulatorRunner,
}

impl Emulator {
    /// Emulator reading artifacts from `config.models_dir`.
    pub fn from_config(config: EmulatorConfig) -> Result<Self> {
        let loader = Arc::new(FileModelLoader::from_config(&config));
        Self::with_loader(config, loader)
    }

    /// Emulator with a custom model source.
    pub fn with_loader(config: EmulatorConfig, loader: Arc<dyn ModelLoader>) -> Result<Self> {
        let builder = ScenarioBuilder::from_config(&config)?;
        Ok(Self::new(config, builder, Arc::new(ModelCache::new(loader))))
    }

    pub fn new(config: EmulatorConfig, builder: ScenarioBuilder, cache: Arc<ModelCache>) -> Self {
        Self {
            config,
            builder,
            runner: EmulatorRunner::new(cache),
        }
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    pub fn builder(&self) -> &ScenarioBuilder {
        &self.builder
    }

    pub fn cache(&self) -> &Arc<ModelCache> {
        self.runner.cache()
    }

    /// Build scenarios from `parameters`, run them and join the results.
    ///
    /// With `options.benchmark` the result carries `build`, `load:<key>`,
    /// `predict:<key>`, `aggregate` and `total` timings.
    pub fn run_scenarios(
        &self,
        parameters: &ScenarioParameters,
        options: &RunOptions,
    ) -> Result<EmulatorResults> {
        options.validate()?;
        let mut timer = StageTimer::new(options.benchmark);
        let batch = timer.time("build", || self.builder.build(parameters))?;
        self.execute(&batch, options, timer)
    }

    /// Run a prebuilt batch.
    pub fn run_batch(&self, batch: &ScenarioBatch, options: &RunOptions) -> Result<EmulatorResults> {
        options.validate()?;
        self.execute(batch, options, StageTimer::new(options.benchmark))
    }

    fn execute(
        &self,
        batch: &ScenarioBatch,
        options: &RunOptions,
        mut timer: StageTimer,
    ) -> Result<EmulatorResults> {
        let output = self.runner.run(batch, options, &mut timer)?;
        let mut results =
            timer.time("aggregate", || ResultAggregator::aggregate(output, batch, None))?;
        results.benchmarks = timer.finish();

        info!(
            scenarios = batch.len(),
            predictors = results.tables().count(),
            time_steps = options.time_steps,
            total_secs = results.benchmarks.as_ref().map(|b| b.total()),
            "emulator run finished"
        );
        Ok(results)
    }

    /// Load every known model now.
    ///
    /// Missing artifacts are reported rather than fatal unless
    /// `strict_warm_up` is set in the configuration.
    pub fn preload(&self, verbose: bool) -> Result<WarmUpReport> {
        let options = WarmUpOptions {
            verbose,
            strict: self.config.strict_warm_up,
        };
        self.cache().warm_up(&WarmUp::All, options)
    }
}
