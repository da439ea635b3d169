//! Batch execution of cached models over a scenario batch.

use crate::model_cache::ModelCache;
use bench_harness::StageTimer;
use emulator_api::RunOptions;
use emulator_spi::{
    EmulatorError, ModelHandle, ModelKey, ModelType, PredictionPoint, Predictor, Result,
    ScenarioBatch, ScenarioRecord,
};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

/// Raw trajectories per requested predictor, in request order.
pub type RunOutput = IndexMap<Predictor, Vec<PredictionPoint>>;

/// Runs every requested model over every scenario row.
#[derive(Debug, Clone)]
pub struct EmulatorRunner {
    cache: Arc<ModelCache>,
}

impl EmulatorRunner {
    pub fn new(cache: Arc<ModelCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<ModelCache> {
        &self.cache
    }

    /// Run `options.predictors` x `options.model_types` over `batch`.
    ///
    /// Options are validated before any model is resolved. Repeated
    /// predictors or model types run once. Each model is resolved once and
    /// reused for every row; points are ordered by model type, then row,
    /// then time.
    pub fn run(
        &self,
        batch: &ScenarioBatch,
        options: &RunOptions,
        timer: &mut StageTimer,
    ) -> Result<RunOutput> {
        options.validate()?;
        let predictors = first_occurrences(&options.predictors);
        let model_types = first_occurrences(&options.model_types);

        let mut output = RunOutput::with_capacity(predictors.len());
        for predictor in predictors {
            let points =
                self.run_predictor(batch, predictor, &model_types, options.time_steps, timer)?;
            output.insert(predictor, points);
        }
        Ok(output)
    }

    /// Trajectories of one predictor for each model type.
    pub fn run_predictor(
        &self,
        batch: &ScenarioBatch,
        predictor: Predictor,
        model_types: &[ModelType],
        time_steps: usize,
        timer: &mut StageTimer,
    ) -> Result<Vec<PredictionPoint>> {
        if time_steps == 0 {
            return Err(EmulatorError::InvalidTimeSteps(time_steps));
        }
        let tags: Vec<Arc<str>> = batch.tags().map(Arc::<str>::from).collect();
        let mut points = Vec::with_capacity(model_types.len() * batch.len() * time_steps);

        for &model_type in model_types {
            let key = ModelKey::new(predictor, model_type);
            let model = timer.time(&format!("load:{key}"), || self.cache.get(key))?;
            debug!(model = %key, rows = batch.len(), time_steps, "running model");

            timer.time(&format!("predict:{key}"), || {
                for (record, tag) in batch.iter().zip(&tags) {
                    let values = predict_row(&model, key, record, time_steps)?;
                    points.extend(values.into_iter().enumerate().map(|(timestep, value)| {
                        PredictionPoint {
                            scenario_tag: Arc::clone(tag),
                            model_type,
                            timestep,
                            value,
                        }
                    }));
                }
                Ok::<(), EmulatorError>(())
            })?;
        }
        Ok(points)
    }
}

/// One row's trajectory, with failures attributed to the scenario.
fn predict_row(
    model: &ModelHandle,
    key: ModelKey,
    record: &ScenarioRecord,
    time_steps: usize,
) -> Result<Vec<f64>> {
    let invocation = |reason: String| EmulatorError::ModelInvocation {
        model: key.to_string(),
        scenario_tag: record.scenario_tag.clone(),
        reason,
    };
    let values = model.predict(record, time_steps).map_err(|e| match e {
        e @ EmulatorError::ModelInvocation { .. } => e,
        other => invocation(other.to_string()),
    })?;
    if values.len() != time_steps {
        return Err(invocation(format!(
            "returned {} values, expected {time_steps}",
            values.len()
        )));
    }
    Ok(values)
}

fn first_occurrences<T: Copy + PartialEq>(items: &[T]) -> Vec<T> {
    let mut unique = Vec::with_capacity(items.len());
    for &item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use emulator_spi::{ModelLoader, TimeSeriesModel};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock model: value encodes (row eir, model type, step)
    struct EchoModel {
        key: ModelKey,
        short_by: usize,
    }

    impl TimeSeriesModel for EchoModel {
        fn key(&self) -> ModelKey {
            self.key
        }

        fn predict(&self, scenario: &ScenarioRecord, time_steps: usize) -> Result<Vec<f64>> {
            if scenario.scenario_tag == "boom" {
                return Err(EmulatorError::invalid_parameter("eir", "model rejected input"));
            }
            let offset = match self.key.model_type {
                ModelType::Lstm => 0.0,
                ModelType::Gru => 0.5,
            };
            Ok((0..time_steps - self.short_by)
                .map(|t| scenario.eir / 1000.0 + offset + t as f64 / 1e6)
                .collect())
        }
    }

    #[derive(Default)]
    struct EchoLoader {
        calls: AtomicUsize,
        short_by: usize,
    }

    impl ModelLoader for EchoLoader {
        fn load(&self, key: ModelKey) -> Result<ModelHandle> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ModelHandle::new(EchoModel {
                key,
                short_by: self.short_by,
            }))
        }

        fn location(&self) -> String {
            "memory".to_string()
        }
    }

    fn record(tag: &str, eir: f64) -> ScenarioRecord {
        ScenarioRecord {
            scenario_tag: tag.to_string(),
            eir,
            prevalence: None,
            resistance: None,
            dn0_use: 0.5,
            dn0_future: 0.5,
            itn_use: 0.5,
            itn_future: 0.5,
            q0: 0.92,
            phi_bednets: 0.85,
            seasonal: 0.0,
            routine: 0.0,
            irs_use: 0.0,
            irs_future: 0.0,
            lsm: 0.0,
        }
    }

    fn batch() -> ScenarioBatch {
        ScenarioBatch::new(vec![record("a", 10.0), record("b", 20.0), record("c", 30.0)]).unwrap()
    }

    fn runner(loader: Arc<EchoLoader>) -> EmulatorRunner {
        EmulatorRunner::new(Arc::new(ModelCache::new(loader)))
    }

    #[test]
    fn test_each_row_yields_time_steps_points() {
        let runner = runner(Arc::new(EchoLoader::default()));
        let options = RunOptions::new().time_steps(5);
        let output = runner.run(&batch(), &options, &mut StageTimer::disabled()).unwrap();
        let points = &output[&Predictor::Prevalence];
        assert_eq!(points.len(), 15);
        assert_eq!(&*points[0].scenario_tag, "a");
        assert_eq!(&*points[5].scenario_tag, "b");
        assert_eq!(points[7].timestep, 2);
    }

    #[test]
    fn test_order_is_model_type_then_row_then_time() {
        let runner = runner(Arc::new(EchoLoader::default()));
        let options = RunOptions::new()
            .model_types([ModelType::Gru, ModelType::Lstm])
            .time_steps(2);
        let output = runner.run(&batch(), &options, &mut StageTimer::disabled()).unwrap();
        let points = &output[&Predictor::Prevalence];
        assert_eq!(points.len(), 12);
        assert!(points[..6].iter().all(|p| p.model_type == ModelType::Gru));
        assert!(points[6..].iter().all(|p| p.model_type == ModelType::Lstm));
        let tags: Vec<&str> = points[..6].iter().map(|p| &*p.scenario_tag).collect();
        assert_eq!(tags, vec!["a", "a", "b", "b", "c", "c"]);
    }

    #[test]
    fn test_duplicates_collapse_and_models_resolve_once() {
        let loader = Arc::new(EchoLoader::default());
        let runner = runner(loader.clone());
        let options = RunOptions::new()
            .predictors([Predictor::Cases, Predictor::Prevalence, Predictor::Cases])
            .model_types([ModelType::Lstm, ModelType::Lstm])
            .time_steps(3);
        let output = runner.run(&batch(), &options, &mut StageTimer::disabled()).unwrap();
        let order: Vec<Predictor> = output.keys().copied().collect();
        assert_eq!(order, vec![Predictor::Cases, Predictor::Prevalence]);
        assert_eq!(output[&Predictor::Cases].len(), 9);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);

        runner.run(&batch(), &options, &mut StageTimer::disabled()).unwrap();
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_invalid_options_fail_before_loading() {
        let loader = Arc::new(EchoLoader::default());
        let runner = runner(loader.clone());
        let err = runner
            .run(&batch(), &RunOptions::new().time_steps(0), &mut StageTimer::disabled())
            .unwrap_err();
        assert!(err.is_input_error());
        let err = runner
            .run(
                &batch(),
                &RunOptions::new().model_types(Vec::new()),
                &mut StageTimer::disabled(),
            )
            .unwrap_err();
        assert!(err.is_input_error());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_model_error_names_scenario() {
        let runner = runner(Arc::new(EchoLoader::default()));
        let batch = ScenarioBatch::new(vec![record("fine", 1.0), record("boom", 2.0)]).unwrap();
        let err = runner
            .run(&batch, &RunOptions::new().time_steps(4), &mut StageTimer::disabled())
            .unwrap_err();
        match err {
            EmulatorError::ModelInvocation {
                model,
                scenario_tag,
                reason,
            } => {
                assert_eq!(model, "prevalence/LSTM");
                assert_eq!(scenario_tag, "boom");
                assert!(reason.contains("model rejected input"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_short_trajectory_is_rejected() {
        let runner = runner(Arc::new(EchoLoader {
            calls: AtomicUsize::new(0),
            short_by: 1,
        }));
        let err = runner
            .run(&batch(), &RunOptions::new().time_steps(4), &mut StageTimer::disabled())
            .unwrap_err();
        assert!(err.to_string().contains("returned 3 values, expected 4"));
    }

    #[test]
    fn test_timer_records_load_and_predict_stages() {
        let runner = runner(Arc::new(EchoLoader::default()));
        let mut timer = StageTimer::new(true);
        runner
            .run(&batch(), &RunOptions::new().time_steps(2), &mut timer)
            .unwrap();
        let record = timer.finish().unwrap();
        assert!(record.get("load:prevalence/LSTM").is_some());
        assert!(record.get("predict:prevalence/LSTM").is_some());
    }
}
