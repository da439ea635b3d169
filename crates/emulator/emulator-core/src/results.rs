//! Joining raw trajectories with their scenarios.

use crate::runner::RunOutput;
use bench_harness::BenchmarkRecord;
use emulator_spi::{
    EmulatorError, EmulatorResults, ModelType, PredictionPoint, PredictionRow, PredictionTable,
    Predictor, Result, ScenarioBatch, ScenarioRecord,
};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Builds [`EmulatorResults`] from runner output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultAggregator;

impl ResultAggregator {
    /// Join every point with the scenario it belongs to.
    ///
    /// Each predictor's points must cover every scenario of `batch` for every
    /// model type that appears, with the same number of steps throughout.
    pub fn aggregate(
        output: RunOutput,
        batch: &ScenarioBatch,
        benchmarks: Option<BenchmarkRecord>,
    ) -> Result<EmulatorResults> {
        let scenarios: HashMap<&str, Arc<ScenarioRecord>> = batch
            .iter()
            .map(|record| (record.scenario_tag.as_str(), Arc::new(record.clone())))
            .collect();

        let mut results = EmulatorResults {
            benchmarks,
            ..Default::default()
        };
        for (predictor, points) in output {
            check_coverage(predictor, &points, batch)?;
            let rows = points
                .into_iter()
                .map(|point| join(predictor, point, &scenarios))
                .collect::<Result<Vec<_>>>()?;
            results.set_table(PredictionTable::new(predictor, rows));
        }
        Ok(results)
    }
}

fn join(
    predictor: Predictor,
    point: PredictionPoint,
    scenarios: &HashMap<&str, Arc<ScenarioRecord>>,
) -> Result<PredictionRow> {
    let scenario = scenarios
        .get(&*point.scenario_tag)
        .cloned()
        .ok_or_else(|| incomplete(predictor, format!("unknown scenario tag '{}'", point.scenario_tag)))?;
    Ok(PredictionRow {
        scenario_tag: point.scenario_tag,
        model_type: point.model_type,
        timestep: point.timestep,
        value: point.value,
        scenario,
    })
}

fn check_coverage(
    predictor: Predictor,
    points: &[PredictionPoint],
    batch: &ScenarioBatch,
) -> Result<()> {
    if points.is_empty() {
        return Err(incomplete(predictor, "no predictions".to_string()));
    }
    let mut counts: IndexMap<ModelType, HashMap<&str, usize>> = IndexMap::new();
    for point in points {
        *counts
            .entry(point.model_type)
            .or_default()
            .entry(&*point.scenario_tag)
            .or_default() += 1;
    }

    let mut steps: Option<usize> = None;
    for (model_type, per_tag) in &counts {
        for tag in batch.tags() {
            let count = per_tag.get(tag).copied().unwrap_or(0);
            match steps {
                _ if count == 0 => {
                    return Err(incomplete(
                        predictor,
                        format!("scenario '{tag}' has no {model_type} predictions"),
                    ))
                }
                Some(expected) if count != expected => {
                    return Err(incomplete(
                        predictor,
                        format!(
                            "scenario '{tag}' has {count} {model_type} steps, expected {expected}"
                        ),
                    ))
                }
                _ => steps = Some(count),
            }
        }
    }
    Ok(())
}

fn incomplete(predictor: Predictor, reason: String) -> EmulatorError {
    EmulatorError::IncompleteResults {
        predictor: predictor.to_string(),
        reason,
    }
}
