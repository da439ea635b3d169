//! Prediction outputs and joined result tables.

use super::{ModelType, Predictor, ScenarioRecord};
use bench_harness::BenchmarkRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// One predicted value for a scenario at a time step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    pub scenario_tag: Arc<str>,
    pub model_type: ModelType,
    pub timestep: usize,
    pub value: f64,
}

/// A prediction joined with the scenario that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    pub scenario_tag: Arc<str>,
    pub model_type: ModelType,
    pub timestep: usize,
    pub value: f64,
    pub scenario: Arc<ScenarioRecord>,
}

/// Mean, min and max of one trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub scenario_tag: String,
    pub model_type: ModelType,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// All rows for one predictor, ordered by model type, scenario, then time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionTable {
    pub predictor: Predictor,
    pub rows: Vec<PredictionRow>,
}

impl PredictionTable {
    pub fn new(predictor: Predictor, rows: Vec<PredictionRow>) -> Self {
        Self { predictor, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[PredictionRow] {
        &self.rows
    }

    /// Distinct scenario tags in first-seen order.
    pub fn scenario_tags(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut tags: Vec<&str> = Vec::new();
        for row in &self.rows {
            let tag: &str = &row.scenario_tag;
            if seen.insert(tag) {
                tags.push(tag);
            }
        }
        tags
    }

    /// Values for one scenario and model type, time ascending.
    pub fn trajectory(&self, scenario_tag: &str, model_type: ModelType) -> Vec<f64> {
        self.rows
            .iter()
            .filter(|r| r.model_type == model_type && &*r.scenario_tag == scenario_tag)
            .map(|r| r.value)
            .collect()
    }

    /// Per-scenario summary statistics, one entry per (model type, scenario).
    pub fn summary_by_scenario(&self) -> Vec<ScenarioSummary> {
        let mut summaries: Vec<(ScenarioSummary, usize)> = Vec::new();
        for row in &self.rows {
            let existing = summaries.iter_mut().rev().find(|(s, _)| {
                s.model_type == row.model_type && s.scenario_tag == *row.scenario_tag
            });
            match existing {
                Some((summary, count)) => {
                    summary.mean += row.value;
                    summary.min = summary.min.min(row.value);
                    summary.max = summary.max.max(row.value);
                    *count += 1;
                }
                None => summaries.push((
                    ScenarioSummary {
                        scenario_tag: row.scenario_tag.to_string(),
                        model_type: row.model_type,
                        mean: row.value,
                        min: row.value,
                        max: row.value,
                    },
                    1,
                )),
            }
        }
        summaries
            .into_iter()
            .map(|(mut summary, count)| {
                summary.mean /= count as f64;
                summary
            })
            .collect()
    }
}

/// Output of a pipeline run.
///
/// Every known predictor has a slot; predictors that were not requested
/// are `None`. `benchmarks` is present only when timing was requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmulatorResults {
    pub prevalence: Option<PredictionTable>,
    pub cases: Option<PredictionTable>,
    pub benchmarks: Option<BenchmarkRecord>,
}

impl EmulatorResults {
    pub fn table(&self, predictor: Predictor) -> Option<&PredictionTable> {
        match predictor {
            Predictor::Prevalence => self.prevalence.as_ref(),
            Predictor::Cases => self.cases.as_ref(),
        }
    }

    pub fn set_table(&mut self, table: PredictionTable) {
        match table.predictor {
            Predictor::Prevalence => self.prevalence = Some(table),
            Predictor::Cases => self.cases = Some(table),
        }
    }

    /// Tables that are present, in predictor order.
    pub fn tables(&self) -> impl Iterator<Item = &PredictionTable> {
        Predictor::ALL.into_iter().filter_map(move |p| self.table(p))
    }
}
