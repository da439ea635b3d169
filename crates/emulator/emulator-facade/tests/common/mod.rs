//! Shared fixtures: a temporary directory of generated model artifacts.

#![allow(dead_code)]

use emulator_facade::{
    AggregatedParameters, CellWeights, EmulatorConfig, Feature, InputScaler, LinearHead,
    ModelArtifact, ModelKey, OutputTransform, Param, Predictor, RawNetParameters,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use tempfile::TempDir;

pub const HIDDEN: usize = 8;

pub fn features() -> Vec<Feature> {
    vec![
        Feature::Eir,
        Feature::Dn0,
        Feature::ItnUse,
        Feature::IrsUse,
        Feature::Lsm,
        Feature::Q0,
        Feature::PhiBednets,
        Feature::Seasonal,
        Feature::Routine,
        Feature::DaySin,
        Feature::DayCos,
        Feature::Years,
    ]
}

/// A small randomly initialised artifact for `key`.
pub fn artifact(key: ModelKey, seed: u64) -> ModelArtifact {
    let mut rng = StdRng::seed_from_u64(seed);
    let features = features();
    let inputs = features.len();
    let rows = key.model_type.gate_count() * HIDDEN;
    let mut matrix = |rows: usize, cols: usize| -> Vec<Vec<f64>> {
        (0..rows)
            .map(|_| (0..cols).map(|_| rng.gen_range(-0.4..0.4)).collect())
            .collect()
    };
    let w_ih = matrix(rows, inputs);
    let w_hh = matrix(rows, HIDDEN);
    let head = matrix(1, HIDDEN).remove(0);

    let (output, output_scale) = match key.predictor {
        Predictor::Prevalence => (OutputTransform::Sigmoid, 1.0),
        Predictor::Cases => (OutputTransform::Softplus, 0.01),
    };
    ModelArtifact {
        predictor: key.predictor,
        model_type: key.model_type,
        features,
        input_scaler: InputScaler {
            mean: vec![0.5; inputs],
            std: vec![2.0; inputs],
        },
        hidden_size: HIDDEN,
        cell: CellWeights {
            w_ih,
            w_hh,
            b_ih: vec![0.0; rows],
            b_hh: vec![0.0; rows],
        },
        head: LinearHead {
            weight: head,
            bias: -0.5,
        },
        output,
        output_scale,
        intervention_day: 1095,
    }
}

pub fn write_artifact(dir: &Path, key: ModelKey, seed: u64) {
    artifact(key, seed)
        .save(dir.join(key.artifact_file_name()))
        .unwrap();
}

/// Temporary models directory holding the given keys.
pub fn models_dir(keys: &[ModelKey]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (seed, key) in keys.iter().enumerate() {
        write_artifact(dir.path(), *key, seed as u64 + 1);
    }
    dir
}

/// Temporary models directory holding every known key.
pub fn full_models_dir() -> TempDir {
    models_dir(&ModelKey::all())
}

pub fn config(dir: &TempDir) -> EmulatorConfig {
    EmulatorConfig::default().with_models_dir(dir.path())
}

/// Aggregated parameters: a scalar everywhere except the given EIR series.
pub fn aggregated(eir: Vec<f64>) -> AggregatedParameters {
    AggregatedParameters {
        eir: Param::Series(eir),
        dn0_use: Param::Scalar(0.45),
        dn0_future: Param::Scalar(0.55),
        q0: Param::Scalar(0.92),
        phi_bednets: Param::Scalar(0.85),
        seasonal: Param::Scalar(0.0),
        routine: Param::Scalar(0.0),
        itn_use: Param::Scalar(0.5),
        irs_use: Param::Scalar(0.0),
        itn_future: Param::Scalar(0.6),
        irs_future: Param::Scalar(0.0),
        lsm: Param::Scalar(0.0),
        scenario_tag: None,
    }
}

/// Four named intervention scenarios in raw form.
pub fn four_scenarios() -> RawNetParameters {
    RawNetParameters {
        res_use: Param::Scalar(0.4),
        py_only: Some(Param::Series(vec![0.5, 0.0, 0.0, 0.0])),
        py_pbo: Some(Param::Series(vec![0.0, 0.5, 0.0, 0.0])),
        py_pyrrole: Some(Param::Series(vec![0.0, 0.0, 0.5, 0.0])),
        py_ppf: Some(Param::Series(vec![0.0, 0.0, 0.0, 0.5])),
        prev: Param::Scalar(0.3),
        season: Param::Scalar(1.0),
        irs_future: Param::Scalar(0.2),
        scenario_tag: Some(vec![
            "Pyrethroid_Only".to_string(),
            "PBO_Nets".to_string(),
            "Pyrrole_Nets".to_string(),
            "PPF_Nets".to_string(),
        ]),
        ..Default::default()
    }
}
