//! Integration tests for the emulator components
//!
//! Exercises the aggregator, builder, loader and cache together against
//! artifacts written to a temporary directory.

mod common;

use emulator_facade::{
    calculate_overall_dn0, EmulatorError, ErrorKind, FileModelLoader, ModelCache, ModelHandle,
    ModelKey, ModelType, NetType, Param, Predictor, RecurrentModel, ScenarioBuilder,
    ScenarioParameters, TimeSeriesModel, WarmUp, WarmUpOptions,
};
use std::sync::Arc;
use std::thread;

#[test]
fn test_dn0_from_short_codes() {
    let result = calculate_overall_dn0(0.3, [("py_only", 0.4), ("py_pbo", 0.2)]).unwrap();
    assert!((result.itn_use() - 0.6).abs() < 1e-12);
    assert!(result.dn0() > 0.0 && result.dn0() < 1.0);
}

#[test]
fn test_dn0_rejects_unknown_and_empty() {
    let err = calculate_overall_dn0(0.3, [("unknown_net", 0.5)]).unwrap_err();
    assert!(err.to_string().contains("Unknown net type"));
    let err = calculate_overall_dn0(0.3, Vec::<(&str, f64)>::new()).unwrap_err();
    assert!(err.to_string().contains("must supply at least one"));
}

#[test]
fn test_pbo_outperforms_pyrethroid_only_under_resistance() {
    let only = calculate_overall_dn0(0.8, [("py_only", 0.5)]).unwrap();
    let pbo = calculate_overall_dn0(0.8, [("py_pbo", 0.5)]).unwrap();
    assert!(pbo.dn0() > only.dn0());
    assert_eq!(NetType::PyrethroidPbo.short_code(), "py_pbo");
}

#[test]
fn test_builder_broadcasts_scalars() {
    let builder = ScenarioBuilder::builtin().unwrap();
    let params = common::aggregated(vec![1.0, 5.0, 20.0, 80.0, 150.0]);
    let batch = builder.build(&ScenarioParameters::Aggregated(params)).unwrap();
    assert_eq!(batch.len(), 5);
    assert!(batch.iter().all(|r| r.q0 == 0.92));
    let tags: Vec<&str> = batch.tags().collect();
    assert_eq!(tags, vec!["000", "001", "002", "003", "004"]);
}

#[test]
fn test_builder_shape_mismatch_names_field() {
    let builder = ScenarioBuilder::builtin().unwrap();
    let mut params = common::aggregated(vec![1.0, 5.0, 20.0]);
    params.itn_use = Param::Series(vec![0.1, 0.2]);
    let err = builder
        .build(&ScenarioParameters::Aggregated(params))
        .unwrap_err();
    match err {
        EmulatorError::ShapeMismatch { field, .. } => assert_eq!(field, "itn_use"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_builder_raw_four_scenarios() {
    let builder = ScenarioBuilder::builtin().unwrap();
    let batch = builder
        .build(&ScenarioParameters::Raw(common::four_scenarios()))
        .unwrap();
    assert_eq!(batch.len(), 4);
    for record in batch.iter() {
        assert!((record.itn_use - 0.5).abs() < 1e-12);
        assert_eq!(record.resistance, Some(0.4));
        assert_eq!(record.irs_future, 0.2);
    }
    let only = batch.get("Pyrethroid_Only").unwrap();
    let pyrrole = batch.get("Pyrrole_Nets").unwrap();
    assert!(pyrrole.dn0_use > only.dn0_use);
}

#[test]
fn test_file_loader_and_model_run() {
    let dir = common::models_dir(&[ModelKey::new(Predictor::Prevalence, ModelType::Gru)]);
    let model = RecurrentModel::from_path(dir.path().join("prevalence_gru.json")).unwrap();
    let batch = ScenarioBuilder::builtin()
        .unwrap()
        .build(&ScenarioParameters::Aggregated(common::aggregated(vec![30.0])))
        .unwrap();
    let values = model.predict(&batch.records()[0], 400).unwrap();
    assert_eq!(values.len(), 400);
    assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
}

#[test]
fn test_cache_returns_identical_handle_after_one_load() {
    let dir = common::full_models_dir();
    let cache = ModelCache::with_loader(FileModelLoader::new(dir.path()));
    let key = ModelKey::new(Predictor::Cases, ModelType::Lstm);

    let first = cache.get(key).unwrap();
    // Removing the artifact proves the second call does not touch disk
    std::fs::remove_file(dir.path().join(key.artifact_file_name())).unwrap();
    let second = cache.get(key).unwrap();
    assert!(ModelHandle::ptr_eq(&first, &second));
    assert_eq!(cache.loaded_keys(), vec![key]);
}

#[test]
fn test_cache_concurrent_first_access() {
    let dir = common::full_models_dir();
    let cache = Arc::new(ModelCache::with_loader(FileModelLoader::new(dir.path())));
    let key = ModelKey::new(Predictor::Prevalence, ModelType::Lstm);

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.get(key).unwrap())
        })
        .collect();
    let models: Vec<ModelHandle> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(models.windows(2).all(|w| ModelHandle::ptr_eq(&w[0], &w[1])));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_missing_artifact_error_is_actionable() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ModelCache::with_loader(FileModelLoader::new(dir.path()));
    let err = cache
        .get(ModelKey::new(Predictor::Prevalence, ModelType::Lstm))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArtifactNotFound);
    let message = err.to_string();
    assert!(message.contains(&dir.path().display().to_string()), "{message}");
    assert!(message.contains("MINTER_MODELS_DIR"), "{message}");
}

#[test]
fn test_warm_up_subset_and_lenient_missing() {
    let dir = common::models_dir(&[ModelKey::new(Predictor::Prevalence, ModelType::Lstm)]);
    let cache = ModelCache::with_loader(FileModelLoader::new(dir.path()));
    let report = cache
        .warm_up(
            &WarmUp::Subset(vec![
                ModelKey::new(Predictor::Prevalence, ModelType::Lstm),
                ModelKey::new(Predictor::Cases, ModelType::Gru),
            ]),
            WarmUpOptions::default(),
        )
        .unwrap();
    assert_eq!(report.loaded.len(), 1);
    assert_eq!(report.missing, vec![ModelKey::new(Predictor::Cases, ModelType::Gru)]);
}

#[test]
fn test_corrupt_artifact_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("prevalence_lstm.json"), "{ not json").unwrap();
    let cache = ModelCache::with_loader(FileModelLoader::new(dir.path()));
    let err = cache
        .get(ModelKey::new(Predictor::Prevalence, ModelType::Lstm))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Artifact);
}
