//! Scenario batch assembly
//!
//! Turns [`ScenarioParameters`] into a validated [`ScenarioBatch`]. Numeric
//! inputs are scalars or per-scenario sequences; the batch length is fixed in
//! a single broadcast pass before any row is built.

use crate::eir::EirCalibration;
use crate::net_efficacy::{NetEfficacyAggregator, NetEfficacyTable};
use emulator_api::{
    AggregatedParameters, EmulatorConfig, Param, RawNetParameters, ScenarioParameters,
};
use emulator_spi::{EmulatorError, NetType, Result, ScenarioBatch, ScenarioRecord};
use std::sync::Arc;
use tracing::debug;

/// Minimum width of generated scenario tags.
const TAG_WIDTH: usize = 3;

/// Builds scenario batches from raw or pre-aggregated parameters.
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    aggregator: NetEfficacyAggregator,
    calibration: Arc<EirCalibration>,
}

impl ScenarioBuilder {
    pub fn new(aggregator: NetEfficacyAggregator, calibration: Arc<EirCalibration>) -> Self {
        Self {
            aggregator,
            calibration,
        }
    }

    /// Builder over the built-in net-efficacy table and EIR calibration.
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(
            NetEfficacyAggregator::builtin()?,
            EirCalibration::builtin()?,
        ))
    }

    /// Builder using the reference tables named in `config`, falling back to
    /// the built-in ones.
    pub fn from_config(config: &EmulatorConfig) -> Result<Self> {
        let table = match &config.net_efficacy_table {
            Some(path) => Arc::new(NetEfficacyTable::from_path(path)?),
            None => NetEfficacyTable::builtin()?,
        };
        let calibration = match &config.eir_calibration {
            Some(path) => Arc::new(EirCalibration::from_path(path)?),
            None => EirCalibration::builtin()?,
        };
        Ok(Self::new(NetEfficacyAggregator::new(table), calibration))
    }

    pub fn aggregator(&self) -> &NetEfficacyAggregator {
        &self.aggregator
    }

    pub fn calibration(&self) -> &EirCalibration {
        &self.calibration
    }

    /// Build a batch from either parameter shape.
    pub fn build(&self, parameters: &ScenarioParameters) -> Result<ScenarioBatch> {
        match parameters {
            ScenarioParameters::Raw(raw) => self.build_raw(raw),
            ScenarioParameters::Aggregated(aggregated) => self.build_aggregated(aggregated),
        }
    }

    /// Aggregate raw net usage per row, for the current and future periods
    /// independently, and calibrate EIR from prevalence.
    pub fn build_raw(&self, params: &RawNetParameters) -> Result<ScenarioBatch> {
        let n = batch_len(&params.fields(), params.scenario_tag.as_deref())?;
        let tags = scenario_tags(params.scenario_tag.as_deref(), n);
        let current_usage = params.net_usage();
        let future_usage = params.future_net_usage();

        let mut records = Vec::with_capacity(n);
        for (row, scenario_tag) in tags.into_iter().enumerate() {
            let record = self
                .raw_row(params, &current_usage, future_usage.as_deref(), row, scenario_tag)
                .map_err(|e| e.in_row(row))?;
            records.push(record);
        }
        let batch = ScenarioBatch::new(records)?;
        debug!(rows = batch.len(), "built scenario batch from raw parameters");
        Ok(batch)
    }

    fn raw_row(
        &self,
        params: &RawNetParameters,
        current_usage: &[(NetType, &Param)],
        future_usage: Option<&[(NetType, &Param)]>,
        row: usize,
        scenario_tag: String,
    ) -> Result<ScenarioRecord> {
        let resistance = params.res_use.value_at(row);
        let resistance_future = params
            .res_future
            .as_ref()
            .map_or(resistance, |p| p.value_at(row));

        let at_row = |usage: &[(NetType, &Param)]| -> Vec<(NetType, f64)> {
            usage.iter().map(|(net, p)| (*net, p.value_at(row))).collect()
        };
        let current = self.aggregator.aggregate(resistance, at_row(current_usage))?;
        let future = self.aggregator.aggregate(
            resistance_future,
            at_row(future_usage.unwrap_or(current_usage)),
        )?;

        let prevalence = params.prev.value_at(row);
        let eir = self.calibration.eir_for_prevalence(prevalence)?;

        Ok(ScenarioRecord {
            scenario_tag,
            eir,
            prevalence: Some(prevalence),
            resistance: Some(resistance),
            dn0_use: current.dn0(),
            dn0_future: future.dn0(),
            itn_use: current.itn_use(),
            itn_future: future.itn_use(),
            q0: params.q0.value_at(row),
            phi_bednets: params.phi.value_at(row),
            seasonal: params.season.value_at(row),
            routine: params.routine.value_at(row),
            irs_use: params.irs.value_at(row),
            irs_future: params.irs_future.value_at(row),
            lsm: params.lsm.value_at(row),
        })
    }

    /// Use pre-aggregated parameters as they are.
    pub fn build_aggregated(&self, params: &AggregatedParameters) -> Result<ScenarioBatch> {
        let n = batch_len(&params.fields(), params.scenario_tag.as_deref())?;
        let records = scenario_tags(params.scenario_tag.as_deref(), n)
            .into_iter()
            .enumerate()
            .map(|(row, scenario_tag)| ScenarioRecord {
                scenario_tag,
                eir: params.eir.value_at(row),
                prevalence: None,
                resistance: None,
                dn0_use: params.dn0_use.value_at(row),
                dn0_future: params.dn0_future.value_at(row),
                itn_use: params.itn_use.value_at(row),
                itn_future: params.itn_future.value_at(row),
                q0: params.q0.value_at(row),
                phi_bednets: params.phi_bednets.value_at(row),
                seasonal: params.seasonal.value_at(row),
                routine: params.routine.value_at(row),
                irs_use: params.irs_use.value_at(row),
                irs_future: params.irs_future.value_at(row),
                lsm: params.lsm.value_at(row),
            })
            .collect();
        let batch = ScenarioBatch::new(records)?;
        debug!(rows = batch.len(), "built scenario batch from aggregated parameters");
        Ok(batch)
    }
}

/// Resolve the batch length and check every field broadcasts to it.
///
/// The length is the longest sequence among the numeric fields and the tag
/// list, or 1 when everything is scalar. Each sequence must then have
/// length 1 or `N`; supplied tags must have exactly `N` entries.
pub fn batch_len(fields: &[(&'static str, &Param)], tags: Option<&[String]>) -> Result<usize> {
    let n = fields
        .iter()
        .filter_map(|(_, p)| p.len())
        .chain(tags.map(<[String]>::len))
        .max()
        .unwrap_or(1)
        .max(1);

    for (name, param) in fields {
        if let Some(len) = param.len() {
            if len != 1 && len != n {
                return Err(EmulatorError::ShapeMismatch {
                    field: name.to_string(),
                    len,
                    expected: n,
                });
            }
        }
    }
    if let Some(tags) = tags {
        if tags.len() != n {
            return Err(EmulatorError::ShapeMismatch {
                field: "scenario_tag".to_string(),
                len: tags.len(),
                expected: n,
            });
        }
    }
    Ok(n)
}

/// Supplied tags, or zero-padded row indices `000`, `001`, ...
fn scenario_tags(supplied: Option<&[String]>, n: usize) -> Vec<String> {
    match supplied {
        Some(tags) => tags.to_vec(),
        None => {
            let width = TAG_WIDTH.max(n.saturating_sub(1).to_string().len());
            (0..n).map(|i| format!("{i:0width$}")).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emulator_spi::ErrorKind;

    fn builder() -> ScenarioBuilder {
        ScenarioBuilder::builtin().unwrap()
    }

    fn aggregated() -> AggregatedParameters {
        AggregatedParameters {
            eir: Param::Scalar(50.0),
            dn0_use: Param::Scalar(0.5),
            dn0_future: Param::Scalar(0.6),
            q0: Param::Scalar(0.92),
            phi_bednets: Param::Scalar(0.85),
            seasonal: Param::Scalar(1.0),
            routine: Param::Scalar(0.0),
            itn_use: Param::Scalar(0.5),
            irs_use: Param::Scalar(0.0),
            itn_future: Param::Scalar(0.6),
            irs_future: Param::Scalar(0.2),
            lsm: Param::Scalar(0.0),
            scenario_tag: None,
        }
    }

    fn raw() -> RawNetParameters {
        RawNetParameters {
            res_use: Param::Scalar(0.3),
            py_only: Some(Param::Scalar(0.4)),
            prev: Param::Scalar(0.25),
            ..Default::default()
        }
    }

    #[test]
    fn test_all_scalars_build_one_row() {
        let batch = builder().build_aggregated(&aggregated()).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.records()[0].scenario_tag, "000");
    }

    #[test]
    fn test_scalars_broadcast_to_sequence_length() {
        let mut params = aggregated();
        params.eir = Param::Series(vec![10.0, 20.0, 30.0]);
        let batch = builder().build_aggregated(&params).unwrap();
        assert_eq!(batch.len(), 3);
        for record in batch.iter() {
            assert_eq!(record.dn0_use, 0.5);
        }
        assert_eq!(batch.records()[2].eir, 30.0);
    }

    #[test]
    fn test_single_element_sequence_broadcasts() {
        let mut params = aggregated();
        params.eir = Param::Series(vec![10.0, 20.0]);
        params.lsm = Param::Series(vec![0.3]);
        let batch = builder().build_aggregated(&params).unwrap();
        assert!(batch.iter().all(|r| r.lsm == 0.3));
    }

    #[test]
    fn test_shape_mismatch_names_field() {
        let mut params = aggregated();
        params.eir = Param::Series(vec![10.0, 20.0, 30.0]);
        params.q0 = Param::Series(vec![0.9, 0.8]);
        let err = builder().build_aggregated(&params).unwrap_err();
        match err {
            EmulatorError::ShapeMismatch {
                field,
                len,
                expected,
            } => {
                assert_eq!(field, "Q0");
                assert_eq!(len, 2);
                assert_eq!(expected, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_sequence_is_rejected() {
        let mut params = aggregated();
        params.routine = Param::Series(Vec::new());
        let err = builder().build_aggregated(&params).unwrap_err();
        assert!(err.to_string().contains("'routine' has length 0"));
    }

    #[test]
    fn test_generated_tags_widen_with_batch() {
        assert_eq!(scenario_tags(None, 3), vec!["000", "001", "002"]);
        let tags = scenario_tags(None, 1001);
        assert_eq!(tags[0], "0000");
        assert_eq!(tags[1000], "1000");
    }

    #[test]
    fn test_supplied_tags_are_used() {
        let mut params = aggregated();
        params.scenario_tag = Some(vec!["baseline".into(), "pbo".into()]);
        let batch = builder().build_aggregated(&params).unwrap();
        assert_eq!(batch.tags().collect::<Vec<_>>(), vec!["baseline", "pbo"]);
    }

    #[test]
    fn test_tag_length_must_match() {
        let mut params = aggregated();
        params.eir = Param::Series(vec![10.0, 20.0, 30.0]);
        params.scenario_tag = Some(vec!["a".into(), "b".into()]);
        let err = builder().build_aggregated(&params).unwrap_err();
        assert!(err.to_string().contains("scenario_tag"));
    }

    #[test]
    fn test_duplicate_tags_are_rejected() {
        let mut params = aggregated();
        params.scenario_tag = Some(vec!["a".into(), "a".into()]);
        let err = builder().build_aggregated(&params).unwrap_err();
        assert!(err.to_string().contains("Duplicate scenario tag 'a'"));
    }

    #[test]
    fn test_invalid_row_is_reported_by_index() {
        let mut params = aggregated();
        params.itn_use = Param::Series(vec![0.5, 0.5, 1.4]);
        let err = builder().build_aggregated(&params).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("row 2"), "{message}");
        assert!(message.contains("itn_use"), "{message}");
    }

    #[test]
    fn test_raw_row_aggregates_net_usage() {
        let b = builder();
        let batch = b.build_raw(&raw()).unwrap();
        let record = &batch.records()[0];
        let expected = b
            .aggregator()
            .aggregate(0.3, [(NetType::PyrethroidOnly, 0.4)])
            .unwrap();
        assert!((record.dn0_use - expected.dn0()).abs() < 1e-12);
        assert!((record.itn_use - 0.4).abs() < 1e-12);
        // Future defaults to current
        assert_eq!(record.dn0_future, record.dn0_use);
        assert_eq!(record.itn_future, record.itn_use);
        assert_eq!(record.resistance, Some(0.3));
        assert_eq!(record.q0, 0.92);
        assert_eq!(record.phi_bednets, 0.85);
    }

    #[test]
    fn test_raw_prevalence_is_calibrated() {
        let b = builder();
        let batch = b.build_raw(&raw()).unwrap();
        let record = &batch.records()[0];
        assert_eq!(record.prevalence, Some(0.25));
        let expected = b.calibration().eir_for_prevalence(0.25).unwrap();
        assert_eq!(record.eir, expected);
    }

    #[test]
    fn test_raw_future_usage_aggregated_separately() {
        let params = RawNetParameters {
            py_pyrrole_future: Some(Param::Scalar(0.6)),
            res_future: Some(Param::Scalar(0.5)),
            ..raw()
        };
        let b = builder();
        let record = b.build_raw(&params).unwrap().into_records().remove(0);
        let future = b
            .aggregator()
            .aggregate(0.5, [(NetType::PyrethroidPyrrole, 0.6)])
            .unwrap();
        assert!((record.dn0_future - future.dn0()).abs() < 1e-12);
        assert!((record.itn_future - 0.6).abs() < 1e-12);
        assert!((record.itn_use - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_raw_without_net_usage_fails() {
        let params = RawNetParameters {
            py_only: None,
            ..raw()
        };
        let err = builder().build_raw(&params).unwrap_err();
        assert!(err.to_string().contains("must supply at least one"));
    }

    #[test]
    fn test_raw_usage_above_one_reports_row() {
        let params = RawNetParameters {
            py_only: Some(Param::Series(vec![0.4, 0.7])),
            py_pbo: Some(Param::Scalar(0.4)),
            ..raw()
        };
        let err = builder().build_raw(&params).unwrap_err();
        assert!(err.to_string().starts_with("Scenario row 1:"), "{err}");
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn test_raw_prevalence_out_of_calibration() {
        let params = RawNetParameters {
            prev: Param::Scalar(0.99),
            ..raw()
        };
        let err = builder().build_raw(&params).unwrap_err();
        assert!(err.to_string().contains("'prev'"));
    }

    #[test]
    fn test_build_dispatches_on_variant() {
        let b = builder();
        let batch = b.build(&ScenarioParameters::from(raw())).unwrap();
        assert!(batch.records()[0].prevalence.is_some());
        let batch = b.build(&ScenarioParameters::from(aggregated())).unwrap();
        assert!(batch.records()[0].prevalence.is_none());
    }
}
