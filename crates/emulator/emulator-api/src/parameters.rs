//! Scenario input parameters.
//!
//! Every numeric field is either a scalar, replicated across the batch, or a
//! sequence with one value per scenario. A batch is described either by raw
//! net/IRS/LSM parameters or by already-aggregated entomological ones.

use emulator_spi::NetType;
use serde::{Deserialize, Serialize};

/// A scalar or per-scenario sequence of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Param {
    Scalar(f64),
    Series(Vec<f64>),
}

impl Param {
    /// Sequence length, or `None` for a scalar.
    pub fn len(&self) -> Option<usize> {
        match self {
            Param::Scalar(_) => None,
            Param::Series(values) => Some(values.len()),
        }
    }

    /// Value for batch row `row` once the batch length is known.
    ///
    /// Scalars and single-element sequences broadcast to every row. The
    /// caller is expected to have checked the sequence length first.
    pub fn value_at(&self, row: usize) -> f64 {
        match self {
            Param::Scalar(v) => *v,
            Param::Series(values) if values.len() == 1 => values[0],
            Param::Series(values) => values[row],
        }
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Scalar(value)
    }
}

impl From<Vec<f64>> for Param {
    fn from(values: Vec<f64>) -> Self {
        Param::Series(values)
    }
}

impl From<&[f64]> for Param {
    fn from(values: &[f64]) -> Self {
        Param::Series(values.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for Param {
    fn from(values: [f64; N]) -> Self {
        Param::Series(values.to_vec())
    }
}

/// Raw intervention parameters, aggregated into efficacy inputs when built.
///
/// Net usages are given per net type by short code. Future usages default
/// to the current ones and `res_future` defaults to `res_use`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawNetParameters {
    /// Pyrethroid resistance level
    pub res_use: Param,
    pub res_future: Option<Param>,
    pub py_only: Option<Param>,
    pub py_pbo: Option<Param>,
    pub py_pyrrole: Option<Param>,
    pub py_ppf: Option<Param>,
    pub py_only_future: Option<Param>,
    pub py_pbo_future: Option<Param>,
    pub py_pyrrole_future: Option<Param>,
    pub py_ppf_future: Option<Param>,
    /// Baseline parasite prevalence, converted to EIR during build
    pub prev: Param,
    #[serde(rename = "Q0")]
    pub q0: Param,
    pub phi: Param,
    pub season: Param,
    pub routine: Param,
    pub irs: Param,
    pub irs_future: Param,
    pub lsm: Param,
    pub scenario_tag: Option<Vec<String>>,
}

impl Default for RawNetParameters {
    fn default() -> Self {
        Self {
            res_use: Param::Scalar(0.0),
            res_future: None,
            py_only: None,
            py_pbo: None,
            py_pyrrole: None,
            py_ppf: None,
            py_only_future: None,
            py_pbo_future: None,
            py_pyrrole_future: None,
            py_ppf_future: None,
            prev: Param::Scalar(0.0),
            q0: Param::Scalar(0.92),
            phi: Param::Scalar(0.85),
            season: Param::Scalar(0.0),
            routine: Param::Scalar(0.0),
            irs: Param::Scalar(0.0),
            irs_future: Param::Scalar(0.0),
            lsm: Param::Scalar(0.0),
            scenario_tag: None,
        }
    }
}

impl RawNetParameters {
    /// Current-period net usages that were supplied, keyed by net type.
    pub fn net_usage(&self) -> Vec<(NetType, &Param)> {
        supplied([
            (NetType::PyrethroidOnly, &self.py_only),
            (NetType::PyrethroidPbo, &self.py_pbo),
            (NetType::PyrethroidPyrrole, &self.py_pyrrole),
            (NetType::PyrethroidPpf, &self.py_ppf),
        ])
    }

    /// Future-period net usages, or `None` when no future usage was supplied.
    pub fn future_net_usage(&self) -> Option<Vec<(NetType, &Param)>> {
        let future = supplied([
            (NetType::PyrethroidOnly, &self.py_only_future),
            (NetType::PyrethroidPbo, &self.py_pbo_future),
            (NetType::PyrethroidPyrrole, &self.py_pyrrole_future),
            (NetType::PyrethroidPpf, &self.py_ppf_future),
        ]);
        (!future.is_empty()).then_some(future)
    }

    /// All supplied numeric fields by input name, for shape checks.
    pub fn fields(&self) -> Vec<(&'static str, &Param)> {
        let mut fields = vec![
            ("res_use", &self.res_use),
            ("prev", &self.prev),
            ("Q0", &self.q0),
            ("phi", &self.phi),
            ("season", &self.season),
            ("routine", &self.routine),
            ("irs", &self.irs),
            ("irs_future", &self.irs_future),
            ("lsm", &self.lsm),
        ];
        let optional = [
            ("res_future", &self.res_future),
            ("py_only", &self.py_only),
            ("py_pbo", &self.py_pbo),
            ("py_pyrrole", &self.py_pyrrole),
            ("py_ppf", &self.py_ppf),
            ("py_only_future", &self.py_only_future),
            ("py_pbo_future", &self.py_pbo_future),
            ("py_pyrrole_future", &self.py_pyrrole_future),
            ("py_ppf_future", &self.py_ppf_future),
        ];
        fields.extend(
            optional
                .into_iter()
                .filter_map(|(name, param)| param.as_ref().map(|p| (name, p))),
        );
        fields
    }
}

fn supplied<'a>(entries: [(NetType, &'a Option<Param>); 4]) -> Vec<(NetType, &'a Param)> {
    entries
        .into_iter()
        .filter_map(|(net, param)| param.as_ref().map(|p| (net, p)))
        .collect()
}

/// Pre-aggregated entomological parameters, used as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedParameters {
    pub eir: Param,
    pub dn0_use: Param,
    pub dn0_future: Param,
    #[serde(rename = "Q0")]
    pub q0: Param,
    pub phi_bednets: Param,
    pub seasonal: Param,
    pub routine: Param,
    pub itn_use: Param,
    pub irs_use: Param,
    pub itn_future: Param,
    pub irs_future: Param,
    pub lsm: Param,
    #[serde(default)]
    pub scenario_tag: Option<Vec<String>>,
}

impl AggregatedParameters {
    /// All numeric fields by input name, for shape checks.
    pub fn fields(&self) -> Vec<(&'static str, &Param)> {
        vec![
            ("eir", &self.eir),
            ("dn0_use", &self.dn0_use),
            ("dn0_future", &self.dn0_future),
            ("Q0", &self.q0),
            ("phi_bednets", &self.phi_bednets),
            ("seasonal", &self.seasonal),
            ("routine", &self.routine),
            ("itn_use", &self.itn_use),
            ("irs_use", &self.irs_use),
            ("itn_future", &self.itn_future),
            ("irs_future", &self.irs_future),
            ("lsm", &self.lsm),
        ]
    }
}

/// Scenario inputs in either supported shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioParameters {
    Raw(RawNetParameters),
    Aggregated(AggregatedParameters),
}

impl From<RawNetParameters> for ScenarioParameters {
    fn from(params: RawNetParameters) -> Self {
        ScenarioParameters::Raw(params)
    }
}

impl From<AggregatedParameters> for ScenarioParameters {
    fn from(params: AggregatedParameters) -> Self {
        ScenarioParameters::Aggregated(params)
    }
}
