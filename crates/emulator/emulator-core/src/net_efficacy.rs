//! Net efficacy aggregation
//!
//! Combines per-net-type usage fractions and a resistance level into a single
//! `dn0` and an overall net usage. Per-type efficacy comes from a lookup table
//! of `dn0` against resistance, one curve per canonical net type.

use crate::lookup::LookupCurve;
use emulator_spi::{DN0Result, EmulatorError, NetType, Result};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

const BUILTIN_TABLE: &str = include_str!("../data/net_efficacy.json");
const BUILTIN_SOURCE: &str = "<builtin>/net_efficacy.json";

/// Tolerance on the usage sum before it counts as exceeding 1.
pub const USAGE_SUM_TOLERANCE: f64 = 1e-9;

static BUILTIN: OnceCell<Arc<NetEfficacyTable>> = OnceCell::new();

#[derive(Deserialize)]
struct TableDocument {
    resistance: Vec<f64>,
    curves: BTreeMap<NetType, Vec<f64>>,
}

/// Baseline `dn0` curves over resistance, one per net type.
#[derive(Debug, Clone, PartialEq)]
pub struct NetEfficacyTable {
    curves: BTreeMap<NetType, LookupCurve>,
}

impl NetEfficacyTable {
    /// The embedded table, parsed once per process.
    pub fn builtin() -> Result<Arc<Self>> {
        BUILTIN
            .get_or_try_init(|| {
                Self::from_json(Path::new(BUILTIN_SOURCE), BUILTIN_TABLE).map(Arc::new)
            })
            .cloned()
    }

    /// Load an external table.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EmulatorError::ArtifactNotFound {
                what: "Net efficacy table".to_string(),
                path: path.to_path_buf(),
                hint: "Check `net_efficacy_table` in the emulator configuration, or unset it to use the built-in table.".to_string(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| EmulatorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(path, &text)
    }

    /// Parse and validate a table document. `source` is used in error messages.
    pub fn from_json(source: &Path, text: &str) -> Result<Self> {
        let document: TableDocument =
            serde_json::from_str(text).map_err(|e| EmulatorError::InvalidArtifact {
                path: source.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut curves = BTreeMap::new();
        for net in NetType::ALL {
            let values = document.curves.get(&net).cloned().ok_or_else(|| {
                EmulatorError::InvalidArtifact {
                    path: source.to_path_buf(),
                    reason: format!("missing curve for {net}"),
                }
            })?;
            if values.iter().any(|v| !(0.0..=1.0).contains(v)) {
                return Err(EmulatorError::InvalidArtifact {
                    path: source.to_path_buf(),
                    reason: format!("{net}: dn0 values must lie in [0, 1]"),
                });
            }
            let curve = LookupCurve::new(
                source,
                net.canonical_name(),
                document.resistance.clone(),
                values,
            )?;
            let (lo, hi) = curve.domain();
            if lo > 0.0 || hi < 1.0 {
                return Err(EmulatorError::InvalidArtifact {
                    path: source.to_path_buf(),
                    reason: format!("resistance must span [0, 1], got [{lo}, {hi}]"),
                });
            }
            curves.insert(net, curve);
        }
        Ok(Self { curves })
    }

    /// Baseline `dn0` of `net` at `resistance` in [0, 1].
    pub fn dn0(&self, net: NetType, resistance: f64) -> Result<f64> {
        self.curves
            .get(&net)
            .and_then(|curve| curve.at(resistance))
            .ok_or_else(|| {
                EmulatorError::invalid_parameter(
                    "resistance_level",
                    format!("{resistance} is outside [0, 1]"),
                )
            })
    }
}

/// Usage-weighted combination of per-type net efficacy.
#[derive(Debug, Clone)]
pub struct NetEfficacyAggregator {
    table: Arc<NetEfficacyTable>,
}

impl NetEfficacyAggregator {
    pub fn new(table: Arc<NetEfficacyTable>) -> Self {
        Self { table }
    }

    /// Aggregator over the built-in table.
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(NetEfficacyTable::builtin()?))
    }

    pub fn table(&self) -> &NetEfficacyTable {
        &self.table
    }

    /// Combine usages keyed by short code (`py_only`, ...).
    ///
    /// Unknown codes are rejected before anything else is checked.
    pub fn aggregate_codes<'a, I>(&self, resistance_level: f64, usage: I) -> Result<DN0Result>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let typed = usage
            .into_iter()
            .map(|(code, fraction)| NetType::from_short_code(code).map(|net| (net, fraction)))
            .collect::<Result<Vec<_>>>()?;
        self.aggregate(resistance_level, typed)
    }

    /// Combine usages keyed by net type.
    ///
    /// `itn_use` is the plain sum of the usages, which must not exceed 1.
    /// `dn0` is the usage-weighted mean of the per-type efficacies, or 0 when
    /// nobody uses a net.
    pub fn aggregate<I>(&self, resistance_level: f64, usage: I) -> Result<DN0Result>
    where
        I: IntoIterator<Item = (NetType, f64)>,
    {
        let mut by_type: BTreeMap<NetType, f64> = BTreeMap::new();
        for (net, fraction) in usage {
            if by_type.insert(net, fraction).is_some() {
                return Err(EmulatorError::invalid_parameter(
                    net.short_code(),
                    "net type supplied more than once",
                ));
            }
        }
        if by_type.is_empty() {
            return Err(EmulatorError::EmptyNetUsage);
        }
        if !resistance_level.is_finite() || !(0.0..=1.0).contains(&resistance_level) {
            return Err(EmulatorError::invalid_parameter(
                "resistance_level",
                format!("{resistance_level} is outside [0, 1]"),
            ));
        }

        let mut itn_use = 0.0;
        let mut weighted = 0.0;
        for (&net, &fraction) in &by_type {
            if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
                return Err(EmulatorError::invalid_parameter(
                    net.short_code(),
                    format!("usage {fraction} is outside [0, 1]"),
                ));
            }
            itn_use += fraction;
            weighted += fraction * self.table.dn0(net, resistance_level)?;
        }

        if itn_use > 1.0 + USAGE_SUM_TOLERANCE {
            return Err(EmulatorError::NetUsageExceedsOne { total: itn_use });
        }
        let dn0 = if itn_use > 0.0 { weighted / itn_use } else { 0.0 };
        Ok(DN0Result::new(dn0.clamp(0.0, 1.0), itn_use.min(1.0)))
    }
}

/// Aggregate short-code usages against the built-in table.
pub fn calculate_overall_dn0<'a, I>(resistance_level: f64, usage: I) -> Result<DN0Result>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    NetEfficacyAggregator::builtin()?.aggregate_codes(resistance_level, usage)
}
