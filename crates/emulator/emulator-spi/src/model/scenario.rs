//! Fully resolved scenario inputs.

use crate::error::{EmulatorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of model inputs.
///
/// Current-period values apply before the intervention switch, `*_future`
/// values from it on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub scenario_tag: String,
    /// Entomological inoculation rate (infectious bites per person-year)
    pub eir: f64,
    /// Baseline prevalence the EIR was calibrated from, if seeded that way
    #[serde(default)]
    pub prevalence: Option<f64>,
    /// Pyrethroid resistance level, when built from raw net usage
    #[serde(default)]
    pub resistance: Option<f64>,
    pub dn0_use: f64,
    pub dn0_future: f64,
    pub itn_use: f64,
    pub itn_future: f64,
    #[serde(rename = "Q0")]
    pub q0: f64,
    pub phi_bednets: f64,
    pub seasonal: f64,
    pub routine: f64,
    pub irs_use: f64,
    pub irs_future: f64,
    pub lsm: f64,
}

const FRACTION: (f64, f64) = (0.0, 1.0);
const NON_NEGATIVE: (f64, f64) = (0.0, f64::INFINITY);

impl ScenarioRecord {
    /// Numeric fields with their valid closed ranges.
    pub fn numeric_fields(&self) -> Vec<(&'static str, f64, (f64, f64))> {
        let mut fields = vec![
            ("eir", self.eir, NON_NEGATIVE),
            ("dn0_use", self.dn0_use, FRACTION),
            ("dn0_future", self.dn0_future, FRACTION),
            ("itn_use", self.itn_use, FRACTION),
            ("itn_future", self.itn_future, FRACTION),
            ("Q0", self.q0, FRACTION),
            ("phi_bednets", self.phi_bednets, FRACTION),
            ("seasonal", self.seasonal, NON_NEGATIVE),
            ("routine", self.routine, FRACTION),
            ("irs_use", self.irs_use, FRACTION),
            ("irs_future", self.irs_future, FRACTION),
            ("lsm", self.lsm, FRACTION),
        ];
        if let Some(prevalence) = self.prevalence {
            fields.push(("prevalence", prevalence, FRACTION));
        }
        if let Some(resistance) = self.resistance {
            fields.push(("resistance", resistance, FRACTION));
        }
        fields
    }

    /// Check every field against its valid range.
    pub fn validate(&self) -> Result<()> {
        if self.scenario_tag.trim().is_empty() {
            return Err(EmulatorError::invalid_parameter(
                "scenario_tag",
                "must not be empty",
            ));
        }
        for (field, value, (min, max)) in self.numeric_fields() {
            if !value.is_finite() || value < min || value > max {
                return Err(EmulatorError::OutOfRange {
                    field: field.to_string(),
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// Ordered, validated scenarios with unique tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioBatch {
    records: Vec<ScenarioRecord>,
}

impl ScenarioBatch {
    /// Validate every record and tag uniqueness. Fails on the first bad row.
    pub fn new(records: Vec<ScenarioRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(EmulatorError::EmptyBatch);
        }
        {
            let mut seen: HashMap<&str, usize> = HashMap::with_capacity(records.len());
            for (row, record) in records.iter().enumerate() {
                record.validate().map_err(|e| e.in_row(row))?;
                if let Some(&first) = seen.get(record.scenario_tag.as_str()) {
                    return Err(EmulatorError::DuplicateScenarioTag {
                        tag: record.scenario_tag.clone(),
                        first,
                        second: row,
                    });
                }
                seen.insert(record.scenario_tag.as_str(), row);
            }
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ScenarioRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScenarioRecord> {
        self.records.iter()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.scenario_tag.as_str())
    }

    pub fn get(&self, tag: &str) -> Option<&ScenarioRecord> {
        self.records.iter().find(|r| r.scenario_tag == tag)
    }

    pub fn into_records(self) -> Vec<ScenarioRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a ScenarioBatch {
    type Item = &'a ScenarioRecord;
    type IntoIter = std::slice::Iter<'a, ScenarioRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl<'de> Deserialize<'de> for ScenarioBatch {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let records = Vec::<ScenarioRecord>::deserialize(deserializer)?;
        ScenarioBatch::new(records).map_err(serde::de::Error::custom)
    }
}
