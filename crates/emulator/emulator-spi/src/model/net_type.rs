//! Insecticide-treated net categories.

use crate::error::{EmulatorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical intervention-net category.
///
/// Serialized by canonical name (`pyrethroid_only`, ...). Each category also
/// has a short code (`py_only`, ...) used by scenario inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetType {
    PyrethroidOnly,
    PyrethroidPbo,
    PyrethroidPyrrole,
    PyrethroidPpf,
}

impl NetType {
    pub const ALL: [NetType; 4] = [
        NetType::PyrethroidOnly,
        NetType::PyrethroidPbo,
        NetType::PyrethroidPyrrole,
        NetType::PyrethroidPpf,
    ];

    pub fn short_code(self) -> &'static str {
        match self {
            NetType::PyrethroidOnly => "py_only",
            NetType::PyrethroidPbo => "py_pbo",
            NetType::PyrethroidPyrrole => "py_pyrrole",
            NetType::PyrethroidPpf => "py_ppf",
        }
    }

    pub fn canonical_name(self) -> &'static str {
        match self {
            NetType::PyrethroidOnly => "pyrethroid_only",
            NetType::PyrethroidPbo => "pyrethroid_pbo",
            NetType::PyrethroidPyrrole => "pyrethroid_pyrrole",
            NetType::PyrethroidPpf => "pyrethroid_ppf",
        }
    }

    /// Translate a user-facing short code. Canonical names are not accepted here.
    pub fn from_short_code(code: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|net| net.short_code() == code)
            .ok_or_else(|| unknown(code))
    }
}

fn unknown(name: &str) -> EmulatorError {
    EmulatorError::UnknownNetType {
        name: name.to_string(),
        expected: NetType::ALL
            .iter()
            .map(|net| net.short_code())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

impl FromStr for NetType {
    type Err = EmulatorError;

    /// Accepts either a short code or a canonical name.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|net| net.short_code() == s || net.canonical_name() == s)
            .ok_or_else(|| unknown(s))
    }
}

impl fmt::Display for NetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}
