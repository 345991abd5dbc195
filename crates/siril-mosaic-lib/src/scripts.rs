//! Filter modes and the Siril script templates bound to them.
//!
//! Each [`FilterMode`] maps to exactly one `.ssf` filename and one template
//! payload. Templates are embedded at compile time and written to disk
//! verbatim; this crate never parses or edits their contents.
//
// Template text from https://github.com/naztronaut/siril-scripts
// (C) Nazmus Nasir (Naztronomy.com), used under GPL-3.0.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::SirilError;

const BROADBAND_SCRIPT: &str = include_str!("../templates/Naztronomy-Seestar_Broadband_Mosaic.ssf");
const NARROWBAND_SCRIPT: &str =
    include_str!("../templates/Naztronomy-Seestar_Narrowband_Mosaic.ssf");

/// Processing profile selecting which script template applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// UV/IR block filter; photometric colour calibration with broadband SPCC.
    #[default]
    Broadband,
    /// Light-pollution (dual band) filter; narrowband SPCC.
    Narrowband,
}

impl FilterMode {
    /// All modes, in the order tools iterate over them.
    pub const ALL: [FilterMode; 2] = [FilterMode::Broadband, FilterMode::Narrowband];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Broadband => "broadband",
            Self::Narrowband => "narrowband",
        }
    }

    /// Filename the script is stored under inside a project directory.
    pub fn script_name(self) -> &'static str {
        match self {
            Self::Broadband => "Naztronomy-Seestar_Broadband_Mosaic.ssf",
            Self::Narrowband => "Naztronomy-Seestar_Narrowband_Mosaic.ssf",
        }
    }

    /// Embedded template text for this mode.
    pub fn script_contents(self) -> &'static str {
        match self {
            Self::Broadband => BROADBAND_SCRIPT,
            Self::Narrowband => NARROWBAND_SCRIPT,
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = SirilError;

    /// Parse a mode name. Matching is exact: the tool surface documents the
    /// lowercase names only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "broadband" => Ok(Self::Broadband),
            "narrowband" => Ok(Self::Narrowband),
            other => Err(SirilError::UnknownFilter(other.to_string())),
        }
    }
}
