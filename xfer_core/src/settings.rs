//! # Transfer Settings
//!
//! Session-wide configuration, loadable from a JSON file. Every field has a
//! default, so a partial file (or none at all) is valid.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "units": "LbIn",
//!   "analysis_type": "LinearStatic",
//!   "save_after_write": true,
//!   "scale_warning_tolerance": 0.01
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::XferResult;
use crate::file_io::load_json;
use crate::loads::AnalysisType;

/// Force/length unit pair both models are switched to before data is read.
///
/// Codes follow the source application's unit enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitSystem {
    #[default]
    LbIn,
    LbFt,
    KipIn,
    KipFt,
    KnMm,
    KnM,
}

impl UnitSystem {
    pub fn code(&self) -> u8 {
        match self {
            UnitSystem::LbIn => 1,
            UnitSystem::LbFt => 2,
            UnitSystem::KipIn => 3,
            UnitSystem::KipFt => 4,
            UnitSystem::KnMm => 5,
            UnitSystem::KnM => 6,
        }
    }

    pub fn force_unit(&self) -> &'static str {
        match self {
            UnitSystem::LbIn | UnitSystem::LbFt => "lb",
            UnitSystem::KipIn | UnitSystem::KipFt => "kip",
            UnitSystem::KnMm | UnitSystem::KnM => "kN",
        }
    }

    pub fn length_unit(&self) -> &'static str {
        match self {
            UnitSystem::LbIn | UnitSystem::KipIn => "in",
            UnitSystem::LbFt | UnitSystem::KipFt => "ft",
            UnitSystem::KnMm => "mm",
            UnitSystem::KnM => "m",
        }
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.force_unit(), self.length_unit())
    }
}

/// Settings for one transfer session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferSettings {
    /// Units both models must be expressed in
    pub units: UnitSystem,

    /// Analysis type used to filter the offered load cases (`None` = all)
    pub analysis_type: Option<AnalysisType>,

    /// Save the target model after a successful write
    pub save_after_write: bool,

    /// Relative difference between reference distances above which
    /// calibration logs a scale warning
    pub scale_warning_tolerance: f64,
}

impl Default for TransferSettings {
    fn default() -> Self {
        TransferSettings {
            units: UnitSystem::LbIn,
            analysis_type: Some(AnalysisType::LinearStatic),
            save_after_write: true,
            scale_warning_tolerance: 0.01,
        }
    }
}

/// Load settings from a JSON file.
pub fn load_settings(path: &Path) -> XferResult<TransferSettings> {
    load_json(path)
}
