//! Source analysis-type codes
//!
//! Load cases in the source model are tagged with the kind of analysis that
//! produces them. The numeric codes match the source application's case-type
//! enumeration and are used to filter the case list shown to the user.

use serde::{Deserialize, Serialize};

/// Analysis type of a source load case
///
/// # Example
/// ```
/// use xfer_core::loads::AnalysisType;
///
/// assert_eq!(AnalysisType::LinearStatic.code(), 1);
/// assert_eq!(AnalysisType::from_code(4), Some(AnalysisType::ResponseSpectrum));
/// assert_eq!(AnalysisType::from_name("Modal"), Some(AnalysisType::Modal));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnalysisType {
    #[default]
    LinearStatic,
    NonlinearStatic,
    Modal,
    ResponseSpectrum,
    LinearHistory,
    NonlinearHistory,
    LinearDynamic,
    NonlinearDynamic,
    MovingLoad,
    Buckling,
    SteadyState,
    PowerSpectralDensity,
    LinearStaticMultiStep,
    HyperStatic,
}

impl AnalysisType {
    /// All analysis types in code order
    pub const ALL: [AnalysisType; 14] = [
        AnalysisType::LinearStatic,
        AnalysisType::NonlinearStatic,
        AnalysisType::Modal,
        AnalysisType::ResponseSpectrum,
        AnalysisType::LinearHistory,
        AnalysisType::NonlinearHistory,
        AnalysisType::LinearDynamic,
        AnalysisType::NonlinearDynamic,
        AnalysisType::MovingLoad,
        AnalysisType::Buckling,
        AnalysisType::SteadyState,
        AnalysisType::PowerSpectralDensity,
        AnalysisType::LinearStaticMultiStep,
        AnalysisType::HyperStatic,
    ];

    /// Numeric code used by the source model (1-based)
    pub fn code(&self) -> u8 {
        match self {
            AnalysisType::LinearStatic => 1,
            AnalysisType::NonlinearStatic => 2,
            AnalysisType::Modal => 3,
            AnalysisType::ResponseSpectrum => 4,
            AnalysisType::LinearHistory => 5,
            AnalysisType::NonlinearHistory => 6,
            AnalysisType::LinearDynamic => 7,
            AnalysisType::NonlinearDynamic => 8,
            AnalysisType::MovingLoad => 9,
            AnalysisType::Buckling => 10,
            AnalysisType::SteadyState => 11,
            AnalysisType::PowerSpectralDensity => 12,
            AnalysisType::LinearStaticMultiStep => 13,
            AnalysisType::HyperStatic => 14,
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            AnalysisType::LinearStatic => "Linear Static",
            AnalysisType::NonlinearStatic => "Nonlinear Static",
            AnalysisType::Modal => "Modal",
            AnalysisType::ResponseSpectrum => "Response Spectrum",
            AnalysisType::LinearHistory => "Linear History",
            AnalysisType::NonlinearHistory => "Nonlinear History",
            AnalysisType::LinearDynamic => "Linear Dynamic",
            AnalysisType::NonlinearDynamic => "Nonlinear Dynamic",
            AnalysisType::MovingLoad => "Moving Load",
            AnalysisType::Buckling => "Buckling",
            AnalysisType::SteadyState => "Steady State",
            AnalysisType::PowerSpectralDensity => "Power Spectral Density",
            AnalysisType::LinearStaticMultiStep => "Linear Static Multi Step",
            AnalysisType::HyperStatic => "Hyper Static",
        }
    }

    pub fn from_code(code: u8) -> Option<AnalysisType> {
        AnalysisType::ALL.iter().copied().find(|t| t.code() == code)
    }

    /// Look up by display name, ignoring case
    pub fn from_name(name: &str) -> Option<AnalysisType> {
        let name = name.trim();
        AnalysisType::ALL
            .iter()
            .copied()
            .find(|t| t.display_name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
