//! Load case selection and peak axial aggregation
//!
//! # Overview
//!
//! - [`LoadCaseSelection`] - Ordered, unique list of source load cases
//! - [`LoadKey`] - Structured identity of a stored load value
//! - [`AnalysisType`] - Source analysis-type codes used to filter cases
//! - [`aggregator`] - Two-phase gather / reduce of peak axial forces
//!
//! Keys are structured; the familiar `P_max_DL_LL` string is only produced by
//! [`LoadKey::display_name`] when a key is shown or written out.
//!
//! # Example
//!
//! ```
//! use xfer_core::loads::{LoadCaseSelection, LoadKey};
//!
//! let selection = LoadCaseSelection::new(["DL", "LL"])?;
//! let key = selection.final_key();
//!
//! assert_eq!(key, LoadKey::combined(["DL", "LL"]));
//! assert_eq!(key.display_name(), "P_max_DL_LL");
//!
//! let single = LoadCaseSelection::new(["DL"])?;
//! assert_eq!(single.final_key().display_name(), "P_max_DL");
//! # Ok::<(), xfer_core::errors::XferError>(())
//! ```

pub mod aggregator;
pub mod analysis_types;

pub use aggregator::{
    aggregate, gather, reduce, AggregatedLoads, CaseGather, CaseLoads, CombinedLoad,
};
pub use analysis_types::AnalysisType;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::{XferError, XferResult};

/// Prefix of every displayed load key
pub const KEY_PREFIX: &str = "P_max";

/// Identity of a stored peak axial value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadKey {
    /// Peak axial force of a single load case
    Case(String),
    /// Sum over the listed cases, in selection order
    Combined(Vec<String>),
}

impl LoadKey {
    pub fn case(name: impl Into<String>) -> Self {
        LoadKey::Case(name.into())
    }

    pub fn combined<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LoadKey::Combined(names.into_iter().map(Into::into).collect())
    }

    /// Cases this key is derived from, in order
    pub fn cases(&self) -> Vec<&str> {
        match self {
            LoadKey::Case(name) => vec![name.as_str()],
            LoadKey::Combined(names) => names.iter().map(String::as_str).collect(),
        }
    }

    /// Presentation name: the prefix and the case names joined by `_`
    pub fn display_name(&self) -> String {
        let mut parts = vec![KEY_PREFIX];
        parts.extend(self.cases());
        parts.join("_")
    }
}

impl std::fmt::Display for LoadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Ordered selection of source load cases.
///
/// Order determines the combined key and the summation order. At least one
/// case is required and names must be unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadCaseSelection {
    cases: Vec<String>,
}

impl LoadCaseSelection {
    pub fn new<I, S>(names: I) -> XferResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cases: Vec<String> = names.into_iter().map(Into::into).collect();
        if cases.is_empty() {
            return Err(XferError::EmptySelection);
        }
        let mut seen = HashSet::new();
        for case in &cases {
            if !seen.insert(case.as_str()) {
                return Err(XferError::DuplicateCase { case: case.clone() });
            }
        }
        Ok(LoadCaseSelection { cases })
    }

    pub fn cases(&self) -> &[String] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Always false; a selection holds at least one case
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// More than one case, so a combined value is produced
    pub fn is_combined(&self) -> bool {
        self.cases.len() > 1
    }

    /// Per-case keys in selection order
    pub fn case_keys(&self) -> Vec<LoadKey> {
        self.cases.iter().map(|c| LoadKey::Case(c.clone())).collect()
    }

    /// Key whose values are transferred to the target
    pub fn final_key(&self) -> LoadKey {
        if self.is_combined() {
            LoadKey::Combined(self.cases.clone())
        } else {
            LoadKey::Case(self.cases[0].clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_validation() {
        let empty: [&str; 0] = [];
        assert_eq!(LoadCaseSelection::new(empty).unwrap_err(), XferError::EmptySelection);
        assert_eq!(
            LoadCaseSelection::new(["DL", "LL", "DL"]).unwrap_err(),
            XferError::DuplicateCase { case: "DL".to_string() }
        );
    }

    #[test]
    fn test_final_key_preserves_order() {
        let s = LoadCaseSelection::new(["LL", "DL", "SDL"]).unwrap();
        assert!(s.is_combined());
        assert_eq!(s.final_key().display_name(), "P_max_LL_DL_SDL");
        assert_eq!(s.case_keys()[0], LoadKey::case("LL"));
    }

    #[test]
    fn test_key_identity_is_structured() {
        // Case names containing underscores stay distinct from combinations
        let joined = LoadKey::case("DL_LL");
        let combined = LoadKey::combined(["DL", "LL"]);
        assert_ne!(joined, combined);
        assert_eq!(joined.display_name(), combined.display_name());
    }

    #[test]
    fn test_key_serialization() {
        let key = LoadKey::combined(["DL", "LL"]);
        let json = serde_json::to_string(&key).unwrap();
        let roundtrip: LoadKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, roundtrip);
    }
}
