//! # Collaborator Contracts
//!
//! The core never talks to the analysis or slab applications directly. It
//! goes through these two traits, implemented by whatever drives the
//! external programs. [`crate::snapshot`] provides JSON-backed
//! implementations.
//!
//! All calls are synchronous and may block for a long time (the source
//! model may run its analysis on first query). There is no cancellation.

use std::collections::HashMap;

use crate::columns::{find_columns, FrameElement};
use crate::errors::XferResult;
use crate::loads::AnalysisType;

/// The model where column demands are computed.
pub trait SourceModel {
    /// Every frame object in the model
    fn frame_elements(&self) -> XferResult<Vec<FrameElement>>;

    /// Story names, ordered as the source presents them.
    ///
    /// Defaults to the distinct stories of the model's columns.
    fn levels(&self) -> XferResult<Vec<String>> {
        let mut levels: Vec<String> = Vec::new();
        for column in find_columns(&self.frame_elements()?) {
            if !levels.contains(&column.story) {
                levels.push(column.story);
            }
        }
        Ok(levels)
    }

    /// Load case names, optionally only those of one analysis type
    fn load_cases(&self, analysis_type: Option<AnalysisType>) -> XferResult<Vec<String>>;

    /// Switch the case subsequent result queries report.
    ///
    /// Fails with `CaseNotFound` for a name the model does not define.
    fn set_active_case(&mut self, case: &str) -> XferResult<()>;

    /// Peak axial force under the active case, per requested column.
    ///
    /// Columns without reported results are left out of the map.
    fn peak_axial(&self, column_ids: &[String]) -> XferResult<HashMap<String, f64>>;
}

/// The model whose loading layers receive point loads.
pub trait TargetModel {
    /// Names of the loading layers available for writing
    fn loading_layers(&self) -> XferResult<Vec<String>>;

    /// Add one point load per index to `layer`.
    ///
    /// Fails with `LengthMismatch` when the three sequences differ in length
    /// and `LayerNotFound` when the layer does not exist.
    fn write_loading_values(
        &mut self,
        layer: &str,
        xs: &[f64],
        ys: &[f64],
        values: &[f64],
    ) -> XferResult<()>;

    /// Persist the modified model
    fn save(&mut self) -> XferResult<()>;
}
