//! # Transfer Session
//!
//! One active session owns both collaborators and the column table, and
//! exposes the three user actions in order:
//!
//! 1. [`TransferSession::pull_data`] - read columns from the source model
//! 2. [`TransferSession::calibrate`] - register source onto target coordinates
//! 3. [`TransferSession::transfer`] - aggregate loads for a level and write them
//!
//! Each action runs to completion before the next starts. Validation and
//! precondition failures are raised before the table changes.
//!
//! ## Example
//!
//! ```rust
//! use xfer_core::columns::{FrameElement, FramePoint};
//! use xfer_core::geometry::{CorrespondencePair, Point2D};
//! use xfer_core::loads::{AnalysisType, LoadCaseSelection};
//! use xfer_core::session::TransferSession;
//! use xfer_core::settings::TransferSettings;
//! use xfer_core::snapshot::{SourceSnapshot, TargetSnapshot};
//!
//! let mut source = SourceSnapshot::default();
//! source.add_frame(FrameElement::new(
//!     "C1", "L2",
//!     FramePoint::new(2.0, 0.0, 0.0),
//!     FramePoint::new(2.0, 0.0, 144.0),
//! ));
//! source.add_case("DL", AnalysisType::LinearStatic);
//! source.set_station_forces("DL", "C1", vec![-100.0]);
//!
//! let target = TargetSnapshot::with_layers(["Column Loads"]);
//! let mut session = TransferSession::pull_data(source, target, TransferSettings::default())?;
//!
//! session.calibrate(&CorrespondencePair::new(
//!     Point2D::new(0.0, 0.0),
//!     Point2D::new(10.0, 0.0),
//!     Point2D::new(5.0, 5.0),
//!     Point2D::new(5.0, 15.0),
//! )?)?;
//!
//! let report = session.transfer("L2", &LoadCaseSelection::new(["DL"])?, "Column Loads")?;
//! assert_eq!(report.column_count, 1);
//! assert_eq!(report.key_name, "P_max_DL");
//! # Ok::<(), xfer_core::errors::XferError>(())
//! ```

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calibration::{map_columns, solve, CalibrationQuality, RigidTransform};
use crate::columns::{find_columns, ColumnTable};
use crate::errors::{XferError, XferResult};
use crate::geometry::{CorrespondencePair, Point2D};
use crate::loads::{aggregate, AggregatedLoads, AnalysisType, LoadCaseSelection, LoadKey};
use crate::model::{SourceModel, TargetModel};
use crate::settings::TransferSettings;
use crate::transfer::{assemble, TransferBatch};

/// Outcome of a calibration action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub transform: RigidTransform,
    pub quality: CalibrationQuality,
    pub mapped_columns: usize,
}

impl CalibrationReport {
    /// Rotation angle in degrees
    pub fn angle_degrees(&self) -> f64 {
        self.transform.angle_degrees()
    }

    pub fn translation(&self) -> Point2D {
        self.transform.translation()
    }
}

/// Outcome of a transfer action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferReport {
    pub session_id: Uuid,
    pub level: String,
    pub layer: String,
    pub key: LoadKey,
    /// Display form of `key`
    pub key_name: String,
    pub column_count: usize,
    /// Sum of the written values
    pub total: f64,
    pub table_version: u64,
    pub saved: bool,
    pub completed_at: DateTime<Utc>,
}

/// The single active transfer session.
pub struct TransferSession<S: SourceModel, T: TargetModel> {
    id: Uuid,
    started: DateTime<Utc>,
    settings: TransferSettings,
    source: S,
    target: T,
    table: ColumnTable,
    transform: Option<RigidTransform>,
}

impl<S: SourceModel, T: TargetModel> TransferSession<S, T> {
    /// Start a session by reading the column table from `source`.
    pub fn pull_data(source: S, target: T, settings: TransferSettings) -> XferResult<Self> {
        let id = Uuid::new_v4();
        info!("Session {} started, units {}", id, settings.units);

        let frames = source.frame_elements()?;
        let table = ColumnTable::new(find_columns(&frames))?;
        info!(
            "Accessed {} frame elements, {} columns on {} levels",
            frames.len(),
            table.len(),
            table.levels().len()
        );

        let layers = target.loading_layers()?;
        info!("Detected target loading layers: {:?}", layers);

        Ok(TransferSession {
            id,
            started: Utc::now(),
            settings,
            source,
            target,
            table,
            transform: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started(&self) -> DateTime<Utc> {
        self.started
    }

    pub fn settings(&self) -> &TransferSettings {
        &self.settings
    }

    pub fn table(&self) -> &ColumnTable {
        &self.table
    }

    /// Transform from the last successful calibration
    pub fn transform(&self) -> Option<&RigidTransform> {
        self.transform.as_ref()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    /// End the session, handing the collaborators back
    pub fn into_parts(self) -> (S, T) {
        (self.source, self.target)
    }

    /// Story names offered for selection
    pub fn levels(&self) -> XferResult<Vec<String>> {
        self.source.levels()
    }

    /// Load cases of one analysis type, or all when `None`
    pub fn load_cases(&self, analysis_type: Option<AnalysisType>) -> XferResult<Vec<String>> {
        self.source.load_cases(analysis_type)
    }

    /// Load cases filtered by the configured analysis type
    pub fn offered_load_cases(&self) -> XferResult<Vec<String>> {
        self.load_cases(self.settings.analysis_type)
    }

    pub fn loading_layers(&self) -> XferResult<Vec<String>> {
        self.target.loading_layers()
    }

    /// Solve the transform for `pair` and map every column with it.
    ///
    /// Replaces any earlier calibration. On failure nothing changes.
    pub fn calibrate(&mut self, pair: &CorrespondencePair) -> XferResult<CalibrationReport> {
        let transform = solve(pair)?;
        let quality = CalibrationQuality::measure(&transform, pair);
        if quality.is_scale_mismatched(self.settings.scale_warning_tolerance) {
            warn!(
                "Reference distances differ (source {:.3}, target {:.3}); point 2 is off by {:.3}",
                quality.source_distance, quality.target_distance, quality.point2_error
            );
        }

        let mapping = map_columns(&transform, &self.table);
        self.table.merge_mapping(&mapping);
        self.transform = Some(transform);

        let translation = transform.translation();
        info!("Rotation calibration matrix: {:?}", transform.rotation_matrix());
        info!(
            "Delta translation values; x: {:.2}{unit}, y: {:.2}{unit}",
            translation.x,
            translation.y,
            unit = self.settings.units.length_unit()
        );

        Ok(CalibrationReport {
            transform,
            quality,
            mapped_columns: mapping.len(),
        })
    }

    /// Aggregate `selection` over the columns of `level` and store the
    /// values in the table. Returns the key to transfer.
    pub fn aggregate(&mut self, level: &str, selection: &LoadCaseSelection) -> XferResult<LoadKey> {
        self.require_level(level)?;
        let loads = self.gather_level(level, selection)?;
        self.table.merge_loads(&loads);
        Ok(selection.final_key())
    }

    /// Batch that a transfer of `key` on `level` would write
    pub fn preview(&self, level: &str, key: &LoadKey) -> XferResult<TransferBatch> {
        assemble(&self.table, level, key)
    }

    /// Aggregate, assemble and write the loads of `level` into `layer`.
    ///
    /// The aggregated values are merged into a candidate table that replaces
    /// the session's table only once the batch has been written.
    pub fn transfer(
        &mut self,
        level: &str,
        selection: &LoadCaseSelection,
        layer: &str,
    ) -> XferResult<TransferReport> {
        info!(
            "Transfer requested: level {}, cases {:?}, layer {}",
            level,
            selection.cases(),
            layer
        );
        self.require_level(level)?;
        self.require_layer(layer)?;
        self.require_calibrated(level)?;

        let loads = self.gather_level(level, selection)?;
        let key = selection.final_key();
        let candidate = self.table.with_loads(&loads);
        let batch = assemble(&candidate, level, &key)?;

        batch.write_to(&mut self.target, layer)?;
        self.table = candidate;
        info!("Load key {} added {} point loads to layer {}", key, batch.len(), layer);

        let saved = if self.settings.save_after_write {
            self.target.save()?;
            true
        } else {
            false
        };

        Ok(TransferReport {
            session_id: self.id,
            level: level.to_string(),
            layer: layer.to_string(),
            key_name: key.display_name(),
            key,
            column_count: batch.len(),
            total: batch.total(),
            table_version: self.table.version(),
            saved,
            completed_at: Utc::now(),
        })
    }

    fn gather_level(
        &mut self,
        level: &str,
        selection: &LoadCaseSelection,
    ) -> XferResult<AggregatedLoads> {
        let ids = self.table.ids_on_level(level);
        let loads = aggregate(&mut self.source, &ids, selection)?;
        for case in selection.cases() {
            info!("Queried peak axial force for load case {}", case);
        }
        Ok(loads)
    }

    fn require_level(&self, level: &str) -> XferResult<()> {
        if self.source.levels()?.iter().any(|l| l == level) {
            Ok(())
        } else {
            Err(XferError::level_not_found(level))
        }
    }

    fn require_layer(&self, layer: &str) -> XferResult<()> {
        if self.target.loading_layers()?.iter().any(|l| l == layer) {
            Ok(())
        } else {
            Err(XferError::layer_not_found(layer))
        }
    }

    fn require_calibrated(&self, level: &str) -> XferResult<()> {
        match self.table.on_level(level).find(|r| r.target_point.is_none()) {
            Some(r) => Err(XferError::calibration_missing(r.id.as_str())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{FrameElement, FramePoint};
    use crate::snapshot::{SourceSnapshot, TargetSnapshot};
    use approx::assert_relative_eq;

    const LAYER: &str = "Column Loads";

    fn column(name: &str, story: &str, x: f64, y: f64) -> FrameElement {
        FrameElement::new(name, story, FramePoint::new(x, y, 0.0), FramePoint::new(x, y, 144.0))
    }

    fn source() -> SourceSnapshot {
        let mut s = SourceSnapshot::default();
        s.stories = vec!["Roof".to_string(), "L2".to_string(), "L1".to_string()];
        s.add_frame(column("C1", "L2", 2.0, 0.0));
        s.add_frame(column("C2", "L2", 0.0, 4.0));
        s.add_frame(column("C3", "L1", 2.0, 0.0));
        s.add_case("DL", AnalysisType::LinearStatic);
        s.add_case("LL", AnalysisType::LinearStatic);
        s.add_case("MODAL", AnalysisType::Modal);
        s.set_station_forces("DL", "C1", vec![-90.0, -100.0]);
        s.set_station_forces("LL", "C1", vec![-50.0]);
        s.set_station_forces("DL", "C2", vec![-80.0]);
        s.set_station_forces("DL", "C3", vec![-250.0]);
        s
    }

    fn session() -> TransferSession<SourceSnapshot, TargetSnapshot> {
        TransferSession::pull_data(
            source(),
            TargetSnapshot::with_layers([LAYER]),
            TransferSettings::default(),
        )
        .unwrap()
    }

    fn quarter_turn() -> CorrespondencePair {
        CorrespondencePair::new(
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(5.0, 5.0),
            Point2D::new(5.0, 15.0),
        )
        .unwrap()
    }

    #[test]
    fn test_pull_data_builds_table() {
        let s = session();
        assert_eq!(s.table().len(), 3);
        assert_eq!(s.levels().unwrap(), vec!["Roof", "L2", "L1"]);
        assert_eq!(s.offered_load_cases().unwrap(), vec!["DL", "LL"]);
        assert_eq!(s.load_cases(None).unwrap().len(), 3);
        assert_eq!(s.loading_layers().unwrap(), vec![LAYER]);
        assert!(s.transform().is_none());
    }

    #[test]
    fn test_calibrate_maps_all_columns() {
        let mut s = session();
        let report = s.calibrate(&quarter_turn()).unwrap();
        assert_eq!(report.mapped_columns, 3);
        assert_relative_eq!(report.angle_degrees(), 90.0, epsilon = 1e-9);

        let c1 = s.table().get("C1").unwrap().target_point.unwrap();
        assert_relative_eq!(c1.x, 5.0, epsilon = 1e-9);
        assert_relative_eq!(c1.y, 7.0, epsilon = 1e-9);
        assert_eq!(s.table().version(), 1);
    }

    #[test]
    fn test_failed_calibration_leaves_table_untouched() {
        let mut s = session();
        let bad = CorrespondencePair {
            source_pt1: Point2D::new(1.0, 1.0),
            source_pt2: Point2D::new(1.0, 1.0),
            target_pt1: Point2D::new(0.0, 0.0),
            target_pt2: Point2D::new(1.0, 0.0),
        };
        assert!(s.calibrate(&bad).is_err());
        assert_eq!(s.table().version(), 0);
        assert!(s.table().records().iter().all(|r| r.target_point.is_none()));
        assert!(s.transform().is_none());
    }

    #[test]
    fn test_transfer_combined_cases() {
        let mut s = session();
        s.calibrate(&quarter_turn()).unwrap();
        let sel = LoadCaseSelection::new(["DL", "LL"]).unwrap();
        let report = s.transfer("L2", &sel, LAYER).unwrap();

        assert_eq!(report.key_name, "P_max_DL_LL");
        assert_eq!(report.column_count, 2);
        assert_eq!(report.total, -230.0);
        assert!(report.saved);
        assert_eq!(report.session_id, s.id());

        let loads = &s.target().layer(LAYER).unwrap().point_loads;
        assert_eq!(loads.len(), 2);
        assert_eq!(loads[0].fz, -150.0);
        assert_eq!(loads[1].fz, -80.0);
        // C2 at source (0, 4) rotates to (-4, 0), then shifts by (5, 5)
        assert_relative_eq!(loads[1].x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(loads[1].y, 5.0, epsilon = 1e-9);
        assert_eq!(s.target().save_count(), 1);

        // Columns on other levels were not aggregated
        assert!(s.table().get("C3").unwrap().loads.is_empty());
    }

    #[test]
    fn test_single_case_stores_no_combined_key() {
        let mut s = session();
        s.calibrate(&quarter_turn()).unwrap();
        let sel = LoadCaseSelection::new(["DL"]).unwrap();
        let report = s.transfer("L2", &sel, LAYER).unwrap();
        assert_eq!(report.key, LoadKey::case("DL"));
        let c1 = s.table().get("C1").unwrap();
        assert_eq!(c1.loads.len(), 1);
        assert_eq!(c1.load(&LoadKey::case("DL")), Some(-100.0));
    }

    #[test]
    fn test_transfer_before_calibration_fails_without_mutation() {
        let mut s = session();
        let sel = LoadCaseSelection::new(["DL"]).unwrap();
        let err = s.transfer("L2", &sel, LAYER).unwrap_err();
        assert_eq!(err, XferError::calibration_missing("C1"));
        assert_eq!(s.table().version(), 0);
        assert!(s.table().records().iter().all(|r| r.loads.is_empty()));
        assert!(s.target().layer(LAYER).unwrap().point_loads.is_empty());
        assert_eq!(s.target().save_count(), 0);
    }

    fn source_with_unloaded_column() -> SourceSnapshot {
        let mut s = source();
        s.add_frame(column("C4", "L2", 6.0, 0.0));
        s
    }

    #[test]
    fn test_failed_assembly_leaves_table_untouched() {
        let mut s = TransferSession::pull_data(
            source_with_unloaded_column(),
            TargetSnapshot::with_layers([LAYER]),
            TransferSettings::default(),
        )
        .unwrap();
        s.calibrate(&quarter_turn()).unwrap();
        let version = s.table().version();

        let sel = LoadCaseSelection::new(["DL"]).unwrap();
        let err = s.transfer("L2", &sel, LAYER).unwrap_err();
        assert_eq!(err, XferError::load_missing("C4", "P_max_DL"));
        assert_eq!(s.table().version(), version);
        assert!(s.table().records().iter().all(|r| r.loads.is_empty()));
        assert!(s.target().layer(LAYER).unwrap().point_loads.is_empty());
        assert_eq!(s.target().save_count(), 0);
    }

    #[test]
    fn test_combined_transfer_writes_zero_for_unloaded_column() {
        let mut s = TransferSession::pull_data(
            source_with_unloaded_column(),
            TargetSnapshot::with_layers([LAYER]),
            TransferSettings::default(),
        )
        .unwrap();
        s.calibrate(&quarter_turn()).unwrap();

        let sel = LoadCaseSelection::new(["DL", "LL"]).unwrap();
        let report = s.transfer("L2", &sel, LAYER).unwrap();
        assert_eq!(report.column_count, 3);
        assert_eq!(report.total, -230.0);
        let loads = &s.target().layer(LAYER).unwrap().point_loads;
        assert_eq!(loads[2].fz, 0.0);
        let c4 = s.table().get("C4").unwrap();
        assert_eq!(c4.load(&LoadKey::combined(["DL", "LL"])), Some(0.0));
    }

    #[test]
    fn test_lookup_failures() {
        let mut s = session();
        s.calibrate(&quarter_turn()).unwrap();
        let sel = LoadCaseSelection::new(["DL"]).unwrap();
        assert_eq!(s.transfer("L9", &sel, LAYER).unwrap_err(), XferError::level_not_found("L9"));
        assert_eq!(
            s.transfer("L2", &sel, "Nope").unwrap_err(),
            XferError::layer_not_found("Nope")
        );
    }

    #[test]
    fn test_unknown_case_leaves_loads_untouched() {
        let mut s = session();
        s.calibrate(&quarter_turn()).unwrap();
        let version = s.table().version();
        let sel = LoadCaseSelection::new(["DL", "EQX"]).unwrap();
        assert_eq!(
            s.transfer("L2", &sel, LAYER).unwrap_err(),
            XferError::case_not_found("EQX")
        );
        assert_eq!(s.table().version(), version);
        assert!(s.table().get("C1").unwrap().loads.is_empty());
    }

    #[test]
    fn test_repeated_aggregation_overwrites() {
        let mut s = session();
        s.calibrate(&quarter_turn()).unwrap();
        let sel = LoadCaseSelection::new(["DL", "LL"]).unwrap();
        let key = s.aggregate("L2", &sel).unwrap();
        let first = s.preview("L2", &key).unwrap();
        s.aggregate("L2", &sel).unwrap();
        let second = s.preview("L2", &key).unwrap();
        assert_eq!(first, second);
        assert_eq!(s.table().get("C1").unwrap().loads.len(), 3);
    }

    #[test]
    fn test_empty_level_writes_nothing() {
        let mut s = session();
        s.calibrate(&quarter_turn()).unwrap();
        let sel = LoadCaseSelection::new(["DL"]).unwrap();
        let report = s.transfer("Roof", &sel, LAYER).unwrap();
        assert_eq!(report.column_count, 0);
        assert!(s.target().layer(LAYER).unwrap().point_loads.is_empty());
    }

    #[test]
    fn test_save_can_be_disabled() {
        let settings = TransferSettings {
            save_after_write: false,
            ..TransferSettings::default()
        };
        let mut s =
            TransferSession::pull_data(source(), TargetSnapshot::with_layers([LAYER]), settings)
                .unwrap();
        s.calibrate(&quarter_turn()).unwrap();
        let report = s.transfer("L1", &LoadCaseSelection::new(["DL"]).unwrap(), LAYER).unwrap();
        assert!(!report.saved);
        let (_, target) = s.into_parts();
        assert_eq!(target.save_count(), 0);
        assert_eq!(target.layer(LAYER).unwrap().point_loads[0].fz, -250.0);
    }
}
