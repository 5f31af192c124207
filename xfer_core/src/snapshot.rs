//! # Model Snapshots
//!
//! JSON-backed stand-ins for the two external applications, so the whole
//! pipeline can run from exported data:
//!
//! - [`SourceSnapshot`] - frames, load cases and axial station results
//!   exported from the analysis model; implements [`SourceModel`]
//! - [`TargetSnapshot`] - loading layers of the slab model with their point
//!   loads; implements [`TargetModel`] in memory
//! - [`TargetFile`] - a target snapshot bound to a locked file on disk
//!
//! ## Source JSON
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "units": "LbIn",
//!   "frames": [
//!     { "name": "C1", "story": "L2",
//!       "point1": { "x": 0.0, "y": 0.0, "z": 0.0 },
//!       "point2": { "x": 0.0, "y": 0.0, "z": 144.0 } }
//!   ],
//!   "load_cases": [ { "name": "DL", "analysis_type": "LinearStatic" } ],
//!   "results": { "DL": { "C1": [-98.5, -100.0] } }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::columns::{find_columns, FrameElement};
use crate::errors::{XferError, XferResult};
use crate::file_io::{load_json, save_json_atomic, validate_version, FileLock};
use crate::loads::AnalysisType;
use crate::model::{SourceModel, TargetModel};
use crate::settings::UnitSystem;

/// Current schema version for snapshot files
pub const SNAPSHOT_VERSION: &str = "0.1.0";

/// A load case defined in the source model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadCaseInfo {
    pub name: String,
    #[serde(default)]
    pub analysis_type: AnalysisType,
}

/// Exported analysis model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSnapshot {
    pub version: String,

    #[serde(default)]
    pub units: UnitSystem,

    /// Explicit story list; when empty, stories are derived from columns
    #[serde(default)]
    pub stories: Vec<String>,

    #[serde(default)]
    pub frames: Vec<FrameElement>,

    #[serde(default)]
    pub load_cases: Vec<LoadCaseInfo>,

    /// Axial force at each output station, keyed by case then frame name
    #[serde(default)]
    pub results: BTreeMap<String, BTreeMap<String, Vec<f64>>>,

    #[serde(skip)]
    active_case: Option<String>,
}

impl Default for SourceSnapshot {
    fn default() -> Self {
        SourceSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            units: UnitSystem::default(),
            stories: Vec::new(),
            frames: Vec::new(),
            load_cases: Vec::new(),
            results: BTreeMap::new(),
            active_case: None,
        }
    }
}

impl SourceSnapshot {
    /// Load and version-check a source snapshot file.
    pub fn load(path: &Path) -> XferResult<Self> {
        let snapshot: SourceSnapshot = load_json(path)?;
        validate_version(&snapshot.version, SNAPSHOT_VERSION)?;
        info!(
            "Opened source snapshot {} ({} frames, {} load cases)",
            path.display(),
            snapshot.frames.len(),
            snapshot.load_cases.len()
        );
        Ok(snapshot)
    }

    pub fn add_frame(&mut self, frame: FrameElement) {
        self.frames.push(frame);
    }

    pub fn add_case(&mut self, name: impl Into<String>, analysis_type: AnalysisType) {
        self.load_cases.push(LoadCaseInfo {
            name: name.into(),
            analysis_type,
        });
    }

    /// Replace the station forces of `frame` under `case`
    pub fn set_station_forces(&mut self, case: &str, frame: &str, forces: Vec<f64>) {
        self.results
            .entry(case.to_string())
            .or_default()
            .insert(frame.to_string(), forces);
    }

    pub fn active_case(&self) -> Option<&str> {
        self.active_case.as_deref()
    }

    fn has_case(&self, name: &str) -> bool {
        self.load_cases.iter().any(|c| c.name == name)
    }
}

/// Station value with the largest magnitude, sign preserved
fn peak_by_magnitude(forces: &[f64]) -> Option<f64> {
    let mut peak: Option<f64> = None;
    for &f in forces {
        match peak {
            Some(p) if f.abs() <= p.abs() => {}
            _ => peak = Some(f),
        }
    }
    peak
}

impl SourceModel for SourceSnapshot {
    fn frame_elements(&self) -> XferResult<Vec<FrameElement>> {
        Ok(self.frames.clone())
    }

    fn levels(&self) -> XferResult<Vec<String>> {
        if !self.stories.is_empty() {
            return Ok(self.stories.clone());
        }
        let mut levels: Vec<String> = Vec::new();
        for column in find_columns(&self.frames) {
            if !levels.contains(&column.story) {
                levels.push(column.story);
            }
        }
        Ok(levels)
    }

    fn load_cases(&self, analysis_type: Option<AnalysisType>) -> XferResult<Vec<String>> {
        Ok(self
            .load_cases
            .iter()
            .filter(|c| analysis_type.map_or(true, |t| c.analysis_type == t))
            .map(|c| c.name.clone())
            .collect())
    }

    fn set_active_case(&mut self, case: &str) -> XferResult<()> {
        if !self.has_case(case) {
            return Err(XferError::case_not_found(case));
        }
        self.active_case = Some(case.to_string());
        Ok(())
    }

    fn peak_axial(&self, column_ids: &[String]) -> XferResult<HashMap<String, f64>> {
        let case = self.active_case.as_deref().ok_or_else(|| {
            XferError::collaborator("peak axial query", "active case", "no output case selected")
        })?;

        let mut out = HashMap::new();
        if let Some(by_frame) = self.results.get(case) {
            for id in column_ids {
                if let Some(peak) = by_frame.get(id).and_then(|f| peak_by_magnitude(f)) {
                    out.insert(id.clone(), peak);
                }
            }
        }
        Ok(out)
    }
}

/// A point load stored on a loading layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLoad {
    pub x: f64,
    pub y: f64,
    /// Vertical force
    pub fz: f64,
}

/// A named loading layer of the target model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingLayer {
    pub name: String,
    #[serde(default)]
    pub point_loads: Vec<PointLoad>,
}

/// Exported slab model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSnapshot {
    pub version: String,

    #[serde(default)]
    pub units: UnitSystem,

    #[serde(default)]
    pub layers: Vec<LoadingLayer>,

    /// Number of times `save` was called on this in-memory snapshot
    #[serde(skip)]
    saves: u32,
}

impl TargetSnapshot {
    /// Empty snapshot with the named layers
    pub fn with_layers<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TargetSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            units: UnitSystem::default(),
            layers: names
                .into_iter()
                .map(|n| LoadingLayer {
                    name: n.into(),
                    point_loads: Vec::new(),
                })
                .collect(),
            saves: 0,
        }
    }

    /// Load and version-check a target snapshot file.
    pub fn load(path: &Path) -> XferResult<Self> {
        let snapshot: TargetSnapshot = load_json(path)?;
        validate_version(&snapshot.version, SNAPSHOT_VERSION)?;
        Ok(snapshot)
    }

    pub fn layer(&self, name: &str) -> Option<&LoadingLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn save_count(&self) -> u32 {
        self.saves
    }
}

impl TargetModel for TargetSnapshot {
    fn loading_layers(&self) -> XferResult<Vec<String>> {
        Ok(self.layers.iter().map(|l| l.name.clone()).collect())
    }

    fn write_loading_values(
        &mut self,
        layer: &str,
        xs: &[f64],
        ys: &[f64],
        values: &[f64],
    ) -> XferResult<()> {
        if xs.len() != ys.len() || xs.len() != values.len() {
            return Err(XferError::LengthMismatch {
                layer: layer.to_string(),
                xs: xs.len(),
                ys: ys.len(),
                values: values.len(),
            });
        }
        let target = self
            .layers
            .iter_mut()
            .find(|l| l.name == layer)
            .ok_or_else(|| XferError::layer_not_found(layer))?;

        target.point_loads.extend(
            xs.iter()
                .zip(ys)
                .zip(values)
                .map(|((&x, &y), &fz)| PointLoad { x, y, fz }),
        );
        Ok(())
    }

    fn save(&mut self) -> XferResult<()> {
        self.saves += 1;
        Ok(())
    }
}

/// A target snapshot bound to its file, locked for the lifetime of the value.
#[derive(Debug)]
pub struct TargetFile {
    path: PathBuf,
    snapshot: TargetSnapshot,
    _lock: FileLock,
}

impl TargetFile {
    /// Lock and open an existing target snapshot.
    pub fn open(path: &Path, user_id: impl Into<String>) -> XferResult<Self> {
        let lock = FileLock::acquire(path, user_id)?;
        let snapshot = TargetSnapshot::load(path)?;
        info!(
            "Opened target snapshot {} ({} loading layers)",
            path.display(),
            snapshot.layers.len()
        );
        Ok(TargetFile {
            path: path.to_path_buf(),
            snapshot,
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> &TargetSnapshot {
        &self.snapshot
    }
}

impl TargetModel for TargetFile {
    fn loading_layers(&self) -> XferResult<Vec<String>> {
        self.snapshot.loading_layers()
    }

    fn write_loading_values(
        &mut self,
        layer: &str,
        xs: &[f64],
        ys: &[f64],
        values: &[f64],
    ) -> XferResult<()> {
        self.snapshot.write_loading_values(layer, xs, ys, values)
    }

    fn save(&mut self) -> XferResult<()> {
        save_json_atomic(&self.snapshot, &self.path)?;
        info!("Saved target snapshot {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::FramePoint;
    use std::fs;

    fn column(name: &str, story: &str) -> FrameElement {
        FrameElement::new(
            name,
            story,
            FramePoint::new(1.0, 2.0, 0.0),
            FramePoint::new(1.0, 2.0, 120.0),
        )
    }

    #[test]
    fn test_peak_by_magnitude_keeps_sign() {
        assert_eq!(peak_by_magnitude(&[-20.0, -100.0, 40.0]), Some(-100.0));
        assert_eq!(peak_by_magnitude(&[5.0, -3.0]), Some(5.0));
        assert_eq!(peak_by_magnitude(&[]), None);
    }

    #[test]
    fn test_load_case_filter() {
        let mut s = SourceSnapshot::default();
        s.add_case("DL", AnalysisType::LinearStatic);
        s.add_case("MODAL", AnalysisType::Modal);
        assert_eq!(s.load_cases(None).unwrap(), vec!["DL".to_string(), "MODAL".to_string()]);
        assert_eq!(s.load_cases(Some(AnalysisType::Modal)).unwrap(), vec!["MODAL".to_string()]);
        assert!(s.load_cases(Some(AnalysisType::Buckling)).unwrap().is_empty());
    }

    #[test]
    fn test_levels_explicit_or_derived() {
        let mut s = SourceSnapshot::default();
        s.add_frame(column("C1", "L3"));
        s.add_frame(column("C2", "L2"));
        assert_eq!(s.levels().unwrap(), vec!["L3".to_string(), "L2".to_string()]);

        s.stories = vec!["Roof".to_string(), "L3".to_string(), "L2".to_string()];
        assert_eq!(s.levels().unwrap().len(), 3);
    }

    #[test]
    fn test_peak_axial_requires_active_case() {
        let s = SourceSnapshot::default();
        let err = s.peak_axial(&["C1".to_string()]).unwrap_err();
        assert_eq!(err.error_code(), "COLLABORATOR_ERROR");
    }

    #[test]
    fn test_peak_axial_follows_active_case() {
        let mut s = SourceSnapshot::default();
        s.add_case("DL", AnalysisType::LinearStatic);
        s.add_case("LL", AnalysisType::LinearStatic);
        s.set_station_forces("DL", "C1", vec![-10.0, -12.0]);
        s.set_station_forces("LL", "C1", vec![-7.0]);
        let ids = vec!["C1".to_string(), "C2".to_string()];

        s.set_active_case("DL").unwrap();
        assert_eq!(s.peak_axial(&ids).unwrap().get("C1"), Some(&-12.0));
        s.set_active_case("LL").unwrap();
        let ll = s.peak_axial(&ids).unwrap();
        assert_eq!(ll.get("C1"), Some(&-7.0));
        assert!(!ll.contains_key("C2"));

        assert_eq!(s.set_active_case("EQX").unwrap_err(), XferError::case_not_found("EQX"));
        assert_eq!(s.active_case(), Some("LL"));
    }

    #[test]
    fn test_write_rejects_length_mismatch_without_writing() {
        let mut t = TargetSnapshot::with_layers(["Column Loads"]);
        let err = t
            .write_loading_values("Column Loads", &[1.0, 2.0], &[1.0], &[5.0, 6.0])
            .unwrap_err();
        assert_eq!(err.error_code(), "LENGTH_MISMATCH");
        assert!(t.layer("Column Loads").unwrap().point_loads.is_empty());
    }

    #[test]
    fn test_write_unknown_layer() {
        let mut t = TargetSnapshot::with_layers(["Column Loads"]);
        let err = t.write_loading_values("Other", &[], &[], &[]).unwrap_err();
        assert_eq!(err, XferError::layer_not_found("Other"));
    }

    #[test]
    fn test_write_appends_point_loads() {
        let mut t = TargetSnapshot::with_layers(["Column Loads"]);
        t.write_loading_values("Column Loads", &[1.0, 3.0], &[2.0, 4.0], &[-10.0, -20.0])
            .unwrap();
        let loads = &t.layer("Column Loads").unwrap().point_loads;
        assert_eq!(loads.len(), 2);
        assert_eq!(loads[1], PointLoad { x: 3.0, y: 4.0, fz: -20.0 });
    }

    #[test]
    fn test_source_snapshot_from_json() {
        let json = r#"{
            "version": "0.1.0",
            "frames": [
                { "name": "C1", "story": "L2",
                  "point1": { "x": 0.0, "y": 0.0, "z": 0.0 },
                  "point2": { "x": 0.0, "y": 0.0, "z": 144.0 } }
            ],
            "load_cases": [ { "name": "DL" } ],
            "results": { "DL": { "C1": [-98.5, -100.0] } }
        }"#;
        let s: SourceSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(s.units, UnitSystem::LbIn);
        assert_eq!(s.load_cases[0].analysis_type, AnalysisType::LinearStatic);
        assert!(s.active_case().is_none());
    }

    #[test]
    fn test_source_load_rejects_newer_version() {
        let path = std::env::temp_dir().join("colxfer_test_source_version.json");
        fs::write(&path, r#"{"version": "0.9.0"}"#).unwrap();
        let err = SourceSnapshot::load(&path).unwrap_err();
        assert_eq!(err.error_code(), "VERSION_MISMATCH");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_target_file_save_persists_loads() {
        let path = std::env::temp_dir().join("colxfer_test_target_file.json");
        save_json_atomic(&TargetSnapshot::with_layers(["Column Loads"]), &path).unwrap();

        {
            let mut file = TargetFile::open(&path, "tester").unwrap();
            file.write_loading_values("Column Loads", &[1.0], &[2.0], &[-3.0]).unwrap();
            file.save().unwrap();
            // Second session cannot open while the first holds the lock
            let err = TargetFile::open(&path, "other").unwrap_err();
            assert_eq!(err.error_code(), "FILE_LOCKED");
        }

        let reloaded = TargetSnapshot::load(&path).unwrap();
        assert_eq!(reloaded.layer("Column Loads").unwrap().point_loads.len(), 1);
        let _ = fs::remove_file(&path);
    }
}
