//! # Column Table
//!
//! The per-session collection of column records. Records are created in bulk
//! when source data is pulled and are never removed afterwards; the table is
//! only changed through its `merge_*` methods, each of which applies one
//! pipeline stage's output as a whole and bumps [`ColumnTable::version`].
//!
//! ```text
//! ColumnTable (version n)
//! └── records: Vec<ColumnRecord>
//!     ├── id, story, source_point
//!     ├── target_point: Option<Point2D>   (after calibration)
//!     └── loads: Vec<LoadEntry>           (after aggregation)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use xfer_core::columns::{find_columns, ColumnTable, FrameElement, FramePoint};
//!
//! let frames = vec![
//!     FrameElement::new(
//!         "C1",
//!         "L2",
//!         FramePoint::new(0.0, 0.0, 0.0),
//!         FramePoint::new(0.0, 0.0, 144.0),
//!     ),
//!     // Sloped member, not a column
//!     FrameElement::new(
//!         "B1",
//!         "L2",
//!         FramePoint::new(0.0, 0.0, 144.0),
//!         FramePoint::new(240.0, 0.0, 144.0),
//!     ),
//! ];
//!
//! let table = ColumnTable::new(find_columns(&frames))?;
//! assert_eq!(table.len(), 1);
//! assert_eq!(table.levels(), vec!["L2".to_string()]);
//! # Ok::<(), xfer_core::errors::XferError>(())
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::calibration::CoordinateMapping;
use crate::errors::{XferError, XferResult};
use crate::geometry::Point2D;
use crate::loads::{AggregatedLoads, LoadKey};

/// Plan tolerance for deciding a frame is vertical
pub const VERTICAL_TOLERANCE: f64 = 1e-6;

/// A 3D end point of a source frame object.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FramePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl FramePoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        FramePoint { x, y, z }
    }

    pub fn plan(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// A frame object as reported by the source model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameElement {
    /// Unique frame name in the source model
    pub name: String,
    /// Story/level the frame belongs to
    pub story: String,
    pub point1: FramePoint,
    pub point2: FramePoint,
}

impl FrameElement {
    pub fn new(
        name: impl Into<String>,
        story: impl Into<String>,
        point1: FramePoint,
        point2: FramePoint,
    ) -> Self {
        FrameElement {
            name: name.into(),
            story: story.into(),
            point1,
            point2,
        }
    }

    /// Both ends share plan coordinates
    pub fn is_vertical(&self) -> bool {
        (self.point1.x - self.point2.x).abs() <= VERTICAL_TOLERANCE
            && (self.point1.y - self.point2.y).abs() <= VERTICAL_TOLERANCE
    }
}

/// Keep the vertical frames and turn them into column records.
///
/// The source point is the plan position of `point1`.
pub fn find_columns(frames: &[FrameElement]) -> Vec<ColumnRecord> {
    frames
        .iter()
        .filter(|f| f.is_vertical())
        .map(|f| ColumnRecord::new(f.name.clone(), f.story.clone(), f.point1.plan()))
        .collect()
}

/// One peak axial value stored under a load key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadEntry {
    pub key: LoadKey,
    /// Peak axial force (signed, force units)
    pub value: f64,
}

/// One structural column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRecord {
    pub id: String,
    pub story: String,
    pub source_point: Point2D,
    /// Populated by calibration
    pub target_point: Option<Point2D>,
    pub loads: Vec<LoadEntry>,
}

impl ColumnRecord {
    pub fn new(id: impl Into<String>, story: impl Into<String>, source_point: Point2D) -> Self {
        ColumnRecord {
            id: id.into(),
            story: story.into(),
            source_point,
            target_point: None,
            loads: Vec::new(),
        }
    }

    /// Value stored under `key`, if any
    pub fn load(&self, key: &LoadKey) -> Option<f64> {
        self.loads.iter().find(|e| &e.key == key).map(|e| e.value)
    }

    /// Insert or overwrite the value under `key`
    pub fn set_load(&mut self, key: LoadKey, value: f64) {
        match self.loads.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.value = value,
            None => self.loads.push(LoadEntry { key, value }),
        }
    }

    pub fn clear_load(&mut self, key: &LoadKey) {
        self.loads.retain(|e| &e.key != key);
    }
}

/// Versioned, ordered collection of column records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnTable {
    version: u64,
    records: Vec<ColumnRecord>,
}

impl ColumnTable {
    /// Build a table, rejecting duplicate column ids.
    pub fn new(records: Vec<ColumnRecord>) -> XferResult<Self> {
        let mut seen = HashSet::new();
        for r in &records {
            if !seen.insert(r.id.as_str()) {
                return Err(XferError::DuplicateColumn { column: r.id.clone() });
            }
        }
        Ok(ColumnTable { version: 0, records })
    }

    /// Number of successful merges applied since creation
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ColumnRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&ColumnRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Distinct story names in first-seen order
    pub fn levels(&self) -> Vec<String> {
        let mut levels: Vec<String> = Vec::new();
        for r in &self.records {
            if !levels.contains(&r.story) {
                levels.push(r.story.clone());
            }
        }
        levels
    }

    /// Records on `level`, in table order
    pub fn on_level<'a>(&'a self, level: &'a str) -> impl Iterator<Item = &'a ColumnRecord> + 'a {
        self.records.iter().filter(move |r| r.story == level)
    }

    /// Ids of the records on `level`, in table order
    pub fn ids_on_level(&self, level: &str) -> Vec<String> {
        self.on_level(level).map(|r| r.id.clone()).collect()
    }

    /// Apply a coordinate mapping to every record it names.
    ///
    /// Ids not present in the table are ignored.
    pub fn merge_mapping(&mut self, mapping: &CoordinateMapping) {
        for (id, point) in mapping.points() {
            if let Some(r) = self.records.iter_mut().find(|r| &r.id == id) {
                r.target_point = Some(*point);
            }
        }
        self.version += 1;
    }

    /// Store aggregated loads on the records they cover.
    ///
    /// Every key in `loads` is overwritten, never accumulated, for the
    /// columns the aggregation covered; a covered column with no value under
    /// a key has any stale value for that key cleared.
    pub fn merge_loads(&mut self, loads: &AggregatedLoads) {
        for r in self.records.iter_mut() {
            if !loads.covers(&r.id) {
                continue;
            }
            for (key, values) in loads.keyed_values() {
                match values.get(&r.id) {
                    Some(v) => r.set_load(key.clone(), *v),
                    None => r.clear_load(key),
                }
            }
        }
        self.version += 1;
    }

    /// Copy of this table with `loads` merged in
    pub fn with_loads(&self, loads: &AggregatedLoads) -> ColumnTable {
        let mut next = self.clone();
        next.merge_loads(loads);
        next
    }
}
