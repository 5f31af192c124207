//! Applies a solved transform to the column table.

use serde::{Deserialize, Serialize};

use super::RigidTransform;
use crate::columns::ColumnTable;
use crate::geometry::Point2D;

/// Target-system points for a set of columns, in table order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoordinateMapping {
    points: Vec<(String, Point2D)>,
}

impl CoordinateMapping {
    pub fn points(&self) -> &[(String, Point2D)] {
        &self.points
    }

    pub fn get(&self, id: &str) -> Option<Point2D> {
        self.points.iter().find(|(c, _)| c == id).map(|(_, p)| *p)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Map every column's source point through `transform`.
///
/// Each row is independent; the table itself is not touched. Merge the
/// result with [`ColumnTable::merge_mapping`].
pub fn map_columns(transform: &RigidTransform, table: &ColumnTable) -> CoordinateMapping {
    CoordinateMapping {
        points: table
            .records()
            .iter()
            .map(|r| (r.id.clone(), transform.apply(r.source_point)))
            .collect(),
    }
}
