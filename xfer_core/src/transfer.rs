//! # Transfer Assembly
//!
//! Joins mapped coordinates with aggregated loads for one level and hands
//! the result to the target model as a single logical write.
//!
//! ## Example
//!
//! ```rust
//! use xfer_core::calibration::{map_columns, RigidTransform};
//! use xfer_core::columns::{ColumnRecord, ColumnTable};
//! use xfer_core::geometry::Point2D;
//! use xfer_core::loads::LoadKey;
//! use xfer_core::transfer::assemble;
//!
//! let mut table = ColumnTable::new(vec![ColumnRecord::new("C1", "L2", Point2D::new(1.0, 2.0))])?;
//! let mapping = map_columns(&RigidTransform::identity(), &table);
//! table.merge_mapping(&mapping);
//!
//! // Nothing aggregated yet: the level has a column without a value
//! assert!(assemble(&table, "L2", &LoadKey::case("DL")).is_err());
//!
//! // A level without columns is simply empty
//! let batch = assemble(&table, "Roof", &LoadKey::case("DL"))?;
//! assert!(batch.is_empty());
//! # Ok::<(), xfer_core::errors::XferError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::columns::ColumnTable;
use crate::errors::{XferError, XferResult};
use crate::loads::LoadKey;
use crate::model::TargetModel;

/// Index-aligned point loads for one level.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransferBatch {
    /// Column ids, aligned with the three value sequences
    pub column_ids: Vec<String>,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub values: Vec<f64>,
}

impl TransferBatch {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of all values in the batch
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Hand the batch to the target model's loading layer.
    pub fn write_to<T: TargetModel + ?Sized>(&self, target: &mut T, layer: &str) -> XferResult<()> {
        target.write_loading_values(layer, &self.xs, &self.ys, &self.values)
    }
}

/// Collect `(x, y, value)` for every column on `level`, in table order.
///
/// # Errors
///
/// * `CalibrationMissing` - a column on the level has no target point
/// * `LoadMissing` - a column on the level has no value under `key`
pub fn assemble(table: &ColumnTable, level: &str, key: &LoadKey) -> XferResult<TransferBatch> {
    let mut batch = TransferBatch::default();

    for record in table.on_level(level) {
        let point = record
            .target_point
            .ok_or_else(|| XferError::calibration_missing(record.id.as_str()))?;
        let value = record
            .load(key)
            .ok_or_else(|| XferError::load_missing(record.id.as_str(), key.display_name()))?;

        batch.column_ids.push(record.id.clone());
        batch.xs.push(point.x);
        batch.ys.push(point.y);
        batch.values.push(value);
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{map_columns, RigidTransform};
    use crate::columns::ColumnRecord;
    use crate::geometry::Point2D;

    fn table() -> ColumnTable {
        let mut records = vec![
            ColumnRecord::new("C1", "L2", Point2D::new(0.0, 0.0)),
            ColumnRecord::new("C2", "L3", Point2D::new(10.0, 0.0)),
            ColumnRecord::new("C3", "L2", Point2D::new(20.0, 5.0)),
        ];
        for (i, r) in records.iter_mut().enumerate() {
            r.set_load(LoadKey::case("DL"), -10.0 * (i as f64 + 1.0));
        }
        let mut table = ColumnTable::new(records).unwrap();
        let mapping = map_columns(&RigidTransform::from_angle(0.0, Point2D::new(1.0, 1.0)), &table);
        table.merge_mapping(&mapping);
        table
    }

    #[test]
    fn test_assemble_filters_level_in_order() {
        let batch = assemble(&table(), "L2", &LoadKey::case("DL")).unwrap();
        assert_eq!(batch.column_ids, vec!["C1".to_string(), "C3".to_string()]);
        assert_eq!(batch.xs, vec![1.0, 21.0]);
        assert_eq!(batch.ys, vec![1.0, 6.0]);
        assert_eq!(batch.values, vec![-10.0, -30.0]);
        assert_eq!(batch.total(), -40.0);
    }

    #[test]
    fn test_lengths_match_level_count() {
        let t = table();
        for level in ["L2", "L3", "Roof"] {
            let batch = assemble(&t, level, &LoadKey::case("DL")).unwrap();
            let count = t.on_level(level).count();
            assert_eq!(batch.xs.len(), count);
            assert_eq!(batch.ys.len(), count);
            assert_eq!(batch.values.len(), count);
        }
    }

    #[test]
    fn test_uncalibrated_column_fails() {
        let mut records = vec![ColumnRecord::new("C1", "L2", Point2D::new(0.0, 0.0))];
        records[0].set_load(LoadKey::case("DL"), -5.0);
        let t = ColumnTable::new(records).unwrap();
        assert_eq!(
            assemble(&t, "L2", &LoadKey::case("DL")).unwrap_err(),
            XferError::calibration_missing("C1")
        );
    }

    #[test]
    fn test_missing_key_fails() {
        let err = assemble(&table(), "L3", &LoadKey::combined(["DL", "LL"])).unwrap_err();
        assert_eq!(err, XferError::load_missing("C2", "P_max_DL_LL"));
    }

    #[test]
    fn test_empty_level_is_empty_batch() {
        let batch = assemble(&table(), "Basement", &LoadKey::case("DL")).unwrap();
        assert!(batch.is_empty());
        assert!(batch.xs.is_empty() && batch.ys.is_empty());
    }
}
