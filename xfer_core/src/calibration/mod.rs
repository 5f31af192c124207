//! # Calibration
//!
//! Registers the source plan coordinates onto the target plan coordinates
//! from two reference points observed in both models.
//!
//! - [`solve`] - Rigid Transform Solver
//! - [`RigidTransform::apply`] - Coordinate Mapper for one point
//! - [`map_columns`] - Coordinate Mapper over a column table
//!
//! Calibration lives for one session only.

pub mod mapper;
pub mod transform;

pub use mapper::{map_columns, CoordinateMapping};
pub use transform::{solve, CalibrationQuality, RigidTransform};
