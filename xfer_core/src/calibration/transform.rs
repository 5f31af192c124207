//! Rigid 2D transform solved from two reference-point correspondences.
//!
//! The transform is rotation plus translation only. When the two models are
//! not drawn at the same scale, point 2 lands on the correct bearing from
//! point 1 but at the source-scaled distance; [`CalibrationQuality`] reports
//! that error, it is never corrected with a scale factor.

use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

use crate::errors::{XferError, XferResult};
use crate::geometry::{CorrespondencePair, Point2D};

/// Rotation followed by translation: `p' = R·p + t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    rotation: Rotation2<f64>,
    translation: Vector2<f64>,
}

impl RigidTransform {
    /// Identity transform (source and target frames coincide)
    pub fn identity() -> Self {
        RigidTransform {
            rotation: Rotation2::identity(),
            translation: Vector2::zeros(),
        }
    }

    /// Build from an angle in radians and a translation.
    pub fn from_angle(angle: f64, translation: Point2D) -> Self {
        RigidTransform {
            rotation: Rotation2::new(angle),
            translation: translation.to_vector(),
        }
    }

    /// Map a source-system point into the target system.
    pub fn apply(&self, point: Point2D) -> Point2D {
        Point2D::from_vector(self.rotation * point.to_vector() + self.translation)
    }

    pub fn angle_radians(&self) -> f64 {
        self.rotation.angle()
    }

    pub fn angle_degrees(&self) -> f64 {
        self.rotation.angle().to_degrees()
    }

    /// Row-major 2×2 rotation matrix
    pub fn rotation_matrix(&self) -> [[f64; 2]; 2] {
        let m = self.rotation.matrix();
        [[m[(0, 0)], m[(0, 1)]], [m[(1, 0)], m[(1, 1)]]]
    }

    pub fn translation(&self) -> Point2D {
        Point2D::from_vector(self.translation)
    }
}

/// How well a solved transform reproduces the second reference point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationQuality {
    /// |source_pt2 - source_pt1|
    pub source_distance: f64,
    /// |target_pt2 - target_pt1|
    pub target_distance: f64,
    /// target_distance / source_distance (1.0 for same-scale drawings)
    pub scale_ratio: f64,
    /// Distance between the mapped source point 2 and target point 2
    pub point2_error: f64,
}

impl CalibrationQuality {
    /// Measure the second-point residual of `transform` against `pair`.
    pub fn measure(transform: &RigidTransform, pair: &CorrespondencePair) -> Self {
        let source_distance = pair.source_distance();
        let target_distance = pair.target_distance();
        CalibrationQuality {
            source_distance,
            target_distance,
            scale_ratio: target_distance / source_distance,
            point2_error: transform.apply(pair.source_pt2).distance_to(&pair.target_pt2),
        }
    }

    /// Relative scale difference exceeds `tolerance`
    pub fn is_scale_mismatched(&self, tolerance: f64) -> bool {
        (self.scale_ratio - 1.0).abs() > tolerance
    }
}

/// Solve the rigid transform taking `pair.source_pt1` onto `pair.target_pt1`
/// and rotating the source reference vector onto the target one.
///
/// # Errors
///
/// * `InvalidCoordinate` - a coordinate is NaN or infinite
/// * `IllDefinedReference` - the two points of either system coincide
///
/// # Example
///
/// ```rust
/// use xfer_core::calibration::solve;
/// use xfer_core::geometry::{CorrespondencePair, Point2D};
///
/// let pair = CorrespondencePair::new(
///     Point2D::new(0.0, 0.0),
///     Point2D::new(10.0, 0.0),
///     Point2D::new(5.0, 5.0),
///     Point2D::new(5.0, 15.0),
/// )?;
/// let transform = solve(&pair)?;
/// let mapped = transform.apply(Point2D::new(2.0, 0.0));
/// assert!((mapped.x - 5.0).abs() < 1e-9);
/// assert!((mapped.y - 7.0).abs() < 1e-9);
/// # Ok::<(), xfer_core::errors::XferError>(())
/// ```
pub fn solve(pair: &CorrespondencePair) -> XferResult<RigidTransform> {
    // Fields are public, so a pair may reach here without going through new()
    pair.validate()?;

    let vs = pair.source_pt2.to_vector() - pair.source_pt1.to_vector();
    let vt = pair.target_pt2.to_vector() - pair.target_pt1.to_vector();
    if vs.norm() == 0.0 {
        return Err(XferError::ill_defined_reference("source", "zero-length reference vector"));
    }
    if vt.norm() == 0.0 {
        return Err(XferError::ill_defined_reference("target", "zero-length reference vector"));
    }

    let theta = vt.y.atan2(vt.x) - vs.y.atan2(vs.x);
    let rotation = Rotation2::new(theta);
    let translation = pair.target_pt1.to_vector() - rotation * pair.source_pt1.to_vector();

    Ok(RigidTransform {
        rotation,
        translation,
    })
}
