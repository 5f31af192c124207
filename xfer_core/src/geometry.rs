//! # Plan Geometry
//!
//! Points and reference-point correspondences used for calibration.
//!
//! All coordinates share one linear unit (inches unless configured otherwise
//! in [`crate::settings::TransferSettings`]). Nothing here knows which model
//! a point came from; the caller keeps source and target values apart.
//!
//! ## Example
//!
//! ```rust
//! use xfer_core::geometry::{CorrespondencePair, Point2D};
//!
//! let pair = CorrespondencePair::new(
//!     Point2D::new(0.0, 0.0),
//!     Point2D::new(10.0, 0.0),
//!     Point2D::new(5.0, 5.0),
//!     Point2D::new(5.0, 15.0),
//! ).unwrap();
//!
//! assert_eq!(pair.source_distance(), 10.0);
//!
//! // Text entered by a user is parsed before anything is computed
//! assert!(Point2D::parse("source point 1", "12.5", "abc").is_err());
//! ```

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::errors::{XferError, XferResult};

/// A plan-view point (x, y).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Point2D { x, y }
    }

    /// Parse user-entered text into a point.
    ///
    /// `field` names the input in the error, e.g. `"source point 1"`.
    /// Each component must parse as a finite `f64`.
    pub fn parse(field: &str, x: &str, y: &str) -> XferResult<Self> {
        let x = parse_component(&format!("{} x", field), x)?;
        let y = parse_component(&format!("{} y", field), y)?;
        Ok(Point2D { x, y })
    }

    /// Parse `"x,y"` into a point.
    pub fn parse_pair(field: &str, text: &str) -> XferResult<Self> {
        match text.split_once(',') {
            Some((x, y)) => Point2D::parse(field, x, y),
            None => Err(XferError::invalid_coordinate(field, text)),
        }
    }

    /// Both components are finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        (other.to_vector() - self.to_vector()).norm()
    }

    /// Polar angle (radians) of the displacement from `self` to `other`
    pub fn bearing_to(&self, other: &Point2D) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    pub fn from_vector(v: Vector2<f64>) -> Self {
        Point2D { x: v.x, y: v.y }
    }
}

impl std::fmt::Display for Point2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

fn parse_component(field: &str, text: &str) -> XferResult<f64> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(XferError::invalid_coordinate(field, trimmed)),
    }
}

/// Two physical reference locations observed in both coordinate systems.
///
/// `source_pt1` and `target_pt1` are the same physical point, likewise for
/// point 2. The two points within each system must be distinct.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrespondencePair {
    pub source_pt1: Point2D,
    pub source_pt2: Point2D,
    pub target_pt1: Point2D,
    pub target_pt2: Point2D,
}

impl CorrespondencePair {
    /// Build and validate a correspondence pair.
    pub fn new(
        source_pt1: Point2D,
        source_pt2: Point2D,
        target_pt1: Point2D,
        target_pt2: Point2D,
    ) -> XferResult<Self> {
        let pair = CorrespondencePair {
            source_pt1,
            source_pt2,
            target_pt1,
            target_pt2,
        };
        pair.validate()?;
        Ok(pair)
    }

    /// Check every coordinate is finite and neither system's points coincide.
    pub fn validate(&self) -> XferResult<()> {
        let named = [
            ("source point 1", self.source_pt1),
            ("source point 2", self.source_pt2),
            ("target point 1", self.target_pt1),
            ("target point 2", self.target_pt2),
        ];
        for (field, p) in named {
            if !p.is_finite() {
                return Err(XferError::invalid_coordinate(field, p.to_string()));
            }
        }
        if self.source_distance() == 0.0 {
            return Err(XferError::ill_defined_reference(
                "source",
                format!("points 1 and 2 coincide at {}", self.source_pt1),
            ));
        }
        if self.target_distance() == 0.0 {
            return Err(XferError::ill_defined_reference(
                "target",
                format!("points 1 and 2 coincide at {}", self.target_pt1),
            ));
        }
        Ok(())
    }

    /// Distance between the two source reference points
    pub fn source_distance(&self) -> f64 {
        self.source_pt1.distance_to(&self.source_pt2)
    }

    /// Distance between the two target reference points
    pub fn target_distance(&self) -> f64 {
        self.target_pt1.distance_to(&self.target_pt2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_point() {
        let p = Point2D::parse("source point 1", " 12.5 ", "-3").unwrap();
        assert_eq!(p, Point2D::new(12.5, -3.0));
    }

    #[test]
    fn test_parse_rejects_text_and_non_finite() {
        let err = Point2D::parse("source point 1", "12", "twelve").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_COORDINATE");
        match err {
            XferError::InvalidCoordinate { field, value } => {
                assert_eq!(field, "source point 1 y");
                assert_eq!(value, "twelve");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(Point2D::parse("p", "NaN", "0").is_err());
        assert!(Point2D::parse("p", "inf", "0").is_err());
        assert!(Point2D::parse("p", "", "0").is_err());
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            Point2D::parse_pair("target point 2", "5,15").unwrap(),
            Point2D::new(5.0, 15.0)
        );
        assert!(Point2D::parse_pair("target point 2", "5 15").is_err());
    }

    #[test]
    fn test_distance_and_bearing() {
        let a = Point2D::new(1.0, 1.0);
        let b = Point2D::new(4.0, 5.0);
        assert_relative_eq!(a.distance_to(&b), 5.0, epsilon = 1e-12);
        let up = Point2D::new(1.0, 3.0);
        assert_relative_eq!(a.bearing_to(&up), std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_pair_rejects_coincident_points() {
        let p = Point2D::new(3.0, 4.0);
        let err = CorrespondencePair::new(p, p, Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0))
            .unwrap_err();
        assert!(matches!(
            err,
            XferError::IllDefinedReference { ref system, .. } if system == "source"
        ));

        let err = CorrespondencePair::new(Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0), p, p)
            .unwrap_err();
        assert!(matches!(
            err,
            XferError::IllDefinedReference { ref system, .. } if system == "target"
        ));
    }

    #[test]
    fn test_pair_rejects_non_finite() {
        let err = CorrespondencePair::new(
            Point2D::new(f64::NAN, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_COORDINATE");
    }
}
