//! # xfer_core - Column Load Transfer Engine
//!
//! `xfer_core` moves column axial-load demands from a structural analysis
//! model (the source) onto a loading layer of a slab model (the target).
//! The two models use unrelated plan coordinates, so a rigid registration is
//! first solved from two reference points picked in both.
//!
//! ## Pipeline
//!
//! ```text
//! Solver ──► Mapper ──┐
//!                     ├──► Assembler ──► target loading layer
//! Aggregator ─────────┘
//! ```
//!
//! - **Stateless stages**: solver, mapper, aggregator and assembler are plain
//!   functions over values
//! - **JSON-First**: all types implement Serialize/Deserialize
//! - **Rich Errors**: structured error types, not just strings
//!
//! ## Quick Start
//!
//! ```rust
//! use xfer_core::calibration::solve;
//! use xfer_core::geometry::{CorrespondencePair, Point2D};
//!
//! let pair = CorrespondencePair::new(
//!     Point2D::new(0.0, 0.0),
//!     Point2D::new(10.0, 0.0),
//!     Point2D::new(5.0, 5.0),
//!     Point2D::new(5.0, 15.0),
//! )?;
//! let transform = solve(&pair)?;
//! let p = transform.apply(Point2D::new(2.0, 0.0));
//! assert!((p.x - 5.0).abs() < 1e-9 && (p.y - 7.0).abs() < 1e-9);
//! # Ok::<(), xfer_core::errors::XferError>(())
//! ```
//!
//! ## Modules
//!
//! - [`geometry`] - Points and reference-point correspondences
//! - [`calibration`] - Rigid transform solver and coordinate mapper
//! - [`columns`] - Versioned column table
//! - [`loads`] - Load case selection and peak axial aggregation
//! - [`transfer`] - Assembly of point loads for one level
//! - [`model`] - Source and target collaborator traits
//! - [`snapshot`] - JSON-backed collaborators
//! - [`session`] - The three user actions tied together
//! - [`settings`] - Session configuration
//! - [`errors`] - Structured error types
//! - [`file_io`] - Atomic saves and file locking

pub mod calibration;
pub mod columns;
pub mod errors;
pub mod file_io;
pub mod geometry;
pub mod loads;
pub mod model;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod transfer;

// Re-export commonly used types at crate root for convenience
pub use errors::{ErrorCategory, XferError, XferResult};
pub use geometry::{CorrespondencePair, Point2D};
pub use model::{SourceModel, TargetModel};
pub use session::{TransferReport, TransferSession};
pub use settings::TransferSettings;
