//! # Error Types
//!
//! Structured error types for xfer_core. Every failure carries enough context
//! (operation, offending identifier) to report a specific, actionable message
//! to whoever drives the session.
//!
//! Errors fall into four categories, see [`ErrorCategory`]. None of them is
//! fatal inside the core; the caller decides whether to retry the action.
//!
//! ## Example
//!
//! ```rust
//! use xfer_core::errors::{ErrorCategory, XferError, XferResult};
//!
//! fn require_layer(layers: &[String], name: &str) -> XferResult<()> {
//!     if !layers.iter().any(|l| l == name) {
//!         return Err(XferError::layer_not_found(name));
//!     }
//!     Ok(())
//! }
//!
//! let err = require_layer(&[], "Column Loads").unwrap_err();
//! assert_eq!(err.category(), ErrorCategory::Lookup);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for xfer_core operations
pub type XferResult<T> = Result<T, XferError>;

/// Broad classes of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Bad user input (coordinates, selections)
    Validation,
    /// A named case, level or layer does not exist
    Lookup,
    /// An action was requested before the state it needs exists
    Precondition,
    /// An external model query or write failed
    Collaborator,
}

/// Structured error type for transfer operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum XferError {
    /// A coordinate component is not a finite number
    #[error("Invalid coordinate input for '{field}': {value}")]
    InvalidCoordinate { field: String, value: String },

    /// The two reference points of one system coincide
    #[error("Ill-defined reference points in {system} system: {reason}")]
    IllDefinedReference { system: String, reason: String },

    /// A load case selection contains no cases
    #[error("Load case selection is empty")]
    EmptySelection,

    /// A load case name appears twice in a selection
    #[error("Duplicate load case in selection: {case}")]
    DuplicateCase { case: String },

    /// Two column records share an identifier
    #[error("Duplicate column identifier: {column}")]
    DuplicateColumn { column: String },

    /// Requested load case is absent from the source model
    #[error("Load case not found: {case}")]
    CaseNotFound { case: String },

    /// Requested level/story is absent from the source model
    #[error("Level not found: {level}")]
    LevelNotFound { level: String },

    /// Requested loading layer is absent from the target model
    #[error("Loading layer not found: {layer}")]
    LayerNotFound { layer: String },

    /// A column has no target-system point yet
    #[error("Calibration missing: column '{column}' has no target coordinates")]
    CalibrationMissing { column: String },

    /// A column has no value under the requested load key
    #[error("Load missing: column '{column}' has no value for '{key}'")]
    LoadMissing { column: String, key: String },

    /// Parallel write sequences differ in length
    #[error("Length mismatch writing '{layer}': x={xs}, y={ys}, values={values}")]
    LengthMismatch {
        layer: String,
        xs: usize,
        ys: usize,
        values: usize,
    },

    /// An external model query or write failed
    #[error("Collaborator error: {operation} on '{target}' - {reason}")]
    Collaborator {
        operation: String,
        target: String,
        reason: String,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

impl XferError {
    /// Create an InvalidCoordinate error
    pub fn invalid_coordinate(field: impl Into<String>, value: impl Into<String>) -> Self {
        XferError::InvalidCoordinate {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an IllDefinedReference error
    pub fn ill_defined_reference(system: impl Into<String>, reason: impl Into<String>) -> Self {
        XferError::IllDefinedReference {
            system: system.into(),
            reason: reason.into(),
        }
    }

    /// Create a CaseNotFound error
    pub fn case_not_found(case: impl Into<String>) -> Self {
        XferError::CaseNotFound { case: case.into() }
    }

    /// Create a LevelNotFound error
    pub fn level_not_found(level: impl Into<String>) -> Self {
        XferError::LevelNotFound { level: level.into() }
    }

    /// Create a LayerNotFound error
    pub fn layer_not_found(layer: impl Into<String>) -> Self {
        XferError::LayerNotFound { layer: layer.into() }
    }

    /// Create a CalibrationMissing error
    pub fn calibration_missing(column: impl Into<String>) -> Self {
        XferError::CalibrationMissing {
            column: column.into(),
        }
    }

    /// Create a LoadMissing error
    pub fn load_missing(column: impl Into<String>, key: impl Into<String>) -> Self {
        XferError::LoadMissing {
            column: column.into(),
            key: key.into(),
        }
    }

    /// Create a Collaborator error
    pub fn collaborator(
        operation: impl Into<String>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        XferError::Collaborator {
            operation: operation.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        XferError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(
        path: impl Into<String>,
        locked_by: impl Into<String>,
        locked_at: impl Into<String>,
    ) -> Self {
        XferError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Which of the four failure classes this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            XferError::InvalidCoordinate { .. }
            | XferError::IllDefinedReference { .. }
            | XferError::EmptySelection
            | XferError::DuplicateCase { .. }
            | XferError::DuplicateColumn { .. } => ErrorCategory::Validation,
            XferError::CaseNotFound { .. }
            | XferError::LevelNotFound { .. }
            | XferError::LayerNotFound { .. } => ErrorCategory::Lookup,
            XferError::CalibrationMissing { .. } | XferError::LoadMissing { .. } => {
                ErrorCategory::Precondition
            }
            XferError::LengthMismatch { .. }
            | XferError::Collaborator { .. }
            | XferError::FileError { .. }
            | XferError::FileLocked { .. }
            | XferError::SerializationError { .. }
            | XferError::VersionMismatch { .. } => ErrorCategory::Collaborator,
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, XferError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            XferError::InvalidCoordinate { .. } => "INVALID_COORDINATE",
            XferError::IllDefinedReference { .. } => "ILL_DEFINED_REFERENCE",
            XferError::EmptySelection => "EMPTY_SELECTION",
            XferError::DuplicateCase { .. } => "DUPLICATE_CASE",
            XferError::DuplicateColumn { .. } => "DUPLICATE_COLUMN",
            XferError::CaseNotFound { .. } => "CASE_NOT_FOUND",
            XferError::LevelNotFound { .. } => "LEVEL_NOT_FOUND",
            XferError::LayerNotFound { .. } => "LAYER_NOT_FOUND",
            XferError::CalibrationMissing { .. } => "CALIBRATION_MISSING",
            XferError::LoadMissing { .. } => "LOAD_MISSING",
            XferError::LengthMismatch { .. } => "LENGTH_MISMATCH",
            XferError::Collaborator { .. } => "COLLABORATOR_ERROR",
            XferError::FileError { .. } => "FILE_ERROR",
            XferError::FileLocked { .. } => "FILE_LOCKED",
            XferError::SerializationError { .. } => "SERIALIZATION_ERROR",
            XferError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = XferError::invalid_coordinate("source point 1 x", "abc");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("InvalidCoordinate"));
        let roundtrip: XferError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(XferError::case_not_found("DL").error_code(), "CASE_NOT_FOUND");
        assert_eq!(XferError::EmptySelection.error_code(), "EMPTY_SELECTION");
        assert_eq!(XferError::calibration_missing("C1").error_code(), "CALIBRATION_MISSING");
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            XferError::ill_defined_reference("source", "points coincide").category(),
            ErrorCategory::Validation
        );
        assert_eq!(XferError::level_not_found("L9").category(), ErrorCategory::Lookup);
        assert_eq!(
            XferError::load_missing("C1", "P_max_DL").category(),
            ErrorCategory::Precondition
        );
        assert_eq!(
            XferError::collaborator("save", "slab.json", "disk full").category(),
            ErrorCategory::Collaborator
        );
    }

    #[test]
    fn test_message_names_offending_identifier() {
        let msg = XferError::case_not_found("WIND-X").to_string();
        assert!(msg.contains("WIND-X"));
    }
}
