//! Error handling for LabelKit
//!
//! Provides error types for every layer of the application:
//! - Validation errors (import payloads, generation input, edits)
//! - Configuration errors (page packing that cannot place a label)
//! - Export errors (rasterization, PDF encoding, saving)
//!
//! Collision search exhaustion is deliberately absent: the resolver recovers
//! locally and never reports it. Cancellation is an export outcome, not an
//! error; `ExportError::Cancelled` only lets collaborators say they stopped
//! because the run was cancelled.

use thiserror::Error;

/// Validation error type
///
/// Input was rejected before any state was changed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Batch generation asked for fewer than one label
    #[error("Quantity must be at least 1, got {quantity}")]
    InvalidQuantity {
        /// The rejected quantity.
        quantity: i64,
    },

    /// Short identifier length outside the supported range
    #[error("Short id length must be between {min} and {max}, got {length}")]
    InvalidUuidLength {
        /// The rejected length.
        length: usize,
        /// Smallest accepted length.
        min: usize,
        /// Largest accepted length.
        max: usize,
    },

    /// Import payload is not a JSON array
    #[error("Invalid file format: Data must be an array of labels")]
    NotAnArray,

    /// An imported label lacks a required property
    #[error("Invalid file format: label {index} is missing required property '{field}'")]
    MissingField {
        /// Position of the offending entry in the array.
        index: usize,
        /// Name of the missing property.
        field: String,
    },

    /// Payload could not be parsed
    #[error("Failed to parse labels: {reason}")]
    Malformed {
        /// Parser message.
        reason: String,
    },

    /// Referenced label is not in the working set
    #[error("Label {id} not found")]
    LabelNotFound {
        /// The unknown label id.
        id: String,
    },

    /// Numeric input rejected
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Configuration error type
///
/// Fatal for the operation that hit it; never turned into empty output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Not even one label fits in the printable area
    #[error(
        "Label {label_width_pt:.1}x{label_height_pt:.1}pt does not fit the printable area \
         {available_width_pt:.1}x{available_height_pt:.1}pt"
    )]
    LabelDoesNotFit {
        /// Label width in points.
        label_width_pt: f64,
        /// Label height in points.
        label_height_pt: f64,
        /// Page width minus left/right margins, in points.
        available_width_pt: f64,
        /// Page height minus top/bottom margins, in points.
        available_height_pt: f64,
    },

    /// Page settings are unusable
    #[error("Invalid page settings: {reason}")]
    InvalidPageSettings {
        /// What is wrong.
        reason: String,
    },
}

/// Export error type
#[derive(Error, Debug)]
pub enum ExportError {
    /// Another export holds the document builder
    #[error("An export is already in progress")]
    AlreadyRunning,

    /// Rasterizing a label failed
    #[error("Failed to rasterize label {label_id}: {reason}")]
    Rasterization {
        /// The label being rendered.
        label_id: String,
        /// What went wrong.
        reason: String,
    },

    /// Building or encoding the PDF failed
    #[error("PDF encoding failed: {reason}")]
    Encoding {
        /// What went wrong.
        reason: String,
    },

    /// Page packing could not place labels
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A collaborator stopped because the run was cancelled
    #[error("Export cancelled")]
    Cancelled,

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Create a rasterization error
    pub fn rasterization(label_id: impl Into<String>, reason: impl Into<String>) -> Self {
        ExportError::Rasterization {
            label_id: label_id.into(),
            reason: reason.into(),
        }
    }

    /// Create an encoding error
    pub fn encoding(reason: impl Into<String>) -> Self {
        ExportError::Encoding {
            reason: reason.into(),
        }
    }

    /// Check if this error only reports a cancellation
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ExportError::Cancelled)
    }
}

/// Main error type for LabelKit
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Validation error
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Configuration error
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Export error
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
