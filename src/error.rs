//! # Error Handling
//!
//! One typed error for the whole pipeline, plus the classification used by the
//! control loops to decide between skip-and-continue and abort.
//!
//! ## Error Classification
//!
//! | Kind | Raised by | Policy |
//! |------|-----------|--------|
//! | `SourceUnavailable` | image sources | skip the frame/trial in loops, fatal for a single shot |
//! | `InvalidDimensions` | frame, compositor | fatal |
//! | `DimensionMismatch` | encoder | fatal |
//! | `InvalidStride` | encoder, config | fatal |
//! | `SinkWriteFailure` | device sink | skip the frame/trial, loop continues |
//! | `DeviceNotFound` | startup check | fatal, not retried |
//! | `Config` | config store, CLI, candidate sets | fatal |
//!
//! ## Usage
//!
//! ```rust
//! use stride_projector::error::{ProjectorError, Recoverable, classify};
//!
//! let err = ProjectorError::sink_write("/tmp/gm12u320_image.rgb", "disk full");
//! assert!(err.is_recoverable());
//! assert!(!classify::is_fatal(&err));
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Operation continues after skipping the affected unit of work
    Warning,
    /// The current run cannot continue
    Fatal,
}

/// Base error type for the projector pipeline
#[derive(Debug, Error)]
pub enum ProjectorError {
    /// The image could not be acquired or decoded
    #[error("source '{origin}' unavailable: {reason}")]
    SourceUnavailable { origin: String, reason: String },

    /// A frame or resize target has a zero dimension
    #[error("invalid dimensions {width}x{height}: both sides must be positive")]
    InvalidDimensions { width: u32, height: u32 },

    /// Frame size disagrees with the encoding configuration
    #[error(
        "frame is {actual_width}x{actual_height} but the encoding expects {expected_width}x{expected_height}"
    )]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// Row stride cannot hold one row of packed pixels
    #[error("stride {stride} is smaller than one packed row ({minimum} bytes for width {width})")]
    InvalidStride {
        stride: usize,
        width: u32,
        minimum: usize,
    },

    /// The device sink rejected a delivery
    #[error("write to '{target}' failed: {reason}")]
    SinkWriteFailure { target: String, reason: String },

    /// The projector device node does not exist
    #[error("projector device {} not found; is the driver loaded?", .path.display())]
    DeviceNotFound { path: PathBuf },

    /// Malformed configuration value
    #[error("configuration error in '{field}': {reason}")]
    Config { field: String, reason: String },

    /// Resampler failure
    #[error("resampling failed: {0}")]
    Scale(#[from] frame_scale::cpu::ScaleError),

    /// I/O errors outside the device sink
    #[error("I/O error during {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProjectorError {
    /// Create a source error
    pub fn source_unavailable(origin: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a sink error
    pub fn sink_write(target: impl Into<String>, reason: impl ToString) -> Self {
        Self::SinkWriteFailure {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "source_unavailable",
            Self::InvalidDimensions { .. } => "invalid_dimensions",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::InvalidStride { .. } => "invalid_stride",
            Self::SinkWriteFailure { .. } => "sink_write_failure",
            Self::DeviceNotFound { .. } => "device_not_found",
            Self::Config { .. } => "config",
            Self::Scale(_) => "scale",
            Self::Io { .. } => "io",
        }
    }
}

/// Result type alias using our custom error type
pub type ProjectorResult<T> = Result<T, ProjectorError>;

/// Recovery strategies for handling errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Drop the current frame or trial and move on
    Skip { reason: String },
    /// Stop the run and report
    Abort,
}

/// Trait for errors that can be recovered from
pub trait Recoverable {
    /// Check if this error can be recovered from
    fn is_recoverable(&self) -> bool;

    /// Get the recovery strategy for this error
    fn recovery_strategy(&self) -> RecoveryStrategy;
}

impl Recoverable for ProjectorError {
    fn is_recoverable(&self) -> bool {
        classify::is_skippable(self)
    }

    fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            Self::SourceUnavailable { .. } => RecoveryStrategy::Skip {
                reason: "source frame unavailable".to_string(),
            },
            Self::SinkWriteFailure { .. } => RecoveryStrategy::Skip {
                reason: "sink rejected the frame".to_string(),
            },
            _ => RecoveryStrategy::Abort,
        }
    }
}

/// Trait for errors with severity levels
pub trait HasSeverity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for ProjectorError {
    fn severity(&self) -> ErrorSeverity {
        if classify::is_skippable(self) {
            ErrorSeverity::Warning
        } else {
            ErrorSeverity::Fatal
        }
    }
}

/// Error classification utilities
pub mod classify {
    use super::*;

    /// Errors the sweep and display loops convert into skip-and-continue
    pub fn is_skippable(error: &ProjectorError) -> bool {
        matches!(
            error,
            ProjectorError::SourceUnavailable { .. } | ProjectorError::SinkWriteFailure { .. }
        )
    }

    /// Errors that terminate the run
    pub fn is_fatal(error: &ProjectorError) -> bool {
        !is_skippable(error)
    }
}

impl From<serde_json::Error> for ProjectorError {
    fn from(error: serde_json::Error) -> Self {
        Self::config("record", error.to_string())
    }
}
