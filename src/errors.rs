use std::path::PathBuf;
use thiserror::Error;

use crate::summary::FailureKind;

/// Structured error types for the image tagging pipeline.
///
/// Variants are split along the two axes the run driver cares about: which external
/// system failed (filesystem, inference service, metadata tool) and whether the failure
/// is confined to one file or makes the whole run pointless. See [`AimError::failure_kind`].
#[derive(Error, Debug)]
pub enum AimError {
    #[error("Input path does not exist: {path:?}")]
    PathNotFound { path: PathBuf },

    #[error("Metadata tool {program:?} is not available: {reason}")]
    ToolNotFound { program: PathBuf, reason: String },

    #[error("Inference service at {endpoint} is unavailable")]
    InferenceUnavailable {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Inference service at {endpoint} returned an invalid response: {reason}")]
    InferenceResponse { endpoint: String, reason: String },

    #[error("Model reply for {path:?} contains no description: {reply:?}")]
    UnusableReply { path: PathBuf, reply: String },

    #[error("Metadata write failed for {path:?}: {reason}")]
    MetadataWrite { path: PathBuf, reason: String },

    #[error("Metadata read failed for {path:?}: {reason}")]
    MetadataRead { path: PathBuf, reason: String },

    #[error("Not a recognizable image file: {path:?}")]
    UnrecognizedImage { path: PathBuf },

    #[error("Filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Validation error: {field} {reason}")]
    Validation { field: String, reason: String },
}

pub type Result<T> = std::result::Result<T, AimError>;

impl AimError {
    /// Category of a per-file failure, or `None` when the error must abort the run.
    pub const fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::FileSystem { .. } | Self::UnrecognizedImage { .. } => Some(FailureKind::Read),
            Self::InferenceUnavailable { .. }
            | Self::InferenceResponse { .. }
            | Self::UnusableReply { .. } => Some(FailureKind::Inference),
            Self::MetadataWrite { .. } | Self::MetadataRead { .. } => Some(FailureKind::Write),
            Self::PathNotFound { .. }
            | Self::ToolNotFound { .. }
            | Self::Configuration { .. }
            | Self::Validation { .. } => None,
        }
    }

    pub const fn is_fatal(&self) -> bool {
        self.failure_kind().is_none()
    }
}

/// Convert I/O errors to filesystem errors.
///
/// Code that knows the path and operation should build [`AimError::FileSystem`]
/// directly; this is the fallback for `?` on bare I/O calls.
impl From<std::io::Error> for AimError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("unknown"),
            operation: "unknown".to_string(),
            source: err,
        }
    }
}

/// Settings files are the only JSON the crate parses outside of a response context,
/// so a bare serde error is a configuration problem.
impl From<serde_json::Error> for AimError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration {
            message: err.to_string(),
        }
    }
}
