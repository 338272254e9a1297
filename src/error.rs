use thiserror::Error;

use crate::recorder::SessionState;

/// Message shown to the user when a capture stream cannot be obtained
pub const CAPTURE_FAILED_NOTICE: &str =
    "Failed to start screen capture. Please make sure you have granted the necessary permissions.";

/// Errors surfaced by the recorder and its platform boundaries
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("No capture source available: {0}")]
    NoCaptureSource(String),

    #[error("Encoder fault: {0}")]
    EncoderFault(String),

    #[error("Failed to release capture stream: {0}")]
    Release(String),

    #[error("Recorder is busy ({0:?})")]
    Busy(SessionState),

    #[error("Export error: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecorderError {
    /// Human-readable notice for the UI
    pub fn notice(&self) -> String {
        match self {
            RecorderError::PermissionDenied(_) | RecorderError::NoCaptureSource(_) => {
                CAPTURE_FAILED_NOTICE.to_string()
            }
            RecorderError::EncoderFault(reason) => {
                format!("Recording stopped because the encoder failed: {}", reason)
            }
            other => other.to_string(),
        }
    }

    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            RecorderError::PermissionDenied(_) => "PERMISSION_DENIED",
            RecorderError::NoCaptureSource(_) => "NO_CAPTURE_SOURCE",
            RecorderError::EncoderFault(_) => "ENCODER_FAULT",
            RecorderError::Release(_) => "RELEASE_FAILED",
            RecorderError::Busy(_) => "BUSY",
            RecorderError::Export(_) => "EXPORT_ERROR",
            RecorderError::Io(_) => "IO_ERROR",
        }
    }
}

pub type RecorderResult<T> = Result<T, RecorderError>;
