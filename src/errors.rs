// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanner

use crate::backends::camera::types::{AcquireError, AcquireErrorKind, SinkError};
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Top-level error type used by the binary and configuration loading
#[derive(Debug, Clone)]
pub enum AppError {
    /// A scan session ended in the failed phase
    Scan(ScanError),
    /// A still image could not be decoded
    Decode(DecodeError),
    /// Configuration errors
    Config(String),
    /// Filesystem errors
    Io(String),
    /// Generic error with message
    Other(String),
}

/// Fatal, session-ending errors
///
/// These are the only errors that leave a scan session. Each one maps to a
/// user-facing instruction; recovery always means starting a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// Camera access was denied
    PermissionDenied(String),
    /// No camera is available
    DeviceNotFound(String),
    /// The camera is held by another application
    DeviceBusy(String),
    /// The video sink never started producing frames
    VideoUnavailable(String),
    /// Unclassified acquisition failure
    Unknown(String),
}

/// Decode-time failures
///
/// "No barcode in this frame" is not an error; decoders return `Ok(None)`.
/// Everything here is absorbed by the detection loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The raster could not be read by the decoder
    InvalidBuffer(String),
    /// Decoder internal failure
    Fault(String),
    /// The blocking decode task panicked or was aborted
    TaskFailed(String),
}

impl ScanError {
    /// Stable kebab-case classification for the failure
    pub fn classification(&self) -> &'static str {
        match self {
            ScanError::PermissionDenied(_) => "permission-denied",
            ScanError::DeviceNotFound(_) => "device-not-found",
            ScanError::DeviceBusy(_) => "device-busy",
            ScanError::VideoUnavailable(_) => "video-unavailable",
            ScanError::Unknown(_) => "unknown",
        }
    }

    /// Short message suitable for showing to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            ScanError::PermissionDenied(_) => {
                "Camera access denied. Please allow camera permissions and refresh."
            }
            ScanError::DeviceNotFound(_) => {
                "No camera found. Please ensure your device has a camera."
            }
            ScanError::DeviceBusy(_) => "Camera is already in use by another application.",
            ScanError::VideoUnavailable(_) => "The camera started but no video arrived.",
            ScanError::Unknown(_) => "Failed to access camera.",
        }
    }

    /// Steps the user can take before starting a new session
    pub fn recovery_steps(&self) -> &'static [&'static str] {
        match self {
            ScanError::PermissionDenied(_) => &[
                "Allow camera permissions when prompted",
                "Refresh and try again",
            ],
            ScanError::DeviceNotFound(_) => &[
                "Connect a camera",
                "Refresh and try again",
            ],
            ScanError::DeviceBusy(_) => &[
                "Close other applications using the camera",
                "Refresh and try again",
            ],
            ScanError::VideoUnavailable(_) | ScanError::Unknown(_) => &[
                "Allow camera permissions when prompted",
                "Refresh and try again",
                "Check if camera is being used by another app",
            ],
        }
    }

    /// Underlying diagnostic detail
    pub fn detail(&self) -> &str {
        match self {
            ScanError::PermissionDenied(msg)
            | ScanError::DeviceNotFound(msg)
            | ScanError::DeviceBusy(msg)
            | ScanError::VideoUnavailable(msg)
            | ScanError::Unknown(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Scan(e) => write!(f, "Scan failed: {}", e),
            AppError::Decode(e) => write!(f, "Decode failed: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.user_message(), self.detail())
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidBuffer(msg) => write!(f, "Invalid buffer: {}", msg),
            DecodeError::Fault(msg) => write!(f, "Decoder fault: {}", msg),
            DecodeError::TaskFailed(msg) => write!(f, "Decode task failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for ScanError {}
impl std::error::Error for DecodeError {}

impl From<&AcquireError> for ScanError {
    fn from(err: &AcquireError) -> Self {
        let msg = err.message.clone();
        match err.kind {
            AcquireErrorKind::NotAllowed => ScanError::PermissionDenied(msg),
            AcquireErrorKind::NotFound => ScanError::DeviceNotFound(msg),
            AcquireErrorKind::NotReadable => ScanError::DeviceBusy(msg),
            AcquireErrorKind::Overconstrained | AcquireErrorKind::Other => ScanError::Unknown(msg),
        }
    }
}

impl From<AcquireError> for ScanError {
    fn from(err: AcquireError) -> Self {
        ScanError::from(&err)
    }
}

impl From<SinkError> for ScanError {
    fn from(err: SinkError) -> Self {
        ScanError::VideoUnavailable(err.to_string())
    }
}

impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        AppError::Scan(err)
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        AppError::Decode(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_errors_classify() {
        let cases = [
            (AcquireErrorKind::NotAllowed, "permission-denied"),
            (AcquireErrorKind::NotFound, "device-not-found"),
            (AcquireErrorKind::NotReadable, "device-busy"),
            (AcquireErrorKind::Overconstrained, "unknown"),
            (AcquireErrorKind::Other, "unknown"),
        ];
        for (kind, expected) in cases {
            let err = ScanError::from(AcquireError::new(kind, "x"));
            assert_eq!(err.classification(), expected, "{:?}", kind);
        }
    }

    #[test]
    fn test_sink_error_is_video_unavailable() {
        let err = ScanError::from(SinkError::Timeout);
        assert_eq!(err.classification(), "video-unavailable");
        assert!(err.detail().contains("Timed out"));
    }

    #[test]
    fn test_every_error_has_recovery_steps() {
        let errors = [
            ScanError::PermissionDenied(String::new()),
            ScanError::DeviceNotFound(String::new()),
            ScanError::DeviceBusy(String::new()),
            ScanError::VideoUnavailable(String::new()),
            ScanError::Unknown(String::new()),
        ];
        for err in errors {
            assert!(!err.recovery_steps().is_empty());
            assert!(!err.user_message().is_empty());
        }
    }
}
