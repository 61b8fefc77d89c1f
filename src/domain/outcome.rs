//! Gate outcomes and the scan error taxonomy

use serde::{Deserialize, Serialize};

/// Everything that can keep a frame from producing a scan
///
/// The first four come from the capture/detection side and never reach the
/// gate. The last four are gate rejections: frequent, expected and silently
/// continuable. None of them end the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ScanError {
    #[error("Error accessing camera: {0}")]
    DeviceUnavailable(String),
    #[error("Unable to configure capture session: {0}")]
    SessionConfigurationFailed(String),
    #[error("Error getting image from buffer")]
    FrameExtractionFailed,
    #[error("Barcode detection error: {0}")]
    DetectionFailed(String),
    #[error("Barcode does not contain data")]
    NoPayload,
    #[error("Barcode is not fully inside the scan zone")]
    OutOfZone,
    #[error("Barcode symbology is not accepted")]
    UnsupportedSymbology,
    #[error("Scan throttled")]
    Throttled,
}

impl ScanError {
    /// Gate-level rejection rather than a capture failure
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ScanError::NoPayload
                | ScanError::OutOfZone
                | ScanError::UnsupportedSymbology
                | ScanError::Throttled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanError::DeviceUnavailable(_) => "device_unavailable",
            ScanError::SessionConfigurationFailed(_) => "session_configuration_failed",
            ScanError::FrameExtractionFailed => "frame_extraction_failed",
            ScanError::DetectionFailed(_) => "detection_failed",
            ScanError::NoPayload => "no_payload",
            ScanError::OutOfZone => "out_of_zone",
            ScanError::UnsupportedSymbology => "unsupported_symbology",
            ScanError::Throttled => "throttled",
        }
    }
}

/// Result of evaluating one detection (or one failed frame)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum GateOutcome {
    Accepted(String),
    RejectedNoPayload,
    RejectedOutOfZone,
    RejectedUnsupportedSymbology,
    RejectedThrottled,
    Error(ScanError),
}

impl GateOutcome {
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateOutcome::Accepted(_))
    }

    /// Accepted payload, if any
    pub fn payload(&self) -> Option<&str> {
        match self {
            GateOutcome::Accepted(payload) => Some(payload),
            _ => None,
        }
    }

    /// Rejection reason for `Rejected*` outcomes
    pub fn rejection(&self) -> Option<ScanError> {
        match self {
            GateOutcome::RejectedNoPayload => Some(ScanError::NoPayload),
            GateOutcome::RejectedOutOfZone => Some(ScanError::OutOfZone),
            GateOutcome::RejectedUnsupportedSymbology => Some(ScanError::UnsupportedSymbology),
            GateOutcome::RejectedThrottled => Some(ScanError::Throttled),
            GateOutcome::Accepted(_) | GateOutcome::Error(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GateOutcome::Accepted(_) => "accepted",
            GateOutcome::RejectedNoPayload => "rejected_no_payload",
            GateOutcome::RejectedOutOfZone => "rejected_out_of_zone",
            GateOutcome::RejectedUnsupportedSymbology => "rejected_unsupported_symbology",
            GateOutcome::RejectedThrottled => "rejected_throttled",
            GateOutcome::Error(_) => "error",
        }
    }
}

impl From<ScanError> for GateOutcome {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::NoPayload => GateOutcome::RejectedNoPayload,
            ScanError::OutOfZone => GateOutcome::RejectedOutOfZone,
            ScanError::UnsupportedSymbology => GateOutcome::RejectedUnsupportedSymbology,
            ScanError::Throttled => GateOutcome::RejectedThrottled,
            other => GateOutcome::Error(other),
        }
    }
}
