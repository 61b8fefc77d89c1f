//! Domain models - core scan types
//!
//! This module contains the canonical data types used throughout the crate:
//! - `types` - Symbology, Timestamp, Observation, DetectionEvent
//! - `geometry` - Rect, ScanZone and the preview coordinate mapping
//! - `outcome` - GateOutcome and the ScanError taxonomy

pub mod geometry;
pub mod outcome;
pub mod types;

// Re-export commonly used types at module level
pub use geometry::{NormalizedOrigin, Point, PreviewMapping, Rect, ScanZone, Size};
pub use outcome::{GateOutcome, ScanError};
pub use types::{Clock, DetectionEvent, Observation, Symbology, SystemClock, Timestamp};
