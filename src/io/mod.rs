//! IO modules - external system interfaces
//!
//! - `frame_source` - JSONL detector output as capture frames
//! - `egress` - Scan reports to file (JSONL format)

pub mod egress;
pub mod frame_source;

// Re-export commonly used types
pub use egress::ReportEgress;
pub use frame_source::{parse_frame_line, FrameReader};
