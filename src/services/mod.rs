//! Services - gating logic and session orchestration
//!
//! - `scan_gate` - Pure gate evaluation (throttle, symbology, payload, zone)
//! - `session` - Per-session state, frame handling and caller side effects
//! - `scan_worker` - Async worker serializing frames into one session

pub mod scan_gate;
pub mod scan_worker;
pub mod session;

// Re-export commonly used types
pub use scan_gate::{evaluate, evaluate_at, GateConfig, GateState};
pub use scan_worker::{create_scan_worker, ScanWorker, WorkerExit};
pub use session::{CaptureFrame, ScanReport, ScanSession, SessionStatus};
