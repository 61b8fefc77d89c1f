//! Infrastructure - configuration and metrics
//!
//! - `config` - Application configuration (TOML loading, defaults)
//! - `metrics` - Lock-free scan metrics

pub mod config;
pub mod metrics;

// Re-export commonly used types
pub use config::Config;
pub use metrics::{MetricsSummary, ScanMetrics};
