//! Lock-free scan metrics and periodic reporting
//!
//! Uses atomics for hot-path operations so recording never blocks the
//! capture pipeline. Reporting swaps the windowed counters to zero.
//!
//! NOTE: All atomics use Relaxed ordering intentionally. These are statistical
//! counters only and must not drive gating decisions.

use crate::domain::outcome::GateOutcome;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Lock-free scan metrics collector
pub struct ScanMetrics {
    /// Frames received from the capture side (monotonic)
    frames_total: AtomicU64,
    /// Gate evaluations since last report (reset on report)
    evaluations_since_report: AtomicU64,
    accepted_total: AtomicU64,
    throttled_total: AtomicU64,
    unsupported_total: AtomicU64,
    no_payload_total: AtomicU64,
    out_of_zone_total: AtomicU64,
    /// Capture/detection errors surfaced to the caller (monotonic)
    errors_total: AtomicU64,
    /// Frames the worker could not forward (monotonic)
    reports_dropped: AtomicU64,
    last_report_time: parking_lot::Mutex<Instant>,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self {
            frames_total: AtomicU64::new(0),
            evaluations_since_report: AtomicU64::new(0),
            accepted_total: AtomicU64::new(0),
            throttled_total: AtomicU64::new(0),
            unsupported_total: AtomicU64::new(0),
            no_payload_total: AtomicU64::new(0),
            out_of_zone_total: AtomicU64::new(0),
            errors_total: AtomicU64::new(0),
            reports_dropped: AtomicU64::new(0),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    #[inline]
    pub fn record_frame(&self) {
        self.frames_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an outcome. Errors never reach the gate and are not evaluations.
    #[inline]
    pub fn record_outcome(&self, outcome: &GateOutcome) {
        let counter = match outcome {
            GateOutcome::Accepted(_) => &self.accepted_total,
            GateOutcome::RejectedThrottled => &self.throttled_total,
            GateOutcome::RejectedUnsupportedSymbology => &self.unsupported_total,
            GateOutcome::RejectedNoPayload => &self.no_payload_total,
            GateOutcome::RejectedOutOfZone => &self.out_of_zone_total,
            GateOutcome::Error(_) => {
                self.errors_total.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.evaluations_since_report.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_report_dropped(&self) {
        self.reports_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot; the evaluation window is reset
    pub fn report(&self) -> MetricsSummary {
        let evaluations = self.evaluations_since_report.swap(0, Ordering::Relaxed);

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        let evaluations_per_sec = if elapsed.as_secs_f64() > 0.0 {
            evaluations as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        MetricsSummary {
            frames_total: self.frames_total.load(Ordering::Relaxed),
            evaluations,
            evaluations_per_sec,
            accepted_total: self.accepted_total.load(Ordering::Relaxed),
            throttled_total: self.throttled_total.load(Ordering::Relaxed),
            unsupported_total: self.unsupported_total.load(Ordering::Relaxed),
            no_payload_total: self.no_payload_total.load(Ordering::Relaxed),
            out_of_zone_total: self.out_of_zone_total.load(Ordering::Relaxed),
            errors_total: self.errors_total.load(Ordering::Relaxed),
            reports_dropped: self.reports_dropped.load(Ordering::Relaxed),
        }
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub frames_total: u64,
    pub evaluations: u64,
    pub evaluations_per_sec: f64,
    pub accepted_total: u64,
    pub throttled_total: u64,
    pub unsupported_total: u64,
    pub no_payload_total: u64,
    pub out_of_zone_total: u64,
    pub errors_total: u64,
    pub reports_dropped: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            frames_total = %self.frames_total,
            evaluations = %self.evaluations,
            evaluations_per_sec = format!("{:.1}", self.evaluations_per_sec),
            accepted = %self.accepted_total,
            throttled = %self.throttled_total,
            unsupported = %self.unsupported_total,
            no_payload = %self.no_payload_total,
            out_of_zone = %self.out_of_zone_total,
            errors = %self.errors_total,
            dropped = %self.reports_dropped,
            "scan_metrics"
        );
    }
}
