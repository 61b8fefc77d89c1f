//! Scan gate - decides which detection is surfaced as "the" scan
//!
//! A pure function of (event, config, state). Checks run in a fixed order:
//! 1. Throttle: within `min_interval` of the previous acceptance
//! 2. Symbology not in the accepted set
//! 3. Payload absent or empty
//! 4. Bounding box not fully inside the scan zone
//!
//! The throttle is checked before anything else so the rate of accepted
//! scans is bounded regardless of detection volume.

use crate::domain::geometry::{ScanZone, Size};
use crate::domain::outcome::GateOutcome;
use crate::domain::types::{DetectionEvent, Symbology, Timestamp};
use std::collections::BTreeSet;
use std::time::Duration;

/// Default minimum time between two accepted scans (1 second)
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Default scan zone edge length (200 x 200)
pub const DEFAULT_ZONE_SIZE: Size = Size::new(200.0, 200.0);

/// Gate configuration, immutable for the lifetime of a scan session
#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    pub accepted_symbologies: BTreeSet<Symbology>,
    pub scan_zone: ScanZone,
    pub min_interval: Duration,
    /// Caller should trigger haptic feedback on acceptance
    pub vibrate_on_accept: bool,
}

impl GateConfig {
    pub fn new(
        accepted_symbologies: impl IntoIterator<Item = Symbology>,
        scan_zone: ScanZone,
        min_interval: Duration,
    ) -> Self {
        Self {
            accepted_symbologies: accepted_symbologies.into_iter().collect(),
            scan_zone,
            min_interval,
            vibrate_on_accept: true,
        }
    }

    pub fn with_vibrate_on_accept(mut self, vibrate: bool) -> Self {
        self.vibrate_on_accept = vibrate;
        self
    }

    /// `Symbology::Other` is never accepted
    #[inline]
    pub fn accepts(&self, symbology: Symbology) -> bool {
        symbology != Symbology::Other && self.accepted_symbologies.contains(&symbology)
    }
}

/// Per-session gate state. Only the gate changes it, and only on acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GateState {
    /// `None` until the first accepted scan
    pub last_accepted_at: Option<Timestamp>,
}

impl GateState {
    /// Time left before another scan can be accepted at `now`
    pub fn throttle_remaining(&self, now: Timestamp, min_interval: Duration) -> Option<Duration> {
        let last = self.last_accepted_at?;
        let elapsed = now.saturating_duration_since(last);
        (elapsed < min_interval).then(|| min_interval - elapsed)
    }
}

/// Evaluate an event at its own capture timestamp
#[inline]
pub fn evaluate(
    event: &DetectionEvent,
    config: &GateConfig,
    state: GateState,
) -> (GateOutcome, GateState) {
    evaluate_at(event, config, state, event.timestamp)
}

/// Evaluate an event at `now`, supplied by the caller's time source
pub fn evaluate_at(
    event: &DetectionEvent,
    config: &GateConfig,
    state: GateState,
    now: Timestamp,
) -> (GateOutcome, GateState) {
    if state.throttle_remaining(now, config.min_interval).is_some() {
        return (GateOutcome::RejectedThrottled, state);
    }

    if !config.accepts(event.symbology) {
        return (GateOutcome::RejectedUnsupportedSymbology, state);
    }

    let Some(payload) = event.non_empty_payload() else {
        return (GateOutcome::RejectedNoPayload, state);
    };

    if !config.scan_zone.contains(&event.bounding_box) {
        return (GateOutcome::RejectedOutOfZone, state);
    }

    (GateOutcome::Accepted(payload.to_string()), GateState { last_accepted_at: Some(now) })
}
