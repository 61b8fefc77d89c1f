//! Scan session - one gate state, fed frame by frame
//!
//! Turns capture frames into gate evaluations and tells the caller which
//! side effects to run. A session ends at its first accepted scan: the
//! report for it carries `stop_requested`, and later frames are dropped.

use crate::domain::geometry::PreviewMapping;
use crate::domain::outcome::{GateOutcome, ScanError};
use crate::domain::types::{new_uuid_v7, DetectionEvent, Observation, Symbology, Timestamp};
use crate::infra::metrics::ScanMetrics;
use crate::services::scan_gate::{self, GateConfig, GateState};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the capture side hands over for each processed frame
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureFrame {
    /// Detector results (possibly several barcodes in one frame)
    Detections { at: Timestamp, observations: Vec<Observation> },
    /// Capture or detection failed for this frame
    Failed { at: Timestamp, error: ScanError },
}

impl CaptureFrame {
    pub fn at(&self) -> Timestamp {
        match self {
            CaptureFrame::Detections { at, .. } | CaptureFrame::Failed { at, .. } => *at,
        }
    }
}

/// Outcome of one frame plus the side effects the caller owns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub session_id: String,
    pub at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbology: Option<Symbology>,
    pub result: GateOutcome,
    /// Trigger haptic feedback
    pub vibrate: bool,
    /// Stop feeding frames; set on exactly one report per session
    pub stop_requested: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Scanning,
    Stopped,
}

pub struct ScanSession {
    id: String,
    config: GateConfig,
    /// Maps detector boxes into scan zone space; `None` = already there
    mapping: Option<PreviewMapping>,
    state: GateState,
    status: SessionStatus,
    metrics: Option<Arc<ScanMetrics>>,
}

impl ScanSession {
    pub fn new(config: GateConfig) -> Self {
        let id = new_uuid_v7();
        info!(
            session_id = %id,
            symbologies = ?config.accepted_symbologies,
            zone = ?config.scan_zone.rect(),
            min_interval_ms = %config.min_interval.as_millis(),
            vibrate_on_accept = %config.vibrate_on_accept,
            "scan_session_started"
        );
        Self {
            id,
            config,
            mapping: None,
            state: GateState::default(),
            status: SessionStatus::Scanning,
            metrics: None,
        }
    }

    pub fn with_mapping(mut self, mapping: Option<PreviewMapping>) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<ScanMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.status == SessionStatus::Stopped
    }

    /// Caller-initiated stop (view dismissed, cancelled)
    pub fn stop(&mut self) {
        if self.status == SessionStatus::Scanning {
            info!(session_id = %self.id, "scan_session_stopped");
            self.status = SessionStatus::Stopped;
        }
    }

    /// Process one frame. Returns `None` for frames the gate never sees
    /// (empty detections) and for anything after the session stopped.
    pub fn handle_frame(&mut self, frame: CaptureFrame) -> Option<ScanReport> {
        if self.is_stopped() {
            debug!(session_id = %self.id, at = %frame.at(), "scan_frame_after_stop");
            return None;
        }

        if let Some(ref metrics) = self.metrics {
            metrics.record_frame();
        }

        match frame {
            CaptureFrame::Failed { at, error } => Some(self.handle_failure(at, error)),
            CaptureFrame::Detections { at, observations } => {
                self.handle_detections(at, &observations)
            }
        }
    }

    fn handle_failure(&mut self, at: Timestamp, error: ScanError) -> ScanReport {
        warn!(
            session_id = %self.id,
            at = %at,
            kind = %error.as_str(),
            error = %error,
            "scan_capture_error"
        );

        let outcome = GateOutcome::from(error);
        if let Some(ref metrics) = self.metrics {
            metrics.record_outcome(&outcome);
        }
        self.report(at, None, outcome)
    }

    fn handle_detections(&mut self, at: Timestamp, observations: &[Observation]) -> Option<ScanReport> {
        // First accepted symbology wins; otherwise the first observation is
        // evaluated so the caller still sees why nothing was accepted.
        let observation = observations
            .iter()
            .find(|o| self.config.accepts(o.symbology))
            .or_else(|| observations.first())?;

        let event = self.to_event(observation, at);

        let (outcome, state) = scan_gate::evaluate(&event, &self.config, self.state);

        self.state = state;
        if let Some(ref metrics) = self.metrics {
            metrics.record_outcome(&outcome);
        }

        match &outcome {
            GateOutcome::Accepted(payload) => {
                info!(
                    session_id = %self.id,
                    at = %at,
                    symbology = %event.symbology,
                    payload_len = %payload.len(),
                    "scan_accepted"
                );
                self.status = SessionStatus::Stopped;
            }
            rejected => {
                debug!(
                    session_id = %self.id,
                    at = %at,
                    symbology = %event.symbology,
                    outcome = %rejected.as_str(),
                    bbox = ?event.bounding_box,
                    "scan_rejected"
                );
            }
        }

        Some(self.report(at, Some(event.symbology), outcome))
    }

    fn to_event(&self, observation: &Observation, at: Timestamp) -> DetectionEvent {
        let bounding_box = match self.mapping {
            Some(ref mapping) => mapping.to_view(&observation.bounding_box),
            None => observation.bounding_box,
        };
        DetectionEvent::new(observation.symbology, observation.payload.clone(), bounding_box, at)
    }

    fn report(&self, at: Timestamp, symbology: Option<Symbology>, result: GateOutcome) -> ScanReport {
        let accepted = result.is_accepted();
        ScanReport {
            session_id: self.id.clone(),
            at,
            symbology,
            vibrate: accepted && self.config.vibrate_on_accept,
            stop_requested: accepted,
            result,
        }
    }
}
