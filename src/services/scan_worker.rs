//! Scan worker - evaluates frames off the capture thread
//!
//! The capture pipeline enqueues frames via an mpsc channel and the worker
//! feeds them, one at a time, into a single `ScanSession`. Reports go out on
//! a second channel so UI-side effects run after the state update.

use crate::infra::metrics::ScanMetrics;
use crate::services::session::{CaptureFrame, ScanReport, ScanSession};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

/// Why the worker stopped
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerExit {
    /// A scan was accepted; carries the accepted report
    Accepted(ScanReport),
    /// Frame channel closed before any acceptance
    FramesClosed,
    /// Shutdown signalled
    Shutdown,
    /// Report receiver dropped
    ReportsClosed,
}

pub struct ScanWorker {
    session: ScanSession,
    frame_rx: mpsc::Receiver<CaptureFrame>,
    metrics: Option<Arc<ScanMetrics>>,
}

impl ScanWorker {
    pub fn new(session: ScanSession, frame_rx: mpsc::Receiver<CaptureFrame>) -> Self {
        Self { session, frame_rx, metrics: None }
    }

    /// Metrics for dropped reports; pass the same instance to the session
    pub fn with_metrics(mut self, metrics: Arc<ScanMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn session_id(&self) -> &str {
        self.session.id()
    }

    /// Run until a scan is accepted, frames stop, or shutdown
    pub async fn run(
        mut self,
        report_tx: mpsc::Sender<ScanReport>,
        mut shutdown: watch::Receiver<bool>,
    ) -> WorkerExit {
        info!(session_id = %self.session.id(), "scan_worker_started");

        let exit = loop {
            tokio::select! {
                frame = self.frame_rx.recv() => {
                    let Some(frame) = frame else {
                        break WorkerExit::FramesClosed;
                    };

                    let Some(report) = self.session.handle_frame(frame) else {
                        continue;
                    };

                    let stop = report.stop_requested;
                    let accepted = stop.then(|| report.clone());

                    if report_tx.send(report).await.is_err() {
                        if let Some(ref metrics) = self.metrics {
                            metrics.record_report_dropped();
                        }
                        warn!(session_id = %self.session.id(), "scan_report_receiver_closed");
                        break WorkerExit::ReportsClosed;
                    }

                    if let Some(report) = accepted {
                        break WorkerExit::Accepted(report);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        self.session.stop();
                        break WorkerExit::Shutdown;
                    }
                }
            }
        };

        info!(
            session_id = %self.session.id(),
            exit = %exit_label(&exit),
            "scan_worker_stopped"
        );
        exit
    }
}

fn exit_label(exit: &WorkerExit) -> &'static str {
    match exit {
        WorkerExit::Accepted(_) => "accepted",
        WorkerExit::FramesClosed => "frames_closed",
        WorkerExit::Shutdown => "shutdown",
        WorkerExit::ReportsClosed => "reports_closed",
    }
}

/// Create a frame channel and the worker consuming it
///
/// Returns the sender (for the capture side) and the worker (to be spawned)
pub fn create_scan_worker(
    session: ScanSession,
    buffer_size: usize,
) -> (mpsc::Sender<CaptureFrame>, ScanWorker) {
    let (frame_tx, frame_rx) = mpsc::channel(buffer_size);
    (frame_tx, ScanWorker::new(session, frame_rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::{Point, Rect, ScanZone, Size};
    use crate::domain::outcome::{GateOutcome, ScanError};
    use crate::domain::types::{Observation, Symbology, Timestamp};
    use crate::services::scan_gate::GateConfig;
    use std::time::Duration;

    fn session() -> ScanSession {
        ScanSession::new(GateConfig::new(
            [Symbology::Qr],
            ScanZone::new(Point::new(100.0, 100.0), Size::new(200.0, 200.0)),
            Duration::from_secs(1),
        ))
    }

    fn qr_frame(t_ms: u64, payload: &str, bbox: Rect) -> CaptureFrame {
        CaptureFrame::Detections {
            at: Timestamp(t_ms),
            observations: vec![Observation {
                symbology: Symbology::Qr,
                payload: Some(payload.to_string()),
                bounding_box: bbox,
            }],
        }
    }

    #[tokio::test]
    async fn test_worker_stops_after_accept() {
        let (frame_tx, worker) = create_scan_worker(session(), 16);
        let (report_tx, mut report_rx) = mpsc::channel(16);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        frame_tx.send(qr_frame(0, "OUT", Rect::new(190.0, 190.0, 30.0, 30.0))).await.unwrap();
        frame_tx.send(qr_frame(10, "IN", Rect::new(10.0, 10.0, 30.0, 30.0))).await.unwrap();
        frame_tx.send(qr_frame(20, "NEVER", Rect::new(10.0, 10.0, 30.0, 30.0))).await.unwrap();

        let exit = worker.run(report_tx, shutdown_rx).await;

        let first = report_rx.recv().await.unwrap();
        assert_eq!(first.result, GateOutcome::RejectedOutOfZone);
        let second = report_rx.recv().await.unwrap();
        assert_eq!(second.result, GateOutcome::Accepted("IN".into()));
        assert!(second.stop_requested);
        assert!(report_rx.recv().await.is_none());

        match exit {
            WorkerExit::Accepted(report) => assert_eq!(report.result.payload(), Some("IN")),
            other => panic!("unexpected exit: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_worker_frames_closed() {
        let (frame_tx, worker) = create_scan_worker(session(), 4);
        let (report_tx, mut report_rx) = mpsc::channel(4);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        frame_tx
            .send(CaptureFrame::Failed { at: Timestamp(0), error: ScanError::FrameExtractionFailed })
            .await
            .unwrap();
        drop(frame_tx);

        let exit = worker.run(report_tx, shutdown_rx).await;
        assert_eq!(exit, WorkerExit::FramesClosed);

        let report = report_rx.recv().await.unwrap();
        assert_eq!(report.result, GateOutcome::Error(ScanError::FrameExtractionFailed));
    }

    #[tokio::test]
    async fn test_worker_shutdown() {
        let (_frame_tx, worker) = create_scan_worker(session(), 4);
        let (report_tx, _report_rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(worker.run(report_tx, shutdown_rx));
        shutdown_tx.send(true).unwrap();

        let exit = tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
        assert_eq!(exit, WorkerExit::Shutdown);
    }

    #[tokio::test]
    async fn test_worker_reports_closed() {
        let metrics = Arc::new(ScanMetrics::new());
        let (frame_tx, worker) = create_scan_worker(session(), 4);
        let worker = worker.with_metrics(metrics.clone());
        let (report_tx, report_rx) = mpsc::channel(4);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        drop(report_rx);

        frame_tx.send(qr_frame(0, "A", Rect::new(10.0, 10.0, 5.0, 5.0))).await.unwrap();

        let exit = worker.run(report_tx, shutdown_rx).await;
        assert_eq!(exit, WorkerExit::ReportsClosed);
        assert_eq!(metrics.report().reports_dropped, 1);
    }
}
