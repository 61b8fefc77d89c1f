//! scan-gate - replays recorded detector output through a scan session
//!
//! Reads capture frames as JSONL (file or stdin), feeds them to a scan
//! worker and appends every report to the egress file. Exits after the first
//! accepted scan, at end of input, or on Ctrl+C.
//!
//! Usage:
//!   scan-gate --config config/scanner.toml --input frames.jsonl

use anyhow::Context;
use clap::Parser;
use scan_gate::domain::{Symbology, SystemClock};
use scan_gate::infra::{Config, ScanMetrics};
use scan_gate::io::{FrameReader, ReportEgress};
use scan_gate::services::{create_scan_worker, ScanSession, WorkerExit};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Scan gate - replay detections through the scan gate
#[derive(Parser, Debug)]
#[command(name = "scan-gate", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "SCAN_GATE_CONFIG", default_value = "config/scanner.toml")]
    config: String,

    /// JSONL capture frames (defaults to stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// JSONL report output (overrides egress.file)
    #[arg(short, long)]
    output: Option<String>,

    /// Accepted symbologies, comma separated (overrides gate.symbologies)
    #[arg(long, value_delimiter = ',')]
    symbologies: Vec<Symbology>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default: INFO, use RUST_LOG=debug to see every rejection
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    info!(git_hash = %env!("GIT_HASH"), "scan_gate_starting");

    let mut config = Config::load_from_path(&args.config).with_symbologies(args.symbologies);
    if let Some(output) = args.output {
        config = config.with_egress_file(output);
    }

    info!(
        config_file = %config.config_file(),
        symbologies = ?config.symbologies(),
        zone = ?config.zone().rect(),
        min_interval_ms = %config.min_interval_ms(),
        vibrate_on_accept = %config.vibrate_on_accept(),
        normalized_input = %config.normalized_input(),
        egress_file = %config.egress_file(),
        "config_loaded"
    );

    let input: Box<dyn BufRead + Send> = match args.input {
        Some(ref path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open input {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let metrics = Arc::new(ScanMetrics::new());

    let session = ScanSession::new(config.gate_config())
        .with_mapping(config.preview_mapping())
        .with_metrics(metrics.clone());
    let (frame_tx, worker) = create_scan_worker(session, 256);
    let worker = worker.with_metrics(metrics.clone());

    // Capture side: blocking reads on a plain thread, one frame at a time
    let reader = std::thread::spawn(move || {
        let mut frames = FrameReader::new(input, SystemClock);
        let mut sent = 0usize;
        for frame in &mut frames {
            match frame {
                Ok(frame) => {
                    if frame_tx.blocking_send(frame).is_err() {
                        // Worker finished (scan accepted or shutdown)
                        break;
                    }
                    sent += 1;
                }
                Err(e) => warn!(error = %format!("{:#}", e), "frame_skipped"),
            }
        }
        info!(frames_sent = %sent, lines = %frames.line_no(), "frame_reader_finished");
    });

    // Presentation side: persist reports, run side effects
    let (report_tx, mut report_rx) = mpsc::channel(256);
    let egress = ReportEgress::new(config.egress_file());
    let presenter = tokio::spawn(async move {
        while let Some(report) = report_rx.recv().await {
            egress.write_report(&report);
            if report.vibrate {
                info!(session_id = %report.session_id, "haptic_feedback_requested");
            }
            if report.stop_requested {
                info!(session_id = %report.session_id, "scan_stop_requested");
            }
        }
    });

    // Periodic metrics
    let metrics_interval = config.metrics_interval_secs();
    if metrics_interval > 0 {
        let periodic = metrics.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
            interval.tick().await;
            loop {
                interval.tick().await;
                periodic.report().log();
            }
        });
    }

    // Handle shutdown on Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    let exit = worker.run(report_tx, shutdown_rx).await;

    if let Err(e) = presenter.await {
        error!(error = %e, "report_presenter_failed");
    }

    match exit {
        WorkerExit::Accepted(report) => {
            if let Some(payload) = report.result.payload() {
                println!("{}", payload);
            }
        }
        WorkerExit::FramesClosed => info!("no_scan_accepted"),
        WorkerExit::Shutdown => info!("scan_cancelled"),
        WorkerExit::ReportsClosed => warn!("report_channel_closed"),
    }

    metrics.report().log();

    // A stdin read cannot be interrupted; only join the reader for file input
    if args.input.is_some() && reader.join().is_err() {
        error!("frame_reader_panicked");
    }

    info!("scan-gate shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_precedence() {
        std::env::remove_var("SCAN_GATE_CONFIG");
        let args = Args::try_parse_from(["scan-gate"]).unwrap();
        assert_eq!(args.config, "config/scanner.toml");

        std::env::set_var("SCAN_GATE_CONFIG", "config/kiosk.toml");
        let args = Args::try_parse_from(["scan-gate"]).unwrap();
        assert_eq!(args.config, "config/kiosk.toml");

        let args = Args::try_parse_from(["scan-gate", "--config", "config/dock.toml"]).unwrap();
        assert_eq!(args.config, "config/dock.toml");
        std::env::remove_var("SCAN_GATE_CONFIG");
    }

    #[test]
    fn test_symbologies_override() {
        let args = Args::try_parse_from(["scan-gate", "--symbologies", "qr,EAN-13"]).unwrap();
        assert_eq!(args.symbologies, vec![Symbology::Qr, Symbology::Ean13]);
        assert!(Args::try_parse_from(["scan-gate", "--symbologies", "other"]).is_err());
    }
}
