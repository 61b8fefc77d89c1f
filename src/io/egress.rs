//! Scan report egress - writes reports to file
//!
//! Reports are written in JSONL format (one JSON object per line)
//! to the file specified in config.

use crate::services::session::ScanReport;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info};

/// Egress writer for scan reports
pub struct ReportEgress {
    file_path: String,
}

impl ReportEgress {
    pub fn new(file_path: &str) -> Self {
        info!(file_path = %file_path, "egress_initialized");
        Self { file_path: file_path.to_string() }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// Write a report to the egress file
    /// Returns true if successful, false otherwise
    pub fn write_report(&self, report: &ScanReport) -> bool {
        let json = match serde_json::to_string(report) {
            Ok(json) => json,
            Err(e) => {
                error!(session_id = %report.session_id, error = %e, "report_serialize_failed");
                return false;
            }
        };

        match self.append_line(&json) {
            Ok(()) => {
                debug!(
                    session_id = %report.session_id,
                    at = %report.at,
                    outcome = %report.result.as_str(),
                    "report_egressed"
                );
                true
            }
            Err(e) => {
                error!(
                    session_id = %report.session_id,
                    error = %e,
                    "report_egress_failed"
                );
                false
            }
        }
    }

    /// Append a line to the egress file
    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Write multiple reports, returns the number written
    pub fn write_reports(&self, reports: &[ScanReport]) -> usize {
        reports.iter().filter(|report| self.write_report(report)).count()
    }
}
