//! Recorded detector output as capture frames
//!
//! One JSON object per line:
//!
//! ```text
//! {"t_ms": 1200, "observations": [{"symbology": "qr", "payload": "ABC", "bbox": {"x": 10, "y": 10, "width": 40, "height": 40}}]}
//! {"t_ms": 1230, "error": {"kind": "detection_failed", "detail": "request failed"}}
//! ```
//!
//! Lines without `t_ms` are stamped from the reader's clock. Blank lines
//! are skipped.

use crate::domain::outcome::ScanError;
use crate::domain::types::{Clock, Observation, Timestamp};
use crate::services::session::CaptureFrame;
use anyhow::Context;
use serde::Deserialize;
use std::io::BufRead;

#[derive(Debug, Deserialize)]
struct FrameLine {
    #[serde(default)]
    t_ms: Option<u64>,
    #[serde(default)]
    observations: Vec<Observation>,
    #[serde(default)]
    error: Option<ScanError>,
}

/// Parse a single JSONL line into a frame
pub fn parse_frame_line(line: &str, clock: &dyn Clock) -> anyhow::Result<CaptureFrame> {
    let parsed: FrameLine = serde_json::from_str(line)?;
    let at = parsed.t_ms.map(Timestamp::from_millis).unwrap_or_else(|| clock.now());

    Ok(match parsed.error {
        Some(error) => CaptureFrame::Failed { at, error },
        None => CaptureFrame::Detections { at, observations: parsed.observations },
    })
}

/// Iterates frames from a JSONL stream
pub struct FrameReader<R, C> {
    reader: R,
    clock: C,
    line_no: usize,
    buf: String,
}

impl<R: BufRead, C: Clock> FrameReader<R, C> {
    pub fn new(reader: R, clock: C) -> Self {
        Self { reader, clock, line_no: 0, buf: String::new() }
    }

    /// Number of lines consumed so far
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead, C: Clock> Iterator for FrameReader<R, C> {
    type Item = anyhow::Result<CaptureFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            let read = match self.reader.read_line(&mut self.buf) {
                Ok(read) => read,
                Err(e) => {
                    return Some(
                        Err(e).with_context(|| format!("Failed to read line {}", self.line_no + 1)),
                    )
                }
            };
            if read == 0 {
                return None;
            }
            self.line_no += 1;

            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }

            let line_no = self.line_no;
            return Some(
                parse_frame_line(line, &self.clock)
                    .with_context(|| format!("Invalid frame on line {}", line_no)),
            );
        }
    }
}
